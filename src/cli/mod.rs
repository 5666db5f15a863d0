//! Terminal front-end: calculator, rates table, and history table.

pub mod convert;
pub mod historical;
pub mod list;
pub mod query;
pub mod rates;
pub mod setup;
pub mod ui;
