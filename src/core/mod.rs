//! Core business logic abstractions

pub mod cache;
pub mod config;
pub mod currency;
pub mod engine;
pub mod error;
pub mod forex;
pub mod log;
pub mod registry;

// Re-export main types for cleaner imports
pub use currency::{CurrencyRecord, CurrencyView, RateDirection};
pub use engine::{RateEngine, RateEntry, RatesTable};
pub use error::{RateError, RateResult};
pub use forex::{ForexProvider, RatePoint};
pub use registry::CurrencyRegistry;
