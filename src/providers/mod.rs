pub mod frankfurter;
pub mod util;

pub use frankfurter::FrankfurterProvider;
