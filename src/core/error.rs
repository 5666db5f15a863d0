//! Rate resolution error types.

use chrono::NaiveDate;
use thiserror::Error;

/// Errors produced while resolving a rate.
///
/// `Display` is safe to show to end users. Provider variants keep the
/// underlying cause separately, see [`RateError::cause`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RateError {
    /// One of the requested codes is not registered.
    #[error("Currency not found: {0}")]
    CurrencyNotFound(String),

    /// The target currency's base rate is zero and cannot be divided by.
    #[error("Exchange rate for target currency {0} results in zero value")]
    ZeroRateTarget(String),

    #[error("Invalid date range: {start} is after {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("Amount must be a positive number")]
    InvalidAmount,

    /// Network failure or timeout talking to the forex provider.
    #[error("Exchange rate provider is unavailable for {from} to {to}")]
    ProviderUnavailable {
        from: String,
        to: String,
        cause: String,
    },

    /// Non-success status or a payload that could not be decoded.
    #[error("Exchange rate provider returned an invalid response for {from} to {to}")]
    ProviderBadResponse {
        from: String,
        to: String,
        cause: String,
    },

    /// Well-formed response that does not carry the requested rate.
    #[error("Exchange rate not available for {from} to {to}")]
    RateNotFound { from: String, to: String },

    /// The result does not fit in a decimal.
    #[error("Conversion result is out of range")]
    Overflow,
}

impl RateError {
    /// Operator-facing detail behind the user-safe message, if any.
    pub fn cause(&self) -> Option<&str> {
        match self {
            RateError::ProviderUnavailable { cause, .. }
            | RateError::ProviderBadResponse { cause, .. } => Some(cause),
            _ => None,
        }
    }

    /// HTTP-equivalent status for this failure.
    pub fn status_code(&self) -> u16 {
        match self {
            RateError::CurrencyNotFound(_) | RateError::RateNotFound { .. } => 404,
            RateError::ZeroRateTarget(_)
            | RateError::InvalidDateRange { .. }
            | RateError::InvalidAmount
            | RateError::Overflow => 400,
            RateError::ProviderBadResponse { .. } => 502,
            RateError::ProviderUnavailable { .. } => 503,
        }
    }
}

pub type RateResult<T> = Result<T, RateError>;
