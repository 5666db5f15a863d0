//! Virtual currency definitions

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// How a stored exchange rate relates one unit of the real currency to one
/// unit of the virtual currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateDirection {
    /// `1 real = exchange_rate custom`
    #[default]
    RealToCustom,
    /// `1 custom = exchange_rate real`
    CustomToReal,
}

impl Display for RateDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                RateDirection::RealToCustom => "real_to_custom",
                RateDirection::CustomToReal => "custom_to_real",
            }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencyRecord {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub subdivision: Option<String>,
    pub exchange_rate: Decimal,
    pub real_currency: String,
    #[serde(default)]
    pub direction: RateDirection,
}

impl CurrencyRecord {
    /// Value of one unit of this currency expressed in its real currency.
    ///
    /// A zero stored rate yields zero rather than failing; callers decide
    /// whether that is usable.
    pub fn base_rate(&self) -> Decimal {
        match self.direction {
            RateDirection::CustomToReal => self.exchange_rate,
            RateDirection::RealToCustom => {
                if self.exchange_rate.is_zero() {
                    Decimal::ZERO
                } else {
                    Decimal::ONE / self.exchange_rate
                }
            }
        }
    }

    /// Whether both currencies are pegged to the same real currency.
    pub fn shares_group_with(&self, other: &CurrencyRecord) -> bool {
        self.real_currency.eq_ignore_ascii_case(&other.real_currency)
    }
}

/// Public projection of a currency, as returned by the list operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrencyView {
    pub name: String,
    pub short: String,
    pub symbol: String,
    pub country: String,
    pub breakdown: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub exchange_rate: Decimal,
    pub exchange_direction: RateDirection,
    pub forex: String,
}

impl From<CurrencyRecord> for CurrencyView {
    fn from(record: CurrencyRecord) -> Self {
        CurrencyView {
            name: record.name,
            short: record.code,
            symbol: record.symbol,
            country: record.country,
            breakdown: record.subdivision,
            exchange_rate: record.exchange_rate,
            exchange_direction: record.direction,
            forex: record.real_currency,
        }
    }
}
