//! Shared fixtures for unit tests.

use crate::core::currency::{CurrencyRecord, RateDirection};
use crate::core::error::{RateError, RateResult};
use crate::core::forex::{ForexProvider, RatePoint};
use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

pub fn currency(
    code: &str,
    name: &str,
    rate: Decimal,
    real: &str,
    direction: RateDirection,
) -> CurrencyRecord {
    CurrencyRecord {
        code: code.to_string(),
        name: name.to_string(),
        symbol: code.chars().next().map(String::from).unwrap_or_default(),
        country: format!("{name} Republic"),
        subdivision: Some("cents".to_string()),
        exchange_rate: rate,
        real_currency: real.to_string(),
        direction,
    }
}

/// VYR and IRE share the USD peg, AVE and ORL share EUR, GAL is on GBP and
/// ZRO has a zero stored rate.
pub fn sample_currencies() -> Vec<CurrencyRecord> {
    vec![
        currency("VYR", "Vyrian Mark", dec!(2.0), "USD", RateDirection::CustomToReal),
        currency("IRE", "Irenic Crown", dec!(0.5), "USD", RateDirection::RealToCustom),
        currency("AVE", "Avelin Drachma", dec!(0.8), "EUR", RateDirection::RealToCustom),
        currency("ORL", "Orlen Penny", dec!(4), "EUR", RateDirection::CustomToReal),
        currency("GAL", "Gallant Shilling", dec!(1), "GBP", RateDirection::CustomToReal),
        currency("ZRO", "Zeroed Token", dec!(0), "USD", RateDirection::RealToCustom),
    ]
}

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

/// Forex provider answering from fixed tables and counting every call.
#[derive(Default)]
pub struct MockForex {
    latest: HashMap<(String, String), RateResult<Decimal>>,
    history: HashMap<(String, String), RateResult<Vec<RatePoint>>>,
    calls: AtomicUsize,
}

impl MockForex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_latest(mut self, from: &str, to: &str, rate: Decimal) -> Self {
        self.latest
            .insert((from.to_string(), to.to_string()), Ok(rate));
        self
    }

    pub fn with_failure(mut self, from: &str, to: &str, error: RateError) -> Self {
        self.latest
            .insert((from.to_string(), to.to_string()), Err(error.clone()));
        self.history
            .insert((from.to_string(), to.to_string()), Err(error));
        self
    }

    pub fn with_history(mut self, from: &str, to: &str, points: &[(&str, Decimal)]) -> Self {
        let series = points
            .iter()
            .map(|(d, rate)| RatePoint {
                date: date(d),
                rate: *rate,
            })
            .collect();
        self.history
            .insert((from.to_string(), to.to_string()), Ok(series));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ForexProvider for MockForex {
    async fn latest_rate(&self, from: &str, to: &str) -> RateResult<Decimal> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        self.latest
            .get(&(from.to_string(), to.to_string()))
            .cloned()
            .unwrap_or_else(|| {
                Err(RateError::RateNotFound {
                    from: from.to_string(),
                    to: to.to_string(),
                })
            })
    }

    async fn historical_rates(
        &self,
        from: &str,
        to: &str,
        _start: NaiveDate,
        _end: NaiveDate,
    ) -> RateResult<Vec<RatePoint>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.history
            .get(&(from.to_string(), to.to_string()))
            .cloned()
            .unwrap_or_else(|| {
                Err(RateError::RateNotFound {
                    from: from.to_string(),
                    to: to.to_string(),
                })
            })
    }
}
