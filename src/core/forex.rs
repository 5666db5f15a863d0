//! Real currency exchange rate abstractions

use crate::core::error::RateResult;
use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Rate on a given day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatePoint {
    pub date: NaiveDate,
    #[serde(with = "rust_decimal::serde::float")]
    pub rate: Decimal,
}

#[async_trait]
pub trait ForexProvider: Send + Sync {
    /// Latest rate for one unit of `from` in `to`. Returns one when both are equal.
    async fn latest_rate(&self, from: &str, to: &str) -> RateResult<Decimal>;

    /// Daily rates over `[start, end]`, ordered by date. Days the provider has
    /// no data for are absent.
    async fn historical_rates(
        &self,
        from: &str,
        to: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> RateResult<Vec<RatePoint>>;
}

/// One point per calendar day in `[start, end]`, all with the same rate.
pub fn constant_series(start: NaiveDate, end: NaiveDate, rate: Decimal) -> Vec<RatePoint> {
    start
        .iter_days()
        .take_while(|date| *date <= end)
        .map(|date| RatePoint { date, rate })
        .collect()
}
