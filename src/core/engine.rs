//! Rate resolution between virtual currencies.
//!
//! Every virtual currency is pegged to a real currency (its group). Converting
//! inside a group only needs the stored base rates; converting across groups
//! multiplies in the forex rate between the two real currencies.

use crate::core::cache::Memo;
use crate::core::currency::{CurrencyRecord, CurrencyView};
use crate::core::error::{RateError, RateResult};
use crate::core::forex::{ForexProvider, RatePoint, constant_series};
use crate::core::registry::CurrencyRegistry;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use futures::future::join_all;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Decimal places of a conversion result.
pub const CONVERSION_DP: u32 = 5;
/// Decimal places of a quoted rate in tables and series.
pub const RATE_DP: u32 = 4;

/// Rounds half away from zero, so `0.000025` becomes `0.00003` at 5 places.
pub fn round_rate(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

type PairMemo = Memo<(String, String), RateResult<Decimal>>;

/// One row of a rates table: either a quote or the reason it failed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RateEntry {
    Quote {
        #[serde(with = "rust_decimal::serde::float")]
        value: Decimal,
        #[serde(with = "rust_decimal::serde::float")]
        change: Decimal,
        timestamp: String,
    },
    Failed {
        error: String,
    },
}

/// Rates of every other currency against `base`, in registry order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatesTable {
    pub base: String,
    #[serde(serialize_with = "serialize_ordered")]
    pub rates: Vec<(String, RateEntry)>,
}

impl RatesTable {
    pub fn get(&self, code: &str) -> Option<&RateEntry> {
        self.rates
            .iter()
            .find(|(c, _)| c.eq_ignore_ascii_case(code))
            .map(|(_, entry)| entry)
    }
}

fn serialize_ordered<S: Serializer>(
    rates: &[(String, RateEntry)],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(rates.len()))?;
    for (code, entry) in rates {
        map.serialize_entry(code, entry)?;
    }
    map.end()
}

pub struct RateEngine {
    registry: Arc<dyn CurrencyRegistry>,
    forex: Arc<dyn ForexProvider>,
}

impl RateEngine {
    pub fn new(registry: Arc<dyn CurrencyRegistry>, forex: Arc<dyn ForexProvider>) -> Self {
        Self { registry, forex }
    }

    pub async fn list_currencies(&self) -> RateResult<Vec<CurrencyView>> {
        let currencies = self.registry.list_all().await?;
        Ok(currencies.into_iter().map(CurrencyView::from).collect())
    }

    /// Converts `amount` of `from` into `to`, rounded to five places.
    #[instrument(skip(self))]
    pub async fn convert(&self, amount: Decimal, from: &str, to: &str) -> RateResult<Decimal> {
        let from_info = self.resolve(from).await?;
        let to_info = self.resolve(to).await?;
        let memo = PairMemo::new();
        self.convert_records(&memo, amount, &from_info, &to_info)
            .await
    }

    /// Quotes one unit of `base` in every other registered currency.
    ///
    /// A failing pair only fails its own entry. Provider lookups run
    /// concurrently and each real-currency pair is fetched once.
    #[instrument(skip(self, now))]
    pub async fn get_rates(&self, base: &str, now: DateTime<Utc>) -> RateResult<RatesTable> {
        let base_info = self.resolve(base).await?;
        let targets = self.registry.list_all_except(&base_info.code).await?;
        let timestamp = now.to_rfc3339_opts(SecondsFormat::Secs, false);
        let memo = PairMemo::new();

        let quotes = targets.iter().map(|target| {
            let memo = &memo;
            let base_info = &base_info;
            let timestamp = &timestamp;
            async move {
                let entry = match self
                    .convert_records(memo, Decimal::ONE, base_info, target)
                    .await
                {
                    Ok(value) => RateEntry::Quote {
                        value: round_rate(value, RATE_DP),
                        change: Decimal::ZERO,
                        timestamp: timestamp.clone(),
                    },
                    Err(e) => {
                        warn!(
                            base = %base_info.code,
                            target = %target.code,
                            cause = e.cause().unwrap_or_default(),
                            "Rate resolution failed: {e}"
                        );
                        RateEntry::Failed {
                            error: e.to_string(),
                        }
                    }
                };
                (target.code.clone(), entry)
            }
        });
        let rates = join_all(quotes).await;
        debug!(
            "Resolved {} rates with {} provider pairs",
            rates.len(),
            memo.len().await
        );

        Ok(RatesTable {
            base: base_info.code,
            rates,
        })
    }

    /// Daily rates of `from` in `to` over `[start, end]`, rounded to four places.
    ///
    /// Cross-group series follow the provider's dates exactly; missing days
    /// stay missing.
    #[instrument(skip(self))]
    pub async fn get_historical_rates(
        &self,
        from: &str,
        to: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> RateResult<Vec<RatePoint>> {
        if start > end {
            return Err(RateError::InvalidDateRange { start, end });
        }

        let from_info = self.resolve(from).await?;
        let to_info = self.resolve(to).await?;

        if from_info.code == to_info.code {
            return Ok(constant_series(start, end, Decimal::ONE));
        }

        let ratio = peg_ratio(&from_info, &to_info)?;
        if from_info.shares_group_with(&to_info) {
            return Ok(constant_series(start, end, round_rate(ratio, RATE_DP)));
        }

        let series = self
            .forex
            .historical_rates(&from_info.real_currency, &to_info.real_currency, start, end)
            .await?;
        debug!("Provider returned {} historical points", series.len());

        series
            .into_iter()
            .map(|point| {
                let rate = ratio.checked_mul(point.rate).ok_or(RateError::Overflow)?;
                Ok(RatePoint {
                    date: point.date,
                    rate: round_rate(rate, RATE_DP),
                })
            })
            .collect()
    }

    async fn resolve(&self, code: &str) -> RateResult<CurrencyRecord> {
        self.registry
            .lookup(code)
            .await?
            .ok_or_else(|| RateError::CurrencyNotFound(code.trim().to_uppercase()))
    }

    async fn convert_records(
        &self,
        memo: &PairMemo,
        amount: Decimal,
        from: &CurrencyRecord,
        to: &CurrencyRecord,
    ) -> RateResult<Decimal> {
        if from.code == to.code {
            return Ok(amount);
        }

        let mut rate = peg_ratio(from, to)?;
        if !from.shares_group_with(to) {
            let forex = self
                .latest_rate(memo, &from.real_currency, &to.real_currency)
                .await?;
            rate = rate.checked_mul(forex).ok_or(RateError::Overflow)?;
        }

        let converted = amount.checked_mul(rate).ok_or(RateError::Overflow)?;
        Ok(round_rate(converted, CONVERSION_DP))
    }

    async fn latest_rate(&self, memo: &PairMemo, from: &str, to: &str) -> RateResult<Decimal> {
        memo.get_or_fetch((from.to_string(), to.to_string()), || {
            self.forex.latest_rate(from, to)
        })
        .await
    }
}

/// `base(from) / base(to)`, failing when the target is worth nothing.
fn peg_ratio(from: &CurrencyRecord, to: &CurrencyRecord) -> RateResult<Decimal> {
    let to_base = to.base_rate();
    if to_base.is_zero() {
        return Err(RateError::ZeroRateTarget(to.code.clone()));
    }
    from.base_rate()
        .checked_div(to_base)
        .ok_or(RateError::Overflow)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryRegistry;
    use crate::test_utils::{MockForex, date, sample_currencies};
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn engine_with(forex: MockForex) -> (RateEngine, Arc<MockForex>) {
        let registry = Arc::new(MemoryRegistry::new(sample_currencies()).unwrap());
        let forex = Arc::new(forex);
        (RateEngine::new(registry, forex.clone()), forex)
    }

    fn unavailable(from: &str, to: &str) -> RateError {
        RateError::ProviderUnavailable {
            from: from.to_string(),
            to: to.to_string(),
            cause: "timed out".to_string(),
        }
    }

    #[tokio::test]
    async fn converting_to_same_currency_returns_amount() {
        let (engine, forex) = engine_with(MockForex::new());

        for amount in [dec!(1), dec!(0.123456789), dec!(10000)] {
            let result = engine.convert(amount, "AVE", "ave").await.unwrap();
            assert_eq!(result, amount);
        }
        assert_eq!(forex.calls(), 0);
    }

    #[tokio::test]
    async fn same_group_conversion_needs_no_provider() {
        let (engine, forex) = engine_with(MockForex::new());

        // base(VYR) = 2.0, base(IRE) = 1 / 0.5 = 2.0
        let result = engine.convert(dec!(10), "VYR", "IRE").await.unwrap();
        assert_eq!(result, dec!(10.00000));
        assert_eq!(forex.calls(), 0);

        // base(AVE) = 1.25, base(ORL) = 4
        let result = engine.convert(dec!(8), "ORL", "AVE").await.unwrap();
        assert_eq!(result, dec!(25.6));
    }

    #[tokio::test]
    async fn cross_group_conversion_applies_forex_rate() {
        let (engine, forex) = engine_with(MockForex::new().with_latest("USD", "EUR", dec!(0.92)));

        // (2.0 / 1.25) * 0.92 = 1.472
        let result = engine.convert(dec!(5), "VYR", "AVE").await.unwrap();
        assert_eq!(result, dec!(7.36));
        assert_eq!(forex.calls(), 1);
    }

    #[tokio::test]
    async fn conversion_rounds_half_away_from_zero() {
        let registry = Arc::new(
            MemoryRegistry::new(vec![
                crate::test_utils::currency(
                    "TNY",
                    "Tiny",
                    dec!(0.000025),
                    "USD",
                    crate::core::currency::RateDirection::CustomToReal,
                ),
                crate::test_utils::currency(
                    "ONE",
                    "Unit",
                    dec!(1),
                    "USD",
                    crate::core::currency::RateDirection::CustomToReal,
                ),
            ])
            .unwrap(),
        );
        let engine = RateEngine::new(registry, Arc::new(MockForex::new()));

        assert_eq!(
            engine.convert(dec!(1), "TNY", "ONE").await.unwrap(),
            dec!(0.00003)
        );
        assert_eq!(
            engine.convert(dec!(3), "TNY", "ONE").await.unwrap(),
            dec!(0.00008)
        );
    }

    #[tokio::test]
    async fn conversion_fails_for_unknown_currency() {
        let (engine, forex) = engine_with(MockForex::new());

        assert_eq!(
            engine.convert(dec!(1), "NOPE", "VYR").await.unwrap_err(),
            RateError::CurrencyNotFound("NOPE".to_string())
        );
        assert_eq!(
            engine.convert(dec!(1), "VYR", "nope").await.unwrap_err(),
            RateError::CurrencyNotFound("NOPE".to_string())
        );
        assert_eq!(forex.calls(), 0);
    }

    #[tokio::test]
    async fn conversion_fails_for_zero_rate_target() {
        let (engine, _) = engine_with(MockForex::new());

        assert_eq!(
            engine.convert(dec!(1), "VYR", "ZRO").await.unwrap_err(),
            RateError::ZeroRateTarget("ZRO".to_string())
        );
        // A zero source is fine, it is only ever multiplied.
        assert_eq!(
            engine.convert(dec!(1), "ZRO", "VYR").await.unwrap(),
            Decimal::ZERO
        );
    }

    #[tokio::test]
    async fn conversion_surfaces_provider_errors() {
        let (engine, _) =
            engine_with(MockForex::new().with_failure("USD", "GBP", unavailable("USD", "GBP")));

        let err = engine.convert(dec!(1), "VYR", "GAL").await.unwrap_err();
        assert_eq!(err, unavailable("USD", "GBP"));
    }

    #[tokio::test]
    async fn rates_cover_every_other_currency_in_order() {
        let (engine, forex) = engine_with(
            MockForex::new()
                .with_latest("USD", "EUR", dec!(0.92))
                .with_latest("USD", "GBP", dec!(0.8)),
        );
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();

        let table = engine.get_rates("vyr", now).await.unwrap();

        assert_eq!(table.base, "VYR");
        let codes: Vec<&str> = table.rates.iter().map(|(c, _)| c.as_str()).collect();
        assert_eq!(codes, vec!["AVE", "GAL", "IRE", "ORL", "ZRO"]);

        // AVE and ORL share the EUR peg, so USD->EUR is fetched once.
        assert_eq!(forex.calls(), 2);

        assert_eq!(
            table.get("AVE"),
            Some(&RateEntry::Quote {
                value: dec!(1.472),
                change: Decimal::ZERO,
                timestamp: "2024-05-01T12:30:00+00:00".to_string(),
            })
        );
        // (2.0 / 4) * 0.92
        match table.get("ORL") {
            Some(RateEntry::Quote { value, .. }) => assert_eq!(*value, dec!(0.46)),
            other => panic!("Expected a quote, got {other:?}"),
        }
        match table.get("IRE") {
            Some(RateEntry::Quote { value, .. }) => assert_eq!(*value, dec!(1)),
            other => panic!("Expected a quote, got {other:?}"),
        }
        assert!(matches!(table.get("ZRO"), Some(RateEntry::Failed { .. })));
    }

    #[tokio::test]
    async fn rates_isolate_a_failing_pair() {
        let (engine, _) = engine_with(
            MockForex::new()
                .with_latest("USD", "EUR", dec!(0.92))
                .with_failure("USD", "GBP", unavailable("USD", "GBP")),
        );

        let table = engine.get_rates("IRE", Utc::now()).await.unwrap();

        assert_eq!(table.rates.len(), 5);
        assert_eq!(
            table.get("GAL"),
            Some(&RateEntry::Failed {
                error: "Exchange rate provider is unavailable for USD to GBP".to_string()
            })
        );
        for code in ["AVE", "ORL", "VYR"] {
            assert!(
                matches!(table.get(code), Some(RateEntry::Quote { .. })),
                "{code} should have a quote"
            );
        }
    }

    #[tokio::test]
    async fn rates_round_to_four_places() {
        let (engine, _) = engine_with(MockForex::new().with_latest("EUR", "USD", dec!(1.08765)));

        let table = engine.get_rates("AVE", Utc::now()).await.unwrap();
        // (1.25 / 2.0) * 1.08765 = 0.67978125 -> 0.67978 -> 0.6798
        match table.get("VYR") {
            Some(RateEntry::Quote { value, change, .. }) => {
                assert_eq!(*value, dec!(0.6798));
                assert!(change.is_zero());
            }
            other => panic!("Expected a quote, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn rates_fail_for_unknown_base() {
        let (engine, _) = engine_with(MockForex::new());
        assert_eq!(
            engine.get_rates("NOPE", Utc::now()).await.unwrap_err(),
            RateError::CurrencyNotFound("NOPE".to_string())
        );
    }

    #[tokio::test]
    async fn rates_table_serializes_as_ordered_map() {
        let (engine, _) = engine_with(MockForex::new().with_latest("USD", "EUR", dec!(0.92)));
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();

        let table = engine.get_rates("VYR", now).await.unwrap();
        let json = serde_json::to_string(&table).unwrap();

        assert!(json.starts_with(r#"{"base":"VYR","rates":{"AVE":"#));
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["rates"]["AVE"]["value"], 1.472);
        assert_eq!(value["rates"]["AVE"]["change"], 0.0);
        assert!(value["rates"]["GAL"]["error"].is_string());
    }

    #[tokio::test]
    async fn history_of_same_currency_is_constant_one() {
        let (engine, forex) = engine_with(MockForex::new());

        let series = engine
            .get_historical_rates("VYR", "vyr", date("2024-01-30"), date("2024-02-02"))
            .await
            .unwrap();

        assert_eq!(series.len(), 4);
        assert_eq!(series[0].date, date("2024-01-30"));
        assert_eq!(series[3].date, date("2024-02-02"));
        assert!(series.iter().all(|p| p.rate == Decimal::ONE));
        assert_eq!(forex.calls(), 0);
    }

    #[tokio::test]
    async fn history_within_group_is_constant_ratio() {
        let (engine, forex) = engine_with(MockForex::new());

        // base(AVE) / base(ORL) = 1.25 / 4 = 0.3125
        let series = engine
            .get_historical_rates("AVE", "ORL", date("2024-03-01"), date("2024-03-03"))
            .await
            .unwrap();

        assert_eq!(series.len(), 3);
        assert!(series.iter().all(|p| p.rate == dec!(0.3125)));
        assert_eq!(forex.calls(), 0);
    }

    #[tokio::test]
    async fn history_across_groups_follows_provider_dates() {
        let (engine, forex) = engine_with(MockForex::new().with_history(
            "USD",
            "EUR",
            &[
                ("2024-03-01", dec!(0.92)),
                ("2024-03-04", dec!(0.91234)),
            ],
        ));

        let series = engine
            .get_historical_rates("VYR", "AVE", date("2024-03-01"), date("2024-03-04"))
            .await
            .unwrap();

        assert_eq!(
            series,
            vec![
                RatePoint {
                    date: date("2024-03-01"),
                    rate: dec!(1.472),
                },
                // 1.6 * 0.91234 = 1.459744
                RatePoint {
                    date: date("2024-03-04"),
                    rate: dec!(1.4597),
                },
            ]
        );
        assert_eq!(forex.calls(), 1);
    }

    #[tokio::test]
    async fn history_rejects_reversed_range_before_any_lookup() {
        let (engine, forex) = engine_with(MockForex::new());

        let err = engine
            .get_historical_rates("NOPE", "AVE", date("2024-03-05"), date("2024-03-01"))
            .await
            .unwrap_err();

        assert!(matches!(err, RateError::InvalidDateRange { .. }));
        assert_eq!(forex.calls(), 0);
    }

    #[tokio::test]
    async fn history_fails_for_unknown_or_zero_target() {
        let (engine, _) = engine_with(MockForex::new());

        assert_eq!(
            engine
                .get_historical_rates("VYR", "NOPE", date("2024-03-01"), date("2024-03-02"))
                .await
                .unwrap_err(),
            RateError::CurrencyNotFound("NOPE".to_string())
        );
        assert_eq!(
            engine
                .get_historical_rates("VYR", "ZRO", date("2024-03-01"), date("2024-03-02"))
                .await
                .unwrap_err(),
            RateError::ZeroRateTarget("ZRO".to_string())
        );
    }

    #[tokio::test]
    async fn history_surfaces_provider_errors() {
        let (engine, _) =
            engine_with(MockForex::new().with_failure("EUR", "GBP", unavailable("EUR", "GBP")));

        let err = engine
            .get_historical_rates("AVE", "GAL", date("2024-03-01"), date("2024-03-02"))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 503);
    }

    #[tokio::test]
    async fn lists_currency_views_by_name() {
        let (engine, _) = engine_with(MockForex::new());

        let views = engine.list_currencies().await.unwrap();
        let codes: Vec<&str> = views.iter().map(|v| v.short.as_str()).collect();
        assert_eq!(codes, vec!["AVE", "GAL", "IRE", "ORL", "VYR", "ZRO"]);
        assert_eq!(views[0].forex, "EUR");
    }

    fn extreme_engine(forex: MockForex) -> RateEngine {
        use crate::core::currency::RateDirection::CustomToReal;
        use crate::test_utils::currency;

        let registry = MemoryRegistry::new(vec![
            currency("BIG", "Big", Decimal::MAX, "USD", CustomToReal),
            currency("MID", "Middle", dec!(2), "USD", CustomToReal),
            currency("ONE", "Unit", dec!(1), "EUR", CustomToReal),
            currency("TNY", "Tiny", dec!(0.0000000000000000000000000001), "USD", CustomToReal),
        ])
        .unwrap();
        RateEngine::new(Arc::new(registry), Arc::new(forex))
    }

    #[tokio::test]
    async fn conversion_reports_amount_overflow() {
        let (engine, _) = engine_with(MockForex::new().with_latest("USD", "EUR", dec!(0.92)));

        for (from, to) in [("ORL", "AVE"), ("VYR", "AVE")] {
            assert_eq!(
                engine.convert(Decimal::MAX, from, to).await.unwrap_err(),
                RateError::Overflow,
                "{from} to {to}"
            );
        }
        assert_eq!(
            engine.convert(Decimal::MAX, "VYR", "VYR").await.unwrap(),
            Decimal::MAX
        );
    }

    #[tokio::test]
    async fn conversion_reports_rate_overflow() {
        let engine = extreme_engine(MockForex::new().with_latest("USD", "EUR", dec!(2)));

        // base(BIG) / base(TNY) does not fit
        assert_eq!(
            engine.convert(dec!(1), "BIG", "TNY").await.unwrap_err(),
            RateError::Overflow
        );
        // the ratio fits but the forex rate pushes it over
        assert_eq!(
            engine.convert(dec!(1), "BIG", "ONE").await.unwrap_err(),
            RateError::Overflow
        );
    }

    #[tokio::test]
    async fn rates_isolate_overflowing_entries() {
        let engine = extreme_engine(MockForex::new().with_latest("USD", "EUR", dec!(2)));

        let table = engine.get_rates("BIG", Utc::now()).await.unwrap();

        assert_eq!(table.rates.len(), 3);
        let overflow = RateEntry::Failed {
            error: "Conversion result is out of range".to_string(),
        };
        assert_eq!(table.get("TNY"), Some(&overflow));
        assert_eq!(table.get("ONE"), Some(&overflow));
        assert!(matches!(table.get("MID"), Some(RateEntry::Quote { .. })));
    }

    #[tokio::test]
    async fn history_reports_overflow() {
        let engine = extreme_engine(MockForex::new().with_history(
            "USD",
            "EUR",
            &[("2024-03-01", dec!(0.5)), ("2024-03-02", dec!(2))],
        ));

        assert_eq!(
            engine
                .get_historical_rates("BIG", "ONE", date("2024-03-01"), date("2024-03-02"))
                .await
                .unwrap_err(),
            RateError::Overflow
        );
        assert_eq!(
            engine
                .get_historical_rates("BIG", "TNY", date("2024-03-01"), date("2024-03-02"))
                .await
                .unwrap_err(),
            RateError::Overflow
        );
    }
}
