use crate::core::config::FrankfurterProviderConfig;
use crate::core::error::{RateError, RateResult};
use crate::core::forex::{ForexProvider, RatePoint, constant_series};
use crate::providers::util::with_retry;
use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::header::ACCEPT;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use tracing::{debug, instrument};

const RETRY_DELAY_MS: u64 = 500;

/// Forex provider for Frankfurter-compatible REST endpoints.
pub struct FrankfurterProvider {
    base_url: String,
    client: reqwest::Client,
    retries: usize,
}

impl FrankfurterProvider {
    pub fn new(config: &FrankfurterProviderConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("pegfx/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()?;

        Ok(FrankfurterProvider {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
            retries: config.retries,
        })
    }

    async fn fetch<T: DeserializeOwned>(&self, url: &str, from: &str, to: &str) -> RateResult<T> {
        debug!("Requesting exchange rates from {}", url);

        let unavailable = |cause: String| RateError::ProviderUnavailable {
            from: from.to_string(),
            to: to.to_string(),
            cause,
        };
        let bad_response = |cause: String| RateError::ProviderBadResponse {
            from: from.to_string(),
            to: to.to_string(),
            cause,
        };

        let response = with_retry(
            || async {
                self.client
                    .get(url)
                    .header(ACCEPT, "application/json")
                    .send()
                    .await
            },
            self.retries,
            RETRY_DELAY_MS,
        )
        .await
        .map_err(|e| unavailable(format!("Request error: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(bad_response(format!("HTTP error: {status}")));
        }

        let text = response
            .text()
            .await
            .map_err(|e| unavailable(format!("Failed to read response body: {e}")))?;

        serde_json::from_str(&text)
            .map_err(|e| bad_response(format!("Failed to parse JSON response: {e}")))
    }
}

#[derive(Debug, Deserialize)]
struct LatestResponse {
    rates: Option<HashMap<String, Decimal>>,
}

#[derive(Debug, Deserialize)]
struct SeriesResponse {
    rates: Option<BTreeMap<NaiveDate, HashMap<String, Decimal>>>,
}

#[async_trait]
impl ForexProvider for FrankfurterProvider {
    #[instrument(name = "FrankfurterLatest", skip(self))]
    async fn latest_rate(&self, from: &str, to: &str) -> RateResult<Decimal> {
        if from == to {
            return Ok(Decimal::ONE);
        }

        let url = format!("{}/latest?from={}&to={}", self.base_url, from, to);
        let data: LatestResponse = self.fetch(&url, from, to).await?;

        data.rates
            .and_then(|mut rates| rates.remove(to))
            .ok_or_else(|| RateError::RateNotFound {
                from: from.to_string(),
                to: to.to_string(),
            })
    }

    #[instrument(name = "FrankfurterSeries", skip(self))]
    async fn historical_rates(
        &self,
        from: &str,
        to: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> RateResult<Vec<RatePoint>> {
        if from == to {
            return Ok(constant_series(start, end, Decimal::ONE));
        }

        let url = format!(
            "{}/{}..{}?from={}&to={}",
            self.base_url, start, end, from, to
        );
        let data: SeriesResponse = self.fetch(&url, from, to).await?;

        let rates = data.rates.ok_or_else(|| RateError::RateNotFound {
            from: from.to_string(),
            to: to.to_string(),
        })?;

        // Days without the target code are dropped, not failed.
        Ok(rates
            .into_iter()
            .filter_map(|(date, mut day)| day.remove(to).map(|rate| RatePoint { date, rate }))
            .collect())
    }
}
