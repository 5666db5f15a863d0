use crate::core::currency::CurrencyRecord;
use crate::core::error::RateResult;
use crate::core::registry::CurrencyRegistry;
use anyhow::{Result, bail};
use async_trait::async_trait;
use std::collections::HashSet;
use tracing::debug;

/// Registry backed by an in-memory list, usually loaded from configuration.
#[derive(Debug, Clone)]
pub struct MemoryRegistry {
    // Kept sorted by name, then code.
    currencies: Vec<CurrencyRecord>,
}

impl MemoryRegistry {
    /// Builds the registry, normalizing codes to upper case.
    ///
    /// Fails on duplicate codes or negative rates.
    pub fn new(records: Vec<CurrencyRecord>) -> Result<Self> {
        let mut seen = HashSet::new();
        let mut currencies = Vec::with_capacity(records.len());

        for mut record in records {
            record.code = record.code.trim().to_uppercase();
            record.real_currency = record.real_currency.trim().to_uppercase();

            if record.code.is_empty() {
                bail!("Currency '{}' has an empty code", record.name);
            }
            if record.exchange_rate.is_sign_negative() && !record.exchange_rate.is_zero() {
                bail!(
                    "Currency {} has a negative exchange rate: {}",
                    record.code,
                    record.exchange_rate
                );
            }
            if !seen.insert(record.code.clone()) {
                bail!("Duplicate currency code: {}", record.code);
            }
            currencies.push(record);
        }

        currencies.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.code.cmp(&b.code)));
        debug!("Loaded {} currencies into registry", currencies.len());
        Ok(Self { currencies })
    }
}

#[async_trait]
impl CurrencyRegistry for MemoryRegistry {
    async fn lookup(&self, code: &str) -> RateResult<Option<CurrencyRecord>> {
        let code = code.trim();
        Ok(self
            .currencies
            .iter()
            .find(|c| c.code.eq_ignore_ascii_case(code))
            .cloned())
    }

    async fn list_all(&self) -> RateResult<Vec<CurrencyRecord>> {
        Ok(self.currencies.clone())
    }
}
