//! Currency lookup abstractions

use crate::core::currency::CurrencyRecord;
use crate::core::error::RateResult;
use async_trait::async_trait;

/// Read-only access to the registered virtual currencies.
#[async_trait]
pub trait CurrencyRegistry: Send + Sync {
    /// Case-insensitive exact match on the currency code.
    async fn lookup(&self, code: &str) -> RateResult<Option<CurrencyRecord>>;

    /// Every currency, ordered by name.
    async fn list_all(&self) -> RateResult<Vec<CurrencyRecord>>;

    /// Every currency except `code`, in the same order as [`list_all`](Self::list_all).
    async fn list_all_except(&self, code: &str) -> RateResult<Vec<CurrencyRecord>> {
        let mut all = self.list_all().await?;
        all.retain(|c| !c.code.eq_ignore_ascii_case(code));
        Ok(all)
    }
}
