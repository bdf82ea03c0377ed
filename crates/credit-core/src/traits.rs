use crate::{CreditError, FeedEntry, PriceBar};
use async_trait::async_trait;

/// Trait for news feed sources (RSS/Atom).
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch_entries(&self, url: &str) -> Result<Vec<FeedEntry>, CreditError>;
}

/// Trait for price-history providers.
#[async_trait]
pub trait PriceHistoryProvider: Send + Sync {
    /// Fetch up to `lookback_days` of samples for `ticker` at the given
    /// sampling interval (e.g. "1d"). Timestamps must already be UTC.
    async fn price_history(
        &self,
        ticker: &str,
        lookback_days: u32,
        interval: &str,
    ) -> Result<Vec<PriceBar>, CreditError>;
}
