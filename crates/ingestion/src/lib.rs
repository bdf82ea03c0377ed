pub mod feed;
pub mod prices;
pub mod synthesize;

pub use feed::{FeedIngestor, RssFeedSource};
pub use prices::{PriceIngestor, YahooChartClient};
pub use synthesize::EventSynthesizer;

use credit_core::{CreditError, IngestCounts};

/// The three ingestion stages in their required order: news ingestion
/// always completes before event synthesis consumes it.
pub struct IngestionPipeline {
    feed: FeedIngestor,
    prices: PriceIngestor,
    events: EventSynthesizer,
}

impl IngestionPipeline {
    pub fn new(feed: FeedIngestor, prices: PriceIngestor, events: EventSynthesizer) -> Self {
        Self {
            feed,
            prices,
            events,
        }
    }

    pub async fn run(&self) -> Result<IngestCounts, CreditError> {
        let news = self.feed.ingest().await?;
        let price_events = self.prices.ingest().await?;
        let derived_events = self.events.run().await?;

        let counts = IngestCounts {
            news,
            price_events,
            derived_events,
        };
        tracing::info!(
            news = counts.news,
            price_events = counts.price_events,
            derived_events = counts.derived_events,
            "Ingestion pass completed"
        );
        Ok(counts)
    }
}
