use async_trait::async_trait;
use credit_core::{CreditError, FeedEntry, FeedSource};
use credit_store::Store;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

/// RSS/Atom feed source over HTTP.
pub struct RssFeedSource {
    client: Client,
}

impl RssFeedSource {
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("credit-iq/0.1")
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { client }
    }
}

impl Default for RssFeedSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FeedSource for RssFeedSource {
    async fn fetch_entries(&self, url: &str) -> Result<Vec<FeedEntry>, CreditError> {
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(CreditError::Feed(format!(
                "{} returned HTTP {}",
                url,
                response.status()
            )));
        }

        let body = response.bytes().await?;
        let parsed = feed_rs::parser::parse(&body[..])
            .map_err(|e| CreditError::Feed(format!("{url}: {e}")))?;

        Ok(parsed
            .entries
            .into_iter()
            .filter_map(entry_to_feed_entry)
            .collect())
    }
}

/// Reduce a parsed feed entry to the fields the pipeline needs.
/// Entries missing a title or link are discarded here; unparseable
/// publish timestamps already arrived as None from the parser.
fn entry_to_feed_entry(entry: feed_rs::model::Entry) -> Option<FeedEntry> {
    let title = entry.title.map(|t| t.content.trim().to_string())?;
    if title.is_empty() {
        return None;
    }

    let link = entry.links.first().map(|l| l.href.trim().to_string())?;
    if link.is_empty() {
        return None;
    }

    Some(FeedEntry {
        title,
        link,
        summary: entry.summary.map(|t| t.content),
        published_at: entry.published.or(entry.updated),
    })
}

/// Pulls candidate news items from the configured feed sources and
/// persists the ones not seen before (dedup by canonical link).
pub struct FeedIngestor {
    store: Store,
    source: Arc<dyn FeedSource>,
    feeds: Vec<String>,
}

impl FeedIngestor {
    pub fn new(store: Store, source: Arc<dyn FeedSource>, feeds: Vec<String>) -> Self {
        Self {
            store,
            source,
            feeds,
        }
    }

    /// Ingest all configured sources sequentially. A failing source is
    /// logged and skipped; it never aborts the remaining sources.
    /// Returns the count of newly inserted items.
    pub async fn ingest(&self) -> Result<usize, CreditError> {
        let mut inserted = 0;

        for url in &self.feeds {
            let entries = match self.source.fetch_entries(url).await {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::warn!(feed = %url, error = %e, "Feed fetch failed, skipping source");
                    continue;
                }
            };

            for entry in entries {
                let new = self
                    .store
                    .insert_news_if_new(
                        &entry.title,
                        &entry.link,
                        entry.summary.as_deref(),
                        entry.published_at,
                    )
                    .await?;
                if new {
                    inserted += 1;
                }
            }
        }

        tracing::info!(inserted, "Feed ingest completed");
        Ok(inserted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Markets</title>
    <item>
      <title>Company reports Q2 earnings beat</title>
      <link>https://example.com/a</link>
      <description>Quarterly results exceed expectations</description>
      <pubDate>Mon, 24 Aug 2026 09:00:00 GMT</pubDate>
    </item>
    <item>
      <title>No link on this one</title>
      <description>should be discarded</description>
    </item>
    <item>
      <title>CEO resigns amid scandal</title>
      <link>https://example.com/b</link>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn discards_entries_without_link() {
        let parsed = feed_rs::parser::parse(SAMPLE_RSS.as_bytes()).unwrap();
        let entries: Vec<FeedEntry> = parsed
            .entries
            .into_iter()
            .filter_map(entry_to_feed_entry)
            .collect();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].link, "https://example.com/a");
        assert!(entries[0].published_at.is_some());
        assert_eq!(
            entries[0].summary.as_deref(),
            Some("Quarterly results exceed expectations")
        );
        assert!(entries[1].published_at.is_none());
    }

    struct StaticSource {
        entries: Vec<FeedEntry>,
    }

    #[async_trait]
    impl FeedSource for StaticSource {
        async fn fetch_entries(&self, _url: &str) -> Result<Vec<FeedEntry>, CreditError> {
            Ok(self.entries.clone())
        }
    }

    struct FailingSource;

    #[async_trait]
    impl FeedSource for FailingSource {
        async fn fetch_entries(&self, url: &str) -> Result<Vec<FeedEntry>, CreditError> {
            Err(CreditError::Feed(format!("{url} unreachable")))
        }
    }

    fn sample_entries() -> Vec<FeedEntry> {
        vec![
            FeedEntry {
                title: "Company reports Q2 earnings beat".into(),
                link: "https://x/y".into(),
                summary: None,
                published_at: None,
            },
            FeedEntry {
                title: "Acme faces lawsuit".into(),
                link: "https://x/z".into(),
                summary: Some("settlement talks".into()),
                published_at: Some(chrono::Utc::now()),
            },
        ]
    }

    #[tokio::test]
    async fn reingest_is_idempotent() {
        let store = Store::connect("sqlite::memory:").await.unwrap();
        let ingestor = FeedIngestor::new(
            store.clone(),
            Arc::new(StaticSource {
                entries: sample_entries(),
            }),
            vec!["https://feed.example".into()],
        );

        assert_eq!(ingestor.ingest().await.unwrap(), 2);
        assert_eq!(ingestor.ingest().await.unwrap(), 0);
        assert_eq!(store.news_count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn same_link_from_two_sources_stores_once() {
        let store = Store::connect("sqlite::memory:").await.unwrap();
        let ingestor = FeedIngestor::new(
            store.clone(),
            Arc::new(StaticSource {
                entries: vec![FeedEntry {
                    title: "dup".into(),
                    link: "https://x/y".into(),
                    summary: None,
                    published_at: None,
                }],
            }),
            vec!["https://one.example".into(), "https://two.example".into()],
        );

        assert_eq!(ingestor.ingest().await.unwrap(), 1);
        assert_eq!(store.news_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn failing_source_does_not_abort_ingest() {
        let store = Store::connect("sqlite::memory:").await.unwrap();

        // One failing source before a healthy one: the healthy source
        // must still be ingested.
        struct Mixed {
            healthy: StaticSource,
        }

        #[async_trait]
        impl FeedSource for Mixed {
            async fn fetch_entries(&self, url: &str) -> Result<Vec<FeedEntry>, CreditError> {
                if url.contains("bad") {
                    Err(CreditError::Feed("boom".into()))
                } else {
                    self.healthy.fetch_entries(url).await
                }
            }
        }

        let ingestor = FeedIngestor::new(
            store.clone(),
            Arc::new(Mixed {
                healthy: StaticSource {
                    entries: sample_entries(),
                },
            }),
            vec!["https://bad.example".into(), "https://good.example".into()],
        );

        assert_eq!(ingestor.ingest().await.unwrap(), 2);
    }
}
