use credit_core::CreditError;
use credit_store::{Issuer, NewEvent, Store};

/// Turns unprocessed news items into derived events: classify, score
/// sentiment, resolve an issuer, link back to the article, and flip the
/// processed flag so each item is synthesized at most once.
pub struct EventSynthesizer {
    store: Store,
}

impl EventSynthesizer {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Returns the count of derived events created.
    pub async fn run(&self) -> Result<usize, CreditError> {
        let issuers = self.store.all_issuers().await?;
        let mut created = 0;

        for item in self.store.unprocessed_news().await? {
            let text = match item.summary.as_deref() {
                Some(summary) => format!("{} {}", item.title, summary),
                None => item.title.clone(),
            };

            let category = sentiment_analysis::classify(&text);
            let sentiment = sentiment_analysis::score_sentiment(&text);
            let issuer_id = resolve_issuer(&issuers, &item.title);

            self.store
                .insert_event(&NewEvent {
                    issuer_id,
                    news_id: Some(item.id),
                    category: category.to_string(),
                    description: item.summary.clone().or_else(|| Some(item.title.clone())),
                    sentiment: Some(sentiment),
                    timestamp: item.published_at,
                    payload: None,
                })
                .await?;
            self.store.mark_news_processed(item.id).await?;
            created += 1;
        }

        tracing::info!(created, "Event synthesis completed");
        Ok(created)
    }
}

/// Match a headline to an issuer: per issuer (iteration order), ticker
/// as substring first, then name, case-insensitive; first match wins.
/// Ambiguous for overlapping names/tickers; kept as a known precision
/// limitation. No match leaves the event unattributed.
fn resolve_issuer(issuers: &[Issuer], title: &str) -> Option<i64> {
    let title_lower = title.to_lowercase();

    for issuer in issuers {
        if let Some(ticker) = issuer.ticker.as_deref() {
            if !ticker.is_empty() && title_lower.contains(&ticker.to_lowercase()) {
                return Some(issuer.id);
            }
        }
        if title_lower.contains(&issuer.name.to_lowercase()) {
            return Some(issuer.id);
        }
    }

    None
}
