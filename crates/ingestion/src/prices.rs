use async_trait::async_trait;
use chrono::DateTime;
use credit_core::{CreditError, PriceBar, PriceHistoryProvider};
use credit_store::{NewEvent, Store};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

const BASE_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

/// Yahoo-chart-shaped price history client. The response is parsed into
/// typed structs at the boundary and mapped straight to `PriceBar`s.
pub struct YahooChartClient {
    client: Client,
}

#[derive(Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct ChartResult {
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Deserialize)]
struct Indicators {
    quote: Vec<QuoteBlock>,
}

#[derive(Deserialize, Default)]
struct QuoteBlock {
    open: Option<Vec<Option<f64>>>,
    high: Option<Vec<Option<f64>>>,
    low: Option<Vec<Option<f64>>>,
    close: Option<Vec<Option<f64>>>,
    volume: Option<Vec<Option<i64>>>,
}

impl YahooChartClient {
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("credit-iq/0.1")
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { client }
    }
}

impl Default for YahooChartClient {
    fn default() -> Self {
        Self::new()
    }
}

fn series_value<T: Copy>(series: &Option<Vec<Option<T>>>, idx: usize) -> Option<T> {
    series.as_ref().and_then(|v| v.get(idx).copied().flatten())
}

#[async_trait]
impl PriceHistoryProvider for YahooChartClient {
    async fn price_history(
        &self,
        ticker: &str,
        lookback_days: u32,
        interval: &str,
    ) -> Result<Vec<PriceBar>, CreditError> {
        let url = format!("{BASE_URL}/{ticker}");
        let range = format!("{lookback_days}d");
        let response = self
            .client
            .get(&url)
            .query(&[("range", range.as_str()), ("interval", interval)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(CreditError::Provider(format!(
                "{} returned HTTP {}",
                ticker,
                response.status()
            )));
        }

        let parsed: ChartResponse = response.json().await?;
        if let Some(err) = parsed.chart.error {
            return Err(CreditError::Provider(format!("{ticker}: {err}")));
        }

        let result = match parsed.chart.result.and_then(|mut r| r.pop()) {
            Some(r) => r,
            None => return Ok(Vec::new()),
        };

        let timestamps = result.timestamp.unwrap_or_default();
        let quote = result.indicators.quote.into_iter().next().unwrap_or_default();

        let bars = timestamps
            .iter()
            .enumerate()
            .filter_map(|(i, &epoch)| {
                // Epoch seconds are UTC by definition; bars with an
                // unrepresentable timestamp are dropped.
                let timestamp = DateTime::from_timestamp(epoch, 0)?;
                Some(PriceBar {
                    timestamp,
                    open: series_value(&quote.open, i),
                    high: series_value(&quote.high, i),
                    low: series_value(&quote.low, i),
                    close: series_value(&quote.close, i),
                    volume: series_value(&quote.volume, i),
                })
            })
            .collect();

        Ok(bars)
    }
}

/// Pulls periodic price snapshots for every issuer with a ticker and
/// records them as `price` events, at most one per issuer per calendar
/// day.
pub struct PriceIngestor {
    store: Store,
    provider: Arc<dyn PriceHistoryProvider>,
    lookback_days: u32,
    interval: String,
}

impl PriceIngestor {
    pub fn new(
        store: Store,
        provider: Arc<dyn PriceHistoryProvider>,
        lookback_days: u32,
        interval: String,
    ) -> Self {
        Self {
            store,
            provider,
            lookback_days,
            interval,
        }
    }

    /// Returns the count of inserted price events. A failed or empty
    /// provider response skips that issuer, not the whole run.
    pub async fn ingest(&self) -> Result<usize, CreditError> {
        let mut inserted = 0;

        for issuer in self.store.issuers_with_tickers().await? {
            let ticker = match issuer.ticker.as_deref().map(str::trim) {
                Some(t) if !t.is_empty() => t.to_string(),
                _ => continue,
            };

            let bars = match self
                .provider
                .price_history(&ticker, self.lookback_days, &self.interval)
                .await
            {
                Ok(bars) => bars,
                Err(e) => {
                    tracing::warn!(
                        issuer = %issuer.name,
                        ticker = %ticker,
                        error = %e,
                        "Price history fetch failed, skipping issuer"
                    );
                    continue;
                }
            };

            for bar in bars {
                let day = bar.timestamp.date_naive();
                if self.store.has_price_event_on(issuer.id, day).await? {
                    continue;
                }

                let payload = json!({
                    "open": bar.open,
                    "high": bar.high,
                    "low": bar.low,
                    "close": bar.close,
                    "volume": bar.volume,
                });

                self.store
                    .insert_event(&NewEvent {
                        issuer_id: Some(issuer.id),
                        news_id: None,
                        category: "price".to_string(),
                        description: Some(format!(
                            "Price snapshot for {} at {}",
                            ticker,
                            bar.timestamp.to_rfc3339()
                        )),
                        sentiment: None,
                        timestamp: Some(bar.timestamp),
                        payload: Some(payload),
                    })
                    .await?;
                inserted += 1;
            }
        }

        tracing::info!(inserted, "Price ingest completed");
        Ok(inserted)
    }
}
