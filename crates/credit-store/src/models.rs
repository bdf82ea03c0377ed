use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// An entity being credit-scored.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Issuer {
    pub id: i64,
    pub name: String,
    pub ticker: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewIssuer {
    pub name: String,
    pub ticker: Option<String>,
    pub country: Option<String>,
}

/// A dated financial snapshot for one issuer. Immutable once created;
/// "latest"/"previous" means report_date descending.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Fundamental {
    pub id: i64,
    pub issuer_id: i64,
    pub report_date: NaiveDate,
    pub revenue: Option<f64>,
    pub ebitda: Option<f64>,
    pub total_debt: Option<f64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewFundamental {
    pub issuer_id: i64,
    pub report_date: NaiveDate,
    pub revenue: Option<f64>,
    pub ebitda: Option<f64>,
    pub total_debt: Option<f64>,
}

/// A deduplicated external article. The link is the global dedup key.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct NewsItem {
    pub id: i64,
    pub title: String,
    pub link: String,
    pub summary: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub processed: bool,
    pub created_at: DateTime<Utc>,
}

/// A normalized signal, news-derived or price-derived. An unresolved
/// issuer attribution is valid and preserved as NULL.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Event {
    pub id: i64,
    pub issuer_id: Option<i64>,
    pub news_id: Option<i64>,
    pub category: String,
    pub description: Option<String>,
    pub sentiment: Option<f64>,
    pub timestamp: DateTime<Utc>,
    /// Source-specific extras as a JSON document (e.g. OHLCV fields).
    pub payload: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEvent {
    pub issuer_id: Option<i64>,
    pub news_id: Option<i64>,
    pub category: String,
    pub description: Option<String>,
    pub sentiment: Option<f64>,
    /// None lets the store default to the insert time.
    pub timestamp: Option<DateTime<Utc>>,
    pub payload: Option<serde_json::Value>,
}
