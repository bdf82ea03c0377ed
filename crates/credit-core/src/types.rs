use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single entry pulled from an RSS/Atom feed, already reduced to the
/// fields the pipeline cares about. Entries without a title or link are
/// discarded before this type is ever constructed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedEntry {
    pub title: String,
    pub link: String,
    pub summary: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

/// OHLCV price sample, normalized to UTC at the provider boundary.
/// Downstream code never sees provider-specific response shapes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceBar {
    pub timestamp: DateTime<Utc>,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: Option<i64>,
}

/// Feature names in model input order. This ordering is a contract:
/// training, scoring and attribution all index into it verbatim.
pub const FEATURE_NAMES: [&str; 6] = [
    "debt_to_ebitda",
    "ebitda_margin",
    "revenue_growth",
    "avg_sentiment",
    "recent_revenue",
    "recent_total_debt",
];

/// Per-issuer feature vector. All six values are always finite:
/// missing inputs resolve to 0.0 by construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub debt_to_ebitda: f64,
    pub ebitda_margin: f64,
    pub revenue_growth: f64,
    pub avg_sentiment: f64,
    pub recent_revenue: f64,
    pub recent_total_debt: f64,
}

impl FeatureVector {
    pub fn zeroed() -> Self {
        Self {
            debt_to_ebitda: 0.0,
            ebitda_margin: 0.0,
            revenue_growth: 0.0,
            avg_sentiment: 0.0,
            recent_revenue: 0.0,
            recent_total_debt: 0.0,
        }
    }

    /// Values in `FEATURE_NAMES` order.
    pub fn as_array(&self) -> [f64; 6] {
        [
            self.debt_to_ebitda,
            self.ebitda_margin,
            self.revenue_growth,
            self.avg_sentiment,
            self.recent_revenue,
            self.recent_total_debt,
        ]
    }

    pub fn from_array(values: [f64; 6]) -> Self {
        Self {
            debt_to_ebitda: values[0],
            ebitda_margin: values[1],
            revenue_growth: values[2],
            avg_sentiment: values[3],
            recent_revenue: values[4],
            recent_total_debt: values[5],
        }
    }
}

/// One feature's contribution to a score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attribution {
    pub feature: String,
    pub value: f64,
    pub attribution: f64,
}

/// Result of scoring one issuer: clamped score, unclamped raw model
/// output, the feature vector, and attributions sorted by descending
/// absolute impact (empty when the explainer is unavailable).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreReport {
    pub score: f64,
    pub raw_score: f64,
    pub features: FeatureVector,
    pub attributions: Vec<Attribution>,
}

/// Counts returned by one full ingestion pass.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct IngestCounts {
    pub news: usize,
    pub price_events: usize,
    pub derived_events: usize,
}
