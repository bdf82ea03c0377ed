use credit_core::{CreditError, FeatureVector};
use credit_store::Store;

pub const EPS: f64 = 1e-6;

/// Maximum fundamentals rows considered per issuer.
const FUNDAMENTALS_WINDOW: i64 = 5;
/// Events with sentiment considered for the rolling average.
const SENTIMENT_WINDOW: i64 = 10;

/// Total division: 0.0 when either operand is absent; near-zero
/// denominators divide by EPS instead, producing a large but finite
/// value with the numerator's sign. Never raises, never NaN/inf.
pub fn safe_div(a: Option<f64>, b: Option<f64>) -> f64 {
    let (a, b) = match (a, b) {
        (Some(a), Some(b)) => (a, b),
        _ => return 0.0,
    };
    if b.abs() > EPS {
        a / b
    } else {
        a / EPS
    }
}

/// Computes the fixed six-dimensional feature vector per issuer from
/// its most recent fundamentals and sentiment events.
pub struct FeatureEngine {
    store: Store,
}

impl FeatureEngine {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// An issuer with zero fundamentals gets the all-zero vector: an
    /// explicit floor, not an error.
    pub async fn compute_features(&self, issuer_id: i64) -> Result<FeatureVector, CreditError> {
        let rows = self
            .store
            .recent_fundamentals(issuer_id, FUNDAMENTALS_WINDOW)
            .await?;

        let latest = match rows.first() {
            Some(latest) => latest,
            None => return Ok(FeatureVector::zeroed()),
        };
        let prev = rows.get(1);

        let debt_to_ebitda = safe_div(latest.total_debt, latest.ebitda);
        let ebitda_margin = safe_div(latest.ebitda, latest.revenue);

        let revenue_growth = match prev {
            Some(prev) => {
                let latest_revenue = latest.revenue.unwrap_or(0.0);
                let prev_revenue = prev.revenue.unwrap_or(0.0);
                safe_div(Some(latest_revenue - prev_revenue), Some(prev_revenue))
            }
            None => 0.0,
        };

        let sentiments = self
            .store
            .recent_sentiments(issuer_id, SENTIMENT_WINDOW)
            .await?;
        let avg_sentiment = if sentiments.is_empty() {
            0.0
        } else {
            sentiments.iter().sum::<f64>() / sentiments.len() as f64
        };

        Ok(FeatureVector {
            debt_to_ebitda,
            ebitda_margin,
            revenue_growth,
            avg_sentiment,
            recent_revenue: latest.revenue.unwrap_or(0.0),
            recent_total_debt: latest.total_debt.unwrap_or(0.0),
        })
    }
}
