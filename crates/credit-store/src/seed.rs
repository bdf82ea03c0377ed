use crate::db::Store;
use crate::models::{NewFundamental, NewIssuer};
use chrono::NaiveDate;
use credit_core::CreditError;

const SAMPLE_ISSUERS: &[(&str, &str, &str)] = &[
    ("Acme Industries", "ACME", "IN"),
    ("Bharat Power Ltd", "BPL", "IN"),
    ("Global Finance PLC", "GFIN", "UK"),
];

/// (issuer name, report date, revenue, ebitda, total debt)
const SAMPLE_FUNDAMENTALS: &[(&str, &str, f64, f64, f64)] = &[
    ("Acme Industries", "2024-12-31", 1250.5, 210.2, 450.0),
    ("Acme Industries", "2025-03-31", 310.4, 52.1, 440.0),
    ("Bharat Power Ltd", "2024-12-31", 980.2, 150.3, 700.0),
    ("Global Finance PLC", "2025-03-31", 220.0, 80.0, 120.0),
];

/// Insert fixture issuers and fundamentals when the issuer table is
/// empty. Idempotent: a non-empty table is left untouched.
pub async fn seed_if_empty(store: &Store) -> Result<(), CreditError> {
    if store.issuer_count().await? > 0 {
        return Ok(());
    }

    tracing::info!("Empty issuer table, seeding fixtures");

    let mut ids = std::collections::HashMap::new();
    for (name, ticker, country) in SAMPLE_ISSUERS {
        let issuer = store
            .create_issuer(&NewIssuer {
                name: (*name).to_string(),
                ticker: Some((*ticker).to_string()),
                country: Some((*country).to_string()),
            })
            .await?;
        ids.insert(*name, issuer.id);
    }

    for (name, date, revenue, ebitda, total_debt) in SAMPLE_FUNDAMENTALS {
        let report_date: NaiveDate = date
            .parse()
            .map_err(|e| CreditError::Model(format!("bad seed date {date}: {e}")))?;
        if let Some(&issuer_id) = ids.get(name) {
            store
                .create_fundamental(&NewFundamental {
                    issuer_id,
                    report_date,
                    revenue: Some(*revenue),
                    ebitda: Some(*ebitda),
                    total_debt: Some(*total_debt),
                })
                .await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn seeding_is_idempotent() {
        let store = Store::connect("sqlite::memory:").await.unwrap();

        seed_if_empty(&store).await.unwrap();
        assert_eq!(store.issuer_count().await.unwrap(), 3);

        seed_if_empty(&store).await.unwrap();
        assert_eq!(store.issuer_count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn seeded_fundamentals_resolve_latest() {
        let store = Store::connect("sqlite::memory:").await.unwrap();
        seed_if_empty(&store).await.unwrap();

        let acme = store
            .all_issuers()
            .await
            .unwrap()
            .into_iter()
            .find(|i| i.name == "Acme Industries")
            .unwrap();
        let rows = store.recent_fundamentals(acme.id, 5).await.unwrap();
        assert_eq!(rows[0].report_date.to_string(), "2025-03-31");
    }
}
