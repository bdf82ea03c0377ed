//! Manual ingestion trigger, same unit of work as a scheduler tick.

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use credit_core::IngestCounts;

use crate::{ApiResponse, AppError, AppState};

pub fn ingest_routes() -> Router<AppState> {
    Router::new().route("/ingest/run", post(run_ingest))
}

async fn run_ingest(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<IngestCounts>>, AppError> {
    let counts = state.pipeline.run().await?;
    Ok(Json(ApiResponse::ok(counts)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::seeded_state;

    #[tokio::test]
    async fn inert_sources_yield_zero_counts() {
        let state = seeded_state("ingest-zero").await;
        let Json(resp) = run_ingest(State(state)).await.unwrap();

        let counts = resp.data.unwrap();
        assert_eq!(counts.news, 0);
        assert_eq!(counts.price_events, 0);
        assert_eq!(counts.derived_events, 0);
    }
}
