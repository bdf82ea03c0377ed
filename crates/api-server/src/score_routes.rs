//! Credit score endpoint: score plus ranked per-feature attribution
//! for one issuer.

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use credit_core::{Attribution, FeatureVector};
use credit_store::models::Issuer;
use serde::Serialize;

use crate::{ApiResponse, AppError, AppState};

#[derive(Serialize, Debug)]
pub struct ScoreResponse {
    pub issuer: Issuer,
    pub score: f64,
    pub raw_score: f64,
    pub features: FeatureVector,
    pub attributions: Vec<Attribution>,
}

pub fn score_routes() -> Router<AppState> {
    Router::new().route("/issuers/:id/score", get(issuer_score))
}

async fn issuer_score(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<ScoreResponse>>, AppError> {
    let issuer = state
        .store
        .get_issuer(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("issuer {id} not found")))?;

    let report = state.scorer.score_and_explain(id).await?;

    Ok(Json(ApiResponse::ok(ScoreResponse {
        issuer,
        score: report.score,
        raw_score: report.raw_score,
        features: report.features,
        attributions: report.attributions,
    })))
}
