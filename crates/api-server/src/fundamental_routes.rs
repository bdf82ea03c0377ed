//! Fundamentals reporting endpoints.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use credit_store::models::{Fundamental, NewFundamental};
use serde::Deserialize;

use crate::{ApiResponse, AppError, AppState};

#[derive(Deserialize)]
pub struct FundamentalsQuery {
    pub issuer_id: Option<i64>,
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    100
}

pub fn fundamental_routes() -> Router<AppState> {
    Router::new().route(
        "/fundamentals",
        get(list_fundamentals).post(create_fundamental),
    )
}

async fn list_fundamentals(
    State(state): State<AppState>,
    Query(query): Query<FundamentalsQuery>,
) -> Result<Json<ApiResponse<Vec<Fundamental>>>, AppError> {
    let rows = state
        .store
        .list_fundamentals(query.issuer_id, query.skip, query.limit)
        .await?;
    Ok(Json(ApiResponse::ok(rows)))
}

async fn create_fundamental(
    State(state): State<AppState>,
    Json(body): Json<NewFundamental>,
) -> Result<(StatusCode, Json<ApiResponse<Fundamental>>), AppError> {
    // Referential check up front so the caller gets a 400, not a
    // foreign-key error.
    if state.store.get_issuer(body.issuer_id).await?.is_none() {
        return Err(AppError::BadRequest(format!(
            "unknown issuer {}",
            body.issuer_id
        )));
    }

    let row = state.store.create_fundamental(&body).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(row))))
}
