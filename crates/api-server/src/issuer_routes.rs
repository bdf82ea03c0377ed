//! Issuer CRUD endpoints.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use credit_core::CreditError;
use credit_store::models::{Issuer, NewIssuer};
use serde::Deserialize;

use crate::{ApiResponse, AppError, AppState};

#[derive(Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    100
}

pub fn issuer_routes() -> Router<AppState> {
    Router::new().route("/issuers", get(list_issuers).post(create_issuer))
}

async fn list_issuers(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<Vec<Issuer>>>, AppError> {
    let issuers = state.store.list_issuers(query.skip, query.limit).await?;
    Ok(Json(ApiResponse::ok(issuers)))
}

async fn create_issuer(
    State(state): State<AppState>,
    Json(body): Json<NewIssuer>,
) -> Result<(StatusCode, Json<ApiResponse<Issuer>>), AppError> {
    if body.name.trim().is_empty() {
        return Err(AppError::BadRequest("issuer name must not be empty".into()));
    }

    let issuer = match state.store.create_issuer(&body).await {
        Ok(issuer) => issuer,
        Err(CreditError::Database(sqlx::Error::Database(db)))
            if db.message().contains("UNIQUE") =>
        {
            return Err(AppError::BadRequest(
                "issuer name or ticker already exists".into(),
            ));
        }
        Err(e) => return Err(e.into()),
    };

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(issuer))))
}
