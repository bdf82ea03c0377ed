//! Presentation layer: axum routes over the store, the scorer and the
//! ingestion pipeline, plus the process wiring for the `credit-api`
//! binary.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use credit_core::CreditError;
use credit_store::seed::seed_if_empty;
use credit_store::Store;
use ingestion::{
    EventSynthesizer, FeedIngestor, IngestionPipeline, PriceIngestor, RssFeedSource,
    YahooChartClient,
};
use ml_engine::Scorer;
use scheduler::IngestionScheduler;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod config;
pub mod fundamental_routes;
pub mod ingest_routes;
pub mod issuer_routes;
pub mod score_routes;

use config::ServerConfig;

#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub scorer: Arc<Scorer>,
    pub pipeline: Arc<IngestionPipeline>,
}

/// Uniform response envelope for every endpoint.
#[derive(Serialize, Debug)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    BadRequest(String),
    Internal(CreditError),
}

impl From<CreditError> for AppError {
    fn from(e: CreditError) -> Self {
        match e {
            CreditError::NotFound(msg) => AppError::NotFound(msg),
            other => AppError::Internal(other),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::NotFound(m) => (StatusCode::NOT_FOUND, m),
            AppError::BadRequest(m) => (StatusCode::BAD_REQUEST, m),
            AppError::Internal(e) => {
                // Details go to the log, not the wire.
                tracing::error!(error = %e, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };
        (status, Json(ApiResponse::<()>::err(message))).into_response()
    }
}

async fn health() -> Json<ApiResponse<&'static str>> {
    Json(ApiResponse::ok("ok"))
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(issuer_routes::issuer_routes())
        .merge(fundamental_routes::fundamental_routes())
        .merge(score_routes::score_routes())
        .merge(ingest_routes::ingest_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn run_server() -> anyhow::Result<()> {
    let config = ServerConfig::from_env()?;

    let store = Store::connect(&config.database_url).await?;
    seed_if_empty(&store).await?;

    let pipeline = Arc::new(IngestionPipeline::new(
        FeedIngestor::new(
            store.clone(),
            Arc::new(RssFeedSource::new()),
            config.feeds.clone(),
        ),
        PriceIngestor::new(
            store.clone(),
            Arc::new(YahooChartClient::new()),
            config.price_lookback_days,
            config.price_interval.clone(),
        ),
        EventSynthesizer::new(store.clone()),
    ));

    let mut scheduler = IngestionScheduler::new(
        Arc::clone(&pipeline),
        Duration::from_secs(config.ingest_interval_seconds),
    );
    scheduler.start();

    let scorer = Arc::new(Scorer::new(store.clone(), &config.model_dir));
    let state = AppState {
        store,
        scorer,
        pipeline,
    };

    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "credit-api listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Let an in-flight ingestion tick finish before the process exits.
    scheduler.stop().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown signal received");
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use async_trait::async_trait;
    use credit_core::{FeedEntry, FeedSource, PriceBar, PriceHistoryProvider};

    pub struct NullSource;

    #[async_trait]
    impl FeedSource for NullSource {
        async fn fetch_entries(&self, _url: &str) -> Result<Vec<FeedEntry>, CreditError> {
            Ok(Vec::new())
        }
    }

    pub struct NullProvider;

    #[async_trait]
    impl PriceHistoryProvider for NullProvider {
        async fn price_history(
            &self,
            _ticker: &str,
            _lookback_days: u32,
            _interval: &str,
        ) -> Result<Vec<PriceBar>, CreditError> {
            Ok(Vec::new())
        }
    }

    /// Seeded in-memory state with inert ingestion sources. Each caller
    /// gets its own model directory so parallel tests do not race.
    pub async fn seeded_state(tag: &str) -> AppState {
        let store = Store::connect("sqlite::memory:").await.unwrap();
        seed_if_empty(&store).await.unwrap();

        let model_dir = std::env::temp_dir().join(format!(
            "credit-iq-api-{}-{}",
            tag,
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&model_dir);

        let pipeline = Arc::new(IngestionPipeline::new(
            FeedIngestor::new(store.clone(), Arc::new(NullSource), Vec::new()),
            PriceIngestor::new(store.clone(), Arc::new(NullProvider), 7, "1d".into()),
            EventSynthesizer::new(store.clone()),
        ));

        AppState {
            scorer: Arc::new(Scorer::new(store.clone(), &model_dir)),
            store,
            pipeline,
        }
    }
}
