//! HTTP API for recommendations, health checks and Prometheus metrics

use crate::config::ServiceConfig;
use crate::reload::{DataReloader, ReloadOutcome};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use prometheus::{Encoder, TextEncoder};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Instant;
use taar_core::{
    ComponentStatus, HealthRegistry, ManagerHandle, RecommendError, Recommendation,
    ServiceMetrics, StructuredLogger,
};
use tracing::{error, info};

/// Shared application state
pub struct AppState {
    pub manager: ManagerHandle,
    pub health_registry: HealthRegistry,
    pub metrics: ServiceMetrics,
    pub logger: StructuredLogger,
    pub reloader: Arc<DataReloader>,
    pub config: ServiceConfig,
}

impl AppState {
    /// Resolve the requested limit against the configured bounds
    fn resolve_limit(&self, requested: Option<usize>) -> Result<usize, ApiError> {
        let limit = requested.unwrap_or(self.config.default_limit);
        if limit == 0 || limit > self.config.max_limit {
            return Err(ApiError::InvalidLimit {
                requested: limit,
                max: self.config.max_limit,
            });
        }
        Ok(limit)
    }
}

/// Errors surfaced to HTTP clients
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("limit must be between 1 and {max}, got {requested}")]
    InvalidLimit { requested: usize, max: usize },

    #[error(transparent)]
    Recommend(#[from] RecommendError),

    #[error("Data reload failed: {0}")]
    Reload(String),

    #[error("Failed to encode metrics: {0}")]
    Metrics(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidLimit { .. } => StatusCode::BAD_REQUEST,
            ApiError::Recommend(RecommendError::Timeout) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Recommend(_) | ApiError::Reload(_) | ApiError::Metrics(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = serde_json::json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        });
        (status, Json(body)).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct RecommendationQuery {
    pub limit: Option<usize>,
}

/// Recommend add-ons for a client.
///
/// The computation runs on the blocking pool, bounded by the configured
/// request timeout.
async fn recommendations(
    State(state): State<Arc<AppState>>,
    Path(client_id): Path<String>,
    Query(query): Query<RecommendationQuery>,
) -> Result<Json<Recommendation>, ApiError> {
    let limit = state.resolve_limit(query.limit)?;
    let start = Instant::now();

    let manager = state.manager.clone();
    let id = client_id.clone();
    let task = tokio::task::spawn_blocking(move || manager.recommend(&id, limit));

    let outcome = match tokio::time::timeout(state.config.request_timeout(), task).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_error)) => Err(RecommendError::Internal(join_error.to_string())),
        Err(_) => Err(RecommendError::Timeout),
    };

    let elapsed = start.elapsed();
    state
        .metrics
        .observe_recommendation_latency(elapsed.as_secs_f64());

    match outcome {
        Ok(recommendation) => {
            state.metrics.record_recommendation(
                recommendation.recommender.as_deref(),
                recommendation.results.len(),
            );
            state.logger.log_recommendation(
                &client_id,
                recommendation.recommender.as_deref(),
                recommendation.results.len(),
                elapsed.as_secs_f64() * 1000.0,
            );
            Ok(Json(recommendation))
        }
        Err(e) => {
            state.metrics.inc_recommendation_errors();
            error!(client_id = %client_id, error = %e, "Recommendation failed");
            Err(e.into())
        }
    }
}

/// Health check response - returns 200 if healthy, 503 if unhealthy
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy => StatusCode::OK,
        // Other recommenders keep answering
        ComponentStatus::Degraded => StatusCode::OK,
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

/// Readiness check response - returns 200 if ready, 503 if not ready
async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

/// Prometheus metrics endpoint
async fn metrics() -> Result<impl IntoResponse, ApiError> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| ApiError::Metrics(e.to_string()))?;

    Ok((
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    ))
}

/// Reload payload files immediately
async fn reload(State(state): State<Arc<AppState>>) -> Result<Json<ReloadOutcome>, ApiError> {
    info!("Data reload requested");
    let outcome = state
        .reloader
        .reload()
        .await
        .map_err(|e| ApiError::Reload(format!("{e:#}")))?;
    Ok(Json(outcome))
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/api/recommendations/:client_id", get(recommendations))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .route("/admin/reload", post(reload))
        .with_state(state)
}

/// Start the API server, returning once `shutdown` resolves
pub async fn serve(
    port: u16,
    state: Arc<AppState>,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
