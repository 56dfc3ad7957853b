use crate::db::DbPool;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use utoipa::ToSchema;

pub trait HealthHandlerState: Clone + Send + Sync + 'static {
    fn db(&self) -> &DbPool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DatabaseHealth {
    pub reachable: bool,
    pub latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: String,
    pub timestamp: String,
    pub database: DatabaseHealth,
}

pub fn health_routes<S>() -> Router<S>
where
    S: HealthHandlerState,
{
    Router::new()
        .route("/", get(health_check::<S>))
        .route("/live", get(liveness_check))
}

/// Database reachability
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service and database are reachable", body = HealthResponse),
        (status = 503, description = "Database is unreachable", body = HealthResponse)
    ),
    tag = "health"
)]
pub async fn health_check<S>(State(state): State<S>) -> impl IntoResponse
where
    S: HealthHandlerState,
{
    let started = Instant::now();
    let result = crate::db::check_connection(state.db()).await;
    let latency_ms = started.elapsed().as_millis() as u64;

    let (status_code, status, message) = match result {
        Ok(()) => (StatusCode::OK, HealthStatus::Healthy, None),
        // Detail is already logged by check_connection.
        Err(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            HealthStatus::Unhealthy,
            Some("Database connection failed".to_string()),
        ),
    };

    (
        status_code,
        Json(HealthResponse {
            status,
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            database: DatabaseHealth {
                reachable: status == HealthStatus::Healthy,
                latency_ms,
                message,
            },
        }),
    )
}

async fn liveness_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "up",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
