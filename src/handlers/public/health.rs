use axum::extract::State;
use serde::Serialize;

use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub database: &'static str,
}

/// GET /health - liveness check including a database round trip
pub async fn health(State(state): State<AppState>) -> ApiResult<HealthResponse> {
    state.store.health_check().await.map_err(|e| {
        tracing::error!("health check failed: {}", e);
        ApiError::service_unavailable("database unavailable")
    })?;

    Ok(ApiResponse::success(HealthResponse { database: "ok" }))
}
