use axum::{Json, extract::State};
use std::sync::Arc;

use super::{ApiResponse, AppState, HealthResponse};

/// GET /api/health
/// Liveness probe; always 200.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<ApiResponse<HealthResponse>> {
    Json(ApiResponse::success(HealthResponse {
        status: "OK",
        timestamp: chrono::Utc::now().to_rfc3339(),
        environment: if state.config().general.development_mode {
            "development"
        } else {
            "production"
        },
    }))
}
