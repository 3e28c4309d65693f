use axum::{Json, extract::State};
use std::sync::Arc;

use super::{AnalysisResponse, AnalyzeRequest, ApiError, ApiResponse, AppState};

/// POST /api/gemini/analyze
/// Runs the model-variant fallback chain over the image at the given URL
/// and returns the scored analysis. Does not persist anything; the caller
/// attaches the result via `PUT /api/images/{id}/analysis`.
pub async fn analyze_image(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<AnalyzeRequest>,
) -> Result<Json<ApiResponse<AnalysisResponse>>, ApiError> {
    if payload.image_url.trim().is_empty() {
        return Err(ApiError::validation("Image URL is required"));
    }

    let image_url = url::Url::parse(payload.image_url.trim())
        .map_err(|_| ApiError::validation("Invalid image URL"))?;

    let outcome = state.analysis().analyze(image_url.as_str()).await?;

    Ok(Json(ApiResponse::success(AnalysisResponse {
        analysis: outcome.analysis,
        safety_score: outcome.level.as_str().to_string(),
        safety_percentage: outcome.percentage,
        model_used: outcome.model_used,
    })))
}
