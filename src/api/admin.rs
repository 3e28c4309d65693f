use axum::{
    Json,
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use super::{
    AdminProfileDto, ApiError, ApiResponse, AppState, BulkAnalysisResponse, EmailRequest,
    VerifyCodeRequest, VerifyCodeResponse,
};
use crate::api::validation::validate_email;
use crate::entities::admins;

// ============================================================================
// Middleware
// ============================================================================

/// Requires a valid, unexpired `Authorization: Bearer <session token>`.
/// The resolved admin account is stored in request extensions for the
/// handler.
pub async fn admin_auth_middleware(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(token) = extract_bearer_token(&headers) else {
        return Err(ApiError::Unauthorized("Missing session token".to_string()));
    };

    let admin = state.admin_auth().profile_by_token(&token).await?;
    request.extensions_mut().insert(admin);

    Ok(next.run(request).await)
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let auth_header = headers.get("Authorization")?;
    let auth_str = auth_header.to_str().ok()?;
    let token = auth_str.strip_prefix("Bearer ")?;
    Some(token.trim().to_string())
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/admin/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<EmailRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = validate_email(&payload.email)?;

    let admin = state.admin_auth().register(&email).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(
            "Admin registered successfully. Please check your email for confirmation.",
            profile_dto(&admin),
        )),
    ))
}

/// POST /api/admin/request-code
pub async fn request_code(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<EmailRequest>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let email = validate_email(&payload.email)?;

    state.admin_auth().request_code(&email).await?;

    Ok(Json(ApiResponse::with_message(
        "Verification code sent to your email",
        (),
    )))
}

/// POST /api/admin/resend-code
/// Always issues a fresh code, superseding any prior one.
pub async fn resend_code(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<EmailRequest>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let email = validate_email(&payload.email)?;

    state.admin_auth().resend_code(&email).await?;

    Ok(Json(ApiResponse::with_message(
        "New verification code sent to your email",
        (),
    )))
}

/// POST /api/admin/verify-code
pub async fn verify_code(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<VerifyCodeRequest>,
) -> Result<Json<ApiResponse<VerifyCodeResponse>>, ApiError> {
    let email = validate_email(&payload.email)?;

    if payload.code.trim().is_empty() {
        return Err(ApiError::validation("Verification code is required"));
    }

    let session = state
        .admin_auth()
        .verify_code(&email, payload.code.trim())
        .await?;

    Ok(Json(ApiResponse::with_message(
        "Login successful",
        VerifyCodeResponse {
            email: session.email,
            is_verified: session.is_verified,
            last_login: session.last_login,
            session_token: session.session_token,
        },
    )))
}

/// GET /api/admin/profile
/// Identified by the session token, not by a caller-supplied email.
pub async fn profile(
    axum::Extension(admin): axum::Extension<admins::Model>,
) -> Json<ApiResponse<AdminProfileDto>> {
    Json(ApiResponse::success(profile_dto(&admin)))
}

/// POST /api/admin/analyze-all
/// Sequentially analyzes every report still missing a safety score.
pub async fn analyze_all(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<BulkAnalysisResponse>>, ApiError> {
    let stats = state.analysis().analyze_pending().await?;

    Ok(Json(ApiResponse::with_message(
        "Bulk analysis finished",
        BulkAnalysisResponse {
            analyzed: stats.analyzed,
            failed: stats.failed,
        },
    )))
}

fn profile_dto(admin: &admins::Model) -> AdminProfileDto {
    AdminProfileDto {
        email: admin.email.clone(),
        is_verified: admin.is_verified,
        last_login: admin.last_login.clone(),
        created_at: admin.created_at.clone(),
    }
}
