use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware,
    routing::{get, post, put},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod admin;
mod analysis;
mod error;
mod observability;
mod reports;
mod system;
mod types;
pub mod validation;

pub use error::{ApiError, set_development_mode};
pub use types::*;

pub use crate::state::{AppState, create_app_state_from_config, create_app_state_with_mailer};

/// Uploaded photos can be large; well past the axum default.
const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

pub fn router(state: Arc<AppState>) -> Router {
    let cors_origins = state.config().server.cors_allowed_origins.clone();
    let media_root = state.media().root().clone();

    let admin_protected = Router::new()
        .route("/admin/profile", get(admin::profile))
        .route("/admin/analyze-all", post(admin::analyze_all))
        .route("/admin/metrics", get(observability::get_metrics))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            admin::admin_auth_middleware,
        ));

    let api_router = Router::new()
        .route("/health", get(system::health))
        .route("/upload", post(reports::upload_report))
        .route("/images", get(reports::list_reports))
        .route("/images/{id}/analysis", put(reports::attach_analysis))
        .route("/images/{id}/like", post(reports::toggle_like))
        .route("/images/{id}/comment", post(reports::add_comment))
        .route(
            "/images/{image_id}/comments/{comment_id}/like",
            post(reports::toggle_comment_like),
        )
        .route("/images/{id}/comments", get(reports::list_comments))
        .route("/gemini/analyze", post(analysis::analyze_image))
        .route("/admin/register", post(admin::register))
        .route("/admin/request-code", post(admin::request_code))
        .route("/admin/verify-code", post(admin::verify_code))
        .route("/admin/resend-code", post(admin::resend_code))
        .merge(admin_protected)
        .with_state(state);

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .nest("/api", api_router)
        .nest_service("/media", tower_http::services::ServeDir::new(media_root))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(observability::logging_middleware))
}
