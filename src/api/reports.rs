use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use std::sync::Arc;

use super::{
    ApiError, ApiResponse, AppState, AttachAnalysisRequest, CommentDto, CommentPageResponse,
    CommentRequest, LikeRequest, LikeResponse, ReportDto,
};
use crate::api::validation::{
    validate_coordinates, validate_limit, validate_page, validate_required,
};
use crate::db::NewReport;
use crate::services::SafetyLevel;

/// Parsed multipart form for a new report.
#[derive(Default)]
struct UploadForm {
    user_name: Option<String>,
    user_area: Option<String>,
    user_pincode: Option<String>,
    latitude: Option<String>,
    longitude: Option<String>,
    address: Option<String>,
    image: Option<(Vec<u8>, Option<String>)>,
}

/// POST /api/upload
/// Multipart upload of a report photo plus submitter metadata. The photo
/// is written to the media store before the report row is created, so a
/// report never references a missing object.
pub async fn upload_report(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<ReportDto>>), ApiError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation(format!("Malformed multipart body: {e}")))?
    {
        let Some(name) = field.name().map(ToString::to_string) else {
            continue;
        };

        match name.as_str() {
            "image" => {
                let content_type = field.content_type().map(ToString::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::validation(format!("Failed to read image: {e}")))?;
                form.image = Some((bytes.to_vec(), content_type));
            }
            "user_name" => form.user_name = Some(read_text(field).await?),
            "user_area" => form.user_area = Some(read_text(field).await?),
            "user_pincode" => form.user_pincode = Some(read_text(field).await?),
            "latitude" => form.latitude = Some(read_text(field).await?),
            "longitude" => form.longitude = Some(read_text(field).await?),
            "address" => form.address = Some(read_text(field).await?),
            _ => {}
        }
    }

    let user_name = required(&form.user_name, "user_name")?;
    let user_area = required(&form.user_area, "user_area")?;
    let user_pincode = required(&form.user_pincode, "user_pincode")?;
    let latitude = parse_coordinate(&form.latitude, "latitude")?;
    let longitude = parse_coordinate(&form.longitude, "longitude")?;
    validate_coordinates(latitude, longitude)?;

    let Some((bytes, content_type)) = form.image else {
        return Err(ApiError::validation("No image file provided"));
    };
    if bytes.is_empty() {
        return Err(ApiError::validation("No image file provided"));
    }

    let image_url = state
        .media()
        .store_report_image(&bytes, content_type.as_deref())
        .await?;

    let report = state
        .store()
        .create_report(NewReport {
            user_name,
            user_area,
            user_pincode,
            latitude,
            longitude,
            address: form
                .address
                .filter(|a| !a.trim().is_empty())
                .map(|a| a.trim().to_string()),
            image_url,
        })
        .await?;

    let overview = state
        .store()
        .get_report_overview(report.id)
        .await?
        .ok_or_else(|| ApiError::internal("Created report vanished"))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(
            "Image uploaded successfully",
            ReportDto::from_overview(overview),
        )),
    ))
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String, ApiError> {
    field
        .text()
        .await
        .map_err(|e| ApiError::validation(format!("Malformed multipart field: {e}")))
}

fn required(value: &Option<String>, name: &str) -> Result<String, ApiError> {
    match value {
        Some(v) => Ok(validate_required(v, name)?.to_string()),
        None => Err(ApiError::validation(format!("{name} is required"))),
    }
}

fn parse_coordinate(value: &Option<String>, name: &str) -> Result<f64, ApiError> {
    let raw = value
        .as_deref()
        .ok_or_else(|| ApiError::validation(format!("{name} is required")))?;

    raw.trim()
        .parse::<f64>()
        .map_err(|_| ApiError::validation(format!("Invalid {name}: {raw}")))
}

/// GET /api/images
/// All reports, newest first, with display placeholders filled in for
/// blank legacy submitter fields.
pub async fn list_reports(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<ReportDto>>>, ApiError> {
    let reports = state
        .store()
        .list_reports()
        .await?
        .into_iter()
        .map(ReportDto::from_overview)
        .collect();

    Ok(Json(ApiResponse::success(reports)))
}

/// PUT /api/images/{id}/analysis
pub async fn attach_analysis(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(payload): Json<AttachAnalysisRequest>,
) -> Result<Json<ApiResponse<ReportDto>>, ApiError> {
    validate_required(&payload.analysis, "analysis")?;

    let level = SafetyLevel::parse(&payload.safety_score).ok_or_else(|| {
        ApiError::validation("safety_score must be one of Safe, Moderate, Danger")
    })?;

    let percentage = payload.safety_percentage.unwrap_or(50);
    if !(0..=100).contains(&percentage) {
        return Err(ApiError::validation(
            "safety_percentage must be between 0 and 100",
        ));
    }

    state
        .store()
        .attach_analysis(id, &payload.analysis, level.as_str(), percentage)
        .await?
        .ok_or_else(|| ApiError::report_not_found(id))?;

    let overview = state
        .store()
        .get_report_overview(id)
        .await?
        .ok_or_else(|| ApiError::report_not_found(id))?;

    Ok(Json(ApiResponse::with_message(
        "Analysis results updated successfully",
        ReportDto::from_overview(overview),
    )))
}

/// POST /api/images/{id}/like
/// Each call flips the caller's like state.
pub async fn toggle_like(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(payload): Json<LikeRequest>,
) -> Result<Json<ApiResponse<LikeResponse>>, ApiError> {
    validate_required(&payload.user_identifier, "user_identifier")?;

    let outcome = state
        .store()
        .toggle_report_like(id, payload.user_identifier.trim())
        .await?
        .ok_or_else(|| ApiError::report_not_found(id))?;

    let message = if outcome.is_liked {
        "Report liked"
    } else {
        "Report unliked"
    };

    Ok(Json(ApiResponse::with_message(
        message,
        LikeResponse {
            likes: outcome.likes,
            is_liked: outcome.is_liked,
        },
    )))
}

/// POST /api/images/{id}/comment
pub async fn add_comment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(payload): Json<CommentRequest>,
) -> Result<Json<ApiResponse<CommentDto>>, ApiError> {
    let user_name = validate_required(&payload.user_name, "user_name")?;
    let body = validate_required(&payload.comment, "comment")?;

    let user_area = payload
        .user_area
        .as_deref()
        .map(str::trim)
        .filter(|a| !a.is_empty());

    let comment = state
        .store()
        .add_comment(id, user_name, user_area, body)
        .await?
        .ok_or_else(|| ApiError::report_not_found(id))?;

    Ok(Json(ApiResponse::with_message(
        "Comment added successfully",
        CommentDto {
            id: comment.public_id,
            user_name: comment.user_name,
            user_area: comment.user_area,
            comment: comment.body,
            created_at: comment.created_at,
            likes: 0,
            liked_by: Vec::new(),
        },
    )))
}

/// POST /api/images/{image_id}/comments/{comment_id}/like
pub async fn toggle_comment_like(
    State(state): State<Arc<AppState>>,
    Path((image_id, comment_id)): Path<(i32, String)>,
    Json(payload): Json<LikeRequest>,
) -> Result<Json<ApiResponse<LikeResponse>>, ApiError> {
    validate_required(&payload.user_identifier, "user_identifier")?;

    if state.store().get_report(image_id).await?.is_none() {
        return Err(ApiError::report_not_found(image_id));
    }

    let outcome = state
        .store()
        .toggle_comment_like(image_id, &comment_id, payload.user_identifier.trim())
        .await?
        .ok_or_else(|| ApiError::comment_not_found(&comment_id))?;

    let message = if outcome.is_liked {
        "Comment liked"
    } else {
        "Comment unliked"
    };

    Ok(Json(ApiResponse::with_message(
        message,
        LikeResponse {
            likes: outcome.likes,
            is_liked: outcome.is_liked,
        },
    )))
}

#[derive(Debug, Deserialize)]
pub struct CommentsQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// GET /api/images/{id}/comments?page=&limit=
/// Pages over stored (oldest-first) order.
pub async fn list_comments(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Query(query): Query<CommentsQuery>,
) -> Result<Json<ApiResponse<CommentPageResponse>>, ApiError> {
    let page = validate_page(query.page.unwrap_or(1))?;
    let limit = validate_limit(query.limit.unwrap_or(5))?;

    let page_data = state
        .store()
        .comments_page(id, page, limit)
        .await?
        .ok_or_else(|| ApiError::report_not_found(id))?;

    Ok(Json(ApiResponse::success(CommentPageResponse {
        comments: page_data
            .comments
            .into_iter()
            .map(CommentDto::from_comment)
            .collect(),
        has_more: page_data.has_more,
        total_comments: page_data.total,
        current_page: page,
        total_pages: page_data.total_pages,
    })))
}
