use serde::{Deserialize, Serialize};

use crate::db::{CommentWithLikes, ReportOverview};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
        }
    }

    pub fn with_message(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: Some(data),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            data: None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LocationDto {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ReportDto {
    pub id: i32,
    pub image_url: String,
    pub user_name: String,
    pub user_area: String,
    pub user_pincode: String,
    pub location: LocationDto,
    pub uploaded_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub safety_score: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub safety_percentage: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analyzed_at: Option<String>,
    pub likes: u64,
    pub liked_by: Vec<String>,
    pub comment_count: u64,
}

impl ReportDto {
    /// Maps a stored report to its response shape, substituting display
    /// placeholders for blank legacy submitter fields. A read-time view
    /// transform only; stored rows are never rewritten.
    #[must_use]
    pub fn from_overview(overview: ReportOverview) -> Self {
        let report = overview.report;

        let fill = |value: String, placeholder: &str| {
            if value.trim().is_empty() {
                placeholder.to_string()
            } else {
                value
            }
        };

        Self {
            id: report.id,
            image_url: report.image_url,
            user_name: fill(report.user_name, "Anonymous User"),
            user_area: fill(report.user_area, "Unknown Area"),
            user_pincode: fill(report.user_pincode, "No Pincode"),
            location: LocationDto {
                latitude: report.latitude,
                longitude: report.longitude,
                address: report.address,
            },
            uploaded_at: report.uploaded_at,
            analysis: report.analysis,
            safety_score: report.safety_score,
            safety_percentage: report.safety_percentage,
            analyzed_at: report.analyzed_at,
            likes: overview.likes,
            liked_by: overview.liked_by,
            comment_count: overview.comment_count,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CommentDto {
    pub id: String,
    pub user_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_area: Option<String>,
    pub comment: String,
    pub created_at: String,
    pub likes: u64,
    pub liked_by: Vec<String>,
}

impl CommentDto {
    #[must_use]
    pub fn from_comment(with_likes: CommentWithLikes) -> Self {
        let comment = with_likes.comment;
        Self {
            id: comment.public_id,
            user_name: comment.user_name,
            user_area: comment.user_area,
            comment: comment.body,
            created_at: comment.created_at,
            likes: with_likes.likes,
            liked_by: with_likes.liked_by,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LikeResponse {
    pub likes: u64,
    pub is_liked: bool,
}

#[derive(Debug, Serialize)]
pub struct CommentPageResponse {
    pub comments: Vec<CommentDto>,
    pub has_more: bool,
    pub total_comments: u64,
    pub current_page: u64,
    pub total_pages: u64,
}

#[derive(Debug, Serialize)]
pub struct AnalysisResponse {
    pub analysis: String,
    pub safety_score: String,
    pub safety_percentage: u8,
    pub model_used: String,
}

#[derive(Debug, Serialize)]
pub struct AdminProfileDto {
    pub email: String,
    pub is_verified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_login: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Serialize)]
pub struct VerifyCodeResponse {
    pub email: String,
    pub is_verified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_login: Option<String>,
    pub session_token: String,
}

#[derive(Debug, Serialize)]
pub struct BulkAnalysisResponse {
    pub analyzed: usize,
    pub failed: usize,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
    pub environment: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct LikeRequest {
    pub user_identifier: String,
}

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub user_name: String,
    pub user_area: Option<String>,
    pub comment: String,
}

#[derive(Debug, Deserialize)]
pub struct AttachAnalysisRequest {
    pub analysis: String,
    pub safety_score: String,
    pub safety_percentage: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub image_url: String,
}

#[derive(Debug, Deserialize)]
pub struct EmailRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyCodeRequest {
    pub email: String,
    pub code: String,
}
