use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

use civicwatch::clients::mailer::{DeliveryReceipt, MailError, Mailer, OutboundEmail};
use civicwatch::config::Config;

const BOUNDARY: &str = "civicwatch-test-boundary";

/// Captures outbound mail so tests can read verification codes.
struct CaptureMailer {
    sent: Mutex<Vec<OutboundEmail>>,
}

impl CaptureMailer {
    fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
        }
    }

    fn last_code(&self) -> String {
        let sent = self.sent.lock().unwrap();
        let email = sent
            .iter()
            .rev()
            .find(|m| m.subject.contains("Verification Code"))
            .expect("no verification email captured");
        email
            .text
            .strip_prefix("Admin Login Verification Code: ")
            .expect("unexpected email body")[..6]
            .to_string()
    }
}

#[async_trait::async_trait]
impl Mailer for CaptureMailer {
    async fn send(&self, message: &OutboundEmail) -> Result<DeliveryReceipt, MailError> {
        self.sent.lock().unwrap().push(message.clone());
        Ok(DeliveryReceipt {
            message_id: "captured".to_string(),
        })
    }
}

fn test_config() -> Config {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();

    let unique = format!(
        "civicwatch-test-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    );
    config.general.media_path = std::env::temp_dir()
        .join(unique)
        .to_string_lossy()
        .to_string();

    config
}

async fn spawn_app() -> (Router, Arc<CaptureMailer>) {
    let mailer = Arc::new(CaptureMailer::new());

    let state = civicwatch::api::create_app_state_with_mailer(test_config(), None, mailer.clone())
        .await
        .expect("Failed to create app state");

    (civicwatch::api::router(state), mailer)
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

/// Builds a multipart body with the given text fields and an optional
/// image part.
fn multipart_body(fields: &[(&str, &str)], image: Option<&[u8]>) -> Vec<u8> {
    let mut body = Vec::new();

    for (name, value) in fields {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
        );
        body.extend_from_slice(value.as_bytes());
        body.extend_from_slice(b"\r\n");
    }

    if let Some(bytes) = image {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            b"Content-Disposition: form-data; name=\"image\"; filename=\"photo.jpg\"\r\n",
        );
        body.extend_from_slice(b"Content-Type: image/jpeg\r\n\r\n");
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }

    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn upload_request(fields: &[(&str, &str)], image: Option<&[u8]>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/upload")
        .header(
            "Content-Type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(fields, image)))
        .unwrap()
}

const FULL_FIELDS: &[(&str, &str)] = &[
    ("user_name", "Asha"),
    ("user_area", "Indiranagar"),
    ("user_pincode", "560038"),
    ("latitude", "12.9716"),
    ("longitude", "77.5946"),
    ("address", "100 Feet Road"),
];

async fn upload_report(app: &Router) -> i64 {
    let response = app
        .clone()
        .oneshot(upload_request(FULL_FIELDS, Some(b"fake image bytes")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    json["data"]["id"].as_i64().unwrap()
}

fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

#[tokio::test]
async fn test_health() {
    let (app, _) = spawn_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["status"], "OK");
}

#[tokio::test]
async fn test_upload_rejects_missing_pincode() {
    let (app, _) = spawn_app().await;

    let fields: Vec<(&str, &str)> = FULL_FIELDS
        .iter()
        .copied()
        .filter(|(name, _)| *name != "user_pincode")
        .collect();

    let response = app
        .oneshot(upload_request(&fields, Some(b"fake image bytes")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert!(json["message"].as_str().unwrap().contains("user_pincode"));
}

#[tokio::test]
async fn test_upload_rejects_missing_image() {
    let (app, _) = spawn_app().await;

    let response = app.oneshot(upload_request(FULL_FIELDS, None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["message"], "No image file provided");
}

#[tokio::test]
async fn test_upload_large_image_and_list() {
    let (app, _) = spawn_app().await;

    let five_megabytes = vec![0xAB_u8; 5 * 1024 * 1024];
    let response = app
        .clone()
        .oneshot(upload_request(FULL_FIELDS, Some(&five_megabytes)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["success"], true);

    let image_url = json["data"]["image_url"].as_str().unwrap();
    assert!(!image_url.is_empty());
    assert!(image_url.contains("/media/infrastructure-reports/"));
    assert_eq!(json["data"]["likes"], 0);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/images")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let reports = json["data"].as_array().unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0]["user_name"], "Asha");
    assert_eq!(reports[0]["location"]["latitude"], 12.9716);
    assert_eq!(reports[0]["comment_count"], 0);
}

#[tokio::test]
async fn test_like_toggle_round_trip() {
    let (app, _) = spawn_app().await;
    let id = upload_report(&app).await;

    let like = serde_json::json!({ "user_identifier": "device-42" });

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/api/images/{id}/like"),
            like.clone(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["likes"], 1);
    assert_eq!(json["data"]["is_liked"], true);

    // Second identical toggle restores the original state.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/api/images/{id}/like"),
            like,
        ))
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(json["data"]["likes"], 0);
    assert_eq!(json["data"]["is_liked"], false);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/images/99999/like",
            serde_json::json!({ "user_identifier": "device-42" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .oneshot(json_request(
            "POST",
            &format!("/api/images/{id}/like"),
            serde_json::json!({ "user_identifier": "  " }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_comment_flow_and_pagination() {
    let (app, _) = spawn_app().await;
    let id = upload_report(&app).await;

    // Rejected: empty comment body.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/api/images/{id}/comment"),
            serde_json::json!({ "user_name": "Ravi", "comment": "  " }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let mut first_comment_id = String::new();
    for i in 0..12 {
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                &format!("/api/images/{id}/comment"),
                serde_json::json!({
                    "user_name": "Ravi",
                    "user_area": "HSR Layout",
                    "comment": format!("comment number {i}"),
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        if i == 0 {
            first_comment_id = json["data"]["id"].as_str().unwrap().to_string();
        }
    }

    // Page 1 of 5.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/api/images/{id}/comments?page=1&limit=5"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["comments"].as_array().unwrap().len(), 5);
    assert_eq!(json["data"]["has_more"], true);
    assert_eq!(json["data"]["total_comments"], 12);
    assert_eq!(json["data"]["total_pages"], 3);
    // Stored order is oldest first.
    assert_eq!(json["data"]["comments"][0]["comment"], "comment number 0");

    // Page 3 holds the remaining two.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/api/images/{id}/comments?page=3&limit=5"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(json["data"]["comments"].as_array().unwrap().len(), 2);
    assert_eq!(json["data"]["has_more"], false);

    // Non-positive pagination input is rejected.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/api/images/{id}/comments?page=0&limit=5"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Comment like toggles and returns to zero.
    let like = serde_json::json!({ "user_identifier": "device-42" });
    let uri = format!("/api/images/{id}/comments/{first_comment_id}/like");

    let response = app
        .clone()
        .oneshot(json_request("POST", &uri, like.clone()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["likes"], 1);

    let response = app
        .clone()
        .oneshot(json_request("POST", &uri, like.clone()))
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(json["data"]["likes"], 0);

    let response = app
        .oneshot(json_request(
            "POST",
            &format!("/api/images/{id}/comments/not-a-comment/like"),
            like,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_attach_analysis() {
    let (app, _) = spawn_app().await;
    let id = upload_report(&app).await;

    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/api/images/{id}/analysis"),
            serde_json::json!({
                "analysis": "Severe pothole with standing water.",
                "safety_score": "Danger",
                "safety_percentage": 10,
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["safety_score"], "Danger");
    assert_eq!(json["data"]["safety_percentage"], 10);
    assert!(json["data"]["analyzed_at"].is_string());

    // Unknown safety level is rejected.
    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/api/images/{id}/analysis"),
            serde_json::json!({ "analysis": "text", "safety_score": "Catastrophic" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(json_request(
            "PUT",
            "/api/images/99999/analysis",
            serde_json::json!({ "analysis": "text", "safety_score": "Safe" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_gemini_analyze_rejects_bad_input() {
    let (app, _) = spawn_app().await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/gemini/analyze",
            serde_json::json!({ "image_url": "" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/gemini/analyze",
            serde_json::json!({ "image_url": "not a url" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_admin_login_flow() {
    let (app, mailer) = spawn_app().await;

    let email = serde_json::json!({ "email": "a@x.com" });

    let response = app
        .clone()
        .oneshot(json_request("POST", "/api/admin/register", email.clone()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    // Duplicate registration conflicts with a plain 400.
    let response = app
        .clone()
        .oneshot(json_request("POST", "/api/admin/register", email.clone()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/admin/request-code",
            email.clone(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Wrong code fails with the generic message.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/admin/verify-code",
            serde_json::json!({ "email": "a@x.com", "code": "000000" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["message"], "Invalid or expired verification code");

    // The emailed code succeeds.
    let code = mailer.last_code();
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/admin/verify-code",
            serde_json::json!({ "email": "a@x.com", "code": code }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let token = json["data"]["session_token"].as_str().unwrap().to_string();
    assert_eq!(token.len(), 64);
    assert_eq!(json["data"]["is_verified"], true);

    // The consumed code cannot be replayed.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/admin/verify-code",
            serde_json::json!({ "email": "a@x.com", "code": code }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Profile resolves from the Bearer token.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/admin/profile")
                .header("Authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["email"], "a@x.com");

    // No token, no profile.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/admin/profile")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Bulk analysis is reachable with the token; nothing is pending.
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/admin/analyze-all")
                .header("Authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["analyzed"], 0);
    assert_eq!(json["data"]["failed"], 0);
}

#[tokio::test]
async fn test_admin_request_code_requires_registration() {
    let (app, _) = spawn_app().await;

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/admin/request-code",
            serde_json::json!({ "email": "ghost@x.com" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
