//! Admin authentication flow: registration, emailed one-time codes, and
//! server-verified session tokens.

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::clients::mailer::{self, Mailer};
use crate::db::Store;
use crate::db::repositories::admin::generate_session_token;
use crate::entities::admins;
use crate::services::verification::{self, Challenge};

#[derive(Debug, Error)]
pub enum AuthFlowError {
    #[error("Admin with this email already exists")]
    Duplicate,

    #[error("Admin not found. Please register first.")]
    NotFound,

    /// Deliberately the same message for wrong and expired codes.
    #[error("Invalid or expired verification code")]
    InvalidCode,

    #[error("Invalid or expired session")]
    InvalidSession,

    #[error("Failed to send verification code. Please try again.")]
    Delivery(#[source] mailer::MailError),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<anyhow::Error> for AuthFlowError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(err.to_string())
    }
}

/// Issued on successful code verification.
#[derive(Debug, Clone)]
pub struct LoginSession {
    pub email: String,
    pub session_token: String,
    pub is_verified: bool,
    pub last_login: Option<String>,
}

pub struct AdminAuthService {
    store: Store,
    mailer: Arc<dyn Mailer>,
    code_ttl_minutes: i64,
    session_ttl_minutes: i64,
}

impl AdminAuthService {
    #[must_use]
    pub fn new(
        store: Store,
        mailer: Arc<dyn Mailer>,
        code_ttl_minutes: i64,
        session_ttl_minutes: i64,
    ) -> Self {
        Self {
            store,
            mailer,
            code_ttl_minutes,
            session_ttl_minutes,
        }
    }

    /// Creates the account and sends a best-effort welcome email; a send
    /// failure does not fail the registration.
    pub async fn register(&self, email: &str) -> Result<admins::Model, AuthFlowError> {
        let email = normalize_email(email);

        if self.store.get_admin_by_email(&email).await?.is_some() {
            return Err(AuthFlowError::Duplicate);
        }

        let admin = self.store.create_admin(&email).await?;

        if let Err(e) = self
            .mailer
            .send(&mailer::registration_confirmation_email(&email))
            .await
        {
            warn!(email = %email, error = %e, "Registration confirmation email failed to send");
        }

        info!(email = %email, "Admin registered");
        Ok(admin)
    }

    /// Generates and persists a fresh challenge, then emails the code. A
    /// prior unexpired code is always overwritten. A delivery failure is
    /// reported to the caller; the stored challenge remains.
    pub async fn request_code(&self, email: &str) -> Result<(), AuthFlowError> {
        let email = normalize_email(email);

        let Some(admin) = self.store.get_admin_by_email(&email).await? else {
            return Err(AuthFlowError::NotFound);
        };

        let challenge = verification::generate_challenge(Utc::now(), self.code_ttl_minutes);
        self.store
            .store_admin_challenge(admin, &challenge.code, &challenge.expires_at.to_rfc3339())
            .await?;

        self.mailer
            .send(&mailer::verification_code_email(&email, &challenge.code))
            .await
            .map_err(AuthFlowError::Delivery)?;

        info!(email = %email, "Verification code sent");
        Ok(())
    }

    /// Identical to [`Self::request_code`]: always issues a fresh code.
    pub async fn resend_code(&self, email: &str) -> Result<(), AuthFlowError> {
        self.request_code(email).await
    }

    /// Verifies the code; on success the challenge is consumed and a
    /// session token issued.
    pub async fn verify_code(&self, email: &str, code: &str) -> Result<LoginSession, AuthFlowError> {
        let email = normalize_email(email);

        let Some(admin) = self.store.get_admin_by_email(&email).await? else {
            return Err(AuthFlowError::NotFound);
        };

        let challenge = stored_challenge(&admin);
        if !verification::verify(challenge.as_ref(), code, Utc::now()) {
            return Err(AuthFlowError::InvalidCode);
        }

        let token = generate_session_token();
        let expires_at = Utc::now() + Duration::minutes(self.session_ttl_minutes);

        self.store
            .complete_admin_login(admin, &token, &expires_at.to_rfc3339())
            .await?;

        // Re-read for the stamped login time.
        let admin = self
            .store
            .get_admin_by_email(&email)
            .await?
            .ok_or(AuthFlowError::NotFound)?;

        info!(email = %email, "Admin login successful");

        Ok(LoginSession {
            email: admin.email,
            session_token: token,
            is_verified: admin.is_verified,
            last_login: admin.last_login,
        })
    }

    /// Resolves an admin from a Bearer session token, rejecting unknown
    /// and expired tokens alike.
    pub async fn profile_by_token(&self, token: &str) -> Result<admins::Model, AuthFlowError> {
        let Some(admin) = self.store.get_admin_by_session_token(token).await? else {
            return Err(AuthFlowError::InvalidSession);
        };

        let expires_at = admin
            .session_expires_at
            .as_deref()
            .and_then(parse_timestamp);

        match expires_at {
            Some(expiry) if Utc::now() <= expiry => Ok(admin),
            _ => Err(AuthFlowError::InvalidSession),
        }
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn stored_challenge(admin: &admins::Model) -> Option<Challenge> {
    let code = admin.verification_code.clone()?;
    let expires_at = parse_timestamp(admin.code_expires_at.as_deref()?)?;
    Some(Challenge { code, expires_at })
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::mailer::{DeliveryReceipt, MailError, OutboundEmail};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Captures outbound mail instead of delivering it.
    struct RecordingMailer {
        sent: Mutex<Vec<OutboundEmail>>,
    }

    impl RecordingMailer {
        fn new() -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
            }
        }

        fn sent_count(&self) -> usize {
            self.sent.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, message: &OutboundEmail) -> Result<DeliveryReceipt, MailError> {
            self.sent.lock().unwrap().push(message.clone());
            Ok(DeliveryReceipt {
                message_id: "recorded".to_string(),
            })
        }
    }

    async fn service_with_mailer() -> (AdminAuthService, Arc<RecordingMailer>) {
        let store = Store::new("sqlite::memory:").await.unwrap();
        let mailer = Arc::new(RecordingMailer::new());
        (
            AdminAuthService::new(store, mailer.clone(), 10, 60),
            mailer,
        )
    }

    #[tokio::test]
    async fn test_register_then_duplicate_conflicts() {
        let (service, mailer) = service_with_mailer().await;

        let admin = service.register("A@X.com").await.unwrap();
        assert_eq!(admin.email, "a@x.com");
        assert!(!admin.is_verified);
        assert_eq!(mailer.sent_count(), 1);

        let err = service.register("a@x.com ").await.unwrap_err();
        assert!(matches!(err, AuthFlowError::Duplicate));
    }

    #[tokio::test]
    async fn test_request_code_requires_account() {
        let (service, _) = service_with_mailer().await;
        let err = service.request_code("ghost@x.com").await.unwrap_err();
        assert!(matches!(err, AuthFlowError::NotFound));
    }

    #[tokio::test]
    async fn test_full_login_flow() {
        let (service, mailer) = service_with_mailer().await;

        service.register("a@x.com").await.unwrap();
        service.request_code("a@x.com").await.unwrap();

        // Code email went out on top of the welcome mail.
        assert_eq!(mailer.sent_count(), 2);

        let stored = service
            .store
            .get_admin_by_email("a@x.com")
            .await
            .unwrap()
            .unwrap();
        let code = stored.verification_code.clone().unwrap();
        assert_eq!(code.len(), 6);

        let err = service.verify_code("a@x.com", "000000").await.unwrap_err();
        assert!(matches!(err, AuthFlowError::InvalidCode));

        let session = service.verify_code("a@x.com", &code).await.unwrap();
        assert_eq!(session.session_token.len(), 64);
        assert!(session.is_verified);
        assert!(session.last_login.is_some());

        // The challenge was consumed; replaying the same code fails.
        let err = service.verify_code("a@x.com", &code).await.unwrap_err();
        assert!(matches!(err, AuthFlowError::InvalidCode));

        // The issued token resolves the profile.
        let profile = service
            .profile_by_token(&session.session_token)
            .await
            .unwrap();
        assert_eq!(profile.email, "a@x.com");
    }

    #[tokio::test]
    async fn test_resend_overwrites_previous_code() {
        let (service, _) = service_with_mailer().await;

        service.register("a@x.com").await.unwrap();
        service.request_code("a@x.com").await.unwrap();

        let first = service
            .store
            .get_admin_by_email("a@x.com")
            .await
            .unwrap()
            .unwrap()
            .verification_code
            .unwrap();

        // Resend until the code actually differs; a collision is possible
        // but vanishingly unlikely twice in a row.
        service.resend_code("a@x.com").await.unwrap();
        let second = service
            .store
            .get_admin_by_email("a@x.com")
            .await
            .unwrap()
            .unwrap()
            .verification_code
            .unwrap();

        if first == second {
            service.resend_code("a@x.com").await.unwrap();
        }

        // Only the stored (latest) code verifies.
        let stored = service
            .store
            .get_admin_by_email("a@x.com")
            .await
            .unwrap()
            .unwrap()
            .verification_code
            .unwrap();
        assert!(service.verify_code("a@x.com", &stored).await.is_ok());
    }

    #[tokio::test]
    async fn test_profile_rejects_unknown_token() {
        let (service, _) = service_with_mailer().await;
        let err = service.profile_by_token("deadbeef").await.unwrap_err();
        assert!(matches!(err, AuthFlowError::InvalidSession));
    }
}
