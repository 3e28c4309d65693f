use anyhow::{Context, Result};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

use crate::entities::admins;

pub struct AdminRepository {
    conn: DatabaseConnection,
}

impl AdminRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Creates an account for an already-normalized (lowercased, trimmed)
    /// email. Uniqueness is enforced by the schema; callers check for an
    /// existing account first to produce a friendly conflict error.
    pub async fn create(&self, email: &str) -> Result<admins::Model> {
        let now = chrono::Utc::now().to_rfc3339();

        let admin = admins::ActiveModel {
            email: Set(email.to_string()),
            is_verified: Set(false),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        admin
            .insert(&self.conn)
            .await
            .context("Failed to insert admin account")
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Option<admins::Model>> {
        admins::Entity::find()
            .filter(admins::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("Failed to query admin by email")
    }

    pub async fn get_by_session_token(&self, token: &str) -> Result<Option<admins::Model>> {
        admins::Entity::find()
            .filter(admins::Column::SessionToken.eq(token))
            .one(&self.conn)
            .await
            .context("Failed to query admin by session token")
    }

    /// Replaces the account's challenge wholesale.
    pub async fn store_challenge(
        &self,
        admin: admins::Model,
        code: &str,
        expires_at: &str,
    ) -> Result<()> {
        let now = chrono::Utc::now().to_rfc3339();

        let mut active: admins::ActiveModel = admin.into();
        active.verification_code = Set(Some(code.to_string()));
        active.code_expires_at = Set(Some(expires_at.to_string()));
        active.updated_at = Set(now);
        active.update(&self.conn).await?;

        Ok(())
    }

    /// Clears the challenge, marks the account verified, stamps the login
    /// time, and stores the new session token.
    pub async fn complete_login(
        &self,
        admin: admins::Model,
        session_token: &str,
        session_expires_at: &str,
    ) -> Result<()> {
        let now = chrono::Utc::now().to_rfc3339();

        let mut active: admins::ActiveModel = admin.into();
        active.verification_code = Set(None);
        active.code_expires_at = Set(None);
        active.is_verified = Set(true);
        active.last_login = Set(Some(now.clone()));
        active.session_token = Set(Some(session_token.to_string()));
        active.session_expires_at = Set(Some(session_expires_at.to_string()));
        active.updated_at = Set(now);
        active.update(&self.conn).await?;

        Ok(())
    }
}

/// Generate a random session token (64 character hex string)
#[must_use]
pub fn generate_session_token() -> String {
    use rand::Rng;

    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();

    bytes.iter().fold(String::with_capacity(64), |mut acc, b| {
        use std::fmt::Write;
        let _ = write!(acc, "{b:02x}");
        acc
    })
}

#[cfg(test)]
mod tests {
    use super::generate_session_token;

    #[test]
    fn test_session_token_shape() {
        let token = generate_session_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(token, generate_session_token());
    }
}
