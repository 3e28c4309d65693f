use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::config::EmailConfig;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("Email delivery failed: {0}")]
    Delivery(String),

    #[error("Email delivery timed out")]
    Timeout,
}

/// A rendered message ready for the transport.
#[derive(Debug, Clone)]
pub struct OutboundEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct DeliveryReceipt {
    pub message_id: String,
}

/// Outbound email transport seam.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &OutboundEmail) -> Result<DeliveryReceipt, MailError>;
}

#[derive(Serialize)]
struct SendRequest<'a> {
    from: FromAddress<'a>,
    to: &'a str,
    subject: &'a str,
    html: &'a str,
    text: &'a str,
}

#[derive(Serialize)]
struct FromAddress<'a> {
    email: &'a str,
    name: &'a str,
}

#[derive(Deserialize)]
struct SendResponse {
    #[serde(default)]
    message_id: Option<String>,
}

/// Transactional-mail HTTP API transport with a bounded send timeout.
pub struct HttpMailer {
    client: Client,
    config: EmailConfig,
}

impl HttpMailer {
    #[must_use]
    pub const fn with_shared_client(client: Client, config: EmailConfig) -> Self {
        Self { client, config }
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, message: &OutboundEmail) -> Result<DeliveryReceipt, MailError> {
        let request_body = SendRequest {
            from: FromAddress {
                email: &self.config.from_address,
                name: &self.config.from_name,
            },
            to: &message.to,
            subject: &message.subject,
            html: &message.html,
            text: &message.text,
        };

        let send = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&request_body)
            .send();

        let response = tokio::time::timeout(
            Duration::from_secs(self.config.send_timeout_seconds),
            send,
        )
        .await
        .map_err(|_| MailError::Timeout)?
        .map_err(|e| MailError::Delivery(e.to_string()))?
        .error_for_status()
        .map_err(|e| MailError::Delivery(e.to_string()))?;

        let receipt: SendResponse = response
            .json()
            .await
            .unwrap_or(SendResponse { message_id: None });

        Ok(DeliveryReceipt {
            message_id: receipt.message_id.unwrap_or_default(),
        })
    }
}

/// Verification-code message, HTML plus plain text.
#[must_use]
pub fn verification_code_email(to: &str, code: &str) -> OutboundEmail {
    OutboundEmail {
        to: to.to_string(),
        subject: "Your Admin Login Verification Code".to_string(),
        html: format!(
            "<div style=\"font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;\">\
             <h2>Admin Login Verification</h2>\
             <p>Your verification code is:</p>\
             <h1 style=\"letter-spacing: 3px;\">{code}</h1>\
             <p>This code will expire in <strong>10 minutes</strong>.</p>\
             <p>If you didn't request this code, please ignore this email.</p>\
             </div>"
        ),
        text: format!("Admin Login Verification Code: {code}\n\nThis code will expire in 10 minutes."),
    }
}

/// Welcome message sent best-effort after registration.
#[must_use]
pub fn registration_confirmation_email(to: &str) -> OutboundEmail {
    OutboundEmail {
        to: to.to_string(),
        subject: "Welcome to CivicWatch - Registration Successful".to_string(),
        html: format!(
            "<div style=\"font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;\">\
             <h1>Welcome to CivicWatch!</h1>\
             <p>Your admin account has been successfully created.</p>\
             <p><strong>Email:</strong> {to}</p>\
             <p>Use the \"Request Code\" feature to get verification codes when logging in.</p>\
             </div>"
        ),
        text: format!(
            "Welcome to CivicWatch!\n\nYour admin account ({to}) has been successfully created.\n\
             Use the \"Request Code\" feature to get verification codes when logging in."
        ),
    }
}
