use std::time::Duration;

use reqwest::Client;
use serde::Serialize;

use crate::digest::NEWSLETTER_NAME;
use crate::error::{AppError, Result};

pub const DEFAULT_API_URL: &str = "https://api.resend.com";

#[derive(Debug, Clone, Serialize)]
pub struct EmailMessage {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
}

/// What the provider answered, kept for logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendReceipt {
    pub status: u16,
    pub body: String,
}

/// Client for the Resend transactional email API.
pub struct ResendClient {
    client: Client,
    api_key: String,
    api_url: String,
    sender: String,
}

impl ResendClient {
    pub fn new(api_key: String, sender: String) -> Result<Self> {
        Self::with_api_url(api_key, sender, DEFAULT_API_URL.to_string())
    }

    pub fn with_api_url(api_key: String, sender: String, api_url: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
            sender,
        })
    }

    pub fn message(&self, to: &str, subject: &str, html: String) -> EmailMessage {
        EmailMessage {
            from: format!("{} <{}>", NEWSLETTER_NAME, self.sender),
            to: vec![to.to_string()],
            subject: subject.to_string(),
            html,
        }
    }

    pub async fn send_email(&self, message: &EmailMessage) -> Result<SendReceipt> {
        self.post("/emails", message).await
    }

    /// Several independent messages in one provider call.
    pub async fn send_batch(&self, messages: &[EmailMessage]) -> Result<SendReceipt> {
        self.post("/emails/batch", &messages).await
    }

    async fn post<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<SendReceipt> {
        let response = self
            .client
            .post(format!("{}{}", self.api_url, path))
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        tracing::info!("Email provider answered {} for {}", status, path);

        if !(200..300).contains(&status) {
            return Err(AppError::EmailApi { status, body });
        }

        Ok(SendReceipt { status, body })
    }
}
