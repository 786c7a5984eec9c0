use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};

use crate::error::{AppError, Result};
use crate::models::Subscriber;
use crate::validation::normalize_email;

use super::SubscriberStore;

const TABLE: &str = "subscribers";

/// Subscriber table hosted behind a PostgREST endpoint (Supabase).
pub struct SupabaseStore {
    client: Client,
    base_url: String,
    api_key: String,
}

impl SupabaseStore {
    pub fn new(base_url: String, api_key: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, TABLE)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    async fn select(&self, filters: &[(&str, String)]) -> Result<Vec<Subscriber>> {
        let mut query: Vec<(&str, String)> = vec![("select", "*".to_string())];
        query.extend(filters.iter().cloned());

        let response = self
            .authorized(self.client.get(self.table_url()))
            .query(&query)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Store(format!("select failed ({}): {}", status, body)));
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl SubscriberStore for SupabaseStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Subscriber>> {
        let rows = self.select(&[("email", format!("eq.{}", normalize_email(email)))]).await?;
        Ok(rows.into_iter().next())
    }

    async fn insert(&self, subscriber: &Subscriber) -> Result<()> {
        let response = self
            .authorized(self.client.post(self.table_url()))
            .header("Prefer", "return=minimal")
            .json(&Subscriber {
                email: normalize_email(&subscriber.email),
                ..subscriber.clone()
            })
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::CONFLICT => Err(AppError::DuplicateSubscriber(subscriber.email.clone())),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(AppError::Store(format!("insert failed ({}): {}", status, body)))
            }
        }
    }

    async fn list_all(&self) -> Result<Vec<Subscriber>> {
        self.select(&[("order", "subscribed_at.asc".to_string())]).await
    }

    async fn active_subscribers(&self) -> Result<Vec<Subscriber>> {
        self.select(&[
            ("unsubscribed", "is.false".to_string()),
            ("order", "subscribed_at.asc".to_string()),
        ])
        .await
    }

    async fn remove(&self, email: &str, token: &str) -> Result<bool> {
        let response = self
            .authorized(self.client.delete(self.table_url()))
            .header("Prefer", "return=representation")
            .query(&[
                ("email", format!("eq.{}", normalize_email(email))),
                ("unsubscribe_token", format!("eq.{}", token)),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Store(format!("delete failed ({}): {}", status, body)));
        }

        let deleted: Vec<Subscriber> = response.json().await?;
        Ok(!deleted.is_empty())
    }
}
