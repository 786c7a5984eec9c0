use std::net::SocketAddr;

use axum::{
    extract::{rejection::JsonRejection, ConnectInfo, State},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::models::Subscriber;
use crate::validation::{is_valid_email, is_valid_name, normalize_email};

use super::{ApiError, AppState};

const CONFIRMATION_SUBJECT: &str = "M&A Newsletter Subscription Confirmation";

#[derive(Debug, Deserialize)]
pub struct SubscribeRequest {
    pub email: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubscribeResponse {
    pub message: String,
    pub email: String,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/subscribe", post(subscribe))
}

/// POST /api/subscribe - body `{email, name}`
#[tracing::instrument(
    name = "Adding a new subscriber",
    skip_all,
    fields(client = %addr.ip())
)]
async fn subscribe(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    payload: Result<Json<SubscribeRequest>, JsonRejection>,
) -> Result<Json<SubscribeResponse>, ApiError> {
    state.limiter.check(&addr.ip()).inspect_err(|limited| {
        tracing::warn!("Rate limited subscribe from {}: {}", addr.ip(), limited);
    })?;

    let Json(payload) = payload.map_err(|e| ApiError::Validation(e.body_text()))?;

    let email = payload.email.as_deref().map(normalize_email).unwrap_or_default();
    let name = payload.name.as_deref().map(str::trim).unwrap_or_default();

    if email.is_empty() || name.is_empty() {
        return Err(ApiError::Validation("Email and name are required".to_string()));
    }
    if !is_valid_email(&email) {
        return Err(ApiError::Validation("Invalid email address".to_string()));
    }
    if !is_valid_name(name) {
        return Err(ApiError::Validation("Invalid name".to_string()));
    }

    // Check-then-insert; a concurrent duplicate still fails on insert.
    if state.store.find_by_email(&email).await?.is_some() {
        return Err(ApiError::Conflict);
    }

    let subscriber = Subscriber::new(email, name);
    state.store.insert(&subscriber).await?;
    tracing::info!("New subscriber saved");

    send_confirmation(&state, &subscriber);

    Ok(Json(SubscribeResponse {
        message: "Successfully subscribed".to_string(),
        email: subscriber.email,
    }))
}

/// Fire-and-forget; a failure is logged and never reaches the client.
fn send_confirmation(state: &AppState, subscriber: &Subscriber) {
    let Some(mailer) = state.mailer.clone() else {
        tracing::info!("No email provider configured, skipping confirmation email");
        return;
    };

    let html = state
        .composer
        .render_confirmation(&subscriber.email, &subscriber.unsubscribe_token);
    let message = mailer.message(&subscriber.email, CONFIRMATION_SUBJECT, html);

    tokio::spawn(async move {
        if let Err(e) = mailer.send_email(&message).await {
            tracing::warn!("Error sending confirmation email: {}", e);
        }
    });
}
