//! HTTP surface: subscribe, unsubscribe, admin listing and the landing page.

mod admin;
mod error;
mod health;
mod subscriptions;
mod unsubscribe;

use std::net::IpAddr;
use std::path::Path;
use std::sync::Arc;

use axum::Router;
use tower_http::services::ServeFile;
use tower_http::trace::TraceLayer;

use crate::db::SubscriberStore;
use crate::digest::DigestComposer;
use crate::services::{RateLimiter, ResendClient};

pub use error::ApiError;
pub use subscriptions::{SubscribeRequest, SubscribeResponse};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn SubscriberStore>,
    /// Absent when no email provider is configured; confirmations are skipped.
    pub mailer: Option<Arc<ResendClient>>,
    pub composer: Arc<DigestComposer>,
    pub limiter: Arc<RateLimiter<IpAddr>>,
    pub admin_token: Option<Arc<str>>,
}

/// Build the full router. `static_dir` must contain `index.html`.
pub fn router(state: AppState, static_dir: &Path) -> Router {
    Router::new()
        .route_service("/", ServeFile::new(static_dir.join("index.html")))
        .merge(subscriptions::routes())
        .merge(admin::routes())
        .merge(unsubscribe::routes())
        .merge(health::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
