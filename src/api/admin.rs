use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::models::Subscriber;

use super::{ApiError, AppState};

#[derive(Debug, Deserialize)]
pub struct AdminQuery {
    pub token: Option<String>,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/admin/subscribers", get(list_subscribers))
}

/// GET /admin/subscribers?token=... - every stored subscriber record
#[tracing::instrument(name = "Listing subscribers", skip_all)]
async fn list_subscribers(
    State(state): State<AppState>,
    Query(query): Query<AdminQuery>,
) -> Result<Json<Vec<Subscriber>>, ApiError> {
    let authorized = match (&state.admin_token, &query.token) {
        (Some(expected), Some(given)) => constant_time_eq(expected.as_bytes(), given.as_bytes()),
        _ => false,
    };
    if !authorized {
        tracing::warn!("Rejected admin request with a bad token");
        return Err(ApiError::Unauthorized);
    }

    let subscribers = state.store.list_all().await?;
    tracing::info!("Returning {} subscribers", subscribers.len());
    Ok(Json(subscribers))
}

/// Compare without short-circuiting on the first differing byte.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
