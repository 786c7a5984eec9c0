use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Html,
    routing::get,
    Router,
};
use serde::Deserialize;

use crate::digest::escape_html;
use crate::validation::normalize_email;

use super::AppState;

#[derive(Debug, Deserialize)]
pub struct UnsubscribeQuery {
    pub email: Option<String>,
    pub token: Option<String>,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/unsubscribe", get(unsubscribe))
}

/// GET /unsubscribe?email=...&token=...
///
/// The reply is the same whether or not a record matched; only the log
/// tells the two apart.
#[tracing::instrument(name = "Unsubscribing", skip_all)]
async fn unsubscribe(
    State(state): State<AppState>,
    Query(query): Query<UnsubscribeQuery>,
) -> (StatusCode, Html<String>) {
    let email = query.email.as_deref().map(normalize_email).unwrap_or_default();
    let token = query.token.as_deref().map(str::trim).unwrap_or_default();
    if email.is_empty() || token.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Html("Invalid unsubscribe link.".to_string()),
        );
    }

    match state.store.remove(&email, token).await {
        Ok(true) => tracing::info!("Removed subscriber {}", email),
        Ok(false) => tracing::info!("No subscriber matched unsubscribe request for {}", email),
        Err(e) => {
            tracing::error!("Failed to unsubscribe {}: {}", email, e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html("Something went wrong, please try again later.".to_string()),
            );
        }
    }

    (
        StatusCode::OK,
        Html(format!("You have been unsubscribed: {}", escape_html(&email))),
    )
}
