use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscriber {
    pub email: String,
    pub name: String,
    pub subscribed_at: DateTime<Utc>,
    pub unsubscribe_token: String,
    #[serde(default)]
    pub unsubscribed: bool,
}

impl Subscriber {
    /// Build a fresh record with a random unsubscribe token.
    pub fn new(email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: name.into(),
            subscribed_at: Utc::now(),
            unsubscribe_token: Uuid::new_v4().to_string(),
            unsubscribed: false,
        }
    }
}

/// One address a digest is delivered to.
///
/// Statically configured recipients have no token and therefore no
/// unsubscribe link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    pub email: String,
    pub unsubscribe_token: Option<String>,
}

impl Recipient {
    pub fn fixed(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            unsubscribe_token: None,
        }
    }
}

impl From<&Subscriber> for Recipient {
    fn from(subscriber: &Subscriber) -> Self {
        Self {
            email: subscriber.email.clone(),
            unsubscribe_token: Some(subscriber.unsubscribe_token.clone()),
        }
    }
}
