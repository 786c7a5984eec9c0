mod json_file;
mod repository;
mod schema;
mod supabase;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{Config, StoreKind};
use crate::error::{AppError, Result};
use crate::models::Subscriber;

pub use json_file::JsonFileStore;
pub use repository::SqliteStore;
pub use supabase::SupabaseStore;

/// Persistence for subscriber records.
///
/// Email is the unique key. `insert` fails with
/// [`AppError::DuplicateSubscriber`] when the address is already stored.
#[async_trait]
pub trait SubscriberStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<Subscriber>>;

    async fn insert(&self, subscriber: &Subscriber) -> Result<()>;

    async fn list_all(&self) -> Result<Vec<Subscriber>>;

    /// Subscribers whose `unsubscribed` flag is clear, oldest first.
    async fn active_subscribers(&self) -> Result<Vec<Subscriber>>;

    /// Delete the record only if both email and token match.
    /// Returns whether a record was removed.
    async fn remove(&self, email: &str, token: &str) -> Result<bool>;
}

/// Open the backend selected in the configuration.
pub async fn open_store(config: &Config) -> Result<Arc<dyn SubscriberStore>> {
    let store: Arc<dyn SubscriberStore> = match config.store {
        StoreKind::Sqlite => {
            tracing::info!("Using SQLite subscriber store at {}", config.db_path);
            Arc::new(SqliteStore::new(&config.db_path).await?)
        }
        StoreKind::Json => {
            tracing::info!("Using JSON subscriber file {}", config.subscribers_file);
            Arc::new(JsonFileStore::new(&config.subscribers_file))
        }
        StoreKind::Supabase => {
            let (url, key) = match (&config.supabase_url, &config.supabase_key) {
                (Some(url), Some(key)) => (url.clone(), key.clone()),
                _ => {
                    return Err(AppError::Config(
                        "missing required variables: SUPABASE_URL, SUPABASE_KEY".to_string(),
                    ))
                }
            };
            tracing::info!("Using hosted subscriber table at {}", url);
            Arc::new(SupabaseStore::new(url, key)?)
        }
    };
    Ok(store)
}
