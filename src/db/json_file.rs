use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::{AppError, Result};
use crate::models::Subscriber;
use crate::validation::normalize_email;

use super::SubscriberStore;

/// Subscribers kept as a JSON array in a single file.
///
/// Every mutation is a read-modify-write under one lock, so the file is only
/// safe to share within a single process.
pub struct JsonFileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    async fn read_all(&self) -> Result<Vec<Subscriber>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(Vec::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_all(&self, subscribers: &[Subscriber]) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_vec_pretty(subscribers)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, content).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl SubscriberStore for JsonFileStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Subscriber>> {
        let email = normalize_email(email);
        let _guard = self.lock.lock().await;
        Ok(self
            .read_all()
            .await?
            .into_iter()
            .find(|s| normalize_email(&s.email) == email))
    }

    async fn insert(&self, subscriber: &Subscriber) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut subscribers = self.read_all().await?;
        let email = normalize_email(&subscriber.email);
        if subscribers.iter().any(|s| {
            normalize_email(&s.email) == email || s.unsubscribe_token == subscriber.unsubscribe_token
        }) {
            return Err(AppError::DuplicateSubscriber(subscriber.email.clone()));
        }
        subscribers.push(Subscriber {
            email,
            ..subscriber.clone()
        });
        self.write_all(&subscribers).await
    }

    async fn list_all(&self) -> Result<Vec<Subscriber>> {
        let _guard = self.lock.lock().await;
        self.read_all().await
    }

    async fn active_subscribers(&self) -> Result<Vec<Subscriber>> {
        let _guard = self.lock.lock().await;
        Ok(self
            .read_all()
            .await?
            .into_iter()
            .filter(|s| !s.unsubscribed)
            .collect())
    }

    async fn remove(&self, email: &str, token: &str) -> Result<bool> {
        let email = normalize_email(email);
        let _guard = self.lock.lock().await;
        let mut subscribers = self.read_all().await?;
        let before = subscribers.len();
        subscribers.retain(|s| !(normalize_email(&s.email) == email && s.unsubscribe_token == token));
        if subscribers.len() == before {
            return Ok(false);
        }
        self.write_all(&subscribers).await?;
        Ok(true)
    }
}
