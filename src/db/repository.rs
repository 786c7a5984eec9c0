use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};
use tokio_rusqlite::Connection;

use crate::error::{AppError, Result};
use crate::models::Subscriber;
use crate::validation::normalize_email;

use super::schema::SCHEMA;
use super::SubscriberStore;

const SELECT_COLUMNS: &str =
    "SELECT email, name, subscribed_at, unsubscribe_token, unsubscribed FROM subscribers";

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub async fn new(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path).await?;
        Self::with_connection(conn).await
    }

    pub async fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().await?;
        Self::with_connection(conn).await
    }

    async fn with_connection(conn: Connection) -> Result<Self> {
        conn.call(|conn| {
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
        .await?;

        Ok(Self { conn })
    }

    async fn query_subscribers(&self, sql: String) -> Result<Vec<Subscriber>> {
        let subscribers = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&sql)?;
                let subscribers = stmt
                    .query_map([], subscriber_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(subscribers)
            })
            .await?;
        Ok(subscribers)
    }
}

#[async_trait]
impl SubscriberStore for SqliteStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Subscriber>> {
        let email = normalize_email(email);
        let subscriber = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&format!("{} WHERE email = ?1", SELECT_COLUMNS))?;
                let subscriber = stmt
                    .query_row(params![email], subscriber_from_row)
                    .optional()?;
                Ok(subscriber)
            })
            .await?;
        Ok(subscriber)
    }

    async fn insert(&self, subscriber: &Subscriber) -> Result<()> {
        let record = subscriber.clone();
        let inserted = self
            .conn
            .call(move |conn| {
                let rows = conn.execute(
                    r#"INSERT INTO subscribers (email, name, subscribed_at, unsubscribe_token, unsubscribed)
                       VALUES (?1, ?2, ?3, ?4, ?5)
                       ON CONFLICT DO NOTHING"#,
                    params![
                        normalize_email(&record.email),
                        record.name,
                        record.subscribed_at.to_rfc3339(),
                        record.unsubscribe_token,
                        record.unsubscribed,
                    ],
                )?;
                Ok(rows > 0)
            })
            .await?;

        if inserted {
            Ok(())
        } else {
            Err(AppError::DuplicateSubscriber(subscriber.email.clone()))
        }
    }

    async fn list_all(&self) -> Result<Vec<Subscriber>> {
        self.query_subscribers(format!("{} ORDER BY id", SELECT_COLUMNS))
            .await
    }

    async fn active_subscribers(&self) -> Result<Vec<Subscriber>> {
        self.query_subscribers(format!("{} WHERE unsubscribed = 0 ORDER BY id", SELECT_COLUMNS))
            .await
    }

    async fn remove(&self, email: &str, token: &str) -> Result<bool> {
        let email = normalize_email(email);
        let token = token.to_string();
        let removed = self
            .conn
            .call(move |conn| {
                let rows = conn.execute(
                    "DELETE FROM subscribers WHERE email = ?1 AND unsubscribe_token = ?2",
                    params![email, token],
                )?;
                Ok(rows > 0)
            })
            .await?;
        Ok(removed)
    }
}

fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    // Try RFC3339 first (e.g., "2026-01-11T12:34:56+00:00")
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    // Try SQLite datetime format (e.g., "2026-01-11 12:34:56")
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    None
}

fn subscriber_from_row(row: &Row) -> rusqlite::Result<Subscriber> {
    Ok(Subscriber {
        email: row.get(0)?,
        name: row.get(1)?,
        subscribed_at: row
            .get::<_, String>(2)
            .ok()
            .and_then(|s| parse_datetime(&s))
            .unwrap_or_else(Utc::now),
        unsubscribe_token: row.get(3)?,
        unsubscribed: row.get(4)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_and_find() {
        let store = SqliteStore::open_in_memory().await.unwrap();
        let subscriber = Subscriber::new("ursula@example.com", "Ursula");
        store.insert(&subscriber).await.unwrap();

        let found = store.find_by_email("ursula@example.com").await.unwrap().unwrap();
        assert_eq!(found.name, "Ursula");
        assert_eq!(found.unsubscribe_token, subscriber.unsubscribe_token);
        assert!(store.find_by_email("other@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_is_rejected() {
        let store = SqliteStore::open_in_memory().await.unwrap();
        store.insert(&Subscriber::new("dup@example.com", "One")).await.unwrap();

        let err = store
            .insert(&Subscriber::new("dup@example.com", "Two"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DuplicateSubscriber(_)));
        assert_eq!(store.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_email_case_variants_are_one_subscriber() {
        let store = SqliteStore::open_in_memory().await.unwrap();
        let subscriber = Subscriber::new("Mixed@Example.com", "One");
        store.insert(&subscriber).await.unwrap();

        let err = store
            .insert(&Subscriber::new("mixed@example.com", "Two"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DuplicateSubscriber(_)));

        let found = store.find_by_email("MIXED@example.COM").await.unwrap().unwrap();
        assert_eq!(found.email, "mixed@example.com");

        assert!(store
            .remove("Mixed@Example.com", &subscriber.unsubscribe_token)
            .await
            .unwrap());
        assert!(store.active_subscribers().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_remove_requires_matching_token() {
        let store = SqliteStore::open_in_memory().await.unwrap();
        let subscriber = Subscriber::new("bye@example.com", "Bye");
        store.insert(&subscriber).await.unwrap();

        assert!(!store.remove("bye@example.com", "wrong-token").await.unwrap());
        assert_eq!(store.list_all().await.unwrap().len(), 1);

        assert!(store
            .remove("bye@example.com", &subscriber.unsubscribe_token)
            .await
            .unwrap());
        assert!(store.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_active_subscribers_skip_flagged_rows() {
        let store = SqliteStore::open_in_memory().await.unwrap();
        store.insert(&Subscriber::new("a@example.com", "A")).await.unwrap();
        let mut gone = Subscriber::new("b@example.com", "B");
        gone.unsubscribed = true;
        store.insert(&gone).await.unwrap();

        let active = store.active_subscribers().await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].email, "a@example.com");
    }

    #[test]
    fn test_parse_datetime_formats() {
        assert!(parse_datetime("2026-01-11T12:34:56+00:00").is_some());
        assert!(parse_datetime("2026-01-11 12:34:56").is_some());
        assert!(parse_datetime("yesterday").is_none());
    }
}
