use chrono::{Duration, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use thiserror::Error;

/// Cache key for the subscription snapshot.
pub const SUBSCRIPTIONS_KEY: &str = "subscriptions";
/// Cache key for the video snapshot.
pub const VIDEOS_KEY: &str = "videos";
/// Cache key for the category document mirror.
pub const CATEGORIES_KEY: &str = "categories";

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache database error: {0}")]
    Db(#[from] sqlx::Error),

    #[error("Cache encode error: {0}")]
    Encode(#[from] serde_json::Error),
}

// ============================================================================
// Cache Store
// ============================================================================

/// SQLite-backed key/value cache with per-entry expiry.
///
/// Entries carry an optional absolute expiry; `None` means "never expires".
/// Eviction is lazy: a read past expiry deletes the row and reports absent,
/// so a stale payload is never returned. Callers treat write failures as a
/// durability degradation, not an error — log and continue.
#[derive(Clone)]
pub struct CacheStore {
    pub(crate) pool: SqlitePool,
}

impl CacheStore {
    /// Open the cache database (`:memory:` in tests) and run migrations.
    pub async fn open(path: &str) -> Result<Self, CacheError> {
        let url = format!("sqlite:{}?mode=rwc", path);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&url)
            .await?;
        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> Result<(), CacheError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS cache (
                key TEXT PRIMARY KEY,
                payload TEXT NOT NULL,
                expires_at INTEGER
            )
        "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Read an entry, lazily evicting it if expired.
    pub async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let row: Option<(String, Option<i64>)> =
            sqlx::query_as("SELECT payload, expires_at FROM cache WHERE key = ?")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;

        let Some((payload, expires_at)) = row else {
            return Ok(None);
        };

        if let Some(expiry) = expires_at {
            if Utc::now().timestamp_millis() > expiry {
                self.remove(key).await?;
                return Ok(None);
            }
        }

        Ok(Some(payload))
    }

    /// Write an entry. `ttl = None` stores a never-expiring entry.
    pub async fn set(
        &self,
        key: &str,
        payload: &str,
        ttl: Option<Duration>,
    ) -> Result<(), CacheError> {
        let expires_at = ttl.map(|d| (Utc::now() + d).timestamp_millis());
        sqlx::query("INSERT OR REPLACE INTO cache (key, payload, expires_at) VALUES (?, ?, ?)")
            .bind(key)
            .bind(payload)
            .bind(expires_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn remove(&self, key: &str) -> Result<(), CacheError> {
        sqlx::query("DELETE FROM cache WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Typed read. A corrupt payload reads as absent (logged), never as an
    /// error — the cache is disposable.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError> {
        let Some(payload) = self.get(key).await? else {
            return Ok(None);
        };
        match serde_json::from_str(&payload) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Discarding corrupt cache entry");
                Ok(None)
            }
        }
    }

    /// Typed write.
    pub async fn set_json<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<Duration>,
    ) -> Result<(), CacheError> {
        let payload = serde_json::to_string(value)?;
        self.set(key, &payload, ttl).await
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_store() -> CacheStore {
        CacheStore::open(":memory:").await.unwrap()
    }

    #[tokio::test]
    async fn test_set_get_round_trip() {
        let store = test_store().await;
        store.set("k", "payload", None).await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("payload"));
    }

    #[tokio::test]
    async fn test_missing_key_is_absent() {
        let store = test_store().await;
        assert!(store.get("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_expired_entry_is_evicted_on_read() {
        let store = test_store().await;

        // Insert directly with an expiry in the past.
        sqlx::query("INSERT INTO cache (key, payload, expires_at) VALUES ('k', 'old', ?)")
            .bind(Utc::now().timestamp_millis() - 1000)
            .execute(&store.pool)
            .await
            .unwrap();

        assert!(store.get("k").await.unwrap().is_none());

        // The read deleted the row, not just filtered it.
        let row: Option<(String,)> = sqlx::query_as("SELECT payload FROM cache WHERE key = 'k'")
            .fetch_optional(&store.pool)
            .await
            .unwrap();
        assert!(row.is_none());
    }

    #[tokio::test]
    async fn test_no_expiry_never_expires() {
        let store = test_store().await;
        store.set("k", "forever", None).await.unwrap();

        let row: Option<(Option<i64>,)> =
            sqlx::query_as("SELECT expires_at FROM cache WHERE key = 'k'")
                .fetch_optional(&store.pool)
                .await
                .unwrap();
        assert_eq!(row.unwrap().0, None);
        assert!(store.get("k").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_set_replaces_existing() {
        let store = test_store().await;
        store.set("k", "one", None).await.unwrap();
        store.set("k", "two", Some(Duration::hours(1))).await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("two"));
    }

    #[tokio::test]
    async fn test_corrupt_json_reads_as_absent() {
        let store = test_store().await;
        store.set("k", "{not json", None).await.unwrap();
        let value: Option<Vec<String>> = store.get_json("k").await.unwrap();
        assert!(value.is_none());
    }

    #[tokio::test]
    async fn test_json_round_trip() {
        let store = test_store().await;
        let value = vec!["a".to_string(), "b".to_string()];
        store.set_json("k", &value, None).await.unwrap();
        let back: Option<Vec<String>> = store.get_json("k").await.unwrap();
        assert_eq!(back.unwrap(), value);
    }

    #[tokio::test]
    async fn test_remove() {
        let store = test_store().await;
        store.set("k", "v", None).await.unwrap();
        store.remove("k").await.unwrap();
        assert!(store.get("k").await.unwrap().is_none());
    }
}
