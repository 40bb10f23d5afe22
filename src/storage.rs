use async_trait::async_trait;
use dashmap::DashMap;
use serde::{de::DeserializeOwned, Serialize};
use sqlx::{Pool, Sqlite};

use crate::error::QuoteError;

/// a string-keyed slot store holding JSON text.
#[async_trait]
pub trait KeyValueStore: Send + Sync + 'static {
    async fn get(&self, key: &str) -> Result<Option<String>, QuoteError>;
    async fn set(&self, key: &str, value: String) -> Result<(), QuoteError>;
    async fn remove(&self, key: &str) -> Result<bool, QuoteError>;
}

#[async_trait]
pub trait KeyValueStoreExt: KeyValueStore {
    /// reads and decodes a slot. `Ok(None)` when the slot is empty; a decode failure is
    /// `Err(QuoteError::Parse)` so callers can decide how to recover.
    async fn get_json<T: DeserializeOwned + Send>(&self, key: &str) -> Result<Option<T>, QuoteError> {
        let raw = self.get(key).await?;
        raw.map(|raw| serde_json::from_str::<T>(&raw).map_err(QuoteError::from))
            .transpose()
    }

    async fn set_json<T: Serialize + Send + Sync>(&self, key: &str, value: &T) -> Result<(), QuoteError> {
        let raw = serde_json::to_string(value)?;
        self.set(key, raw).await
    }
}

impl<T: KeyValueStore + ?Sized> KeyValueStoreExt for T {}

/// durable slots, kept in the `kv_store` table.
#[derive(Clone)]
pub struct SqliteStore {
    db: Pool<Sqlite>,
}

impl SqliteStore {
    pub fn new(db: Pool<Sqlite>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl KeyValueStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<String>, QuoteError> {
        let value: Option<String> = sqlx::query_scalar(
            r#"
                SELECT
                    value
                FROM kv_store
                WHERE key = $1;
            "#,
        )
        .bind(key)
        .fetch_optional(&self.db)
        .await
        .inspect_err(|e| tracing::error!(err = ?e, key = %key, "an error occurred when reading slot"))?;

        Ok(value)
    }

    async fn set(&self, key: &str, value: String) -> Result<(), QuoteError> {
        sqlx::query(
            r#"
                INSERT INTO
                    kv_store (key, value)
                VALUES
                    ($1, $2)
                ON CONFLICT (key)
                DO UPDATE SET
                    value = excluded.value,
                    updated_at = strftime('%Y-%m-%dT%H:%M:%SZ', 'now');
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.db)
        .await
        .inspect_err(|e| tracing::error!(err = ?e, key = %key, "an error occurred when writing slot"))?;

        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<bool, QuoteError> {
        let result = sqlx::query(
            r#"
                DELETE FROM kv_store
                WHERE key = $1;
            "#,
        )
        .bind(key)
        .execute(&self.db)
        .await
        .inspect_err(|e| tracing::error!(err = ?e, key = %key, "an error occurred when removing slot"))?;

        Ok(result.rows_affected() > 0)
    }
}

/// slots that only live as long as the process does.
#[derive(Default)]
pub struct MemoryStore {
    data: DashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, QuoteError> {
        Ok(self.data.get(key).map(|v| v.value().clone()))
    }

    async fn set(&self, key: &str, value: String) -> Result<(), QuoteError> {
        self.data.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<bool, QuoteError> {
        Ok(self.data.remove(key).is_some())
    }
}
