#![allow(async_fn_in_trait)]

use crate::error::StorageResult;
use crate::models::Setting;
use crate::transaction;
use serde_json::Value;
use sqlx::SqlitePool;
use tracing::debug;

/// Key/value settings with JSON values
pub trait SettingRepository: Send + Sync {
    /// Read a setting; a missing key is `None`
    async fn get(&self, key: &str) -> StorageResult<Option<Value>>;

    /// Insert or overwrite a setting
    async fn save(&self, key: &str, value: &Value) -> StorageResult<()>;

    async fn delete(&self, key: &str) -> StorageResult<()>;

    /// Every setting, ordered by key
    async fn all(&self) -> StorageResult<Vec<Setting>>;
}

#[derive(Debug, Clone)]
pub struct SqliteSettingRepository {
    pool: SqlitePool,
}

impl SqliteSettingRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl SettingRepository for SqliteSettingRepository {
    async fn get(&self, key: &str) -> StorageResult<Option<Value>> {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some((raw,)) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, key: &str, value: &Value) -> StorageResult<()> {
        let mut tx = self.pool.begin().await?;
        transaction::upsert_setting(&mut tx, key, value).await?;
        tx.commit().await?;

        debug!(key, "Setting saved");
        Ok(())
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        sqlx::query("DELETE FROM settings WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn all(&self) -> StorageResult<Vec<Setting>> {
        let rows: Vec<(String, String)> =
            sqlx::query_as("SELECT key, value FROM settings ORDER BY key")
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter()
            .map(|(key, raw)| -> StorageResult<Setting> {
                Ok(Setting::new(key, serde_json::from_str::<Value>(&raw)?))
            })
            .collect()
    }
}
