#![allow(async_fn_in_trait)]

use crate::error::StorageResult;
use crate::models::{Snapshot, SnapshotSummary};
use serde_json::{Map, Value};
use sqlx::SqlitePool;
use tracing::debug;

/// Persistence for the bounded ring of backup snapshots
///
/// Ring order is insertion order: the oldest snapshot has the lowest row id.
/// Snapshots are addressed by their unique timestamp string.
pub trait SnapshotRepository: Send + Sync {
    /// Summaries, oldest first
    async fn list(&self) -> StorageResult<Vec<SnapshotSummary>>;

    /// Snapshot with exactly this timestamp
    async fn find(&self, timestamp: &str) -> StorageResult<Option<Snapshot>>;

    /// Most recently appended snapshot
    async fn latest(&self) -> StorageResult<Option<Snapshot>>;

    async fn oldest_timestamp(&self) -> StorageResult<Option<String>>;

    async fn newest_timestamp(&self) -> StorageResult<Option<String>>;

    /// Append a snapshot and evict the oldest beyond `capacity`
    ///
    /// Both happen in one transaction. Returns the number evicted.
    async fn append(&self, snapshot: &Snapshot, capacity: usize) -> StorageResult<u64>;

    /// Remove a snapshot; returns `false` if none had that timestamp
    async fn delete(&self, timestamp: &str) -> StorageResult<bool>;

    async fn clear(&self) -> StorageResult<u64>;

    async fn count(&self) -> StorageResult<i64>;

    /// Backup preferences, kept apart from inventory settings
    async fn settings(&self) -> StorageResult<Map<String, Value>>;

    /// Merge `settings` into the stored ones; all keys or none are written
    async fn save_settings(&self, settings: &Map<String, Value>) -> StorageResult<()>;
}

#[derive(Debug, sqlx::FromRow)]
struct SnapshotRow {
    timestamp: String,
    version: String,
    materials_count: i64,
    movements_count: i64,
}

#[derive(Debug, Clone)]
pub struct SqliteSnapshotRepository {
    pool: SqlitePool,
}

impl SqliteSnapshotRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn timestamp_at(&self, order: &str) -> StorageResult<Option<String>> {
        let row: Option<(String,)> = sqlx::query_as(&format!(
            "SELECT timestamp FROM snapshots ORDER BY id {} LIMIT 1",
            order
        ))
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(timestamp,)| timestamp))
    }
}

impl SnapshotRepository for SqliteSnapshotRepository {
    async fn list(&self) -> StorageResult<Vec<SnapshotSummary>> {
        let rows = sqlx::query_as::<_, SnapshotRow>(
            r#"
            SELECT timestamp, version, materials_count, movements_count
            FROM snapshots
            ORDER BY id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| {
                SnapshotSummary::new(
                    &row.timestamp,
                    &row.version,
                    row.materials_count,
                    row.movements_count,
                )
            })
            .collect())
    }

    async fn find(&self, timestamp: &str) -> StorageResult<Option<Snapshot>> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT payload FROM snapshots WHERE timestamp = ?")
                .bind(timestamp)
                .fetch_optional(&self.pool)
                .await?;

        match row {
            Some((payload,)) => Ok(Some(serde_json::from_str(&payload)?)),
            None => Ok(None),
        }
    }

    async fn latest(&self) -> StorageResult<Option<Snapshot>> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT payload FROM snapshots ORDER BY id DESC LIMIT 1")
                .fetch_optional(&self.pool)
                .await?;

        match row {
            Some((payload,)) => Ok(Some(serde_json::from_str(&payload)?)),
            None => Ok(None),
        }
    }

    async fn oldest_timestamp(&self) -> StorageResult<Option<String>> {
        self.timestamp_at("ASC").await
    }

    async fn newest_timestamp(&self) -> StorageResult<Option<String>> {
        self.timestamp_at("DESC").await
    }

    async fn append(&self, snapshot: &Snapshot, capacity: usize) -> StorageResult<u64> {
        let payload = serde_json::to_string(snapshot)?;
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO snapshots (timestamp, version, materials_count, movements_count, payload)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&snapshot.timestamp)
        .bind(&snapshot.version)
        .bind(snapshot.data.materials.len() as i64)
        .bind(snapshot.data.movements.len() as i64)
        .bind(payload)
        .execute(&mut *tx)
        .await?;

        let evicted = sqlx::query(
            r#"
            DELETE FROM snapshots
            WHERE id NOT IN (SELECT id FROM snapshots ORDER BY id DESC LIMIT ?)
            "#,
        )
        .bind(capacity as i64)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        tx.commit().await?;

        debug!(timestamp = %snapshot.timestamp, evicted, "Snapshot appended");
        Ok(evicted)
    }

    async fn delete(&self, timestamp: &str) -> StorageResult<bool> {
        let result = sqlx::query("DELETE FROM snapshots WHERE timestamp = ?")
            .bind(timestamp)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn clear(&self) -> StorageResult<u64> {
        let result = sqlx::query("DELETE FROM snapshots")
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn count(&self) -> StorageResult<i64> {
        let result: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM snapshots")
            .fetch_one(&self.pool)
            .await?;

        Ok(result.0)
    }

    async fn settings(&self) -> StorageResult<Map<String, Value>> {
        let rows: Vec<(String, String)> =
            sqlx::query_as("SELECT key, value FROM backup_settings ORDER BY key")
                .fetch_all(&self.pool)
                .await?;

        let mut settings = Map::new();
        for (key, raw) in rows {
            settings.insert(key, serde_json::from_str(&raw)?);
        }
        Ok(settings)
    }

    async fn save_settings(&self, settings: &Map<String, Value>) -> StorageResult<()> {
        let mut tx = self.pool.begin().await?;

        for (key, value) in settings {
            sqlx::query(
                r#"
                INSERT INTO backup_settings (key, value) VALUES (?, ?)
                ON CONFLICT (key) DO UPDATE SET value = excluded.value
                "#,
            )
            .bind(key)
            .bind(serde_json::to_string(value)?)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}
