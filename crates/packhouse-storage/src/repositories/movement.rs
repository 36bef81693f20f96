#![allow(async_fn_in_trait)]

use crate::error::StorageResult;
use crate::models::{Movement, MovementFilter, NewMovement};
use crate::transaction::{self, MOVEMENT_COLUMNS};
use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::{debug, info};

/// Repository trait for stock movements
pub trait MovementRepository: Send + Sync {
    /// All movements, most recent `date` first, ties in insertion order
    async fn find_all(&self) -> StorageResult<Vec<Movement>>;

    async fn find_by_id(&self, id: i64) -> StorageResult<Option<Movement>>;

    /// Movements linked to a material id, same ordering as `find_all`
    async fn find_by_material(&self, material_id: i64) -> StorageResult<Vec<Movement>>;

    /// Movements matching every field of the filter
    async fn filter(&self, filter: &MovementFilter) -> StorageResult<Vec<Movement>>;

    async fn count(&self) -> StorageResult<i64>;

    /// Post a movement and adjust its material atomically
    async fn create(&self, movement: &NewMovement) -> StorageResult<Movement>;

    /// Remove every movement; material quantities are left as they are
    async fn delete_all(&self) -> StorageResult<u64>;
}

/// SQLite implementation of MovementRepository
#[derive(Debug, Clone)]
pub struct SqliteMovementRepository {
    pool: SqlitePool,
}

impl SqliteMovementRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl MovementRepository for SqliteMovementRepository {
    async fn find_all(&self) -> StorageResult<Vec<Movement>> {
        let movements = sqlx::query_as::<_, Movement>(&format!(
            "SELECT {} FROM movements ORDER BY date DESC, id ASC",
            MOVEMENT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(movements)
    }

    async fn find_by_id(&self, id: i64) -> StorageResult<Option<Movement>> {
        let movement = sqlx::query_as::<_, Movement>(&format!(
            "SELECT {} FROM movements WHERE id = ?",
            MOVEMENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(movement)
    }

    async fn find_by_material(&self, material_id: i64) -> StorageResult<Vec<Movement>> {
        let movements = sqlx::query_as::<_, Movement>(&format!(
            "SELECT {} FROM movements WHERE material_id = ? ORDER BY date DESC, id ASC",
            MOVEMENT_COLUMNS
        ))
        .bind(material_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(movements)
    }

    async fn filter(&self, filter: &MovementFilter) -> StorageResult<Vec<Movement>> {
        let mut builder: QueryBuilder<'_, Sqlite> =
            QueryBuilder::new(format!("SELECT {} FROM movements WHERE 1 = 1", MOVEMENT_COLUMNS));

        if let Some(name) = &filter.material_name {
            builder.push(" AND material_name = ").push_bind(name.as_str());
        }
        if let Some(kind) = filter.kind {
            builder.push(" AND type = ").push_bind(kind.as_str());
        }
        builder.push(" ORDER BY date DESC, id ASC");

        let movements = builder
            .build_query_as::<Movement>()
            .fetch_all(&self.pool)
            .await?;

        // The day is compared in local time, which SQLite cannot do for us.
        let movements: Vec<Movement> = movements
            .into_iter()
            .filter(|movement| filter.matches(movement))
            .collect();

        debug!(?filter, matched = movements.len(), "Movements filtered");
        Ok(movements)
    }

    async fn count(&self) -> StorageResult<i64> {
        let result: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM movements")
            .fetch_one(&self.pool)
            .await?;

        Ok(result.0)
    }

    async fn create(&self, movement: &NewMovement) -> StorageResult<Movement> {
        let mut tx = self.pool.begin().await?;
        let posted = transaction::post_movement(&mut tx, movement, Utc::now()).await?;
        tx.commit().await?;

        info!(
            id = posted.id,
            material = %posted.material_name,
            kind = %posted.kind,
            quantity = posted.quantity,
            "Movement posted"
        );
        Ok(posted)
    }

    async fn delete_all(&self) -> StorageResult<u64> {
        let result = sqlx::query("DELETE FROM movements")
            .execute(&self.pool)
            .await?;

        info!(removed = result.rows_affected(), "Movement history cleared");
        Ok(result.rows_affected())
    }
}
