#![allow(async_fn_in_trait)]

use crate::error::{StorageError, StorageResult};
use crate::models::{Material, MaterialUpdate, NewMaterial};
use crate::transaction::{self, MATERIAL_COLUMNS};
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::info;

/// Repository trait for Material entity operations
///
/// Native async trait methods (Edition 2024), no async-trait crate.
pub trait MaterialRepository: Send + Sync {
    /// All materials in insertion order
    async fn find_all(&self) -> StorageResult<Vec<Material>>;

    async fn find_by_id(&self, id: i64) -> StorageResult<Option<Material>>;

    /// Find a material by its unique name
    async fn find_by_name(&self, name: &str) -> StorageResult<Option<Material>>;

    async fn count(&self) -> StorageResult<i64>;

    /// Register a new material
    async fn create(&self, material: &NewMaterial) -> StorageResult<Material>;

    /// Merge a partial update, recompute status and restamp `updated_at`
    async fn update(&self, id: i64, update: &MaterialUpdate) -> StorageResult<Material>;

    /// Delete a material; its movements are left in place
    async fn delete(&self, id: i64) -> StorageResult<()>;
}

/// SQLite implementation of MaterialRepository
#[derive(Debug, Clone)]
pub struct SqliteMaterialRepository {
    pool: SqlitePool,
}

impl SqliteMaterialRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl MaterialRepository for SqliteMaterialRepository {
    async fn find_all(&self) -> StorageResult<Vec<Material>> {
        let materials = sqlx::query_as::<_, Material>(&format!(
            "SELECT {} FROM materials ORDER BY id",
            MATERIAL_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(materials)
    }

    async fn find_by_id(&self, id: i64) -> StorageResult<Option<Material>> {
        let material = sqlx::query_as::<_, Material>(&format!(
            "SELECT {} FROM materials WHERE id = ?",
            MATERIAL_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(material)
    }

    async fn find_by_name(&self, name: &str) -> StorageResult<Option<Material>> {
        let material = sqlx::query_as::<_, Material>(&format!(
            "SELECT {} FROM materials WHERE name = ?",
            MATERIAL_COLUMNS
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(material)
    }

    async fn count(&self) -> StorageResult<i64> {
        let result: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM materials")
            .fetch_one(&self.pool)
            .await?;

        Ok(result.0)
    }

    async fn create(&self, material: &NewMaterial) -> StorageResult<Material> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;
        let created = transaction::insert_material(&mut tx, material, now, now).await?;
        tx.commit().await?;

        info!(id = created.id, name = %created.name, quantity = created.quantity, "Material added");
        Ok(created)
    }

    async fn update(&self, id: i64, update: &MaterialUpdate) -> StorageResult<Material> {
        let mut tx = self.pool.begin().await?;

        let mut material = sqlx::query_as::<_, Material>(&format!(
            "SELECT {} FROM materials WHERE id = ?",
            MATERIAL_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| StorageError::not_found("Material", "id", id))?;

        let renamed = update.name.as_ref().is_some_and(|name| name != &material.name);

        material.apply(update);
        material.updated_at = Utc::now();

        sqlx::query(
            r#"
            UPDATE materials
            SET name = ?, quantity = ?, unit = ?, min_stock = ?, status = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&material.name)
        .bind(material.quantity)
        .bind(&material.unit)
        .bind(material.min_stock)
        .bind(material.status.as_str())
        .bind(material.updated_at)
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| StorageError::from_insert(e, "Material", "name", &material.name))?;

        if renamed {
            transaction::rename_movements(&mut tx, id, &material.name).await?;
        }

        tx.commit().await?;

        info!(id, name = %material.name, status = %material.status, "Material updated");
        Ok(material)
    }

    async fn delete(&self, id: i64) -> StorageResult<()> {
        let result = sqlx::query("DELETE FROM materials WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::not_found("Material", "id", id));
        }

        info!(id, "Material deleted");
        Ok(())
    }
}
