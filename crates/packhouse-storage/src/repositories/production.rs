#![allow(async_fn_in_trait)]

use crate::error::{StorageError, StorageResult};
use crate::models::production::total_weight;
use crate::models::{
    Brand, NewProduction, ProductionFilter, ProductionRecord, ProductionSummary, ProductionUpdate,
};
use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::info;

const BRAND_COLUMNS: &str = "id, name, box_weight, created_at, updated_at";

const PRODUCTION_COLUMNS: &str = "id, date, brand_id, brand_name, boxes, box_weight, total_weight, created_at, updated_at";

/// Brands (box weight profiles)
pub trait BrandRepository: Send + Sync {
    /// All brands ordered by name
    async fn find_all(&self) -> StorageResult<Vec<Brand>>;

    async fn find_by_id(&self, id: i64) -> StorageResult<Option<Brand>>;

    async fn create(&self, name: &str, box_weight: f64) -> StorageResult<Brand>;

    /// Rename and/or reweigh a brand; registered production keeps its weight
    async fn update(
        &self,
        id: i64,
        name: Option<&str>,
        box_weight: Option<f64>,
    ) -> StorageResult<Brand>;

    /// Delete a brand that has no production registered against it
    async fn delete(&self, id: i64) -> StorageResult<()>;
}

/// Production batches
pub trait ProductionRepository: Send + Sync {
    /// Batches matching the filter, most recent day first
    async fn find(&self, filter: &ProductionFilter) -> StorageResult<Vec<ProductionRecord>>;

    async fn find_by_id(&self, id: i64) -> StorageResult<Option<ProductionRecord>>;

    async fn create(&self, production: &NewProduction) -> StorageResult<ProductionRecord>;

    async fn update(&self, id: i64, update: &ProductionUpdate) -> StorageResult<ProductionRecord>;

    async fn delete(&self, id: i64) -> StorageResult<()>;

    async fn summary(&self, filter: &ProductionFilter) -> StorageResult<ProductionSummary>;
}

fn validate_box_weight(box_weight: f64) -> StorageResult<()> {
    if box_weight.is_finite() && box_weight > 0.0 {
        Ok(())
    } else {
        Err(StorageError::Validation(format!(
            "box weight must be positive, got {}",
            box_weight
        )))
    }
}

fn validate_boxes(boxes: i64) -> StorageResult<()> {
    if boxes > 0 {
        Ok(())
    } else {
        Err(StorageError::Validation(format!(
            "box count must be positive, got {}",
            boxes
        )))
    }
}

#[derive(Debug, Clone)]
pub struct SqliteBrandRepository {
    pool: SqlitePool,
}

impl SqliteBrandRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl BrandRepository for SqliteBrandRepository {
    async fn find_all(&self) -> StorageResult<Vec<Brand>> {
        let brands = sqlx::query_as::<_, Brand>(&format!(
            "SELECT {} FROM brands ORDER BY name",
            BRAND_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(brands)
    }

    async fn find_by_id(&self, id: i64) -> StorageResult<Option<Brand>> {
        let brand = sqlx::query_as::<_, Brand>(&format!(
            "SELECT {} FROM brands WHERE id = ?",
            BRAND_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(brand)
    }

    async fn create(&self, name: &str, box_weight: f64) -> StorageResult<Brand> {
        validate_box_weight(box_weight)?;
        let now = Utc::now();

        let result = sqlx::query(
            "INSERT INTO brands (name, box_weight, created_at, updated_at) VALUES (?, ?, ?, ?)",
        )
        .bind(name)
        .bind(box_weight)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::from_insert(e, "Brand", "name", name))?;

        info!(name, box_weight, "Brand added");
        Ok(Brand {
            id: result.last_insert_rowid(),
            name: name.to_string(),
            box_weight,
            created_at: now,
            updated_at: now,
        })
    }

    async fn update(
        &self,
        id: i64,
        name: Option<&str>,
        box_weight: Option<f64>,
    ) -> StorageResult<Brand> {
        if let Some(weight) = box_weight {
            validate_box_weight(weight)?;
        }

        let mut tx = self.pool.begin().await?;

        let mut brand = sqlx::query_as::<_, Brand>(&format!(
            "SELECT {} FROM brands WHERE id = ?",
            BRAND_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| StorageError::not_found("Brand", "id", id))?;

        if let Some(name) = name {
            brand.name = name.to_string();
        }
        if let Some(weight) = box_weight {
            brand.box_weight = weight;
        }
        brand.updated_at = Utc::now();

        sqlx::query("UPDATE brands SET name = ?, box_weight = ?, updated_at = ? WHERE id = ?")
            .bind(&brand.name)
            .bind(brand.box_weight)
            .bind(brand.updated_at)
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| StorageError::from_insert(e, "Brand", "name", &brand.name))?;

        sqlx::query("UPDATE production SET brand_name = ? WHERE brand_id = ?")
            .bind(&brand.name)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(id, name = %brand.name, box_weight = brand.box_weight, "Brand updated");
        Ok(brand)
    }

    async fn delete(&self, id: i64) -> StorageResult<()> {
        let (batches,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM production WHERE brand_id = ?")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        if batches > 0 {
            return Err(StorageError::Validation(format!(
                "brand {} has {} production batches registered",
                id, batches
            )));
        }

        let result = sqlx::query("DELETE FROM brands WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::not_found("Brand", "id", id));
        }

        info!(id, "Brand deleted");
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct SqliteProductionRepository {
    pool: SqlitePool,
}

impl SqliteProductionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn brand(&self, brand_id: i64) -> StorageResult<Brand> {
        SqliteBrandRepository::new(self.pool.clone())
            .find_by_id(brand_id)
            .await?
            .ok_or_else(|| StorageError::not_found("Brand", "id", brand_id))
    }
}

impl ProductionRepository for SqliteProductionRepository {
    async fn find(&self, filter: &ProductionFilter) -> StorageResult<Vec<ProductionRecord>> {
        let mut builder: QueryBuilder<'_, Sqlite> =
            QueryBuilder::new(format!("SELECT {} FROM production WHERE 1 = 1", PRODUCTION_COLUMNS));

        if let Some(date) = filter.date {
            builder.push(" AND date = ").push_bind(date);
        }
        if let Some(brand_id) = filter.brand_id {
            builder.push(" AND brand_id = ").push_bind(brand_id);
        }
        builder.push(" ORDER BY date DESC, id ASC");

        let records = builder
            .build_query_as::<ProductionRecord>()
            .fetch_all(&self.pool)
            .await?;

        Ok(records)
    }

    async fn find_by_id(&self, id: i64) -> StorageResult<Option<ProductionRecord>> {
        let record = sqlx::query_as::<_, ProductionRecord>(&format!(
            "SELECT {} FROM production WHERE id = ?",
            PRODUCTION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn create(&self, production: &NewProduction) -> StorageResult<ProductionRecord> {
        validate_boxes(production.boxes)?;
        let brand = self.brand(production.brand_id).await?;

        let now = Utc::now();
        let total = total_weight(production.boxes, brand.box_weight);

        let result = sqlx::query(
            r#"
            INSERT INTO production (date, brand_id, brand_name, boxes, box_weight, total_weight, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(production.date)
        .bind(brand.id)
        .bind(&brand.name)
        .bind(production.boxes)
        .bind(brand.box_weight)
        .bind(total)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        info!(
            date = %production.date,
            brand = %brand.name,
            boxes = production.boxes,
            total_weight = total,
            "Production registered"
        );

        Ok(ProductionRecord {
            id: result.last_insert_rowid(),
            date: production.date,
            brand_id: brand.id,
            brand_name: brand.name,
            boxes: production.boxes,
            box_weight: brand.box_weight,
            total_weight: total,
            created_at: now,
            updated_at: now,
        })
    }

    async fn update(&self, id: i64, update: &ProductionUpdate) -> StorageResult<ProductionRecord> {
        let mut record = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| StorageError::not_found("Production", "id", id))?;

        if let Some(boxes) = update.boxes {
            validate_boxes(boxes)?;
            record.boxes = boxes;
        }
        if let Some(date) = update.date {
            record.date = date;
        }
        if let Some(brand_id) = update.brand_id
            && brand_id != record.brand_id
        {
            let brand = self.brand(brand_id).await?;
            record.brand_id = brand.id;
            record.brand_name = brand.name;
            record.box_weight = brand.box_weight;
        }
        record.total_weight = total_weight(record.boxes, record.box_weight);
        record.updated_at = Utc::now();

        sqlx::query(
            r#"
            UPDATE production
            SET date = ?, brand_id = ?, brand_name = ?, boxes = ?,
                box_weight = ?, total_weight = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(record.date)
        .bind(record.brand_id)
        .bind(&record.brand_name)
        .bind(record.boxes)
        .bind(record.box_weight)
        .bind(record.total_weight)
        .bind(record.updated_at)
        .bind(id)
        .execute(&self.pool)
        .await?;

        info!(id, boxes = record.boxes, total_weight = record.total_weight, "Production updated");
        Ok(record)
    }

    async fn delete(&self, id: i64) -> StorageResult<()> {
        let result = sqlx::query("DELETE FROM production WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::not_found("Production", "id", id));
        }

        info!(id, "Production deleted");
        Ok(())
    }

    async fn summary(&self, filter: &ProductionFilter) -> StorageResult<ProductionSummary> {
        let records = self.find(filter).await?;
        Ok(ProductionSummary::from_records(&records))
    }
}
