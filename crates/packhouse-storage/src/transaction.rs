//! Transaction-aware operations for atomic multi-record writes.
//!
//! Every function here takes an open SQLite transaction so that callers can
//! group several writes into one unit: posting a movement together with its
//! material adjustment, replacing the whole inventory on import, or seeding
//! the reference dataset. Dropping the transaction without committing rolls
//! everything back.
//!
//! # Usage Pattern
//!
//! ```no_run
//! use packhouse_storage::{Database, transaction};
//! use packhouse_storage::models::{NewMaterial, NewMovement};
//! use chrono::Utc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::in_memory().await?;
//! let now = Utc::now();
//!
//! let mut tx = db.pool().begin().await?;
//! transaction::insert_material(&mut tx, &NewMaterial::new("Caixa Roxa", 250), now, now).await?;
//! transaction::post_movement(&mut tx, &NewMovement::exit("Caixa Roxa", 15), now).await?;
//! tx.commit().await?;
//! # Ok(())
//! # }
//! ```

use crate::error::{StorageError, StorageResult};
use crate::models::{ImportedMovement, Material, Movement, NewMaterial, NewMovement};
use chrono::{DateTime, Utc};
use packhouse_core::MaterialStatus;
use packhouse_core::constants::DEFAULT_UNIT;
use serde_json::Value;
use sqlx::{Sqlite, Transaction};

pub(crate) const MATERIAL_COLUMNS: &str =
    "id, name, quantity, unit, min_stock, status, created_at, updated_at";

pub(crate) const MOVEMENT_COLUMNS: &str =
    "id, material_id, material_name, type AS kind, quantity, unit, date, description, created_at";

/// Insert a material, computing its status from quantity and threshold
///
/// # Errors
///
/// Returns [`StorageError::DuplicateKey`] if the name is taken.
pub async fn insert_material(
    tx: &mut Transaction<'_, Sqlite>,
    material: &NewMaterial,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
) -> StorageResult<Material> {
    let status = material.initial_status();

    let result = sqlx::query(
        r#"
        INSERT INTO materials (name, quantity, unit, min_stock, status, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&material.name)
    .bind(material.quantity)
    .bind(&material.unit)
    .bind(material.min_stock)
    .bind(status.as_str())
    .bind(created_at)
    .bind(updated_at)
    .execute(&mut **tx)
    .await
    .map_err(|e| StorageError::from_insert(e, "Material", "name", &material.name))?;

    Ok(Material {
        id: result.last_insert_rowid(),
        name: material.name.clone(),
        quantity: material.quantity,
        unit: material.unit.clone(),
        min_stock: material.min_stock,
        status,
        created_at,
        updated_at,
    })
}

/// Look up a material by name inside the transaction.
pub async fn find_material_by_name(
    tx: &mut Transaction<'_, Sqlite>,
    name: &str,
) -> StorageResult<Option<Material>> {
    let material = sqlx::query_as::<_, Material>(&format!(
        "SELECT {} FROM materials WHERE name = ?",
        MATERIAL_COLUMNS
    ))
    .bind(name)
    .fetch_optional(&mut **tx)
    .await?;

    Ok(material)
}

/// Every material, by id, as seen by the transaction.
pub async fn all_materials(tx: &mut Transaction<'_, Sqlite>) -> StorageResult<Vec<Material>> {
    let materials = sqlx::query_as::<_, Material>(&format!(
        "SELECT {} FROM materials ORDER BY id",
        MATERIAL_COLUMNS
    ))
    .fetch_all(&mut **tx)
    .await?;

    Ok(materials)
}

/// Every movement, newest first, as seen by the transaction.
pub async fn all_movements(tx: &mut Transaction<'_, Sqlite>) -> StorageResult<Vec<Movement>> {
    let movements = sqlx::query_as::<_, Movement>(&format!(
        "SELECT {} FROM movements ORDER BY date DESC, id ASC",
        MOVEMENT_COLUMNS
    ))
    .fetch_all(&mut **tx)
    .await?;

    Ok(movements)
}

/// Post a stock movement and adjust its material
///
/// The movement's material is resolved by name. Its quantity moves by `+q`
/// for an entry and `-q` for an exit, the status is recomputed and
/// `updated_at` restamped. The movement is stored with the material's id,
/// canonical name and (unless given) unit.
///
/// # Errors
///
/// - [`StorageError::Validation`] if the quantity is not positive, or the
///   new stock would not fit in an `i64`
/// - [`StorageError::NotFound`] if no material has that name
///
/// In both cases nothing has been written.
pub async fn post_movement(
    tx: &mut Transaction<'_, Sqlite>,
    movement: &NewMovement,
    now: DateTime<Utc>,
) -> StorageResult<Movement> {
    if movement.quantity <= 0 {
        return Err(StorageError::Validation(format!(
            "movement quantity must be positive, got {}",
            movement.quantity
        )));
    }

    let material = find_material_by_name(tx, &movement.material_name)
        .await?
        .ok_or_else(|| StorageError::not_found("Material", "name", &movement.material_name))?;

    let quantity = material
        .quantity
        .checked_add(movement.kind.signed(movement.quantity))
        .ok_or_else(|| {
            StorageError::Validation(format!(
                "stock of '{}' would overflow ({} {} {})",
                material.name, material.quantity, movement.kind, movement.quantity
            ))
        })?;
    let status = MaterialStatus::for_quantity(quantity, material.min_stock);

    sqlx::query("UPDATE materials SET quantity = ?, status = ?, updated_at = ? WHERE id = ?")
        .bind(quantity)
        .bind(status.as_str())
        .bind(now)
        .bind(material.id)
        .execute(&mut **tx)
        .await?;

    let unit = movement.unit.clone().unwrap_or(material.unit);
    let date = movement.date.unwrap_or(now);

    let result = sqlx::query(
        r#"
        INSERT INTO movements (material_id, material_name, type, quantity, unit, date, description, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(material.id)
    .bind(&material.name)
    .bind(movement.kind.as_str())
    .bind(movement.quantity)
    .bind(&unit)
    .bind(date)
    .bind(&movement.description)
    .bind(now)
    .execute(&mut **tx)
    .await?;

    Ok(Movement {
        id: result.last_insert_rowid(),
        material_id: Some(material.id),
        material_name: material.name,
        kind: movement.kind,
        quantity: movement.quantity,
        unit,
        date,
        description: movement.description.clone(),
        created_at: now,
    })
}

/// Store an imported movement as history without touching any material.
///
/// `material_id` is the id the movement resolved to in the new data set, or
/// `None` to keep it as an orphan.
pub async fn insert_history_movement(
    tx: &mut Transaction<'_, Sqlite>,
    movement: &ImportedMovement,
    material_id: Option<i64>,
    now: DateTime<Utc>,
) -> StorageResult<i64> {
    if movement.quantity <= 0 {
        return Err(StorageError::Validation(format!(
            "movement quantity must be positive, got {}",
            movement.quantity
        )));
    }

    let result = sqlx::query(
        r#"
        INSERT INTO movements (material_id, material_name, type, quantity, unit, date, description, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(material_id)
    .bind(&movement.material_name)
    .bind(movement.kind.as_str())
    .bind(movement.quantity)
    .bind(movement.unit.as_deref().unwrap_or(DEFAULT_UNIT))
    .bind(movement.date.unwrap_or(now))
    .bind(&movement.description)
    .bind(movement.created_at.unwrap_or(now))
    .execute(&mut **tx)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Refresh the cached material name on every movement of a material.
pub async fn rename_movements(
    tx: &mut Transaction<'_, Sqlite>,
    material_id: i64,
    name: &str,
) -> StorageResult<u64> {
    let result = sqlx::query("UPDATE movements SET material_name = ? WHERE material_id = ?")
        .bind(name)
        .bind(material_id)
        .execute(&mut **tx)
        .await?;

    Ok(result.rows_affected())
}

/// Empty materials, movements and settings.
pub async fn clear_inventory(tx: &mut Transaction<'_, Sqlite>) -> StorageResult<()> {
    for table in ["movements", "materials", "settings"] {
        sqlx::query(&format!("DELETE FROM {}", table))
            .execute(&mut **tx)
            .await?;
    }
    Ok(())
}

/// Insert or replace a setting; the value is stored as JSON text.
pub async fn upsert_setting(
    tx: &mut Transaction<'_, Sqlite>,
    key: &str,
    value: &Value,
) -> StorageResult<()> {
    let encoded = serde_json::to_string(value)?;

    sqlx::query(
        r#"
        INSERT INTO settings (key, value) VALUES (?, ?)
        ON CONFLICT (key) DO UPDATE SET value = excluded.value
        "#,
    )
    .bind(key)
    .bind(encoded)
    .execute(&mut **tx)
    .await?;

    Ok(())
}
