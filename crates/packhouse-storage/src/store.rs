//! Inventory store: the single entry point for materials, movements and
//! settings.
//!
//! [`InventoryStore`] wraps the repositories behind one value that is built
//! once at startup and handed to the backup manager, the seeder and the CLI.
//! Every multi-record write runs in one SQLite transaction.

use crate::connection::Database;
use crate::error::StorageResult;
use crate::models::{
    ImportPayload, InventoryExport, Material, MaterialUpdate, Movement, MovementFilter,
    NewMaterial, NewMovement, Setting,
};
use crate::repositories::{
    MaterialRepository, MovementRepository, SettingRepository, SqliteMaterialRepository,
    SqliteMovementRepository, SqliteSettingRepository,
};
use crate::transaction;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::SqlitePool;
use std::collections::HashMap;
use tracing::{info, warn};

/// Counts of records written by [`InventoryStore::import_data`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub materials: usize,
    pub movements: usize,
    /// Movements whose material could not be resolved
    pub orphaned: usize,
}

#[derive(Debug, Clone)]
pub struct InventoryStore {
    pool: SqlitePool,
    materials: SqliteMaterialRepository,
    movements: SqliteMovementRepository,
    settings: SqliteSettingRepository,
}

impl InventoryStore {
    pub fn new(db: &Database) -> Self {
        let pool = db.pool().clone();
        Self {
            materials: SqliteMaterialRepository::new(pool.clone()),
            movements: SqliteMovementRepository::new(pool.clone()),
            settings: SqliteSettingRepository::new(pool.clone()),
            pool,
        }
    }

    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    // Materials

    /// Register a material; fails with `DuplicateKey` if the name is taken.
    pub async fn add_material(&self, material: &NewMaterial) -> StorageResult<Material> {
        self.materials.create(material).await
    }

    pub async fn get_all_materials(&self) -> StorageResult<Vec<Material>> {
        self.materials.find_all().await
    }

    pub async fn get_material(&self, id: i64) -> StorageResult<Option<Material>> {
        self.materials.find_by_id(id).await
    }

    pub async fn get_material_by_name(&self, name: &str) -> StorageResult<Option<Material>> {
        self.materials.find_by_name(name).await
    }

    pub async fn update_material(
        &self,
        id: i64,
        update: &MaterialUpdate,
    ) -> StorageResult<Material> {
        self.materials.update(id, update).await
    }

    /// Delete a material. Its movements stay behind as orphans.
    pub async fn delete_material(&self, id: i64) -> StorageResult<()> {
        self.materials.delete(id).await
    }

    pub async fn count_materials(&self) -> StorageResult<i64> {
        self.materials.count().await
    }

    // Movements

    /// Post a movement and adjust the material it names.
    pub async fn add_movement(&self, movement: &NewMovement) -> StorageResult<Movement> {
        self.movements.create(movement).await
    }

    pub async fn get_all_movements(&self) -> StorageResult<Vec<Movement>> {
        self.movements.find_all().await
    }

    pub async fn get_movement(&self, id: i64) -> StorageResult<Option<Movement>> {
        self.movements.find_by_id(id).await
    }

    pub async fn movements_for_material(&self, material_id: i64) -> StorageResult<Vec<Movement>> {
        self.movements.find_by_material(material_id).await
    }

    pub async fn filter_movements(&self, filter: &MovementFilter) -> StorageResult<Vec<Movement>> {
        self.movements.filter(filter).await
    }

    /// Drop the movement history without changing any quantity.
    pub async fn clear_movements_history(&self) -> StorageResult<u64> {
        self.movements.delete_all().await
    }

    pub async fn count_movements(&self) -> StorageResult<i64> {
        self.movements.count().await
    }

    // Settings

    pub async fn save_setting(&self, key: &str, value: &Value) -> StorageResult<()> {
        self.settings.save(key, value).await
    }

    pub async fn get_setting(&self, key: &str) -> StorageResult<Option<Value>> {
        self.settings.get(key).await
    }

    pub async fn all_settings(&self) -> StorageResult<Vec<Setting>> {
        self.settings.all().await
    }

    // Whole-store operations

    /// Empty materials, movements and settings in one transaction.
    pub async fn clear_all(&self) -> StorageResult<()> {
        let mut tx = self.pool.begin().await?;
        transaction::clear_inventory(&mut tx).await?;
        tx.commit().await?;

        info!("Inventory cleared");
        Ok(())
    }

    /// Copy of every material and movement
    ///
    /// Both tables are read inside one transaction, so a movement posted
    /// concurrently shows up together with its quantity change or not at all.
    pub async fn export_data(&self) -> StorageResult<InventoryExport> {
        let mut tx = self.pool.begin().await?;
        let materials = transaction::all_materials(&mut tx).await?;
        let movements = transaction::all_movements(&mut tx).await?;
        tx.commit().await?;

        Ok(InventoryExport {
            materials,
            movements,
            export_date: Utc::now(),
        })
    }

    /// Replace the whole inventory with `payload`
    ///
    /// Runs as one transaction: the store is cleared, materials are inserted
    /// with their status recomputed, then movements are stored as history.
    /// Imported quantities are trusted as they are; movements do not adjust
    /// them again.
    ///
    /// A movement carrying a material id is linked to the material that had
    /// that id in the payload. One without an id is linked by material name.
    /// Movements that resolve to nothing are kept as orphans.
    ///
    /// # Errors
    ///
    /// Any failure (duplicate material names, invalid quantities, database
    /// errors) rolls back the transaction and leaves the previous data
    /// untouched.
    pub async fn import_data(&self, payload: &ImportPayload) -> StorageResult<ImportReport> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        transaction::clear_inventory(&mut tx).await?;

        let mut by_old_id: HashMap<i64, i64> = HashMap::new();
        let mut by_name: HashMap<String, i64> = HashMap::new();

        for imported in &payload.materials {
            let material = NewMaterial::new(imported.name.clone(), imported.quantity)
                .unit(imported.unit.clone())
                .min_stock(imported.min_stock);

            let created = transaction::insert_material(
                &mut tx,
                &material,
                imported.created_at.unwrap_or(now),
                imported.updated_at.unwrap_or(now),
            )
            .await?;

            if let Some(old_id) = imported.id {
                by_old_id.insert(old_id, created.id);
            }
            by_name.insert(created.name, created.id);
        }

        let mut report = ImportReport {
            materials: payload.materials.len(),
            ..Default::default()
        };

        for imported in &payload.movements {
            let material_id = match imported.material_id {
                Some(old_id) => by_old_id.get(&old_id).copied(),
                None => by_name.get(&imported.material_name).copied(),
            };

            if material_id.is_none() {
                warn!(
                    material = %imported.material_name,
                    movement_id = ?imported.id,
                    "Imported movement has no matching material; keeping it as orphan"
                );
                report.orphaned += 1;
            }

            transaction::insert_history_movement(&mut tx, imported, material_id, now).await?;
            report.movements += 1;
        }

        tx.commit().await?;

        info!(
            materials = report.materials,
            movements = report.movements,
            orphaned = report.orphaned,
            "Inventory imported"
        );
        Ok(report)
    }
}
