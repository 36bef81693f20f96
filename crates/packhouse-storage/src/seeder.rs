//! One-time seeding of the reference dataset.
//!
//! A fresh database is filled with the packing house's starting materials,
//! a short movement history and default settings. A persisted flag makes the
//! operation idempotent; a store that already holds materials is never
//! seeded either.

use crate::error::StorageResult;
use crate::models::setting::is_truthy;
use crate::models::{NewMaterial, NewMovement};
use crate::stats::InventoryStats;
use crate::store::InventoryStore;
use crate::transaction;
use chrono::Utc;
use packhouse_core::constants::{MIGRATION_DATE_KEY, SEEDED_FLAG_KEY};
use packhouse_core::{MovementType, parse_timestamp};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::info;

const SEED_MATERIALS: [(&str, i64); 4] = [
    ("Caixa Roxa", 250),
    ("Bolsão", 15),
    ("Gerador", 180),
    ("Strado", 50),
];

// (material, type, quantity, local date, description)
const SEED_MOVEMENTS: [(&str, MovementType, i64, &str, &str); 7] = [
    ("Caixa Roxa", MovementType::In, 50, "2026-02-15T14:30:00", "Entrada de caixas roxas"),
    ("Bolsão", MovementType::Out, 20, "2026-02-15T10:15:00", "Saída de bolsões"),
    ("Gerador", MovementType::In, 30, "2026-02-14T16:45:00", "Entrada de geradores"),
    ("Strado", MovementType::Out, 10, "2026-02-14T09:20:00", "Saída de strados"),
    ("Bolsão", MovementType::In, 25, "2026-02-13T11:30:00", "Entrada de bolsões"),
    ("Caixa Roxa", MovementType::Out, 15, "2026-02-12T15:20:00", "Saída de caixas roxas"),
    ("Strado", MovementType::In, 40, "2026-02-12T09:10:00", "Entrada de strados"),
];

/// Counts written by [`Seeder::seed`]; all zero when seeding was skipped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedReport {
    pub materials: usize,
    pub movements: usize,
    pub settings: usize,
}

impl SeedReport {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Store overview with the seeding state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseInfo {
    pub is_seeded: bool,
    pub materials_count: i64,
    pub movements_count: i64,
    pub stats: InventoryStats,
    pub last_migration: Option<Value>,
}

#[derive(Debug, Clone)]
pub struct Seeder {
    store: InventoryStore,
}

impl Seeder {
    pub fn new(store: InventoryStore) -> Self {
        Self { store }
    }

    /// `true` once the seeded flag is set (`"true"` or `true`).
    pub async fn is_seeded(&self) -> StorageResult<bool> {
        Ok(self
            .store
            .get_setting(SEEDED_FLAG_KEY)
            .await?
            .is_some_and(|value| is_truthy(&value)))
    }

    /// Insert the reference dataset unless already seeded or non-empty
    ///
    /// Materials, movements, settings and the flag are written in a single
    /// transaction. Movements are posted like any other, so they adjust the
    /// seeded quantities.
    pub async fn seed(&self) -> StorageResult<SeedReport> {
        if self.is_seeded().await? {
            info!("Reference data already seeded");
            return Ok(SeedReport::default());
        }
        if self.store.count_materials().await? > 0 {
            info!("Store already holds materials; skipping seed");
            return Ok(SeedReport::default());
        }

        let now = Utc::now();
        let settings = [
            ("app_version", json!("1.0.0")),
            (MIGRATION_DATE_KEY, json!(now.to_rfc3339())),
            ("default_min_stock", json!(20)),
            ("company_name", json!("Packing House")),
            ("currency", json!("BRL")),
        ];

        let mut tx = self.store.pool().begin().await?;

        for (name, quantity) in SEED_MATERIALS {
            transaction::insert_material(&mut tx, &NewMaterial::new(name, quantity), now, now)
                .await?;
        }

        for (name, kind, quantity, date, description) in SEED_MOVEMENTS {
            let movement = NewMovement::new(name, kind, quantity)
                .date(parse_timestamp(date)?)
                .description(description);
            transaction::post_movement(&mut tx, &movement, now).await?;
        }

        for (key, value) in &settings {
            transaction::upsert_setting(&mut tx, key, value).await?;
        }
        transaction::upsert_setting(&mut tx, SEEDED_FLAG_KEY, &json!("true")).await?;

        tx.commit().await?;

        let report = SeedReport {
            materials: SEED_MATERIALS.len(),
            movements: SEED_MOVEMENTS.len(),
            settings: settings.len(),
        };
        info!(
            materials = report.materials,
            movements = report.movements,
            settings = report.settings,
            "Reference data seeded"
        );
        Ok(report)
    }

    /// Wipe the store, reset the flag and seed again.
    pub async fn force_reseed(&self) -> StorageResult<SeedReport> {
        self.store.clear_all().await?;
        self.store
            .save_setting(SEEDED_FLAG_KEY, &json!("false"))
            .await?;
        self.seed().await
    }

    pub async fn database_info(&self) -> StorageResult<DatabaseInfo> {
        Ok(DatabaseInfo {
            is_seeded: self.is_seeded().await?,
            materials_count: self.store.count_materials().await?,
            movements_count: self.store.count_movements().await?,
            stats: InventoryStats::collect(&self.store).await?,
            last_migration: self.store.get_setting(MIGRATION_DATE_KEY).await?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::Database;
    use packhouse_core::MaterialStatus;

    async fn setup_test_seeder() -> (InventoryStore, Seeder) {
        let db = Database::in_memory().await.unwrap();
        let store = InventoryStore::new(&db);
        (store.clone(), Seeder::new(store))
    }

    #[tokio::test]
    async fn test_seed_reference_dataset() {
        let (store, seeder) = setup_test_seeder().await;
        assert!(!seeder.is_seeded().await.unwrap());

        let report = seeder.seed().await.unwrap();
        assert_eq!(
            report,
            SeedReport {
                materials: 4,
                movements: 7,
                settings: 5
            }
        );
        assert!(seeder.is_seeded().await.unwrap());

        let quantity = |name: &'static str| {
            let store = store.clone();
            async move { store.get_material_by_name(name).await.unwrap().unwrap() }
        };
        assert_eq!(quantity("Caixa Roxa").await.quantity, 285);
        let bolsao = quantity("Bolsão").await;
        assert_eq!(bolsao.quantity, 20);
        assert_eq!(bolsao.status, MaterialStatus::Normal);
        assert_eq!(quantity("Gerador").await.quantity, 210);
        assert_eq!(quantity("Strado").await.quantity, 80);

        assert_eq!(
            store.get_setting("company_name").await.unwrap(),
            Some(json!("Packing House"))
        );
        assert_eq!(store.all_settings().await.unwrap().len(), 6);
    }

    #[tokio::test]
    async fn test_seed_twice_equals_once() {
        let (store, seeder) = setup_test_seeder().await;

        seeder.seed().await.unwrap();
        let first = store.export_data().await.unwrap();

        assert!(seeder.seed().await.unwrap().is_empty());
        let second = store.export_data().await.unwrap();

        assert_eq!(first.materials, second.materials);
        assert_eq!(first.movements, second.movements);
    }

    #[tokio::test]
    async fn test_seed_skipped_when_materials_exist() {
        let (store, seeder) = setup_test_seeder().await;
        store
            .add_material(&NewMaterial::new("Fita", 10))
            .await
            .unwrap();

        assert!(seeder.seed().await.unwrap().is_empty());
        assert_eq!(store.count_materials().await.unwrap(), 1);
        assert!(!seeder.is_seeded().await.unwrap());
    }

    #[tokio::test]
    async fn test_force_reseed() {
        let (store, seeder) = setup_test_seeder().await;
        seeder.seed().await.unwrap();
        store
            .add_material(&NewMaterial::new("Fita", 10))
            .await
            .unwrap();

        let report = seeder.force_reseed().await.unwrap();
        assert_eq!(report.materials, 4);
        assert_eq!(store.count_materials().await.unwrap(), 4);
        assert!(store.get_material_by_name("Fita").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_database_info() {
        let (_store, seeder) = setup_test_seeder().await;
        seeder.seed().await.unwrap();

        let info = seeder.database_info().await.unwrap();
        assert!(info.is_seeded);
        assert_eq!(info.materials_count, 4);
        assert_eq!(info.movements_count, 7);
        assert_eq!(info.stats.total_quantity, 595);
        assert!(info.last_migration.is_some());
    }
}
