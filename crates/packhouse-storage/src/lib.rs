//! Storage layer for the packing house inventory.
//!
//! SQLite-backed persistence for materials, stock movements, settings and
//! production batches, plus the backup subsystem built on top of it:
//! versioned snapshots in a bounded ring, JSON file export/import, integrity
//! checks and an auto-backup scheduler.
//!
//! # Architecture
//!
//! - [`Database`] - Connection pool with embedded migrations
//! - [`repositories`] - Data access traits with SQLite implementations
//! - [`transaction`] - Multi-record writes inside one SQLite transaction
//! - [`InventoryStore`] - Facade over materials, movements and settings
//! - [`IntegrityChecker`] - Cross-record consistency report
//! - [`BackupManager`] - Snapshot ring, restore, file transfer, scheduling
//! - [`Seeder`] - Idempotent seeding of the reference dataset
//! - [`InventoryStats`] - Dashboard counters
//!
//! Nothing here is a global. Build the values once at startup and pass them
//! where they are needed.
//!
//! # Examples
//!
//! ```no_run
//! use packhouse_storage::{BackupConfig, BackupManager, Database, DatabaseConfig, InventoryStore};
//! use packhouse_storage::models::{NewMaterial, NewMovement};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::new(DatabaseConfig::new("packhouse.db")).await?;
//! let store = InventoryStore::new(&db);
//!
//! store.add_material(&NewMaterial::new("Caixa Roxa", 250)).await?;
//! store.add_movement(&NewMovement::exit("Caixa Roxa", 15)).await?;
//!
//! let backups = BackupManager::new(&db, store.clone(), BackupConfig::default());
//! let snapshot = backups.create_snapshot().await?;
//! println!("snapshot {} taken", snapshot.timestamp);
//! # Ok(())
//! # }
//! ```
//!
//! # Atomicity
//!
//! Posting a movement updates its material in the same transaction. Imports
//! clear and refill the store in one transaction. Appending a snapshot and
//! evicting the oldest one is a single transaction too. A failure in any of
//! them leaves the previous state in place.

pub mod backup;
pub mod connection;
pub mod error;
pub mod integrity;
pub mod messages;
pub mod models;
pub mod repositories;
pub mod seeder;
pub mod stats;
pub mod store;
pub mod transaction;

pub use backup::{BackupConfig, BackupManager};
pub use connection::{Database, DatabaseConfig};
pub use error::{StorageError, StorageResult};
pub use integrity::{IntegrityChecker, IntegrityIssue, IntegrityReport};
pub use messages::DisplayMessages;
pub use models::{Material, Movement, Snapshot, SnapshotSummary};
pub use repositories::{
    BrandRepository, MaterialRepository, MovementRepository, ProductionRepository,
    SettingRepository, SnapshotRepository, SqliteBrandRepository, SqliteMaterialRepository,
    SqliteMovementRepository, SqliteProductionRepository, SqliteSettingRepository,
    SqliteSnapshotRepository,
};
pub use seeder::{DatabaseInfo, SeedReport, Seeder};
pub use stats::InventoryStats;
pub use store::{ImportReport, InventoryStore};
