pub mod backup;
pub mod material;
pub mod movement;
pub mod production;
pub mod setting;

pub use backup::{
    BackupStats, ImportPayload, ImportedMaterial, ImportedMovement, InventoryExport, Snapshot,
    SnapshotSummary,
};
pub use material::{Material, MaterialUpdate, NewMaterial};
pub use movement::{Movement, MovementFilter, NewMovement};
pub use production::{
    Brand, NewProduction, ProductionFilter, ProductionRecord, ProductionSummary, ProductionUpdate,
};
pub use setting::Setting;
