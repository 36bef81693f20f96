pub mod material;
pub mod movement;
pub mod production;
pub mod setting;
pub mod snapshot;

pub use material::{MaterialRepository, SqliteMaterialRepository};
pub use movement::{MovementRepository, SqliteMovementRepository};
pub use production::{
    BrandRepository, ProductionRepository, SqliteBrandRepository, SqliteProductionRepository,
};
pub use setting::{SettingRepository, SqliteSettingRepository};
pub use snapshot::{SnapshotRepository, SqliteSnapshotRepository};
