//! Core constants for the packing house inventory system.
//!
//! This module centralizes the thresholds, limits and well-known keys shared
//! by the storage layer and the command-line driver. Changing any of them
//! changes how existing backup files are interpreted.
//!
//! # Usage
//!
//! ```
//! use packhouse_core::constants::*;
//!
//! // Low stock threshold for a new material
//! assert_eq!(DEFAULT_MIN_STOCK, 20);
//!
//! // Backup ring retention
//! assert_eq!(BACKUP_CAPACITY, 10);
//! ```

// ============================================================================
// Stock Thresholds
// ============================================================================

/// Default low-stock threshold applied when a material does not set one.
///
/// A material is flagged `Low` while `quantity < min_stock`.
pub const DEFAULT_MIN_STOCK: i64 = 20;

/// Default unit of measure for materials and movements.
pub const DEFAULT_UNIT: &str = "unidade";

/// Maximum accepted difference between the stored quantity of a material
/// and the quantity replayed from its movements.
///
/// Differences up to this value are treated as manual adjustments and are
/// not reported by the integrity checker.
///
/// # Examples
///
/// ```
/// use packhouse_core::constants::QUANTITY_TOLERANCE;
///
/// let stored = 100_i64;
/// assert!((stored - 96).abs() <= QUANTITY_TOLERANCE);
/// assert!((stored - 94).abs() > QUANTITY_TOLERANCE);
/// ```
pub const QUANTITY_TOLERANCE: i64 = 5;

// ============================================================================
// Backup Ring
// ============================================================================

/// Number of snapshots retained in the backup ring.
///
/// When a new snapshot would exceed this capacity the oldest one is evicted
/// (FIFO, not LRU).
pub const BACKUP_CAPACITY: usize = 10;

/// Default interval between automatic snapshots (seconds).
///
/// # Value: 300 seconds (5 minutes)
pub const AUTO_BACKUP_INTERVAL_SECS: u64 = 300;

/// Delay before the startup snapshot is taken (milliseconds).
///
/// Gives storage initialization and seeding time to settle.
pub const STARTUP_BACKUP_DELAY_MS: u64 = 2000;

/// Version string written into every snapshot and backup file.
pub const BACKUP_FORMAT_VERSION: &str = "1.0.0";

/// Product name used as the prefix of exported backup files.
///
/// Exported files are named `<product>-backup-<YYYY-MM-DD>.json`.
pub const PRODUCT_NAME: &str = "packing-house";

// ============================================================================
// Well-known Setting Keys
// ============================================================================

/// Setting that records whether the reference dataset was seeded.
///
/// Stored as the string `"true"` once seeding completes.
pub const SEEDED_FLAG_KEY: &str = "data_migrated";

/// Setting that records when the reference dataset was seeded.
pub const MIGRATION_DATE_KEY: &str = "migration_date";

// ============================================================================
// Storage Defaults
// ============================================================================

/// Default path of the SQLite database file.
pub const DEFAULT_DATABASE_PATH: &str = "packhouse.db";
