use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use packhouse_core::MovementType;
use packhouse_core::constants::{AUTO_BACKUP_INTERVAL_SECS, DEFAULT_DATABASE_PATH};
use std::path::PathBuf;

/// Packing house inventory with local backups
#[derive(Parser, Debug)]
#[command(name = "packhouse")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the SQLite database file
    #[arg(short, long, env = "PACKHOUSE_DB", global = true, default_value = DEFAULT_DATABASE_PATH)]
    pub database: PathBuf,

    /// Seconds between scheduled snapshots
    #[arg(long, env = "PACKHOUSE_BACKUP_INTERVAL_SECS", global = true, default_value_t = AUTO_BACKUP_INTERVAL_SECS)]
    pub backup_interval_secs: u64,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, env = "PACKHOUSE_LOG", global = true, default_value = "packhouse=info")]
    pub log_level: String,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Seed the reference dataset (skipped if already seeded)
    Seed {
        /// Wipe the store and seed again
        #[arg(long)]
        force: bool,
    },

    /// Show seeding state and counters
    Info,

    /// Show dashboard counters
    Stats,

    /// Check materials against their movement history
    Check {
        /// Allowed difference between stored and replayed quantity
        #[arg(long)]
        tolerance: Option<i64>,
    },

    /// Manage materials
    #[command(subcommand)]
    Material(MaterialCommands),

    /// Register and list stock movements
    #[command(subcommand)]
    Movement(MovementCommands),

    /// Read and write application settings
    #[command(subcommand)]
    Setting(SettingCommands),

    /// Snapshots, restore and backup files
    #[command(subcommand)]
    Backup(BackupCommands),

    /// Manage brands (box weight profiles)
    #[command(subcommand)]
    Brand(BrandCommands),

    /// Register and list production batches
    #[command(subcommand)]
    Production(ProductionCommands),

    /// Keep running with scheduled snapshots until Ctrl-C
    Run,
}

#[derive(Subcommand, Debug)]
pub enum MaterialCommands {
    /// List all materials
    List,

    /// Show one material by name
    Show { name: String },

    /// Add a material
    Add {
        name: String,

        /// Initial quantity
        #[arg(allow_hyphen_values = true)]
        quantity: i64,

        #[arg(long)]
        unit: Option<String>,

        #[arg(long)]
        min_stock: Option<i64>,
    },

    /// Edit a material
    Update {
        id: i64,

        #[arg(long)]
        name: Option<String>,

        #[arg(long, allow_hyphen_values = true)]
        quantity: Option<i64>,

        #[arg(long)]
        unit: Option<String>,

        #[arg(long)]
        min_stock: Option<i64>,
    },

    /// Delete a material; its movements stay as history
    Delete { id: i64 },
}

#[derive(Subcommand, Debug)]
pub enum MovementCommands {
    /// List movements, newest first
    List {
        /// Only movements of this material
        #[arg(long)]
        material: Option<String>,

        /// `in` or `out`
        #[arg(long = "type")]
        kind: Option<MovementType>,

        /// Local calendar day (YYYY-MM-DD)
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Post an entry or exit against a material
    Add {
        material: String,

        /// `in` or `out`
        kind: MovementType,

        quantity: i64,

        #[arg(long)]
        unit: Option<String>,

        /// When it happened (defaults to now)
        #[arg(long, value_parser = parse_when)]
        date: Option<DateTime<Utc>>,

        #[arg(long)]
        description: Option<String>,
    },

    /// Delete the whole movement history
    Clear,
}

#[derive(Subcommand, Debug)]
pub enum SettingCommands {
    /// List every setting
    List,

    /// Read one setting
    Get { key: String },

    /// Write a setting; the value is stored as JSON when it parses as JSON
    Set { key: String, value: String },
}

#[derive(Subcommand, Debug)]
pub enum BackupCommands {
    /// Take a snapshot now
    Create,

    /// List snapshots, oldest first
    List,

    /// Restore a snapshot by timestamp
    Restore { timestamp: String },

    /// Restore the newest snapshot
    RestoreLatest,

    /// Delete a snapshot by timestamp
    Delete { timestamp: String },

    /// Delete every snapshot
    Clear,

    /// Write a snapshot to a JSON file
    Export {
        /// Snapshot to export (defaults to a fresh one)
        #[arg(long)]
        timestamp: Option<String>,

        /// Output directory
        #[arg(long, default_value = ".")]
        dir: PathBuf,
    },

    /// Replace the store with the contents of a backup file
    Import { file: PathBuf },

    /// Show ring counters and backup settings
    Stats,
}

#[derive(Subcommand, Debug)]
pub enum BrandCommands {
    /// List brands by name
    List,

    /// Add a brand
    Add {
        name: String,

        /// Weight of one box in kg
        box_weight: f64,
    },

    /// Rename or reweigh a brand
    Update {
        id: i64,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        box_weight: Option<f64>,
    },

    /// Delete a brand with no production registered
    Delete { id: i64 },
}

#[derive(Subcommand, Debug)]
pub enum ProductionCommands {
    /// List production, newest day first
    List {
        #[arg(long)]
        date: Option<NaiveDate>,

        #[arg(long)]
        brand: Option<i64>,
    },

    /// Register a production batch
    Add {
        /// Production day (YYYY-MM-DD)
        date: NaiveDate,

        brand: i64,

        boxes: i64,
    },

    /// Edit a production batch
    Update {
        id: i64,

        #[arg(long)]
        date: Option<NaiveDate>,

        #[arg(long)]
        brand: Option<i64>,

        #[arg(long)]
        boxes: Option<i64>,
    },

    /// Delete a production batch
    Delete { id: i64 },

    /// Total boxes and weight
    Summary {
        #[arg(long)]
        date: Option<NaiveDate>,

        #[arg(long)]
        brand: Option<i64>,
    },
}

fn parse_when(s: &str) -> packhouse_core::Result<DateTime<Utc>> {
    packhouse_core::parse_timestamp(s)
}
