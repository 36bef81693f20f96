//! Packhouse command line
//!
//! Opens the local inventory database, runs one subcommand and exits, or with
//! `run` stays up taking scheduled snapshots until interrupted.

mod cli;
mod commands;

use anyhow::{Context, Result, bail};
use clap::Parser;
use packhouse_storage::{
    BackupConfig, BackupManager, Database, DatabaseConfig, DisplayMessages, InventoryStore,
    StorageError,
};
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::commands::App;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    if let Err(e) = init_tracing(&cli.log_level) {
        eprintln!("{e:#}");
        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if let Some(storage) = err.downcast_ref::<StorageError>() {
                eprintln!("{}", DisplayMessages::for_error(storage));
            }
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

/// `RUST_LOG` wins over `--log-level` when set.
fn init_tracing(default_directives: &str) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_directives)
            .with_context(|| format!("Invalid log filter '{default_directives}'"))?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    if cli.backup_interval_secs == 0 {
        bail!("--backup-interval-secs must be at least 1");
    }

    let path = cli.database.to_string_lossy().into_owned();
    let db = Database::new(DatabaseConfig::new(path.as_str()))
        .await
        .with_context(|| format!("Failed to open database {path}"))?;

    let config = BackupConfig::default()
        .auto_backup_interval(Duration::from_secs(cli.backup_interval_secs));
    let backups = BackupManager::new(&db, InventoryStore::new(&db), config);
    let app = App::new(&db, backups, cli.json);

    let result = app.execute(cli.command).await;
    db.close().await;
    result
}
