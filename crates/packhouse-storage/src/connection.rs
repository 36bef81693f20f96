//! SQLite pool setup and embedded migrations.
//!
//! The store is single-writer: the default pool holds one connection, so
//! read-then-write transactions (posting a movement, importing a backup)
//! never race each other for the write lock.

use crate::error::{StorageError, StorageResult};
use packhouse_core::constants::DEFAULT_DATABASE_PATH;
use sqlx::ConnectOptions;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// SQLite file holding inventory, snapshots and production
    pub database_path: String,

    pub max_connections: u32,
    pub min_connections: u32,

    /// Connections are recycled after this long
    pub max_lifetime: Duration,

    pub acquire_timeout: Duration,

    /// How long a statement waits on a locked database before failing
    pub busy_timeout: Duration,

    pub create_if_missing: bool,

    /// Apply pending migrations when the pool opens
    pub auto_migrate: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            database_path: DEFAULT_DATABASE_PATH.to_string(),
            max_connections: 1,
            min_connections: 1,
            max_lifetime: Duration::from_secs(3600),
            acquire_timeout: Duration::from_secs(30),
            busy_timeout: Duration::from_secs(5),
            create_if_missing: true,
            auto_migrate: true,
        }
    }
}

impl DatabaseConfig {
    pub fn new(database_path: impl Into<String>) -> Self {
        Self {
            database_path: database_path.into(),
            ..Default::default()
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    pub fn create_if_missing(mut self, create: bool) -> Self {
        self.create_if_missing = create;
        self
    }

    pub fn auto_migrate(mut self, migrate: bool) -> Self {
        self.auto_migrate = migrate;
        self
    }
}

/// Handle to the inventory database
///
/// Clones share one pool. Build it once at startup and hand it to
/// [`InventoryStore`](crate::InventoryStore) and
/// [`BackupManager`](crate::BackupManager).
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open the database file, creating it and its directory if needed
    ///
    /// ```no_run
    /// use packhouse_storage::connection::{Database, DatabaseConfig};
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let db = Database::new(DatabaseConfig::new("data/packhouse.db")).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn new(config: DatabaseConfig) -> StorageResult<Self> {
        let path = Path::new(&config.database_path);
        if config.database_path.trim().is_empty() {
            return Err(StorageError::Configuration(
                "database path is empty".to_string(),
            ));
        }

        if config.create_if_missing
            && let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty())
        {
            tokio::fs::create_dir_all(dir).await.map_err(|e| {
                StorageError::Configuration(format!(
                    "cannot create database directory {}: {e}",
                    dir.display()
                ))
            })?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(config.create_if_missing)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(config.busy_timeout)
            .disable_statement_logging();

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections.max(1))
            .min_connections(config.min_connections)
            .max_lifetime(Some(config.max_lifetime))
            .acquire_timeout(config.acquire_timeout)
            .connect_with(options)
            .await?;

        info!(
            path = %config.database_path,
            connections = config.max_connections.max(1),
            "Database opened"
        );

        let db = Self { pool };
        if config.auto_migrate {
            db.migrate().await?;
        }
        Ok(db)
    }

    /// Fresh migrated database that lives as long as the returned handle.
    ///
    /// One connection that never expires: an in-memory SQLite database is
    /// dropped with its connection.
    pub async fn in_memory() -> StorageResult<Self> {
        let options = SqliteConnectOptions::new()
            .in_memory(true)
            .foreign_keys(true)
            .disable_statement_logging();

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .max_lifetime(None)
            .idle_timeout(None)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Apply the workspace `migrations/`, embedded at compile time.
    pub async fn migrate(&self) -> StorageResult<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        debug!("Migrations applied");
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Wait for checked-out connections, then close the pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Run SQLite's `quick_check` over the database file
    ///
    /// # Errors
    ///
    /// [`StorageError::Validation`] when SQLite reports corruption.
    pub async fn health_check(&self) -> StorageResult<()> {
        let (result,): (String,) = sqlx::query_as("PRAGMA quick_check")
            .fetch_one(&self.pool)
            .await?;

        if result != "ok" {
            return Err(StorageError::Validation(format!(
                "database failed quick_check: {result}"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults_to_single_writer() {
        let config = DatabaseConfig::default();

        assert_eq!(config.database_path, "packhouse.db");
        assert_eq!(config.max_connections, 1);
        assert_eq!(config.busy_timeout, Duration::from_secs(5));
        assert!(config.create_if_missing);
        assert!(config.auto_migrate);
    }

    #[test]
    fn test_config_builder() {
        let config = DatabaseConfig::new("backup-test.db")
            .max_connections(3)
            .busy_timeout(Duration::from_millis(250))
            .create_if_missing(false)
            .auto_migrate(false);

        assert_eq!(config.database_path, "backup-test.db");
        assert_eq!(config.max_connections, 3);
        assert_eq!(config.busy_timeout, Duration::from_millis(250));
        assert!(!config.create_if_missing);
        assert!(!config.auto_migrate);
    }

    #[tokio::test]
    async fn test_file_database_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("packhouse.db");

        let db = Database::new(DatabaseConfig::new(path.to_string_lossy()))
            .await
            .unwrap();
        db.health_check().await.unwrap();
        db.close().await;

        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_empty_path_is_rejected() {
        let err = Database::new(DatabaseConfig::new("  ")).await.unwrap_err();
        assert!(matches!(err, StorageError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_missing_file_without_create() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.db");

        let result = Database::new(
            DatabaseConfig::new(path.to_string_lossy())
                .create_if_missing(false)
                .acquire_timeout(Duration::from_secs(1)),
        )
        .await;

        assert!(result.is_err());
        assert!(!path.exists());
    }
}
