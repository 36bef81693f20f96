//! Backup snapshots, file export/import and the auto-backup scheduler.
//!
//! A snapshot is a timestamped, versioned copy of the whole inventory. The
//! manager keeps the most recent ones in a bounded ring (oldest evicted
//! first), restores any of them into the store, and moves them in and out of
//! JSON files.
//!
//! # Serialization
//!
//! Every operation that changes the ring or the store holds one in-flight
//! guard, so a scheduled snapshot never interleaves with a restore or an
//! import. Scheduled ticks do not wait for the guard: a tick that finds it
//! taken is skipped.
//!
//! # Session lifecycle
//!
//! ```no_run
//! use packhouse_storage::{BackupConfig, BackupManager, Database, InventoryStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::in_memory().await?;
//! let store = InventoryStore::new(&db);
//! let backups = BackupManager::new(&db, store, BackupConfig::default());
//!
//! // First snapshot after the startup delay, then one per interval
//! backups.begin_session().await;
//!
//! // ... application runs ...
//!
//! // Stop the scheduler and take a final snapshot
//! backups.shutdown().await?;
//! # Ok(())
//! # }
//! ```

use crate::connection::Database;
use crate::error::{StorageError, StorageResult};
use crate::models::{BackupStats, ImportPayload, Snapshot, SnapshotSummary};
use crate::repositories::{SnapshotRepository, SqliteSnapshotRepository};
use crate::store::{ImportReport, InventoryStore};
use chrono::{DateTime, SecondsFormat, Utc};
use packhouse_core::constants::{
    AUTO_BACKUP_INTERVAL_SECS, BACKUP_CAPACITY, BACKUP_FORMAT_VERSION, PRODUCT_NAME,
    STARTUP_BACKUP_DELAY_MS,
};
use packhouse_core::parse_timestamp;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// Backup manager configuration
#[derive(Debug, Clone)]
pub struct BackupConfig {
    /// Maximum number of snapshots kept in the ring
    pub capacity: usize,

    /// Period of the auto-backup scheduler
    pub auto_backup_interval: Duration,

    /// Delay before the first snapshot of a session
    pub startup_delay: Duration,

    /// Format version written into every snapshot
    pub version: String,

    /// Prefix of exported file names
    pub product_name: String,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            capacity: BACKUP_CAPACITY,
            auto_backup_interval: Duration::from_secs(AUTO_BACKUP_INTERVAL_SECS),
            startup_delay: Duration::from_millis(STARTUP_BACKUP_DELAY_MS),
            version: BACKUP_FORMAT_VERSION.to_string(),
            product_name: PRODUCT_NAME.to_string(),
        }
    }
}

impl BackupConfig {
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn auto_backup_interval(mut self, interval: Duration) -> Self {
        self.auto_backup_interval = interval;
        self
    }

    pub fn startup_delay(mut self, delay: Duration) -> Self {
        self.startup_delay = delay;
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn product_name(mut self, name: impl Into<String>) -> Self {
        self.product_name = name.into();
        self
    }
}

#[derive(Debug)]
struct AutoBackupHandle {
    stop: watch::Sender<bool>,
    task: JoinHandle<()>,
}

/// Snapshot ring, restore, file transfer and scheduling
///
/// Cloning is cheap; clones share the in-flight guard and the scheduler.
#[derive(Debug, Clone)]
pub struct BackupManager {
    store: InventoryStore,
    snapshots: SqliteSnapshotRepository,
    config: BackupConfig,
    op_lock: Arc<Mutex<()>>,
    auto_backup: Arc<Mutex<Option<AutoBackupHandle>>>,
}

impl BackupManager {
    pub fn new(db: &Database, store: InventoryStore, config: BackupConfig) -> Self {
        Self {
            store,
            snapshots: SqliteSnapshotRepository::new(db.pool().clone()),
            config,
            op_lock: Arc::new(Mutex::new(())),
            auto_backup: Arc::new(Mutex::new(None)),
        }
    }

    pub fn config(&self) -> &BackupConfig {
        &self.config
    }

    /// Snapshot the store into the ring, evicting the oldest beyond capacity.
    pub async fn create_snapshot(&self) -> StorageResult<Snapshot> {
        let _guard = self.op_lock.lock().await;
        self.create_snapshot_locked().await
    }

    async fn create_snapshot_locked(&self) -> StorageResult<Snapshot> {
        let snapshot = self.build_snapshot().await?;
        let evicted = self
            .snapshots
            .append(&snapshot, self.config.capacity)
            .await?;

        info!(
            timestamp = %snapshot.timestamp,
            materials = snapshot.data.materials.len(),
            movements = snapshot.data.movements.len(),
            evicted,
            "Backup snapshot created"
        );
        Ok(snapshot)
    }

    async fn build_snapshot(&self) -> StorageResult<Snapshot> {
        let data = self.store.export_data().await?;
        let timestamp = self.next_timestamp().await?;

        Ok(Snapshot {
            data,
            timestamp,
            version: self.config.version.clone(),
        })
    }

    /// Current time at microsecond precision, bumped past the newest snapshot
    /// so ring timestamps stay unique and increasing.
    async fn next_timestamp(&self) -> StorageResult<String> {
        let mut micros = Utc::now().timestamp_micros();

        if let Some(newest) = self.snapshots.newest_timestamp().await?
            && let Ok(newest) = parse_timestamp(&newest)
        {
            micros = micros.max(newest.timestamp_micros() + 1);
        }

        let timestamp = DateTime::from_timestamp_micros(micros).unwrap_or_else(Utc::now);
        Ok(timestamp.to_rfc3339_opts(SecondsFormat::Micros, true))
    }

    /// Snapshot summaries, oldest first.
    pub async fn list_snapshots(&self) -> StorageResult<Vec<SnapshotSummary>> {
        self.snapshots.list().await
    }

    pub async fn get_snapshot(&self, timestamp: &str) -> StorageResult<Option<Snapshot>> {
        self.snapshots.find(timestamp).await
    }

    /// Replace the store contents with the snapshot taken at `timestamp`.
    pub async fn restore_snapshot(&self, timestamp: &str) -> StorageResult<ImportReport> {
        let _guard = self.op_lock.lock().await;

        let snapshot = self
            .snapshots
            .find(timestamp)
            .await?
            .ok_or_else(|| StorageError::not_found("Snapshot", "timestamp", timestamp))?;

        self.restore_locked(&snapshot).await
    }

    /// Restore the newest snapshot; `EmptyBackupSet` if the ring is empty.
    pub async fn restore_latest(&self) -> StorageResult<ImportReport> {
        let _guard = self.op_lock.lock().await;

        let snapshot = self
            .snapshots
            .latest()
            .await?
            .ok_or(StorageError::EmptyBackupSet)?;

        self.restore_locked(&snapshot).await
    }

    async fn restore_locked(&self, snapshot: &Snapshot) -> StorageResult<ImportReport> {
        let report = self
            .store
            .import_data(&ImportPayload::from(&snapshot.data))
            .await?;

        info!(timestamp = %snapshot.timestamp, "Backup snapshot restored");
        Ok(report)
    }

    /// Remove one snapshot. Unknown timestamps are not an error.
    pub async fn delete_snapshot(&self, timestamp: &str) -> StorageResult<bool> {
        let _guard = self.op_lock.lock().await;

        let removed = self.snapshots.delete(timestamp).await?;
        if removed {
            info!(timestamp, "Backup snapshot deleted");
        }
        Ok(removed)
    }

    /// Empty the ring.
    pub async fn clear_all(&self) -> StorageResult<u64> {
        let _guard = self.op_lock.lock().await;

        let removed = self.snapshots.clear().await?;
        info!(removed, "Backup ring cleared");
        Ok(removed)
    }

    /// Write a snapshot to `<product>-backup-<YYYY-MM-DD>.json` under `dir`
    ///
    /// With a timestamp, that ring snapshot is written; without one, a fresh
    /// snapshot is taken that does not enter the ring. The file is written to
    /// a temporary name first and renamed into place.
    ///
    /// # Errors
    ///
    /// - [`StorageError::NotFound`] for an unknown timestamp
    /// - [`StorageError::FileWriteError`] if the directory or file cannot be written
    pub async fn export_to_file(
        &self,
        timestamp: Option<&str>,
        dir: &Path,
    ) -> StorageResult<PathBuf> {
        let snapshot = match timestamp {
            Some(timestamp) => self
                .snapshots
                .find(timestamp)
                .await?
                .ok_or_else(|| StorageError::not_found("Snapshot", "timestamp", timestamp))?,
            None => self.build_snapshot().await?,
        };

        let file_name = format!(
            "{}-backup-{}.json",
            self.config.product_name,
            snapshot.file_date()
        );
        let path = dir.join(&file_name);
        let temp_path = dir.join(format!(".{}.tmp", file_name));
        let contents = serde_json::to_string_pretty(&snapshot)?;

        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|source| StorageError::FileWriteError {
                path: dir.to_path_buf(),
                source,
            })?;

        tokio::fs::write(&temp_path, contents)
            .await
            .map_err(|source| StorageError::FileWriteError {
                path: temp_path.clone(),
                source,
            })?;

        if let Err(source) = tokio::fs::rename(&temp_path, &path).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(StorageError::FileWriteError { path, source });
        }

        info!(path = %path.display(), timestamp = %snapshot.timestamp, "Backup exported");
        Ok(path)
    }

    /// Import a backup file into the store, then snapshot the result.
    pub async fn import_from_file(&self, path: &Path) -> StorageResult<ImportReport> {
        let contents =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|source| StorageError::FileReadError {
                    path: path.to_path_buf(),
                    source,
                })?;

        let report = self.import_from_str(&contents).await?;
        info!(path = %path.display(), "Backup file imported");
        Ok(report)
    }

    /// Import backup file contents into the store, then snapshot the result
    ///
    /// # Errors
    ///
    /// [`StorageError::InvalidFormat`] if the contents are not a backup
    /// document; the store is left untouched in that case.
    pub async fn import_from_str(&self, contents: &str) -> StorageResult<ImportReport> {
        let payload = ImportPayload::from_backup_json(contents)?;

        let _guard = self.op_lock.lock().await;
        let report = self.store.import_data(&payload).await?;
        self.create_snapshot_locked().await?;

        Ok(report)
    }

    /// Start (or restart) periodic snapshots; the first fires after one period.
    pub async fn start_auto_backup(&self, interval: Duration) {
        self.spawn_scheduler(interval, interval).await;
    }

    /// Start the session scheduler: a first snapshot after the configured
    /// startup delay, then one per configured interval.
    pub async fn begin_session(&self) {
        self.spawn_scheduler(self.config.startup_delay, self.config.auto_backup_interval)
            .await;
    }

    async fn spawn_scheduler(&self, first_delay: Duration, period: Duration) {
        let mut slot = self.auto_backup.lock().await;

        if let Some(previous) = slot.take() {
            let _ = previous.stop.send(true);
            debug!("Replacing running auto-backup task");
        }

        let (stop, mut stop_rx) = watch::channel(false);
        let manager = self.clone();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + first_delay, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    changed = stop_rx.changed() => {
                        if changed.is_err() || *stop_rx.borrow() {
                            break;
                        }
                    }
                    _ = ticker.tick() => manager.auto_tick().await,
                }
            }

            debug!("Auto-backup task stopped");
        });

        *slot = Some(AutoBackupHandle { stop, task });
        info!(
            first_in_ms = first_delay.as_millis() as u64,
            period_secs = period.as_secs(),
            "Auto-backup started"
        );
    }

    async fn auto_tick(&self) {
        let Ok(_guard) = self.op_lock.try_lock() else {
            warn!("Backup operation in flight; skipping scheduled snapshot");
            return;
        };

        match self.create_snapshot_locked().await {
            Ok(snapshot) => debug!(timestamp = %snapshot.timestamp, "Scheduled snapshot taken"),
            Err(e) => error!(error = %e, "Scheduled snapshot failed"),
        }
    }

    /// Stop the scheduler. A snapshot already running is allowed to finish.
    ///
    /// Returns `false` if no scheduler was running.
    pub async fn stop_auto_backup(&self) -> bool {
        match self.auto_backup.lock().await.take() {
            Some(handle) => {
                let _ = handle.stop.send(true);
                info!("Auto-backup stopped");
                true
            }
            None => false,
        }
    }

    pub async fn is_auto_backup_enabled(&self) -> bool {
        self.auto_backup
            .lock()
            .await
            .as_ref()
            .is_some_and(|handle| !handle.task.is_finished())
    }

    /// End the session: stop the scheduler, wait for it, take a final snapshot.
    pub async fn shutdown(&self) -> StorageResult<Snapshot> {
        let handle = self.auto_backup.lock().await.take();
        if let Some(handle) = handle {
            let _ = handle.stop.send(true);
            if let Err(e) = handle.task.await {
                warn!(error = %e, "Auto-backup task ended abnormally");
            }
        }

        let snapshot = self.create_snapshot().await?;
        info!(timestamp = %snapshot.timestamp, "Shutdown snapshot created");
        Ok(snapshot)
    }

    /// Merge backup preferences into the stored ones.
    ///
    /// All keys are written in one transaction; on error none of them are.
    pub async fn save_settings(&self, settings: &Map<String, Value>) -> StorageResult<()> {
        self.snapshots.save_settings(settings).await?;
        debug!(keys = settings.len(), "Backup settings saved");
        Ok(())
    }

    pub async fn settings(&self) -> StorageResult<Map<String, Value>> {
        self.snapshots.settings().await
    }

    pub async fn get_stats(&self) -> StorageResult<BackupStats> {
        Ok(BackupStats {
            backups_count: self.snapshots.count().await? as usize,
            oldest_timestamp: self.snapshots.oldest_timestamp().await?,
            newest_timestamp: self.snapshots.newest_timestamp().await?,
            auto_backup_enabled: self.is_auto_backup_enabled().await,
            settings: self.snapshots.settings().await?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrity::{IntegrityChecker, IntegrityIssue};
    use crate::models::{NewMaterial, NewMovement};
    use packhouse_core::MaterialStatus;
    use serde_json::json;

    async fn setup_test_manager(config: BackupConfig) -> (InventoryStore, BackupManager) {
        let db = Database::in_memory().await.unwrap();
        let store = InventoryStore::new(&db);
        let manager = BackupManager::new(&db, store.clone(), config);
        (store, manager)
    }

    #[tokio::test]
    async fn test_snapshot_and_orphan_scenario() {
        let (store, manager) = setup_test_manager(BackupConfig::default()).await;

        let caixa = store
            .add_material(&NewMaterial::new("Caixa Roxa", 250))
            .await
            .unwrap();
        store
            .add_movement(&NewMovement::exit("Caixa Roxa", 15))
            .await
            .unwrap();

        let caixa = store.get_material(caixa.id).await.unwrap().unwrap();
        assert_eq!(caixa.quantity, 235);
        assert_eq!(caixa.status, MaterialStatus::Normal);

        manager.create_snapshot().await.unwrap();
        let listed = manager.list_snapshots().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].materials_count, 1);
        assert_eq!(listed[0].movements_count, 1);

        store.delete_material(caixa.id).await.unwrap();
        let report = IntegrityChecker::new().check(&store).await.unwrap();
        let orphans = report
            .issues
            .iter()
            .filter(|i| matches!(i, IntegrityIssue::OrphanedMovement { .. }))
            .count();
        assert_eq!(orphans, 1);
    }

    #[tokio::test]
    async fn test_ring_keeps_most_recent() {
        let (_store, manager) = setup_test_manager(BackupConfig::default().capacity(3)).await;

        let mut taken = Vec::new();
        for _ in 0..5 {
            taken.push(manager.create_snapshot().await.unwrap().timestamp);
        }

        let listed: Vec<String> = manager
            .list_snapshots()
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.timestamp)
            .collect();
        assert_eq!(listed, taken[2..].to_vec());

        let mut sorted = taken.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted, taken);
    }

    #[tokio::test]
    async fn test_restore_snapshot() {
        let (store, manager) = setup_test_manager(BackupConfig::default()).await;
        store
            .add_material(&NewMaterial::new("Strado", 50))
            .await
            .unwrap();
        let snapshot = manager.create_snapshot().await.unwrap();

        store
            .add_movement(&NewMovement::exit("Strado", 45))
            .await
            .unwrap();
        store
            .add_material(&NewMaterial::new("Fita", 5))
            .await
            .unwrap();

        manager.restore_snapshot(&snapshot.timestamp).await.unwrap();

        let materials = store.get_all_materials().await.unwrap();
        assert_eq!(materials.len(), 1);
        assert_eq!(materials[0].quantity, 50);
        assert!(store.get_all_movements().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_restore_errors() {
        let (_store, manager) = setup_test_manager(BackupConfig::default()).await;

        assert!(matches!(
            manager.restore_latest().await,
            Err(StorageError::EmptyBackupSet)
        ));
        assert!(manager
            .restore_snapshot("2026-01-01T00:00:00.000000Z")
            .await
            .unwrap_err()
            .is_not_found());
    }

    #[tokio::test]
    async fn test_restore_latest_uses_newest() {
        let (store, manager) = setup_test_manager(BackupConfig::default()).await;
        store
            .add_material(&NewMaterial::new("Gerador", 180))
            .await
            .unwrap();
        manager.create_snapshot().await.unwrap();
        store
            .add_movement(&NewMovement::exit("Gerador", 80))
            .await
            .unwrap();
        manager.create_snapshot().await.unwrap();
        store.clear_all().await.unwrap();

        manager.restore_latest().await.unwrap();

        let gerador = store.get_material_by_name("Gerador").await.unwrap().unwrap();
        assert_eq!(gerador.quantity, 100);
    }

    #[tokio::test]
    async fn test_delete_is_idempotent_and_clear() {
        let (_store, manager) = setup_test_manager(BackupConfig::default()).await;
        let first = manager.create_snapshot().await.unwrap();
        manager.create_snapshot().await.unwrap();

        assert!(manager.delete_snapshot(&first.timestamp).await.unwrap());
        assert!(!manager.delete_snapshot(&first.timestamp).await.unwrap());
        assert_eq!(manager.list_snapshots().await.unwrap().len(), 1);

        assert_eq!(manager.clear_all().await.unwrap(), 1);
        assert!(manager.list_snapshots().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_export_and_import_file() {
        let dir = tempfile::tempdir().unwrap();
        let (store, manager) = setup_test_manager(BackupConfig::default()).await;
        store
            .add_material(&NewMaterial::new("Caixa Roxa", 250))
            .await
            .unwrap();
        store
            .add_movement(&NewMovement::exit("Caixa Roxa", 15))
            .await
            .unwrap();

        let path = manager.export_to_file(None, dir.path()).await.unwrap();
        let file_name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(file_name.starts_with("packing-house-backup-"));
        assert!(file_name.ends_with(".json"));
        // fresh exports stay out of the ring
        assert!(manager.list_snapshots().await.unwrap().is_empty());

        store.clear_all().await.unwrap();

        let report = manager.import_from_file(&path).await.unwrap();
        assert_eq!(report.materials, 1);
        assert_eq!(report.movements, 1);
        assert_eq!(report.orphaned, 0);

        let caixa = store.get_material_by_name("Caixa Roxa").await.unwrap().unwrap();
        assert_eq!(caixa.quantity, 235);
        assert_eq!(manager.list_snapshots().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_export_ring_snapshot_by_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        let (_store, manager) = setup_test_manager(BackupConfig::default()).await;
        let snapshot = manager.create_snapshot().await.unwrap();

        let path = manager
            .export_to_file(Some(&snapshot.timestamp), dir.path())
            .await
            .unwrap();
        let written: Snapshot =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written, snapshot);

        assert!(manager
            .export_to_file(Some("2026-01-01T00:00:00.000000Z"), dir.path())
            .await
            .unwrap_err()
            .is_not_found());
    }

    #[tokio::test]
    async fn test_import_errors_leave_store_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let (store, manager) = setup_test_manager(BackupConfig::default()).await;
        store
            .add_material(&NewMaterial::new("Strado", 50))
            .await
            .unwrap();

        let missing = dir.path().join("missing.json");
        assert!(matches!(
            manager.import_from_file(&missing).await,
            Err(StorageError::FileReadError { .. })
        ));

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, r#"{"data": {"materials": []}}"#).unwrap();
        assert!(matches!(
            manager.import_from_file(&bad).await,
            Err(StorageError::InvalidFormat(_))
        ));

        assert_eq!(store.get_all_materials().await.unwrap().len(), 1);
        assert!(manager.list_snapshots().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_auto_backup_start_and_stop() {
        let (_store, manager) = setup_test_manager(BackupConfig::default()).await;

        manager.start_auto_backup(Duration::from_millis(50)).await;
        assert!(manager.is_auto_backup_enabled().await);

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(manager.stop_auto_backup().await);
        assert!(!manager.stop_auto_backup().await);
        assert!(!manager.is_auto_backup_enabled().await);

        tokio::time::sleep(Duration::from_millis(50)).await;
        let count = manager.list_snapshots().await.unwrap().len();
        assert!(count >= 2, "expected at least two scheduled snapshots, got {count}");

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(manager.list_snapshots().await.unwrap().len(), count);
    }

    #[tokio::test]
    async fn test_restart_replaces_running_scheduler() {
        let (_store, manager) = setup_test_manager(BackupConfig::default()).await;

        manager.start_auto_backup(Duration::from_secs(3600)).await;
        manager.start_auto_backup(Duration::from_secs(3600)).await;
        assert!(manager.is_auto_backup_enabled().await);

        assert!(manager.stop_auto_backup().await);
        assert!(!manager.is_auto_backup_enabled().await);
    }

    #[tokio::test]
    async fn test_tick_skipped_while_operation_in_flight() {
        let (_store, manager) = setup_test_manager(BackupConfig::default()).await;

        let guard = manager.op_lock.lock().await;
        manager.auto_tick().await;
        drop(guard);
        assert!(manager.list_snapshots().await.unwrap().is_empty());

        manager.auto_tick().await;
        assert_eq!(manager.list_snapshots().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_session_startup_and_shutdown_snapshots() {
        let config = BackupConfig::default()
            .startup_delay(Duration::from_millis(20))
            .auto_backup_interval(Duration::from_secs(3600));
        let (_store, manager) = setup_test_manager(config).await;

        manager.begin_session().await;
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(manager.list_snapshots().await.unwrap().len(), 1);

        manager.shutdown().await.unwrap();
        assert_eq!(manager.list_snapshots().await.unwrap().len(), 2);
        assert!(!manager.is_auto_backup_enabled().await);
    }

    #[tokio::test]
    async fn test_stats_and_settings() {
        let (_store, manager) = setup_test_manager(BackupConfig::default()).await;

        let empty = manager.get_stats().await.unwrap();
        assert_eq!(empty.backups_count, 0);
        assert_eq!(empty.oldest_timestamp, None);
        assert!(!empty.auto_backup_enabled);

        let first = manager.create_snapshot().await.unwrap();
        let second = manager.create_snapshot().await.unwrap();

        let mut settings = Map::new();
        settings.insert("autoBackup".to_string(), json!(true));
        manager.save_settings(&settings).await.unwrap();

        let stats = manager.get_stats().await.unwrap();
        assert_eq!(stats.backups_count, 2);
        assert_eq!(stats.oldest_timestamp, Some(first.timestamp));
        assert_eq!(stats.newest_timestamp, Some(second.timestamp));
        assert_eq!(stats.settings["autoBackup"], json!(true));
    }

    #[tokio::test]
    async fn test_backup_settings_survive_store_clear() {
        let (store, manager) = setup_test_manager(BackupConfig::default()).await;

        let mut settings = Map::new();
        settings.insert("retention".to_string(), json!(10));
        manager.save_settings(&settings).await.unwrap();
        store.clear_all().await.unwrap();

        assert_eq!(manager.settings().await.unwrap()["retention"], json!(10));
    }

    #[tokio::test]
    async fn test_save_settings_is_all_or_nothing() {
        let (_store, manager) = setup_test_manager(BackupConfig::default()).await;

        let mut settings = Map::new();
        settings.insert("autoBackup".to_string(), json!(true));
        settings.insert("retention".to_string(), json!(10));
        manager.save_settings(&settings).await.unwrap();

        let mut update = Map::new();
        update.insert("autoBackup".to_string(), json!(false));
        update.insert("retention ".to_string(), json!(3));
        assert!(manager.save_settings(&update).await.is_err());

        let stored = manager.settings().await.unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored["autoBackup"], json!(true));
        assert_eq!(stored["retention"], json!(10));
    }
}
