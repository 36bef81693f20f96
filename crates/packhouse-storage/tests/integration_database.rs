//! Integration tests for database connection, migrations and pooling
//!
//! Run with: cargo test --package packhouse-storage --test integration_database

use packhouse_storage::connection::{Database, DatabaseConfig};
use packhouse_storage::models::{NewMaterial, NewMovement};
use packhouse_storage::{InventoryStore, MaterialRepository, SqliteMaterialRepository};
use std::sync::Arc;
use tokio::sync::Barrier;

#[tokio::test]
async fn test_in_memory_database() {
    let db = Database::in_memory().await.unwrap();
    db.health_check().await.unwrap();
    db.close().await;
}

#[tokio::test]
async fn test_migration_idempotency() {
    let db = Database::in_memory().await.unwrap();

    db.migrate().await.unwrap();
    db.migrate().await.unwrap();

    for table in [
        "materials",
        "movements",
        "settings",
        "snapshots",
        "backup_settings",
        "brands",
        "production",
    ] {
        let result: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?")
                .bind(table)
                .fetch_one(db.pool())
                .await
                .unwrap();
        assert_eq!(result.0, 1, "missing table {table}");
    }

    db.close().await;
}

#[tokio::test]
async fn test_schema_rejects_invalid_rows() {
    let db = Database::in_memory().await.unwrap();

    let bad_type = sqlx::query(
        "INSERT INTO movements (material_name, type, quantity, unit, date, created_at)
         VALUES ('Fita', 'transfer', 1, 'unidade', '2026-02-15', '2026-02-15')",
    )
    .execute(db.pool())
    .await;
    assert!(bad_type.is_err());

    let bad_quantity = sqlx::query(
        "INSERT INTO movements (material_name, type, quantity, unit, date, created_at)
         VALUES ('Fita', 'in', 0, 'unidade', '2026-02-15', '2026-02-15')",
    )
    .execute(db.pool())
    .await;
    assert!(bad_quantity.is_err());
}

#[tokio::test]
async fn test_deleted_material_ids_are_not_reused() {
    let db = Database::in_memory().await.unwrap();
    let repo = SqliteMaterialRepository::new(db.pool().clone());

    let first = repo.create(&NewMaterial::new("Fita", 10)).await.unwrap();
    repo.delete(first.id).await.unwrap();
    let second = repo.create(&NewMaterial::new("Fita", 10)).await.unwrap();

    assert!(second.id > first.id);
}

#[tokio::test]
async fn test_file_database_persists_between_opens() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("packhouse.db");
    let config = DatabaseConfig::new(path.to_string_lossy()).max_connections(2);

    {
        let db = Database::new(config.clone()).await.unwrap();
        let store = InventoryStore::new(&db);
        store
            .add_material(&NewMaterial::new("Caixa Roxa", 250))
            .await
            .unwrap();
        store
            .add_movement(&NewMovement::exit("Caixa Roxa", 15))
            .await
            .unwrap();
        db.close().await;
    }

    let db = Database::new(config).await.unwrap();
    let store = InventoryStore::new(&db);
    let material = store
        .get_material_by_name("Caixa Roxa")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(material.quantity, 235);
    assert_eq!(store.get_all_movements().await.unwrap().len(), 1);
    db.close().await;
}

#[tokio::test]
async fn test_concurrent_movements_are_serialized() {
    let db = Database::in_memory().await.unwrap();
    let store = InventoryStore::new(&db);
    store
        .add_material(&NewMaterial::new("Strado", 0))
        .await
        .unwrap();

    const NUM_CONCURRENT_TASKS: usize = 10;
    let barrier = Arc::new(Barrier::new(NUM_CONCURRENT_TASKS));
    let mut handles = vec![];

    for _ in 0..NUM_CONCURRENT_TASKS {
        let store = store.clone();
        let barrier = barrier.clone();

        handles.push(tokio::spawn(async move {
            barrier.wait().await;
            store.add_movement(&NewMovement::entry("Strado", 1)).await
        }));
    }

    for result in futures::future::join_all(handles).await {
        result.unwrap().unwrap();
    }

    let material = store.get_material_by_name("Strado").await.unwrap().unwrap();
    assert_eq!(material.quantity, NUM_CONCURRENT_TASKS as i64);
    assert_eq!(
        store.count_movements().await.unwrap(),
        NUM_CONCURRENT_TASKS as i64
    );

    db.close().await;
}
