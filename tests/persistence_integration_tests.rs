//! Integration tests for WAL persistence, recovery and schema versioning

use chrono::Utc;
use inventorydb::storage::persistence::{SNAPSHOT_FILE_NAME, WAL_FILE_NAME};
use inventorydb::storage::DatabaseManifest;
use inventorydb::{
    Device, DeviceStatus, DeviceStore, DurabilityMode, InventoryError, StatusFilter, StoreConfig,
};
use tempfile::TempDir;

fn config(dir: &TempDir) -> StoreConfig {
    StoreConfig::new(dir.path()).seed_size(30)
}

#[tokio::test]
async fn test_initialize_writes_manifest_and_snapshot() {
    let dir = TempDir::new().unwrap();
    let store = DeviceStore::open(config(&dir)).unwrap();
    store.initialize().await.unwrap();

    let db_path = store.database_path();
    assert!(db_path.join(SNAPSHOT_FILE_NAME).exists());
    assert!(db_path.join(WAL_FILE_NAME).exists());

    let manifest = DatabaseManifest::load(&db_path).unwrap().unwrap();
    assert_eq!(manifest.version, inventorydb::SCHEMA_VERSION);
    assert_eq!(manifest.name, "device-database");
}

#[tokio::test]
async fn test_crash_recovery_replays_wal() {
    let dir = TempDir::new().unwrap();

    // Session 1: seed, then mutate without checkpointing
    {
        let store = DeviceStore::open(config(&dir).durability(DurabilityMode::Sync)).unwrap();
        store.initialize().await.unwrap();
        store.delete("DEMO-001").await.unwrap();
        let device = store.get("DEMO-002").await.unwrap().unwrap();
        store
            .update("DEMO-002", device.with_name("Rack 7 sensor"))
            .await
            .unwrap();
    }

    // Session 2: a new adapter sees snapshot + WAL
    let store = DeviceStore::open(config(&dir)).unwrap();
    assert_eq!(store.count().await.unwrap(), 29);
    assert!(store.get("DEMO-001").await.unwrap().is_none());
    assert_eq!(store.get("DEMO-002").await.unwrap().unwrap().name, "Rack 7 sensor");

    let active = store.fetch(StatusFilter::Active).await.unwrap();
    assert_eq!(active.len(), 10);
}

#[tokio::test]
async fn test_automatic_checkpoint_truncates_wal() {
    let dir = TempDir::new().unwrap();
    let store = DeviceStore::open(config(&dir).checkpoint_threshold(3)).unwrap();
    store.initialize().await.unwrap();

    for i in 0..3 {
        let id = format!("EXTRA-{i}");
        store
            .update(&id, Device::new(&id, "extra", DeviceStatus::Active, Utc::now()))
            .await
            .unwrap();
    }

    let wal_len = std::fs::metadata(store.database_path().join(WAL_FILE_NAME)).unwrap().len();
    assert_eq!(wal_len, 0);

    let reopened = DeviceStore::open(config(&dir)).unwrap();
    assert_eq!(reopened.count().await.unwrap(), 33);
}

#[tokio::test]
async fn test_older_schema_version_recreates_store() {
    let dir = TempDir::new().unwrap();
    {
        let old = DeviceStore::open(config(&dir).schema_version(4)).unwrap();
        old.initialize().await.unwrap();
        assert_eq!(old.count().await.unwrap(), 30);
    }

    let current = DeviceStore::open(config(&dir)).unwrap();
    assert_eq!(current.count().await.unwrap(), 0);
    assert!(current.database_exists());

    let manifest = DatabaseManifest::load(&current.database_path()).unwrap().unwrap();
    assert_eq!(manifest.version, inventorydb::SCHEMA_VERSION);

    // The recreated store accepts writes
    current
        .update("A-1", Device::new("A-1", "after upgrade", DeviceStatus::Active, Utc::now()))
        .await
        .unwrap();
    assert_eq!(current.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_newer_schema_version_is_rejected() {
    let dir = TempDir::new().unwrap();
    {
        let newer = DeviceStore::open(config(&dir).schema_version(9)).unwrap();
        newer.initialize().await.unwrap();
    }

    let current = DeviceStore::open(config(&dir)).unwrap();
    let err = current.count().await.unwrap_err();
    match err {
        InventoryError::Query(msg) => assert!(msg.contains("version")),
        other => panic!("unexpected error: {other:?}"),
    }

    // initialize recovers from the mismatch by recreating everything
    current.initialize().await.unwrap();
    assert_eq!(current.count().await.unwrap(), 30);
}

#[tokio::test]
async fn test_durability_none_keeps_data_in_handle_only() {
    let dir = TempDir::new().unwrap();
    let store = DeviceStore::open(config(&dir).durability(DurabilityMode::None)).unwrap();
    store.initialize().await.unwrap();
    assert_eq!(store.count().await.unwrap(), 30);
    assert!(!store.database_path().join(WAL_FILE_NAME).exists());

    let reopened = DeviceStore::open(config(&dir).durability(DurabilityMode::None)).unwrap();
    assert_eq!(reopened.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_explicit_checkpoint() {
    let dir = TempDir::new().unwrap();
    let store = DeviceStore::open(config(&dir)).unwrap();
    store.initialize().await.unwrap();
    store.delete("DEMO-030").await.unwrap();
    store.checkpoint().await.unwrap();

    let wal_len = std::fs::metadata(store.database_path().join(WAL_FILE_NAME)).unwrap().len();
    assert_eq!(wal_len, 0);

    let reopened = DeviceStore::open(config(&dir)).unwrap();
    assert_eq!(reopened.count().await.unwrap(), 29);
}
