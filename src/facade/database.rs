use crate::connection::StoreConfig;
use crate::core::{Device, DeviceStatus, InventoryError, Result, StatusCounts};
use crate::query::{QueryPlan, StatusFilter, STATUS_INDEX};
use crate::seed::SeedGenerator;
use crate::storage::{
    DatabaseManifest, ObjectStore, PersistenceManager, StorageOrigin, StoreSchema, WalEntry,
};
use std::fmt;
use std::path::PathBuf;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

/// An open database: its object store (if created) and its WAL/snapshot files.
struct Database {
    store: Option<ObjectStore>,
    persistence: PersistenceManager,
}

impl Database {
    fn store(&self, name: &str) -> Result<&ObjectStore> {
        self.store
            .as_ref()
            .ok_or_else(|| InventoryError::StoreNotFound(name.to_string()))
    }

    fn add(&mut self, name: &str, device: Device) -> Result<()> {
        self.write(name, device, false)
    }

    fn put(&mut self, name: &str, device: Device) -> Result<()> {
        self.write(name, device, true)
    }

    fn write(&mut self, name: &str, device: Device, overwrite: bool) -> Result<()> {
        // A rejected record must never reach the log
        self.store(name)?.check_write(&device, overwrite)?;

        self.persistence.log(&WalEntry::Put { device: device.clone() })?;
        if let Some(store) = self.store.as_mut() {
            if overwrite {
                store.put(device)?;
            } else {
                store.add(device)?;
            }
        }
        Ok(())
    }

    fn delete(&mut self, name: &str, key: &str) -> Result<bool> {
        if self.store(name)?.get(key).is_none() {
            return Ok(false);
        }
        self.persistence.log(&WalEntry::Delete { key: key.to_string() })?;
        if let Some(store) = self.store.as_mut() {
            store.delete(key);
        }
        Ok(true)
    }

    fn checkpoint(&mut self) -> Result<()> {
        self.persistence.checkpoint(self.store.as_ref())
    }

    fn maybe_checkpoint(&mut self) -> Result<()> {
        if self.persistence.needs_checkpoint() {
            self.checkpoint()?;
        }
        Ok(())
    }
}

/// Persistent device store.
///
/// Owns the handle to one database under a [`StorageOrigin`]. Every operation
/// locks the handle for its own duration only, so each call behaves as one
/// transaction. Reads against a database or object store that does not exist
/// yet return zero or an empty list rather than an error.
///
/// # Examples
///
/// ```no_run
/// use inventorydb::{DeviceStore, StatusFilter, StoreConfig};
///
/// # tokio_test::block_on(async {
/// let store = DeviceStore::open(StoreConfig::new("./data")).unwrap();
/// store.initialize().await.unwrap();
/// assert_eq!(store.count().await.unwrap(), 200);
///
/// let active = store.fetch(StatusFilter::Active).await.unwrap();
/// println!("{} active devices", active.len());
/// # });
/// ```
pub struct DeviceStore {
    config: StoreConfig,
    origin: StorageOrigin,
    handle: Mutex<Option<Database>>,
}

impl DeviceStore {
    /// Create the adapter. Nothing is read from or written to disk until the
    /// first operation.
    pub fn open(config: StoreConfig) -> Result<Self> {
        config.validate().map_err(InventoryError::Validation)?;
        let origin = StorageOrigin::new(&config.data_dir);
        Ok(Self {
            config,
            origin,
            handle: Mutex::new(None),
        })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn origin(&self) -> &StorageOrigin {
        &self.origin
    }

    pub fn database_path(&self) -> PathBuf {
        self.config.database_path()
    }

    pub fn database_exists(&self) -> bool {
        self.origin.database_exists(&self.config.database)
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Destroy this application's database, recreate the schema, and load a
    /// fresh seed batch.
    ///
    /// A failure leaves whatever was written so far; callers should retry the
    /// whole operation.
    pub async fn initialize(&self) -> Result<()> {
        let mut guard = self.handle.lock().await;
        *guard = None;

        info!(database = %self.config.database, "Starting database initialization");
        self.origin
            .delete_database(&self.config.database)
            .await
            .map_err(InventoryError::into_init)?;

        let mut db = self.create_database().map_err(InventoryError::into_init)?;

        let devices = SeedGenerator::new(self.config.seed_size).generate();
        for device in devices {
            db.add(&self.config.store_name, device)
                .map_err(InventoryError::into_init)?;
        }
        db.checkpoint().map_err(InventoryError::into_init)?;

        let count = db.store.as_ref().map(|s| s.count()).unwrap_or(0);
        *guard = Some(db);
        info!(count, "Database initialized");
        Ok(())
    }

    /// Delete every database under the storage origin.
    ///
    /// This is a full reset: databases that do not belong to the device store
    /// are removed as well.
    pub async fn wipe_all(&self) -> Result<()> {
        let mut guard = self.handle.lock().await;
        *guard = None;
        let removed = self
            .origin
            .delete_all()
            .await
            .map_err(InventoryError::into_write)?;
        info!(root = %self.origin.root().display(), databases = ?removed, "Storage origin wiped");
        Ok(())
    }

    /// Write a snapshot and truncate the WAL.
    pub async fn checkpoint(&self) -> Result<()> {
        let mut guard = self.handle.lock().await;
        if let Some(db) = self.database(&mut guard)? {
            db.checkpoint()?;
        }
        Ok(())
    }

    // ========================================================================
    // Reads
    // ========================================================================

    pub async fn count(&self) -> Result<usize> {
        let mut guard = self.handle.lock().await;
        let db = match self.database(&mut guard).map_err(InventoryError::into_query)? {
            Some(db) => db,
            None => return Ok(0),
        };
        Ok(db.store.as_ref().map(|s| s.count()).unwrap_or(0))
    }

    pub async fn count_by_status(&self) -> Result<StatusCounts> {
        let mut guard = self.handle.lock().await;
        let store = match self.database(&mut guard).map_err(InventoryError::into_query)? {
            Some(Database { store: Some(store), .. }) => store,
            _ => return Ok(StatusCounts::default()),
        };

        let count = |status: DeviceStatus| {
            store
                .count_by_index(STATUS_INDEX, &status.into())
                .map_err(InventoryError::into_query)
        };
        Ok(StatusCounts {
            active: count(DeviceStatus::Active)?,
            inactive: count(DeviceStatus::Inactive)?,
        })
    }

    /// Devices matching `filter`, as owned copies in serial-number order.
    pub async fn fetch(&self, filter: StatusFilter) -> Result<Vec<Device>> {
        debug!(%filter, "Fetching devices");
        let mut guard = self.handle.lock().await;
        let store = match self.database(&mut guard).map_err(InventoryError::into_query)? {
            Some(Database { store: Some(store), .. }) => store,
            _ => return Ok(Vec::new()),
        };

        let devices = match filter.plan() {
            QueryPlan::FullScan => store.get_all(),
            QueryPlan::IndexLookup { index, key } => store
                .get_all_by_index(index, &key)
                .map_err(InventoryError::into_query)?,
        };
        debug!(count = devices.len(), "Found devices");
        Ok(devices)
    }

    pub async fn get(&self, id: &str) -> Result<Option<Device>> {
        let mut guard = self.handle.lock().await;
        match self.database(&mut guard).map_err(InventoryError::into_query)? {
            Some(Database { store: Some(store), .. }) => Ok(store.get(id)),
            _ => Ok(None),
        }
    }

    pub async fn stats(&self) -> Result<StoreStats> {
        let counts = self.count_by_status().await?;
        Ok(StoreStats {
            database: self.config.database.clone(),
            schema_version: self.config.schema_version,
            record_count: self.count().await?,
            counts,
        })
    }

    // ========================================================================
    // Writes
    // ========================================================================

    /// Insert a new device. Fails with a constraint violation if the serial
    /// number is taken.
    pub async fn add(&self, device: Device) -> Result<()> {
        let mut guard = self.handle.lock().await;
        let db = self.writable(&mut guard)?;
        db.add(&self.config.store_name, device)
            .map_err(InventoryError::into_write)?;
        db.maybe_checkpoint().map_err(InventoryError::into_write)
    }

    /// Upsert `device` under key `id`. The key in the payload is replaced by
    /// `id`.
    pub async fn update(&self, id: &str, mut device: Device) -> Result<()> {
        if device.serial_number != id {
            warn!(id, payload_key = %device.serial_number, "Update payload key differs, using id");
            device.serial_number = id.to_string();
        }
        let mut guard = self.handle.lock().await;
        let db = self.writable(&mut guard)?;
        db.put(&self.config.store_name, device)
            .map_err(InventoryError::into_write)?;
        db.maybe_checkpoint().map_err(InventoryError::into_write)
    }

    /// Remove the device under `id`. Deleting a missing key succeeds.
    pub async fn delete(&self, id: &str) -> Result<()> {
        let mut guard = self.handle.lock().await;
        let db = self.writable(&mut guard)?;
        let removed = db
            .delete(&self.config.store_name, id)
            .map_err(InventoryError::into_write)?;
        if removed {
            debug!(id, "Device deleted");
        }
        db.maybe_checkpoint().map_err(InventoryError::into_write)
    }

    // ========================================================================
    // Handle management
    // ========================================================================

    fn writable<'g>(&self, guard: &'g mut MutexGuard<'_, Option<Database>>) -> Result<&'g mut Database> {
        self.database(guard)
            .map_err(InventoryError::into_write)?
            .ok_or_else(|| {
                InventoryError::Write(format!("Database '{}' does not exist", self.config.database))
            })
    }

    /// Return the open database, opening it from disk if needed.
    ///
    /// `None` means the database directory does not exist. A cached handle is
    /// dropped when its directory has been removed behind our back.
    fn database<'g>(&self, guard: &'g mut MutexGuard<'_, Option<Database>>) -> Result<Option<&'g mut Database>> {
        if !self.database_exists() {
            if guard.is_some() {
                debug!(database = %self.config.database, "Database directory gone, closing handle");
            }
            **guard = None;
            return Ok(None);
        }
        if guard.is_none() {
            **guard = Some(self.open_database()?);
        }
        Ok((**guard).as_mut())
    }

    fn create_database(&self) -> Result<Database> {
        let path = self.database_path();
        DatabaseManifest::new(&self.config.database, self.config.schema_version).save(&path)?;

        let mut persistence = PersistenceManager::new(&path, self.config.durability_mode)?;
        persistence.wal_mut().set_checkpoint_threshold(self.config.checkpoint_threshold);

        let schema = StoreSchema::devices(&self.config.store_name);
        persistence.log(&WalEntry::CreateStore { schema: schema.clone() })?;
        Ok(Database {
            store: Some(ObjectStore::new(schema)),
            persistence,
        })
    }

    fn open_database(&self) -> Result<Database> {
        let path = self.database_path();
        let expected = self.config.schema_version;
        let found = DatabaseManifest::load(&path)?.map(|m| m.version).unwrap_or(0);

        if found > expected {
            return Err(InventoryError::VersionMismatch { found, expected });
        }

        let mut persistence = PersistenceManager::new(&path, self.config.durability_mode)?;
        persistence.wal_mut().set_checkpoint_threshold(self.config.checkpoint_threshold);

        if found < expected {
            info!(found, expected, "Schema version changed, recreating object store");
            let schema = StoreSchema::devices(&self.config.store_name);
            persistence.log(&WalEntry::DropStore { name: self.config.store_name.clone() })?;
            persistence.log(&WalEntry::CreateStore { schema: schema.clone() })?;
            let store = ObjectStore::new(schema);
            persistence.checkpoint(Some(&store))?;
            DatabaseManifest::new(&self.config.database, expected).save(&path)?;
            return Ok(Database { store: Some(store), persistence });
        }

        let store = persistence.recover()?;
        // Fold the replayed log into a snapshot so new appends never follow a torn tail
        if !persistence.wal().is_empty() {
            persistence.checkpoint(store.as_ref())?;
        }
        debug!(
            database = %self.config.database,
            records = store.as_ref().map(|s| s.count()).unwrap_or(0),
            "Database opened"
        );
        Ok(Database { store, persistence })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreStats {
    pub database: String,
    pub schema_version: u32,
    pub record_count: usize,
    pub counts: StatusCounts,
}

impl fmt::Display for StoreStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Database '{}' (schema v{}): {} devices, {} active, {} inactive",
            self.database,
            self.schema_version,
            self.record_count,
            self.counts.active,
            self.counts.inactive
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> DeviceStore {
        DeviceStore::open(StoreConfig::new(dir.path()).seed_size(9)).unwrap()
    }

    #[tokio::test]
    async fn test_reads_on_missing_database_are_empty() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        assert_eq!(store.count().await.unwrap(), 0);
        assert_eq!(store.count_by_status().await.unwrap(), StatusCounts::default());
        assert!(store.fetch(StatusFilter::All).await.unwrap().is_empty());
        assert!(store.get("DEMO-001").await.unwrap().is_none());
        assert!(!store.database_exists());
    }

    #[tokio::test]
    async fn test_write_on_missing_database_is_write_error() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let device = Device::new("X", "x", DeviceStatus::Active, Utc::now());
        let err = store.update("X", device).await.unwrap_err();
        assert!(matches!(err, InventoryError::Write(_)));
        assert!(!store.database_exists());
    }

    #[tokio::test]
    async fn test_initialize_uses_configured_seed_size() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.initialize().await.unwrap();
        assert_eq!(store.count().await.unwrap(), 9);
        assert_eq!(
            store.count_by_status().await.unwrap(),
            StatusCounts { active: 3, inactive: 6 }
        );
    }

    #[tokio::test]
    async fn test_manifest_without_store_reads_as_empty() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let path = store.database_path();
        DatabaseManifest::new("device-database", crate::SCHEMA_VERSION).save(&path).unwrap();
        assert_eq!(store.count().await.unwrap(), 0);

        let device = Device::new("X", "x", DeviceStatus::Active, Utc::now());
        let err = store.update("X", device).await.unwrap_err();
        assert!(matches!(err, InventoryError::Write(msg) if msg.contains("not found")));
    }

    #[tokio::test]
    async fn test_stats_display() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.initialize().await.unwrap();
        let stats = store.stats().await.unwrap();
        assert_eq!(stats.record_count, 9);
        assert!(stats.to_string().contains("9 devices"));
    }

    #[test]
    fn test_rejected_write_is_not_logged() {
        use crate::core::IndexedField;
        use crate::storage::{DurabilityMode, IndexSpec};

        let dir = TempDir::new().unwrap();
        let schema = StoreSchema::new("devices", "serialNumber").with_index(IndexSpec {
            name: "name".into(),
            field: IndexedField::Name,
            unique: true,
        });
        let mut persistence = PersistenceManager::new(dir.path(), DurabilityMode::Sync).unwrap();
        persistence.log(&WalEntry::CreateStore { schema: schema.clone() }).unwrap();
        let mut db = Database {
            store: Some(ObjectStore::new(schema)),
            persistence,
        };

        db.add("devices", Device::new("A", "boiler", DeviceStatus::Active, Utc::now()))
            .unwrap();
        let clash = Device::new("B", "boiler", DeviceStatus::Inactive, Utc::now());
        assert!(matches!(
            db.put("devices", clash.clone()),
            Err(InventoryError::ConstraintViolation(_))
        ));
        assert!(db.add("devices", clash).is_err());
        assert_eq!(db.persistence.wal().entries_since_checkpoint(), 2);

        let recovered = db.persistence.recover().unwrap().unwrap();
        assert_eq!(recovered.count(), 1);
        assert!(recovered.get("B").is_none());
    }

    #[test]
    fn test_open_rejects_invalid_config() {
        let err = DeviceStore::open(StoreConfig::new("/tmp").database("")).err().unwrap();
        assert!(matches!(err, InventoryError::Validation(_)));
    }
}
