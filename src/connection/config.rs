use crate::storage::DurabilityMode;
use std::path::{Path, PathBuf};

pub const DEFAULT_DATABASE_NAME: &str = "device-database";
pub const DEFAULT_STORE_NAME: &str = "devices";
/// Bumped whenever the object store or index layout changes.
pub const SCHEMA_VERSION: u32 = 5;
pub const DEFAULT_SEED_SIZE: usize = 200;
pub const DEFAULT_ITEMS_PER_PAGE: usize = 12;

/// Device store configuration
///
/// Built with chained setters, or parsed from `inventorydb://<dir>/<database>`.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Storage origin: the directory that holds every database
    pub data_dir: PathBuf,

    /// Database directory name under the origin
    pub database: String,

    /// Object store name inside the database
    pub store_name: String,

    /// Schema version the adapter expects
    pub schema_version: u32,

    /// Number of demo records written by initialize
    pub seed_size: usize,

    pub durability_mode: DurabilityMode,

    /// WAL entries between automatic checkpoints
    pub checkpoint_threshold: usize,

    /// Page size for listings
    pub items_per_page: usize,
}

impl StoreConfig {
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            database: DEFAULT_DATABASE_NAME.to_string(),
            store_name: DEFAULT_STORE_NAME.to_string(),
            schema_version: SCHEMA_VERSION,
            seed_size: DEFAULT_SEED_SIZE,
            durability_mode: DurabilityMode::Async,
            checkpoint_threshold: crate::storage::persistence::DEFAULT_CHECKPOINT_THRESHOLD,
            items_per_page: DEFAULT_ITEMS_PER_PAGE,
        }
    }

    pub fn database(mut self, database: &str) -> Self {
        self.database = database.to_string();
        self
    }

    pub fn schema_version(mut self, version: u32) -> Self {
        self.schema_version = version;
        self
    }

    pub fn seed_size(mut self, size: usize) -> Self {
        self.seed_size = size;
        self
    }

    pub fn durability(mut self, mode: DurabilityMode) -> Self {
        self.durability_mode = mode;
        self
    }

    pub fn checkpoint_threshold(mut self, threshold: usize) -> Self {
        self.checkpoint_threshold = threshold;
        self
    }

    pub fn items_per_page(mut self, per_page: usize) -> Self {
        self.items_per_page = per_page;
        self
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(&self.database)
    }

    /// Parse from a location string
    ///
    /// Format: "inventorydb://<data-dir>/<database>"
    ///
    /// # Examples
    ///
    /// ```
    /// use inventorydb::StoreConfig;
    ///
    /// let config = StoreConfig::from_url("inventorydb:///var/lib/inventory/devices").unwrap();
    /// assert_eq!(config.database, "devices");
    /// assert_eq!(config.data_dir, std::path::PathBuf::from("/var/lib/inventory"));
    /// ```
    pub fn from_url(url: &str) -> Result<Self, String> {
        let path = url
            .strip_prefix("inventorydb://")
            .ok_or_else(|| "URL must start with 'inventorydb://'".to_string())?;

        let path = Path::new(path);
        let database = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| "URL must end with a database name".to_string())?;
        let data_dir = path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        Ok(Self::new(data_dir).database(database))
    }

    pub fn to_url(&self) -> String {
        format!("inventorydb://{}", self.database_path().display())
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.database.trim().is_empty() {
            return Err("Database name cannot be empty".to_string());
        }
        if self.database.contains(['/', '\\']) || self.database == "." || self.database == ".." {
            return Err(format!("Database name '{}' is not a plain directory name", self.database));
        }
        if self.store_name.trim().is_empty() {
            return Err("Store name cannot be empty".to_string());
        }
        if self.schema_version == 0 {
            return Err("schema_version must be > 0".to_string());
        }
        if self.items_per_page == 0 {
            return Err("items_per_page must be > 0".to_string());
        }
        Ok(())
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new("./inventorydb-data")
    }
}
