use crate::core::{InventoryError, Result};
use futures::future::try_join_all;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Root directory that owns every database of the application.
///
/// Each database is a subdirectory named after the database.
#[derive(Debug, Clone)]
pub struct StorageOrigin {
    root: PathBuf,
}

impl StorageOrigin {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn database_path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    pub fn database_exists(&self, name: &str) -> bool {
        self.database_path(name).is_dir()
    }

    /// Names of every database under the origin. A missing root means none.
    pub fn list_databases(&self) -> Result<Vec<String>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }
        let entries = fs::read_dir(&self.root)
            .map_err(|e| InventoryError::Io(format!("Failed to list storage origin: {}", e)))?;
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| InventoryError::Io(e.to_string()))?;
            if entry.path().is_dir() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Remove one database. Deleting a database that does not exist succeeds.
    pub async fn delete_database(&self, name: &str) -> Result<()> {
        let path = self.database_path(name);
        match tokio::fs::remove_dir_all(&path).await {
            Ok(()) => {
                debug!(database = name, "Database deleted");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(InventoryError::Io(format!(
                "Failed to delete database '{}': {}",
                name, e
            ))),
        }
    }

    /// Remove every database under the origin, concurrently.
    ///
    /// This is not limited to the device database: anything the origin holds
    /// is destroyed. Returns the names that were removed.
    pub async fn delete_all(&self) -> Result<Vec<String>> {
        let names = self.list_databases()?;
        try_join_all(names.iter().map(|name| self.delete_database(name))).await?;
        info!(count = names.len(), "All databases deleted");
        Ok(names)
    }
}
