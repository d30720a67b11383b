use crate::core::{InventoryError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

pub const MANIFEST_FILE_NAME: &str = "manifest.json";

/// Name and schema version of a database, stored next to its WAL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseManifest {
    pub name: String,
    pub version: u32,
    pub created_at: i64,
}

impl DatabaseManifest {
    pub fn new(name: impl Into<String>, version: u32) -> Self {
        Self {
            name: name.into(),
            version,
            created_at: chrono::Utc::now().timestamp_millis(),
        }
    }

    pub fn load(dir: &Path) -> Result<Option<Self>> {
        let path = dir.join(MANIFEST_FILE_NAME);
        if !path.exists() {
            return Ok(None);
        }
        let data = fs::read(&path)
            .map_err(|e| InventoryError::Io(format!("Failed to read manifest: {}", e)))?;
        Ok(Some(serde_json::from_slice(&data)?))
    }

    /// Write the manifest atomically (temp file in the same directory, then rename).
    pub fn save(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)
            .map_err(|e| InventoryError::Io(format!("Failed to create database directory: {}", e)))?;
        let mut temp = NamedTempFile::new_in(dir)
            .map_err(|e| InventoryError::Io(format!("Failed to create temp file: {}", e)))?;
        serde_json::to_writer_pretty(&mut temp, self)?;
        temp.flush()
            .map_err(|e| InventoryError::Io(format!("Failed to flush manifest: {}", e)))?;
        temp.persist(dir.join(MANIFEST_FILE_NAME))
            .map_err(|e| InventoryError::Io(format!("Failed to persist manifest: {}", e.error)))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_manifest_is_none() {
        let dir = TempDir::new().unwrap();
        assert!(DatabaseManifest::load(dir.path()).unwrap().is_none());
    }

    #[test]
    fn test_save_overwrites_previous_version() {
        let dir = TempDir::new().unwrap();
        DatabaseManifest::new("devices", 4).save(dir.path()).unwrap();
        DatabaseManifest::new("devices", 5).save(dir.path()).unwrap();
        let loaded = DatabaseManifest::load(dir.path()).unwrap().unwrap();
        assert_eq!(loaded.version, 5);
        assert_eq!(loaded.name, "devices");
    }
}
