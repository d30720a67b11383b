use crate::core::{Device, IndexKey, IndexedField, InventoryError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSpec {
    pub name: String,
    pub field: IndexedField,
    pub unique: bool,
}

impl IndexSpec {
    pub fn new(name: impl Into<String>, field: IndexedField) -> Self {
        Self {
            name: name.into(),
            field,
            unique: false,
        }
    }
}

/// Layout of an object store: its name, key path, and secondary indexes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSchema {
    name: String,
    key_path: String,
    indexes: Vec<IndexSpec>,
}

impl StoreSchema {
    pub fn new(name: impl Into<String>, key_path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key_path: key_path.into(),
            indexes: Vec::new(),
        }
    }

    pub fn with_index(mut self, spec: IndexSpec) -> Self {
        self.indexes.push(spec);
        self
    }

    /// The device store: keyed by serial number, indexed on name, status and
    /// last connection date.
    pub fn devices(name: impl Into<String>) -> Self {
        Self::new(name, "serialNumber")
            .with_index(IndexSpec::new("name", IndexedField::Name))
            .with_index(IndexSpec::new("status", IndexedField::Status))
            .with_index(IndexSpec::new("lastConnectionDate", IndexedField::LastConnectionDate))
    }

    pub fn indexes(&self) -> &[IndexSpec] { &self.indexes }
}

/// In-memory keyed collection of devices with secondary indexes.
///
/// Indexes are derived data: they are not serialized and are rebuilt with
/// [`ObjectStore::rebuild_indexes`] after a snapshot is loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectStore {
    schema: StoreSchema,
    records: BTreeMap<String, Device>,
    #[serde(skip)]
    indexes: HashMap<String, BTreeMap<IndexKey, BTreeSet<String>>>,
}

impl ObjectStore {
    pub fn new(schema: StoreSchema) -> Self {
        let indexes = schema
            .indexes()
            .iter()
            .map(|spec| (spec.name.clone(), BTreeMap::new()))
            .collect();
        Self {
            schema,
            records: BTreeMap::new(),
            indexes,
        }
    }

    /// Check that `device` can be written without changing anything.
    ///
    /// With `overwrite` false an existing record under the same key is a
    /// conflict. Unique indexes are checked in both modes.
    pub fn check_write(&self, device: &Device, overwrite: bool) -> Result<()> {
        if !overwrite && self.records.contains_key(&device.serial_number) {
            return Err(InventoryError::ConstraintViolation(format!(
                "{} '{}' already exists in object store '{}'",
                self.schema.key_path, device.serial_number, self.schema.name
            )));
        }
        self.check_unique_indexes(device)
    }

    /// Insert a new record. Fails if the key is already present.
    pub fn add(&mut self, device: Device) -> Result<()> {
        self.check_write(&device, false)?;
        self.index_record(&device);
        self.records.insert(device.serial_number.clone(), device);
        Ok(())
    }

    /// Insert or replace the record under its key. Returns the previous record.
    pub fn put(&mut self, device: Device) -> Result<Option<Device>> {
        self.check_write(&device, true)?;
        let previous = self.records.remove(&device.serial_number);
        if let Some(old) = &previous {
            self.unindex_record(old);
        }
        self.index_record(&device);
        self.records.insert(device.serial_number.clone(), device);
        Ok(previous)
    }

    /// Remove the record under `key`. Absent keys are not an error.
    pub fn delete(&mut self, key: &str) -> Option<Device> {
        let removed = self.records.remove(key);
        if let Some(old) = &removed {
            self.unindex_record(old);
        }
        removed
    }

    pub fn get(&self, key: &str) -> Option<Device> {
        self.records.get(key).cloned()
    }

    pub fn count(&self) -> usize {
        self.records.len()
    }

    /// All records in key order.
    pub fn get_all(&self) -> Vec<Device> {
        self.records.values().cloned().collect()
    }

    /// All records whose indexed value equals `key`, in key order.
    pub fn get_all_by_index(&self, index: &str, key: &IndexKey) -> Result<Vec<Device>> {
        let index_map = self.index(index)?;
        Ok(index_map
            .get(key)
            .map(|ids| ids.iter().filter_map(|id| self.records.get(id).cloned()).collect())
            .unwrap_or_default())
    }

    pub fn count_by_index(&self, index: &str, key: &IndexKey) -> Result<usize> {
        let index_map = self.index(index)?;
        Ok(index_map.get(key).map(|ids| ids.len()).unwrap_or(0))
    }

    pub fn rebuild_indexes(&mut self) {
        self.indexes = self
            .schema
            .indexes()
            .iter()
            .map(|spec| (spec.name.clone(), BTreeMap::new()))
            .collect();
        let records: Vec<Device> = self.records.values().cloned().collect();
        for device in &records {
            self.index_record(device);
        }
    }

    fn index(&self, name: &str) -> Result<&BTreeMap<IndexKey, BTreeSet<String>>> {
        self.indexes.get(name).ok_or_else(|| {
            InventoryError::Query(format!(
                "Index '{}' not found on object store '{}'",
                name, self.schema.name
            ))
        })
    }

    fn check_unique_indexes(&self, device: &Device) -> Result<()> {
        for spec in self.schema.indexes().iter().filter(|spec| spec.unique) {
            let value = spec.field.extract(device);
            let conflict = self
                .indexes
                .get(&spec.name)
                .and_then(|index| index.get(&value))
                .is_some_and(|ids| ids.iter().any(|id| id != &device.serial_number));
            if conflict {
                return Err(InventoryError::ConstraintViolation(format!(
                    "Unique index '{}' already contains value {}",
                    spec.name, value
                )));
            }
        }
        Ok(())
    }

    fn index_record(&mut self, device: &Device) {
        for spec in self.schema.indexes() {
            if let Some(index) = self.indexes.get_mut(&spec.name) {
                index
                    .entry(spec.field.extract(device))
                    .or_default()
                    .insert(device.serial_number.clone());
            }
        }
    }

    fn unindex_record(&mut self, device: &Device) {
        for spec in self.schema.indexes() {
            if let Some(index) = self.indexes.get_mut(&spec.name) {
                let value = spec.field.extract(device);
                if let Some(ids) = index.get_mut(&value) {
                    ids.remove(&device.serial_number);
                    if ids.is_empty() {
                        index.remove(&value);
                    }
                }
            }
        }
    }
}
