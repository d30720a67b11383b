//! Write-Ahead Logging (WAL) and snapshot persistence for a device database

use crate::core::{Device, InventoryError, Result};
use crate::storage::table::{ObjectStore, StoreSchema};
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

pub const WAL_FILE_NAME: &str = "devices.wal";
pub const SNAPSHOT_FILE_NAME: &str = "devices.snapshot";
pub const DEFAULT_CHECKPOINT_THRESHOLD: usize = 1000;

// ============================================================================
// WAL Entry Types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum WalEntry {
    CreateStore { schema: StoreSchema },
    DropStore { name: String },
    Put { device: Device },
    Delete { key: String },
}

// ============================================================================
// Database Snapshot
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct DatabaseSnapshot {
    pub version: u32,
    pub store: Option<ObjectStore>,
    pub metadata: SnapshotMetadata,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SnapshotMetadata {
    pub created_at: i64,
    pub record_count: usize,
}

impl DatabaseSnapshot {
    pub fn new(store: Option<ObjectStore>) -> Self {
        let record_count = store.as_ref().map(|s| s.count()).unwrap_or(0);
        Self {
            version: 1,
            store,
            metadata: SnapshotMetadata {
                created_at: chrono::Utc::now().timestamp_millis(),
                record_count,
            },
        }
    }
}

// ============================================================================
// Durability Configuration
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DurabilityMode {
    /// fsync after every WAL append
    Sync,
    /// flush to the OS, no fsync
    #[default]
    Async,
    /// nothing is written to disk
    None,
}

// ============================================================================
// WAL Manager
// ============================================================================

/// Wrap an I/O failure with what was being attempted.
fn io_context(action: &'static str) -> impl FnOnce(std::io::Error) -> InventoryError {
    move |e| InventoryError::Io(format!("{action}: {e}"))
}

/// Open the log for appending, optionally discarding what it holds.
fn open_log(path: &Path, truncate: bool) -> Result<BufWriter<File>> {
    let mut options = OpenOptions::new();
    options.create(true);
    if truncate {
        options.write(true).truncate(true);
    } else {
        options.append(true);
    }
    let file = options.open(path).map_err(io_context("Failed to open WAL file"))?;
    Ok(BufWriter::new(file))
}

/// Read one `u32` length-prefixed frame. `Ok(None)` at a clean end of log
/// or at a frame cut short by a crash.
fn read_frame(reader: &mut impl Read, path: &Path) -> Result<Option<Vec<u8>>> {
    let mut len_bytes = [0u8; 4];
    match reader.read_exact(&mut len_bytes) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(io_context("Failed to read WAL frame length")(e)),
    }
    let mut frame = vec![0u8; u32::from_le_bytes(len_bytes) as usize];
    match reader.read_exact(&mut frame) {
        Ok(()) => Ok(Some(frame)),
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
            warn!(path = %path.display(), "Truncated WAL entry ignored");
            Ok(None)
        }
        Err(e) => Err(io_context("Failed to read WAL frame")(e)),
    }
}

pub struct WalManager {
    wal_path: PathBuf,
    writer: Option<BufWriter<File>>,
    durability_mode: DurabilityMode,
    entries_since_checkpoint: usize,
    checkpoint_threshold: usize,
}

impl WalManager {
    pub fn new<P: AsRef<Path>>(wal_path: P, durability_mode: DurabilityMode) -> Result<Self> {
        let wal_path = wal_path.as_ref().to_path_buf();
        if let Some(parent) = wal_path.parent() {
            fs::create_dir_all(parent).map_err(io_context("Failed to create WAL directory"))?;
        }
        let writer = match durability_mode {
            DurabilityMode::None => None,
            _ => Some(open_log(&wal_path, false)?),
        };
        Ok(Self {
            wal_path,
            writer,
            durability_mode,
            entries_since_checkpoint: 0,
            checkpoint_threshold: DEFAULT_CHECKPOINT_THRESHOLD,
        })
    }

    pub fn append(&mut self, entry: &WalEntry) -> Result<()> {
        let Some(writer) = self.writer.as_mut() else {
            return Ok(());
        };
        let payload = rmp_serde::to_vec(entry)?;
        let mut frame = Vec::with_capacity(payload.len() + 4);
        frame.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        frame.extend_from_slice(&payload);

        writer.write_all(&frame).map_err(io_context("Failed to write WAL"))?;
        writer.flush().map_err(io_context("Failed to flush WAL"))?;
        if self.durability_mode == DurabilityMode::Sync {
            writer.get_ref().sync_data().map_err(io_context("Failed to sync WAL"))?;
        }
        self.entries_since_checkpoint += 1;
        Ok(())
    }

    /// Every complete entry in log order.
    pub fn read_all(&self) -> Result<Vec<WalEntry>> {
        let file = match File::open(&self.wal_path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_context("Failed to open WAL for reading")(e)),
        };
        let mut reader = BufReader::new(file);
        let mut entries = Vec::new();
        while let Some(frame) = read_frame(&mut reader, &self.wal_path)? {
            entries.push(rmp_serde::from_slice(&frame)?);
        }
        Ok(entries)
    }

    /// Empty the log. The old writer stays in place if the truncate fails.
    pub fn clear(&mut self) -> Result<()> {
        if self.writer.is_none() {
            return Ok(());
        }
        let truncated = open_log(&self.wal_path, true)?;
        self.writer = Some(truncated);
        self.entries_since_checkpoint = 0;
        Ok(())
    }

    pub fn needs_checkpoint(&self) -> bool {
        self.entries_since_checkpoint >= self.checkpoint_threshold
    }

    pub fn is_empty(&self) -> bool {
        fs::metadata(&self.wal_path).map(|m| m.len() == 0).unwrap_or(true)
    }

    pub fn entries_since_checkpoint(&self) -> usize {
        self.entries_since_checkpoint
    }

    pub fn set_checkpoint_threshold(&mut self, threshold: usize) {
        self.checkpoint_threshold = threshold;
    }
}

// ============================================================================
// Snapshot Manager
// ============================================================================

pub struct SnapshotManager {
    snapshot_path: PathBuf,
}

impl SnapshotManager {
    pub fn new<P: AsRef<Path>>(snapshot_path: P) -> Self {
        Self {
            snapshot_path: snapshot_path.as_ref().to_path_buf(),
        }
    }

    /// Replace the snapshot atomically: write a temp file beside it, fsync,
    /// then rename over the old one.
    pub fn save(&self, snapshot: &DatabaseSnapshot) -> Result<()> {
        let dir = self.snapshot_path.parent().unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir).map_err(io_context("Failed to create snapshot directory"))?;

        let bytes = rmp_serde::to_vec(snapshot)?;
        let mut temp = NamedTempFile::new_in(dir).map_err(io_context("Failed to create snapshot temp file"))?;
        temp.write_all(&bytes).map_err(io_context("Failed to write snapshot"))?;
        temp.as_file().sync_all().map_err(io_context("Failed to sync snapshot"))?;
        temp.persist(&self.snapshot_path)
            .map_err(|e| io_context("Failed to replace snapshot")(e.error))?;
        Ok(())
    }

    /// Load the snapshot with its indexes rebuilt.
    pub fn load(&self) -> Result<Option<DatabaseSnapshot>> {
        let bytes = match fs::read(&self.snapshot_path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_context("Failed to read snapshot")(e)),
        };
        let mut snapshot: DatabaseSnapshot = rmp_serde::from_slice(&bytes)?;
        if let Some(store) = snapshot.store.as_mut() {
            store.rebuild_indexes();
        }
        Ok(Some(snapshot))
    }
}

// ============================================================================
// Persistence Manager
// ============================================================================

pub struct PersistenceManager {
    wal: WalManager,
    snapshot: SnapshotManager,
    durability_mode: DurabilityMode,
}

impl PersistenceManager {
    pub fn new<P: AsRef<Path>>(data_dir: P, durability_mode: DurabilityMode) -> Result<Self> {
        let data_dir = data_dir.as_ref();
        let wal = WalManager::new(data_dir.join(WAL_FILE_NAME), durability_mode)?;
        let snapshot = SnapshotManager::new(data_dir.join(SNAPSHOT_FILE_NAME));
        Ok(Self { wal, snapshot, durability_mode })
    }

    pub fn log(&mut self, entry: &WalEntry) -> Result<()> {
        self.wal.append(entry)
    }

    pub fn checkpoint(&mut self, store: Option<&ObjectStore>) -> Result<()> {
        if self.durability_mode == DurabilityMode::None { return Ok(()); }
        let snapshot = DatabaseSnapshot::new(store.cloned());
        self.snapshot.save(&snapshot)?;
        let folded = self.wal.entries_since_checkpoint();
        self.wal.clear()?;
        debug!(records = snapshot.metadata.record_count, folded, "Checkpoint written");
        Ok(())
    }

    pub fn needs_checkpoint(&self) -> bool {
        self.wal.needs_checkpoint()
    }

    /// Rebuild the object store from snapshot + WAL.
    ///
    /// Returns `None` when the database has no object store.
    pub fn recover(&self) -> Result<Option<ObjectStore>> {
        let mut store = self.snapshot.load()?.and_then(|snapshot| snapshot.store);

        for entry in self.wal.read_all()? {
            match entry {
                WalEntry::CreateStore { schema } => {
                    store = Some(ObjectStore::new(schema));
                }
                WalEntry::DropStore { .. } => {
                    store = None;
                }
                WalEntry::Put { device } => {
                    if let Some(s) = store.as_mut() {
                        s.put(device)?;
                    }
                }
                WalEntry::Delete { key } => {
                    if let Some(s) = store.as_mut() {
                        s.delete(&key);
                    }
                }
            }
        }
        Ok(store)
    }

    pub fn wal(&self) -> &WalManager { &self.wal }
    pub fn wal_mut(&mut self) -> &mut WalManager { &mut self.wal }
}
