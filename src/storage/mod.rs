pub mod manifest;
pub mod origin;
pub mod persistence;
pub mod table;

pub use manifest::DatabaseManifest;
pub use origin::StorageOrigin;
pub use persistence::{DurabilityMode, PersistenceManager, WalEntry};
pub use table::{IndexSpec, ObjectStore, StoreSchema};
