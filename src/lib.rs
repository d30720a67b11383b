// ============================================================================
// inventorydb Library
// ============================================================================
//
// Embedded device inventory: a persistent object store keyed by serial
// number with a status index, demo seeding, status filters and pagination.

pub mod connection;
pub mod core;
pub mod facade;
pub mod listing;
pub mod pagination;
pub mod query;
pub mod seed;
pub mod storage;

// Re-export main types for convenience
pub use connection::{SCHEMA_VERSION, StoreConfig};
pub use crate::core::{Device, DeviceStatus, InventoryError, Result, StatusCounts};
pub use facade::{DeviceRepository, DeviceStore, StoreStats};
pub use listing::DeviceListing;
pub use pagination::Paginator;
pub use query::{QueryPlan, StatusFilter};
pub use seed::SeedGenerator;
pub use storage::{DurabilityMode, StorageOrigin};
