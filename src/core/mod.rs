pub mod error;
pub mod types;
pub mod value;

pub use error::{InventoryError, Result};
pub use types::{
    Device, DeviceStatus, StatusCounts, MAX_DEVICE_NAME_LEN, validate_device_name,
};
pub use value::{IndexKey, IndexedField};
