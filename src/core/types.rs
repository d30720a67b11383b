use super::{InventoryError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Longest device name accepted by the edit path.
pub const MAX_DEVICE_NAME_LEN: usize = 32;

/// Status stored on a device record.
///
/// There are exactly two real statuses. The "All" token used when listing
/// lives on [`crate::query::StatusFilter`] and can never be parsed into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DeviceStatus {
    Active,
    Inactive,
}

impl DeviceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceStatus::Active => "Active",
            DeviceStatus::Inactive => "Inactive",
        }
    }
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeviceStatus {
    type Err = InventoryError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(DeviceStatus::Active),
            "inactive" => Ok(DeviceStatus::Inactive),
            _ => Err(InventoryError::InvalidStatus(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub serial_number: String,
    pub name: String,
    pub status: DeviceStatus,
    pub last_connection_date: DateTime<Utc>,
}

impl Device {
    pub fn new(
        serial_number: impl Into<String>,
        name: impl Into<String>,
        status: DeviceStatus,
        last_connection_date: DateTime<Utc>,
    ) -> Self {
        Self {
            serial_number: serial_number.into(),
            name: name.into(),
            status,
            last_connection_date,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == DeviceStatus::Active
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_status(mut self, status: DeviceStatus) -> Self {
        self.status = status;
        self
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | {} | {} | {}",
            self.serial_number,
            self.name,
            self.status,
            self.last_connection_date.format("%Y-%m-%d %H:%M:%S UTC")
        )
    }
}

/// Per-status record counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub active: usize,
    pub inactive: usize,
}

impl StatusCounts {
    pub fn total(&self) -> usize {
        self.active + self.inactive
    }
}

/// Check a name coming from the edit path: non-blank and at most
/// [`MAX_DEVICE_NAME_LEN`] characters.
pub fn validate_device_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(InventoryError::Validation(
            "Device name cannot be empty".to_string(),
        ));
    }
    let len = name.chars().count();
    if len > MAX_DEVICE_NAME_LEN {
        return Err(InventoryError::Validation(format!(
            "Device name is {} characters long, maximum is {}",
            len, MAX_DEVICE_NAME_LEN
        )));
    }
    Ok(())
}
