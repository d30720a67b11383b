use crate::core::{Device, DeviceStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Value stored in a secondary index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum IndexKey {
    Text(String),
    Timestamp(i64),
}

impl From<DeviceStatus> for IndexKey {
    fn from(status: DeviceStatus) -> Self {
        IndexKey::Text(status.as_str().to_string())
    }
}

impl From<&str> for IndexKey {
    fn from(text: &str) -> Self {
        IndexKey::Text(text.to_string())
    }
}

impl From<DateTime<Utc>> for IndexKey {
    fn from(ts: DateTime<Utc>) -> Self {
        IndexKey::Timestamp(ts.timestamp_millis())
    }
}

impl fmt::Display for IndexKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexKey::Text(s) => write!(f, "'{}'", s),
            IndexKey::Timestamp(ms) => write!(f, "{}", ms),
        }
    }
}

/// Device field a secondary index is built over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexedField {
    Name,
    Status,
    LastConnectionDate,
}

impl IndexedField {
    pub fn extract(&self, device: &Device) -> IndexKey {
        match self {
            IndexedField::Name => IndexKey::Text(device.name.clone()),
            IndexedField::Status => device.status.into(),
            IndexedField::LastConnectionDate => device.last_connection_date.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_key_matches_stored_spelling() {
        assert_eq!(IndexKey::from(DeviceStatus::Active), IndexKey::Text("Active".into()));
    }

    #[test]
    fn test_extract_fields() {
        let now = Utc::now();
        let device = Device::new("S-1", "Probe", DeviceStatus::Inactive, now);
        assert_eq!(IndexedField::Name.extract(&device), IndexKey::Text("Probe".into()));
        assert_eq!(IndexedField::Status.extract(&device), IndexKey::Text("Inactive".into()));
        assert_eq!(
            IndexedField::LastConnectionDate.extract(&device),
            IndexKey::Timestamp(now.timestamp_millis())
        );
    }
}
