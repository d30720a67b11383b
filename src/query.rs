use crate::core::{DeviceStatus, IndexKey, InventoryError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const STATUS_INDEX: &str = "status";

/// Filter token selected by the caller when listing devices.
///
/// `All` is a filter only; it has no [`DeviceStatus`] counterpart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum StatusFilter {
    #[default]
    All,
    Active,
    Inactive,
}

/// How a filter is answered by the object store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryPlan {
    FullScan,
    IndexLookup { index: &'static str, key: IndexKey },
}

impl StatusFilter {
    /// The stored status this filter selects, `None` for `All`.
    pub fn status(&self) -> Option<DeviceStatus> {
        match self {
            StatusFilter::All => None,
            StatusFilter::Active => Some(DeviceStatus::Active),
            StatusFilter::Inactive => Some(DeviceStatus::Inactive),
        }
    }

    pub fn plan(&self) -> QueryPlan {
        match self.status() {
            None => QueryPlan::FullScan,
            Some(status) => QueryPlan::IndexLookup {
                index: STATUS_INDEX,
                key: status.into(),
            },
        }
    }

    pub fn matches(&self, status: DeviceStatus) -> bool {
        self.status().is_none_or(|wanted| wanted == status)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StatusFilter::All => "All",
            StatusFilter::Active => "Active",
            StatusFilter::Inactive => "Inactive",
        }
    }
}

impl From<DeviceStatus> for StatusFilter {
    fn from(status: DeviceStatus) -> Self {
        match status {
            DeviceStatus::Active => StatusFilter::Active,
            DeviceStatus::Inactive => StatusFilter::Inactive,
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatusFilter {
    type Err = InventoryError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(StatusFilter::All),
            "active" => Ok(StatusFilter::Active),
            "inactive" => Ok(StatusFilter::Inactive),
            _ => Err(InventoryError::InvalidFilter(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_is_a_full_scan() {
        assert_eq!(StatusFilter::All.plan(), QueryPlan::FullScan);
        assert_eq!(StatusFilter::All.status(), None);
    }

    #[test]
    fn test_status_filters_use_the_index() {
        assert_eq!(
            StatusFilter::Inactive.plan(),
            QueryPlan::IndexLookup {
                index: STATUS_INDEX,
                key: IndexKey::Text("Inactive".into()),
            }
        );
    }

    #[test]
    fn test_parse() {
        assert_eq!("ALL".parse::<StatusFilter>().unwrap(), StatusFilter::All);
        assert_eq!("active".parse::<StatusFilter>().unwrap(), StatusFilter::Active);
        assert!("offline".parse::<StatusFilter>().is_err());
    }

    #[test]
    fn test_matches() {
        assert!(StatusFilter::All.matches(DeviceStatus::Inactive));
        assert!(StatusFilter::Active.matches(DeviceStatus::Active));
        assert!(!StatusFilter::Active.matches(DeviceStatus::Inactive));
    }
}
