use thiserror::Error;

#[derive(Error, Debug)]
pub enum InventoryError {
    #[error("Storage initialization failed: {0}")]
    StorageInit(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Write failed: {0}")]
    Write(String),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Object store '{0}' not found")]
    StoreNotFound(String),

    #[error("Schema version mismatch: database is at version {found}, expected {expected}")]
    VersionMismatch { found: u32, expected: u32 },

    #[error("Invalid device status: '{0}'")]
    InvalidStatus(String),

    #[error("Invalid status filter: '{0}'")]
    InvalidFilter(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("I/O error: {0}")]
    Io(String),
}

pub type Result<T> = std::result::Result<T, InventoryError>;

impl InventoryError {
    /// Wrap a lower-level failure as an initialization error.
    ///
    /// Errors that already belong to the adapter taxonomy pass through.
    pub fn into_init(self) -> Self {
        match self {
            err @ InventoryError::StorageInit(_) => err,
            other => InventoryError::StorageInit(other.to_string()),
        }
    }

    pub fn into_query(self) -> Self {
        match self {
            err @ InventoryError::Query(_) => err,
            other => InventoryError::Query(other.to_string()),
        }
    }

    pub fn into_write(self) -> Self {
        match self {
            err @ (InventoryError::Write(_) | InventoryError::ConstraintViolation(_)) => err,
            other => InventoryError::Write(other.to_string()),
        }
    }
}

impl From<std::io::Error> for InventoryError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<rmp_serde::encode::Error> for InventoryError {
    fn from(err: rmp_serde::encode::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<rmp_serde::decode::Error> for InventoryError {
    fn from(err: rmp_serde::decode::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for InventoryError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
