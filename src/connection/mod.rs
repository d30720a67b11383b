pub mod config;

pub use config::{SCHEMA_VERSION, StoreConfig};
