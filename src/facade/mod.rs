pub mod database;
pub mod repository;

pub use database::{DeviceStore, StoreStats};
pub use repository::DeviceRepository;
