use crate::core::{Device, Result};
use crate::facade::DeviceStore;
use crate::query::StatusFilter;
use async_trait::async_trait;

/// The calls a listing needs from storage.
///
/// Implemented by [`DeviceStore`]; tests can substitute an in-memory version.
#[async_trait]
pub trait DeviceRepository: Send + Sync {
    async fn fetch(&self, filter: StatusFilter) -> Result<Vec<Device>>;

    async fn update(&self, id: &str, device: Device) -> Result<()>;

    async fn delete(&self, id: &str) -> Result<()>;
}

#[async_trait]
impl DeviceRepository for DeviceStore {
    async fn fetch(&self, filter: StatusFilter) -> Result<Vec<Device>> {
        DeviceStore::fetch(self, filter).await
    }

    async fn update(&self, id: &str, device: Device) -> Result<()> {
        DeviceStore::update(self, id, device).await
    }

    async fn delete(&self, id: &str) -> Result<()> {
        DeviceStore::delete(self, id).await
    }
}

#[async_trait]
impl<R: DeviceRepository + ?Sized> DeviceRepository for std::sync::Arc<R> {
    async fn fetch(&self, filter: StatusFilter) -> Result<Vec<Device>> {
        (**self).fetch(filter).await
    }

    async fn update(&self, id: &str, device: Device) -> Result<()> {
        (**self).update(id, device).await
    }

    async fn delete(&self, id: &str) -> Result<()> {
        (**self).delete(id).await
    }
}
