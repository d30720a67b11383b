//! Filtered, paginated view over a device repository.

use crate::core::{Device, Result, validate_device_name};
use crate::facade::DeviceRepository;
use crate::pagination::Paginator;
use crate::query::StatusFilter;
use tracing::debug;

/// Composes a repository, a status filter and a paginator.
///
/// Holds a copy of the current filtered result. Every mutation goes through
/// the repository and is followed by a re-query, so the copy never outlives
/// a write made through this listing.
pub struct DeviceListing<R> {
    repository: R,
    filter: StatusFilter,
    paginator: Paginator,
    devices: Vec<Device>,
}

impl<R: DeviceRepository> DeviceListing<R> {
    pub fn new(repository: R, items_per_page: usize) -> Self {
        Self {
            repository,
            filter: StatusFilter::All,
            paginator: Paginator::new(items_per_page),
            devices: Vec::new(),
        }
    }

    /// Build a listing and load the first page for `filter`.
    pub async fn load(repository: R, items_per_page: usize, filter: StatusFilter) -> Result<Self> {
        let mut listing = Self::new(repository, items_per_page);
        listing.filter = filter;
        listing.refresh().await?;
        Ok(listing)
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn filter(&self) -> StatusFilter {
        self.filter
    }

    pub fn paginator(&self) -> &Paginator {
        &self.paginator
    }

    pub fn current_page(&self) -> usize {
        self.paginator.current_page()
    }

    pub fn total_pages(&self) -> usize {
        self.paginator.total_pages()
    }

    pub fn total_items(&self) -> usize {
        self.devices.len()
    }

    /// Every device matching the active filter.
    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    /// Devices on the current page.
    pub fn current_items(&self) -> &[Device] {
        self.paginator.slice(&self.devices)
    }

    pub async fn refresh(&mut self) -> Result<()> {
        self.devices = self.repository.fetch(self.filter).await?;
        self.paginator.set_total_items(self.devices.len());
        Ok(())
    }

    /// Switch filters. The result set changes, so the listing goes back to
    /// page 1. Selecting the active filter again does nothing.
    ///
    /// If the fetch fails the listing keeps its previous filter, page and rows.
    pub async fn set_filter(&mut self, filter: StatusFilter) -> Result<()> {
        if filter == self.filter {
            return Ok(());
        }
        let devices = self.repository.fetch(filter).await?;
        debug!(from = %self.filter, to = %filter, count = devices.len(), "Filter changed");
        self.filter = filter;
        self.devices = devices;
        self.paginator.reset();
        self.paginator.set_total_items(self.devices.len());
        Ok(())
    }

    pub fn go_to_page(&mut self, page: usize) -> bool {
        self.paginator.go_to(page)
    }

    pub fn next_page(&mut self) -> bool {
        self.paginator.next()
    }

    pub fn previous_page(&mut self) -> bool {
        self.paginator.previous()
    }

    /// Save an edited device: the name must be non-blank and at most 32
    /// characters.
    pub async fn save(&mut self, id: &str, device: Device) -> Result<()> {
        validate_device_name(&device.name)?;
        self.repository.update(id, device).await?;
        self.refresh().await
    }

    pub async fn remove(&mut self, id: &str) -> Result<()> {
        self.repository.delete(id).await?;
        self.refresh().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{DeviceStatus, InventoryError};
    use async_trait::async_trait;
    use chrono::Utc;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryRepository {
        devices: Mutex<BTreeMap<String, Device>>,
        failing_filter: Mutex<Option<StatusFilter>>,
    }

    impl MemoryRepository {
        fn with_devices(count: usize) -> Self {
            let repo = Self::default();
            {
                let mut devices = repo.devices.lock().unwrap();
                for i in 1..=count {
                    let status = if i % 2 == 0 { DeviceStatus::Active } else { DeviceStatus::Inactive };
                    let serial = format!("S-{i:03}");
                    devices.insert(serial.clone(), Device::new(serial, format!("Unit {i}"), status, Utc::now()));
                }
            }
            repo
        }
    }

    #[async_trait]
    impl DeviceRepository for MemoryRepository {
        async fn fetch(&self, filter: StatusFilter) -> Result<Vec<Device>> {
            if *self.failing_filter.lock().unwrap() == Some(filter) {
                return Err(InventoryError::Query(format!("{filter} lookup failed")));
            }
            let devices = self.devices.lock().unwrap();
            Ok(devices.values().filter(|d| filter.matches(d.status)).cloned().collect())
        }

        async fn update(&self, id: &str, mut device: Device) -> Result<()> {
            device.serial_number = id.to_string();
            self.devices.lock().unwrap().insert(id.to_string(), device);
            Ok(())
        }

        async fn delete(&self, id: &str) -> Result<()> {
            self.devices.lock().unwrap().remove(id);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_filter_change_resets_to_first_page() {
        let mut listing = DeviceListing::load(MemoryRepository::with_devices(40), 12, StatusFilter::All)
            .await
            .unwrap();
        assert!(listing.go_to_page(3));
        assert_eq!(listing.current_page(), 3);

        listing.set_filter(StatusFilter::Active).await.unwrap();
        assert_eq!(listing.current_page(), 1);
        assert_eq!(listing.total_items(), 20);
        assert_eq!(listing.total_pages(), 2);
    }

    #[tokio::test]
    async fn test_same_filter_keeps_page() {
        let mut listing = DeviceListing::load(MemoryRepository::with_devices(40), 12, StatusFilter::All)
            .await
            .unwrap();
        listing.go_to_page(2);
        listing.set_filter(StatusFilter::All).await.unwrap();
        assert_eq!(listing.current_page(), 2);
    }

    #[tokio::test]
    async fn test_save_rejects_long_name() {
        let mut listing = DeviceListing::load(MemoryRepository::with_devices(3), 12, StatusFilter::All)
            .await
            .unwrap();
        let device = listing.devices()[0].clone().with_name("n".repeat(33));
        let err = listing.save("S-001", device).await.unwrap_err();
        assert!(matches!(err, InventoryError::Validation(_)));
        assert_eq!(listing.devices()[0].name, "Unit 1");
    }

    #[tokio::test]
    async fn test_status_edit_drops_device_from_filtered_view() {
        let mut listing = DeviceListing::load(MemoryRepository::with_devices(4), 12, StatusFilter::Active)
            .await
            .unwrap();
        assert_eq!(listing.total_items(), 2);

        let device = listing.devices()[0].clone().with_status(DeviceStatus::Inactive);
        let id = device.serial_number.clone();
        listing.save(&id, device).await.unwrap();
        assert_eq!(listing.total_items(), 1);
        assert!(listing.devices().iter().all(|d| d.serial_number != id));
    }

    #[tokio::test]
    async fn test_remove_last_item_on_last_page_moves_back() {
        let mut listing = DeviceListing::load(MemoryRepository::with_devices(13), 12, StatusFilter::All)
            .await
            .unwrap();
        assert!(listing.go_to_page(2));
        assert_eq!(listing.current_items().len(), 1);

        listing.remove("S-013").await.unwrap();
        assert_eq!(listing.current_page(), 1);
        assert_eq!(listing.current_items().len(), 12);
    }

    #[tokio::test]
    async fn test_failed_filter_change_keeps_previous_view() {
        let repo = MemoryRepository::with_devices(30);
        *repo.failing_filter.lock().unwrap() = Some(StatusFilter::Active);
        let mut listing = DeviceListing::load(repo, 12, StatusFilter::All).await.unwrap();
        assert!(listing.go_to_page(3));

        assert!(listing.set_filter(StatusFilter::Active).await.is_err());
        assert_eq!(listing.filter(), StatusFilter::All);
        assert_eq!(listing.current_page(), 3);
        assert_eq!(listing.total_items(), 30);

        // Once the repository recovers, the same filter is fetched for real
        *listing.repository().failing_filter.lock().unwrap() = None;
        listing.set_filter(StatusFilter::Active).await.unwrap();
        assert_eq!(listing.filter(), StatusFilter::Active);
        assert_eq!(listing.current_page(), 1);
        assert_eq!(listing.total_items(), 15);
        assert!(listing.current_items().iter().all(|d| d.is_active()));
    }
}
