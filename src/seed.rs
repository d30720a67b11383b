//! Demo dataset generation.
//!
//! Every third device (by sequence number) is active, the rest inactive.
//! `last_connection_date` is a whole number of days, 1 through 90, before the
//! reference instant.

use crate::core::{Device, DeviceStatus};
use chrono::{DateTime, Duration, Utc};
use rand::Rng;

pub const SERIAL_PREFIX: &str = "DEMO-";
pub const NAME_PREFIX: &str = "Demo Device ";
pub const MAX_DAYS_AGO: i64 = 90;

pub struct SeedGenerator {
    batch_size: usize,
    now: DateTime<Utc>,
}

impl SeedGenerator {
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size,
            now: Utc::now(),
        }
    }

    /// Fix the instant dates are computed from.
    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn generate(&self) -> Vec<Device> {
        self.generate_with(&mut rand::thread_rng())
    }

    pub fn generate_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<Device> {
        let width = pad_width(self.batch_size);
        (1..=self.batch_size)
            .map(|i| {
                let padded = format!("{:0width$}", i, width = width);
                let days_ago = rng.gen_range(1..=MAX_DAYS_AGO);
                Device {
                    serial_number: format!("{SERIAL_PREFIX}{padded}"),
                    name: format!("{NAME_PREFIX}{padded}"),
                    status: status_for(i),
                    last_connection_date: self.now - Duration::days(days_ago),
                }
            })
            .collect()
    }
}

pub fn status_for(sequence: usize) -> DeviceStatus {
    if sequence % 3 == 0 {
        DeviceStatus::Active
    } else {
        DeviceStatus::Inactive
    }
}

fn pad_width(batch_size: usize) -> usize {
    batch_size.to_string().len().max(3)
}
