//! Coherency tracking for point regions: one [`DeviceSet`] per key.

use std::collections::HashMap;

use parking_lot::Mutex;

use super::DeviceSet;
use crate::error::DeviceGlobalId;

#[derive(Default)]
pub struct PointCoherency {
    owners: Mutex<HashMap<u64, DeviceSet>>,
}

impl PointCoherency {
    pub fn new() -> Self {
        PointCoherency::default()
    }

    pub fn who_owns(&self, key: u64) -> DeviceSet {
        self.owners.lock().get(&key).copied().unwrap_or_default()
    }

    /// Source device to fetch `key` from if `device` does not already
    /// own it, or `None` if `device` already has a valid replica.
    pub fn fetch_source(&self, key: u64, device: DeviceGlobalId) -> Option<DeviceGlobalId> {
        let set = self.who_owns(key);
        if set.contains(device) {
            None
        } else {
            set.any_owner()
        }
    }

    pub fn mark_fetched(&self, key: u64, device: DeviceGlobalId) {
        super::apply_read_completion(self.owners.lock().entry(key).or_default(), device);
    }

    pub fn complete_write(&self, key: u64, device: DeviceGlobalId) {
        super::apply_write_completion(self.owners.lock().entry(key).or_default(), device);
    }

    pub fn complete_read(&self, key: u64, device: DeviceGlobalId) {
        self.mark_fetched(key, device);
    }

    pub fn invalidate(&self, key: u64, device: DeviceGlobalId) {
        if let Some(set) = self.owners.lock().get_mut(&key) {
            set.remove(device);
        }
    }
}
