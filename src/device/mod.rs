//! Device and router (spec.md §4.9, component C9).
//!
//! Grounded on `original_source/include/xkrt/device/device.h`. Device
//! ids form one dense global space; id `0` is always the host.

pub mod memory;
pub mod router;

pub use memory::MemoryArea;
pub use router::{CfsRouter, RandomRouter, Router};

use crate::error::DeviceGlobalId;
use crate::task::Target;

pub const HOST_DEVICE: DeviceGlobalId = 0;

pub struct Device {
    pub id: DeviceGlobalId,
    pub target: Target,
    pub memory: MemoryArea,
}

impl Device {
    pub fn new(id: DeviceGlobalId, target: Target, memory_capacity: usize) -> Self {
        Device {
            id,
            target,
            memory: MemoryArea::new(memory_capacity),
        }
    }

    pub fn host(memory_capacity: usize) -> Self {
        Device::new(HOST_DEVICE, Target::Host, memory_capacity)
    }
}

/// The fixed set of devices a `Runtime` was initialized with.
pub struct DeviceSet {
    devices: Vec<Device>,
}

impl DeviceSet {
    pub fn new(devices: Vec<Device>) -> Self {
        debug_assert_eq!(devices.first().map(|d| d.id), Some(HOST_DEVICE));
        DeviceSet { devices }
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn get(&self, id: DeviceGlobalId) -> Option<&Device> {
        self.devices.get(id as usize)
    }

    pub fn ids(&self) -> Vec<DeviceGlobalId> {
        self.devices.iter().map(|d| d.id).collect()
    }

    pub fn ids_for_target(&self, target: Target) -> Vec<DeviceGlobalId> {
        self.devices.iter().filter(|d| d.target == target).map(|d| d.id).collect()
    }

    pub fn ids_for_target_not(&self, target: Target) -> Vec<DeviceGlobalId> {
        self.devices.iter().filter(|d| d.target != target).map(|d| d.id).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Device> {
        self.devices.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_device_is_always_id_zero() {
        let set = DeviceSet::new(vec![Device::host(1024)]);
        assert_eq!(set.get(HOST_DEVICE).unwrap().target, Target::Host);
    }
}
