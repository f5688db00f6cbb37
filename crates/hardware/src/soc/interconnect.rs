//! System interconnect (bus) for memory and MMIO access.
//!
//! This module implements the bus that sits behind the MMU. It provides:
//! 1. **Main memory:** The owned RAM region the TLB fast path points into.
//! 2. **Device registration:** MMIO devices added by address range and kept sorted.
//! 3. **Access routing:** Byte-slice load/store dispatch by physical address with a
//!    last-device hint.

use tracing::debug;

use super::memory::PhysicalMemory;
use super::traits::Device;

/// System bus: RAM plus a sorted list of MMIO devices.
pub struct Bus {
    /// Main memory.
    memory: PhysicalMemory,
    /// Registered MMIO devices, sorted by base address.
    devices: Vec<Box<dyn Device>>,
    last_device_idx: usize,
}

impl Bus {
    /// Creates a bus with the given main memory and no devices.
    pub const fn new(memory: PhysicalMemory) -> Self {
        Self {
            memory,
            devices: Vec::new(),
            last_device_idx: 0,
        }
    }

    /// Registers a device; devices are kept sorted by base address.
    pub fn add_device(&mut self, dev: Box<dyn Device>) {
        let (base, size) = dev.address_range();
        debug!(name = dev.name(), size, "device attached at {base:#x}");
        self.devices.push(dev);
        self.devices.sort_by_key(|d| d.address_range().0);
        self.last_device_idx = 0;
    }

    /// Returns main memory.
    pub const fn memory(&self) -> &PhysicalMemory {
        &self.memory
    }

    /// Returns main memory mutably.
    pub const fn memory_mut(&mut self) -> &mut PhysicalMemory {
        &mut self.memory
    }

    /// Returns the number of attached MMIO devices.
    pub fn device_count(&self) -> usize {
        self.devices.len()
    }

    fn find_device(&mut self, paddr: u64) -> Option<(&mut Box<dyn Device>, u64)> {
        let claims = |dev: &dyn Device| {
            let (start, size) = dev.address_range();
            paddr >= start && paddr - start < size
        };

        if self
            .devices
            .get(self.last_device_idx)
            .is_some_and(|d| claims(d.as_ref()))
        {
            let dev = &mut self.devices[self.last_device_idx];
            let offset = paddr - dev.address_range().0;
            return Some((dev, offset));
        }

        let idx = self.devices.iter().position(|d| claims(d.as_ref()))?;
        self.last_device_idx = idx;
        let dev = &mut self.devices[idx];
        let offset = paddr - dev.address_range().0;
        Some((dev, offset))
    }

    /// Loads from a device. Returns `false` if no device claims `paddr` or the
    /// device rejects the access.
    pub fn mmio_load(&mut self, paddr: u64, bytes: &mut [u8]) -> bool {
        self.find_device(paddr)
            .is_some_and(|(dev, offset)| dev.load(offset, bytes))
    }

    /// Stores to a device. Returns `false` if no device claims `paddr` or the
    /// device rejects the access.
    pub fn mmio_store(&mut self, paddr: u64, bytes: &[u8]) -> bool {
        self.find_device(paddr)
            .is_some_and(|(dev, offset)| dev.store(offset, bytes))
    }
}

impl std::fmt::Debug for Bus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bus")
            .field("memory", &self.memory)
            .field(
                "devices",
                &self.devices.iter().map(|d| d.name()).collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}
