//! Device trait for memory-mapped I/O.
//!
//! This module defines the `Device` trait implemented by every bus-attached
//! peripheral outside main memory. It provides:
//! 1. **Identification:** `name` and `address_range` for bus routing.
//! 2. **Access:** Width-agnostic byte-slice load and store at device-relative offsets.
//!
//! The MMU never caches translations to device pages; every MMIO access is
//! dispatched through the bus.

/// Trait for memory-mapped I/O devices attached to the system bus.
pub trait Device: Send + Sync {
    /// Returns a short name for this device (e.g., `"UART0"`).
    fn name(&self) -> &str;

    /// Returns `(base_address, size_in_bytes)` of the device's MMIO window.
    fn address_range(&self) -> (u64, u64);

    /// Fills `bytes` from the device-relative `offset`.
    ///
    /// Returns `false` if the device does not decode the access, which the MMU
    /// reports as an access fault.
    fn load(&mut self, offset: u64, bytes: &mut [u8]) -> bool;

    /// Writes `bytes` at the device-relative `offset`.
    ///
    /// Returns `false` if the device does not decode the access.
    fn store(&mut self, offset: u64, bytes: &[u8]) -> bool;
}
