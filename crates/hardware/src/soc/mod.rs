//! System-on-Chip (SoC) components behind the MMU.
//!
//! The MMU consumes two collaborators from here: the physical memory its TLB
//! entries point into, and the bus that dispatches everything else to
//! memory-mapped devices.

/// Memory-mapped I/O device implementations.
pub mod devices;

/// System bus interconnect and routing.
pub mod interconnect;

/// Physical main memory.
pub mod memory;

/// Device trait definitions for MMIO access.
pub mod traits;

pub use interconnect::Bus;
pub use memory::PhysicalMemory;
