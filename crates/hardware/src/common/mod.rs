//! Common types and constants shared by every part of the MMU.
//!
//! This module provides the vocabulary the rest of the crate speaks:
//! 1. **Address Types:** Strong types for virtual and physical addresses.
//! 2. **Constants:** Page geometry, table sizes, and tag sentinels.
//! 3. **Memory Access:** Access classification and the generic access-width trait.
//! 4. **Error Handling:** The trap taxonomy, trigger matches, and configuration errors.

/// Address type definitions (physical and virtual addresses).
pub mod addr;

/// Common constants used throughout the MMU.
pub mod constants;

/// Memory access type and width definitions.
pub mod data;

/// Error types and trap definitions.
pub mod error;

pub use addr::{PhysAddr, VirtAddr};
pub use constants::{PAGE_OFFSET_MASK, PAGE_SHIFT, PAGE_SIZE};
pub use data::{AccessType, MemoryWord, TriggerOperation};
pub use error::{ConfigError, Trap, TriggerMatch};
