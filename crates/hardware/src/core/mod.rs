//! Per-hart memory core.
//!
//! This module contains the architectural state the MMU reads and the units
//! that implement translation, caching and rollback.

/// Architecture-specific components (privilege modes, translation state).
pub mod arch;

/// Memory-system units (MMU, time-warp history).
pub mod units;

pub use self::units::mmu::Mmu;
