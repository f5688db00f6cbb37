//! Trap and error definitions.
//!
//! This module defines every way an access through the MMU can fail:
//! 1. **Trap Representation:** Synchronous faults that unwind the in-flight access.
//! 2. **Trigger Matches:** The diagnostic payload of a debug-trigger hit.
//! 3. **Configuration Errors:** Rejected MMU or memory configuration.

use std::fmt;

use super::data::{AccessType, TriggerOperation};

/// A debug-trigger match on a memory operation.
///
/// Raised either immediately (trigger timing "before") or handed back to the
/// caller as a pending fault once the access has completed (timing "after").
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TriggerMatch {
    /// Index of the trigger that matched.
    pub index: usize,
    /// Operation that matched.
    pub operation: TriggerOperation,
    /// Virtual address of the access.
    pub address: u64,
    /// Data observed by the access (loaded value, stored value, or instruction halfword).
    pub data: u64,
}

impl fmt::Display for TriggerMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "trigger {} on {} at {:#x} (data {:#x})",
            self.index, self.operation, self.address, self.data
        )
    }
}

/// Synchronous faults raised by the MMU.
///
/// Faults are never retried inside the MMU; they propagate to the execution
/// layer, which is responsible for trap delivery. Every variant carries the
/// faulting virtual address (or the full trigger match).
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Trap {
    /// Instruction fetch from a PC that is not instruction-aligned.
    #[error("InstructionAddressMisaligned({0:#x})")]
    InstructionAddressMisaligned(u64),

    /// Instruction fetch denied by translation or permission checks, or
    /// rejected by the device at the physical address.
    #[error("InstructionAccessFault({0:#x})")]
    InstructionAccessFault(u64),

    /// Load from an address not aligned to the access width.
    #[error("LoadAddressMisaligned({0:#x})")]
    LoadAddressMisaligned(u64),

    /// Load denied by translation or permission checks.
    #[error("LoadAccessFault({0:#x})")]
    LoadAccessFault(u64),

    /// Store or AMO to an address not aligned to the access width.
    #[error("StoreAddressMisaligned({0:#x})")]
    StoreAddressMisaligned(u64),

    /// Store denied by translation or permission checks. AMOs report their
    /// load-side faults with this variant as well.
    #[error("StoreAccessFault({0:#x})")]
    StoreAccessFault(u64),

    /// A debug trigger matched.
    #[error("TriggerMatched({0})")]
    TriggerMatched(TriggerMatch),
}

impl Trap {
    /// Builds the access fault matching an access type.
    ///
    /// # Arguments
    ///
    /// * `access` - The kind of access that failed.
    /// * `addr` - The faulting virtual address.
    pub const fn access_fault(access: AccessType, addr: u64) -> Self {
        match access {
            AccessType::Fetch => Self::InstructionAccessFault(addr),
            AccessType::Read => Self::LoadAccessFault(addr),
            AccessType::Write => Self::StoreAccessFault(addr),
        }
    }

    /// Returns the faulting address, or the matched address for a trigger.
    pub const fn badaddr(&self) -> u64 {
        match *self {
            Self::InstructionAddressMisaligned(a)
            | Self::InstructionAccessFault(a)
            | Self::LoadAddressMisaligned(a)
            | Self::LoadAccessFault(a)
            | Self::StoreAddressMisaligned(a)
            | Self::StoreAccessFault(a) => a,
            Self::TriggerMatched(m) => m.address,
        }
    }

    /// Returns `true` for the three access-fault variants.
    pub const fn is_access_fault(&self) -> bool {
        matches!(
            self,
            Self::InstructionAccessFault(_) | Self::LoadAccessFault(_) | Self::StoreAccessFault(_)
        )
    }

    /// Reclassifies a load access fault as a store access fault.
    ///
    /// An AMO is a read-modify-write, so the caller only ever sees "store failed".
    #[must_use]
    pub const fn into_store_fault(self) -> Self {
        match self {
            Self::LoadAccessFault(a) => Self::StoreAccessFault(a),
            other => other,
        }
    }
}

/// Errors reported while validating or parsing configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A table size that must be a non-zero power of two is not.
    #[error("{field} must be a non-zero power of two, got {value}")]
    NotPowerOfTwo {
        /// Name of the offending field.
        field: &'static str,
        /// Value that was supplied.
        value: usize,
    },

    /// The register width is neither 32 nor 64.
    #[error("unsupported xlen {0}; expected 32 or 64")]
    UnsupportedXlen(u32),

    /// The instruction alignment is neither 2 nor 4 bytes.
    #[error("pc_align must be 2 or 4, got {0}")]
    InvalidPcAlign(u64),

    /// Physical memory base or size is not page-granular, or the size is zero.
    #[error("physical memory must be a non-empty, page-aligned region (base {base:#x}, size {size:#x})")]
    InvalidMemoryRegion {
        /// Requested base address.
        base: u64,
        /// Requested size in bytes.
        size: u64,
    },

    /// The configuration document could not be parsed.
    #[error("invalid configuration JSON: {0}")]
    Json(#[from] serde_json::Error),
}
