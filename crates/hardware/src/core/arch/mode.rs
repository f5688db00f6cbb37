//! RISC-V Privilege Modes.
//!
//! This module defines the privilege levels the MMU distinguishes:
//! 1. **Mode Classification:** User (U), Supervisor (S), and Machine (M).
//! 2. **Serialization:** Conversion between the `mstatus.MPP` encoding and enum variants.
//! 3. **Observability:** Human-readable names for log output.

/// RISC-V privilege mode levels.
///
/// Machine mode bypasses paging entirely; supervisor and user accesses are
/// translated and checked against the PTE `U` bit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PrivilegeMode {
    /// User mode (U-mode).
    User = 0,

    /// Supervisor mode (S-mode).
    Supervisor = 1,

    /// Machine mode (M-mode).
    #[default]
    Machine = 3,
}

impl PrivilegeMode {
    /// Decodes a two-bit privilege field.
    ///
    /// The reserved hypervisor encoding (2) is treated as user mode, the way
    /// a core without the H extension demotes it.
    pub const fn from_u8(val: u8) -> Self {
        match val & 0b11 {
            1 => Self::Supervisor,
            3 => Self::Machine,
            _ => Self::User,
        }
    }

    /// Returns the two-bit encoding of the mode.
    pub const fn to_u8(self) -> u8 {
        self as u8
    }

    /// Returns the human-readable name of the privilege mode.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::User => "User",
            Self::Supervisor => "Supervisor",
            Self::Machine => "Machine",
        }
    }
}

impl std::fmt::Display for PrivilegeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
