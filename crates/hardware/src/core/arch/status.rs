//! Translation mode and privilege state.
//!
//! The MMU does not own the core's CSRs. Instead the execution layer hands it a
//! `PrivilegeState` snapshot describing everything translation depends on:
//! 1. **Privilege:** Current mode, plus the MPRV/MPP override for data accesses.
//! 2. **Translation Mode:** Bare, Sv32, Sv39, or Sv48 and the root page-table PPN.
//! 3. **Status Flags:** PUM (protect user memory) and MXR (make executable readable).

use crate::common::AccessType;

use super::mode::PrivilegeMode;

/// Page-table format selected by the active translation mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TranslationMode {
    /// No translation; every access behaves as machine mode.
    #[default]
    Bare,
    /// Two-level table, 10-bit indices, 4-byte PTEs, 20-bit VPN.
    Sv32,
    /// Three-level table, 9-bit indices, 8-byte PTEs, 27-bit VPN.
    Sv39,
    /// Four-level table, 9-bit indices, 8-byte PTEs, 36-bit VPN.
    Sv48,
}

impl TranslationMode {
    /// Number of page-table levels walked (0 for bare).
    pub const fn levels(self) -> u32 {
        match self {
            Self::Bare => 0,
            Self::Sv32 => 2,
            Self::Sv39 => 3,
            Self::Sv48 => 4,
        }
    }

    /// Width in bits of each level's table index.
    pub const fn index_bits(self) -> u32 {
        match self {
            Self::Bare => 0,
            Self::Sv32 => 10,
            Self::Sv39 | Self::Sv48 => 9,
        }
    }

    /// Size of one PTE in bytes.
    pub const fn pte_size(self) -> usize {
        match self {
            Self::Sv32 => 4,
            Self::Bare | Self::Sv39 | Self::Sv48 => 8,
        }
    }

    /// Effective VPN width in bits (20, 27, or 36).
    pub const fn vpn_bits(self) -> u32 {
        self.levels() * self.index_bits()
    }

    /// Mask applied to a VPN to form a permission-table tag.
    pub const fn vpn_mask(self) -> u64 {
        (1u64 << self.vpn_bits()) - 1
    }
}

/// Everything address translation reads from the core's privileged state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct PrivilegeState {
    /// Current privilege mode.
    pub privilege: PrivilegeMode,
    /// Active page-table format.
    pub translation: TranslationMode,
    /// Physical page number of the root page table.
    pub root_ppn: u64,
    /// Modify PRiVilege: data accesses use `mpp` instead of `privilege`.
    pub mprv: bool,
    /// Previous privilege, substituted for data accesses when `mprv` is set.
    pub mpp: PrivilegeMode,
    /// Protect User Memory: supervisor accesses to user pages fault.
    pub pum: bool,
    /// Make eXecutable Readable: loads may read execute-only pages.
    pub mxr: bool,
    /// The hart is in debug mode; the MPRV override is ignored.
    pub debug_mode: bool,
}

impl PrivilegeState {
    /// Machine-mode state with translation off.
    pub fn machine() -> Self {
        Self::default()
    }

    /// Supervisor-mode state translating through the given root table.
    ///
    /// # Arguments
    ///
    /// * `translation` - Page-table format.
    /// * `root_ppn` - Physical page number of the root table.
    pub fn supervisor(translation: TranslationMode, root_ppn: u64) -> Self {
        Self {
            privilege: PrivilegeMode::Supervisor,
            translation,
            root_ppn,
            ..Self::default()
        }
    }

    /// Returns a copy running at `privilege`.
    #[must_use]
    pub const fn with_privilege(mut self, privilege: PrivilegeMode) -> Self {
        self.privilege = privilege;
        self
    }

    /// Resolves the privilege an access is performed with.
    ///
    /// Data accesses honor MPRV (outside debug mode); bare translation forces
    /// machine mode for every access.
    pub fn effective_privilege(&self, access: AccessType) -> PrivilegeMode {
        let mut mode = self.privilege;
        if access != AccessType::Fetch && !self.debug_mode && self.mprv {
            mode = self.mpp;
        }
        if self.translation == TranslationMode::Bare {
            mode = PrivilegeMode::Machine;
        }
        mode
    }
}
