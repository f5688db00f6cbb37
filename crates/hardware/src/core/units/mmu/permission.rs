//! Cached page permissions.
//!
//! A `PermissionTable` models the target's hardware TLB: a direct-mapped array
//! of `(tag, meta)` pairs with a tag index, where `meta` holds the low PTE bits
//! (V/R/W/X/U/G/A/D) of the resolved leaf. The walker fills it; the MMU checks
//! it ahead of the fast-path TLB so that a fast-path entry can never outlive
//! the permissions it was installed under.
//!
//! [`evaluate`] is the single permission rule shared by that pre-check and the
//! page-table walker.

use std::collections::HashMap;

use crate::common::AccessType;
use crate::common::constants::PERMISSION_INVALID_TAG;
use crate::core::arch::mode::PrivilegeMode;

use super::ptw::{PTE_D, PTE_R, PTE_U, PTE_V, PTE_W, PTE_X};

/// Outcome of checking an access against a PTE's permission bits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    /// The access is permitted as-is.
    Allow,
    /// A store to a writable page whose dirty bit is clear. Not a fault: the
    /// walker sets D and the store proceeds.
    DirtyMiss,
    /// The access must fault.
    Fault,
}

/// Status bits consulted by [`evaluate`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PermissionContext {
    /// Effective privilege is supervisor (otherwise user).
    pub supervisor: bool,
    /// Protect user memory from supervisor accesses.
    pub pum: bool,
    /// Make executable pages readable.
    pub mxr: bool,
}

impl PermissionContext {
    /// Builds the context for an effective (non-machine) privilege.
    pub const fn new(privilege: PrivilegeMode, pum: bool, mxr: bool) -> Self {
        Self {
            supervisor: matches!(privilege, PrivilegeMode::Supervisor),
            pum,
            mxr,
        }
    }
}

/// Decides whether `access` is allowed by PTE bits `meta`.
///
/// A page with W set and R clear is a reserved encoding and faults for every
/// access type.
pub const fn evaluate(meta: u64, access: AccessType, ctx: PermissionContext) -> Verdict {
    let no_priv = if meta & PTE_U != 0 {
        ctx.supervisor && ctx.pum
    } else {
        !ctx.supervisor
    };
    let no_valid = meta & PTE_V == 0 || (meta & PTE_R == 0 && meta & PTE_W != 0);
    let readable = meta & PTE_R != 0;
    let writable = meta & PTE_W != 0;
    let executable = meta & PTE_X != 0;

    let fault = match access {
        AccessType::Fetch => no_priv || no_valid || !executable,
        AccessType::Read => no_priv || no_valid || (!readable && !(ctx.mxr && executable)),
        AccessType::Write => {
            if !no_priv && !no_valid && writable && meta & PTE_D == 0 {
                return Verdict::DirtyMiss;
            }
            no_priv || no_valid || !(readable && writable)
        }
    };

    if fault { Verdict::Fault } else { Verdict::Allow }
}

/// Which cached permission table an entry belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TlbKind {
    /// Instruction-side table (fetches).
    Instruction,
    /// Data-side table (loads and stores).
    Data,
}

impl From<AccessType> for TlbKind {
    fn from(access: AccessType) -> Self {
        match access {
            AccessType::Fetch => Self::Instruction,
            AccessType::Read | AccessType::Write => Self::Data,
        }
    }
}

/// Direct-mapped table of cached PTE permission bits.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PermissionTable {
    meta: Vec<u64>,
    tags: Vec<u64>,
    tag_map: HashMap<u64, usize>,
    mask: usize,
}

impl PermissionTable {
    /// Creates an empty table with `size` slots (rounded up to a power of two).
    pub fn new(size: usize) -> Self {
        let size = size.max(1).next_power_of_two();
        Self {
            meta: vec![0; size],
            tags: vec![PERMISSION_INVALID_TAG; size],
            tag_map: HashMap::with_capacity(size),
            mask: size - 1,
        }
    }

    /// Returns the number of slots.
    pub const fn capacity(&self) -> usize {
        self.mask + 1
    }

    /// Returns the number of cached tags.
    pub fn len(&self) -> usize {
        self.tag_map.len()
    }

    /// Returns `true` if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.tag_map.is_empty()
    }

    /// Returns the cached PTE bits for `tag`.
    pub fn lookup(&self, tag: u64) -> Option<u64> {
        self.tag_map.get(&tag).map(|&slot| self.meta[slot])
    }

    /// Caches `meta` for `tag` in the slot the tag maps to.
    pub fn insert(&mut self, tag: u64, meta: u64) {
        self.set(tag as usize, tag, meta);
    }

    /// Writes a specific slot, as an external target-TLB model does.
    ///
    /// The slot's previous tag and any other slot holding `tag` are dropped.
    ///
    /// # Arguments
    ///
    /// * `slot` - Slot index (taken modulo the table size).
    /// * `tag` - Masked VPN.
    /// * `meta` - Low PTE bits.
    pub fn set(&mut self, slot: usize, tag: u64, meta: u64) {
        let slot = slot & self.mask;

        let old = self.tags[slot];
        if old != PERMISSION_INVALID_TAG && self.tag_map.get(&old) == Some(&slot) {
            let _ = self.tag_map.remove(&old);
        }
        if let Some(prev) = self.tag_map.insert(tag, slot) {
            if prev != slot {
                self.tags[prev] = PERMISSION_INVALID_TAG;
            }
        }

        self.tags[slot] = tag;
        self.meta[slot] = meta;
    }

    /// Drops every cached entry.
    pub fn flush(&mut self) {
        self.tags.fill(PERMISSION_INVALID_TAG);
        self.meta.fill(0);
        self.tag_map.clear();
    }
}
