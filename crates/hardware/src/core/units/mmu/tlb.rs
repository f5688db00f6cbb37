//! Translation Lookaside Buffer (TLB).
//!
//! Three direct-mapped tag tables (fetch, load, store) share one array of
//! physical bases. A tag is the VPN, the VPN with [`TLB_CHECK_TRIGGERS`] set,
//! or [`TLB_INVALID_TAG`]. The base for a slot is chosen so that
//! `base + vaddr` (wrapping) is the byte offset of `vaddr` in main memory.
//!
//! Entries are installed only after the walker has granted the access, so a
//! page appears in exactly the tables whose access types have succeeded.

use crate::common::AccessType;
use crate::common::constants::{TLB_CHECK_TRIGGERS, TLB_INVALID_TAG};

/// Result of probing one TLB table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TlbLookup {
    /// Tag matched; `base + vaddr` is the memory offset.
    Hit(u64),
    /// Tag matched with the trigger flag; the access must be checked against
    /// debug triggers before it completes.
    HitCheckTriggers(u64),
    /// No entry for this page.
    Miss,
}

/// Fast-path translation cache.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tlb {
    insn_tags: Vec<u64>,
    load_tags: Vec<u64>,
    store_tags: Vec<u64>,
    /// Memory offset minus virtual page address, per slot.
    data: Vec<u64>,
    /// Mask used for indexing (size - 1).
    mask: usize,
}

impl Tlb {
    /// Creates an empty TLB.
    ///
    /// # Arguments
    ///
    /// * `size` - Slots per table (rounded up to the next power of two).
    pub fn new(size: usize) -> Self {
        let size = size.max(1).next_power_of_two();
        Self {
            insn_tags: vec![TLB_INVALID_TAG; size],
            load_tags: vec![TLB_INVALID_TAG; size],
            store_tags: vec![TLB_INVALID_TAG; size],
            data: vec![0; size],
            mask: size - 1,
        }
    }

    /// Returns the number of slots per table.
    pub const fn len(&self) -> usize {
        self.mask + 1
    }

    /// Always `false`; a TLB has at least one slot.
    pub const fn is_empty(&self) -> bool {
        false
    }

    #[inline(always)]
    const fn index(&self, vpn: u64) -> usize {
        (vpn as usize) & self.mask
    }

    #[inline(always)]
    fn tags(&self, access: AccessType) -> &[u64] {
        match access {
            AccessType::Fetch => &self.insn_tags,
            AccessType::Read => &self.load_tags,
            AccessType::Write => &self.store_tags,
        }
    }

    #[inline(always)]
    fn tags_mut(&mut self, access: AccessType) -> &mut [u64] {
        match access {
            AccessType::Fetch => &mut self.insn_tags,
            AccessType::Read => &mut self.load_tags,
            AccessType::Write => &mut self.store_tags,
        }
    }

    /// Probes the table for `access` at `vpn`.
    #[inline(always)]
    pub fn lookup(&self, access: AccessType, vpn: u64) -> TlbLookup {
        let idx = self.index(vpn);
        let tag = self.tags(access)[idx];
        if tag == vpn {
            TlbLookup::Hit(self.data[idx])
        } else if tag == vpn | TLB_CHECK_TRIGGERS {
            TlbLookup::HitCheckTriggers(self.data[idx])
        } else {
            TlbLookup::Miss
        }
    }

    /// Returns the raw tag stored for `access` in the slot `vpn` maps to.
    pub fn tag(&self, access: AccessType, vpn: u64) -> u64 {
        self.tags(access)[self.index(vpn)]
    }

    /// Installs a translation for `access`.
    ///
    /// Any other table holding a different page in the same slot is
    /// invalidated, since the slots share one base. A colliding entry for a
    /// different page is silently evicted.
    ///
    /// # Arguments
    ///
    /// * `vpn` - Virtual page number.
    /// * `base` - Memory offset of the page minus its virtual address (wrapping).
    /// * `access` - Table to install into.
    /// * `check_triggers` - Flag the tag so hits evaluate debug triggers.
    pub fn refill(&mut self, vpn: u64, base: u64, access: AccessType, check_triggers: bool) {
        let idx = self.index(vpn);
        for table in [&mut self.insn_tags, &mut self.load_tags, &mut self.store_tags] {
            if table[idx] & !TLB_CHECK_TRIGGERS != vpn {
                table[idx] = TLB_INVALID_TAG;
            }
        }

        let tag = if check_triggers {
            vpn | TLB_CHECK_TRIGGERS
        } else {
            vpn
        };
        self.tags_mut(access)[idx] = tag;
        self.data[idx] = base;
    }

    /// Drops the entry for `vpn` from one table, if present.
    pub fn invalidate(&mut self, access: AccessType, vpn: u64) {
        let idx = self.index(vpn);
        let slot = &mut self.tags_mut(access)[idx];
        if *slot & !TLB_CHECK_TRIGGERS == vpn {
            *slot = TLB_INVALID_TAG;
        }
    }

    /// Invalidates every entry in all three tables.
    ///
    /// Called on `SFENCE.VMA`, translation-mode changes, and privilege changes.
    pub fn flush(&mut self) {
        self.insn_tags.fill(TLB_INVALID_TAG);
        self.load_tags.fill(TLB_INVALID_TAG);
        self.store_tags.fill(TLB_INVALID_TAG);
    }

    /// Number of valid entries in the table for `access`.
    pub fn occupancy(&self, access: AccessType) -> usize {
        self.tags(access)
            .iter()
            .filter(|&&t| t != TLB_INVALID_TAG)
            .count()
    }
}
