//! Page Table Walker (PTW) for RISC-V Sv32, Sv39 and Sv48.
//!
//! This module implements the page table walking algorithm. It traverses the
//! multi-level page table structure selected by the active translation mode to
//! translate a virtual address into a physical address, enforcing page-level
//! permissions and updating the Accessed/Dirty bits in place.

use crate::common::constants::{PAGE_OFFSET_MASK, PAGE_SHIFT};
use crate::common::{AccessType, Trap};
use crate::core::arch::mode::PrivilegeMode;
use crate::core::arch::status::PrivilegeState;
use crate::soc::memory::PhysicalMemory;

use super::permission::{PermissionContext, Verdict, evaluate};

/// Page Table Entry valid bit (bit 0).
pub const PTE_V: u64 = 1;

/// Page Table Entry read permission bit (bit 1).
pub const PTE_R: u64 = 1 << 1;

/// Page Table Entry write permission bit (bit 2).
pub const PTE_W: u64 = 1 << 2;

/// Page Table Entry execute permission bit (bit 3).
pub const PTE_X: u64 = 1 << 3;

/// Page Table Entry user mode access bit (bit 4).
pub const PTE_U: u64 = 1 << 4;

/// Page Table Entry global mapping bit (bit 5).
pub const PTE_G: u64 = 1 << 5;

/// Page Table Entry accessed bit (bit 6).
pub const PTE_A: u64 = 1 << 6;

/// Page Table Entry dirty bit (bit 7).
pub const PTE_D: u64 = 1 << 7;

/// Bit shift to extract the Physical Page Number from a PTE.
pub const PTE_PPN_SHIFT: u64 = 10;

/// Width mask of the PPN field in an 8-byte PTE (bits 10-53).
const PTE_PPN_MASK: u64 = (1 << 44) - 1;

/// Low PTE bits kept in the permission tables.
const PTE_META_MASK: u64 = 0xFF;

/// A strongly-typed wrapper around a raw Page Table Entry.
///
/// Sv32 entries are 4 bytes wide and are zero-extended into the same type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageTableEntry(u64);

impl PageTableEntry {
    /// Creates a new PageTableEntry from a raw value.
    pub const fn new(val: u64) -> Self {
        Self(val)
    }

    /// Builds a leaf or pointer entry from a PPN and flag bits.
    pub const fn from_parts(ppn: u64, flags: u64) -> Self {
        Self((ppn << PTE_PPN_SHIFT) | (flags & PTE_META_MASK))
    }

    /// Returns the underlying raw value.
    pub const fn raw(&self) -> u64 {
        self.0
    }

    /// Returns true if the Valid (V) bit is set.
    pub const fn is_valid(&self) -> bool {
        self.0 & PTE_V != 0
    }

    /// Returns true if the Accessed (A) bit is set.
    pub const fn is_accessed(&self) -> bool {
        self.0 & PTE_A != 0
    }

    /// Returns true if the Dirty (D) bit is set.
    pub const fn is_dirty(&self) -> bool {
        self.0 & PTE_D != 0
    }

    /// Extracts the Physical Page Number (PPN) from the entry.
    pub const fn ppn(&self) -> u64 {
        (self.0 >> PTE_PPN_SHIFT) & PTE_PPN_MASK
    }

    /// Returns the V/R/W/X/U/G/A/D bits.
    pub const fn meta(&self) -> u64 {
        self.0 & PTE_META_MASK
    }

    /// Determines if this entry points to the next level page table.
    ///
    /// An entry is a pointer if it is Valid but has R=0, W=0, and X=0.
    pub const fn is_table(&self) -> bool {
        self.0 & (PTE_V | PTE_R | PTE_W | PTE_X) == PTE_V
    }

    /// Returns a new instance with the given flag bits set.
    #[must_use]
    pub const fn with_flags(&self, flags: u64) -> Self {
        Self(self.0 | flags)
    }
}

/// An Accessed/Dirty write-back performed by the walker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PteUpdate {
    /// Physical address of the PTE.
    pub paddr: u64,
    /// PTE width in bytes.
    pub len: usize,
    /// Raw PTE before the update.
    pub old: u64,
    /// Raw PTE after the update.
    pub new: u64,
}

impl PteUpdate {
    /// Returns `true` if this update set the Dirty bit.
    pub const fn set_dirty(&self) -> bool {
        self.old & PTE_D == 0 && self.new & PTE_D != 0
    }
}

/// A successful walk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Translation {
    /// Translated physical address.
    pub paddr: u64,
    /// V/R/W/X/U/G/A/D bits of the leaf after any update; zero when
    /// translation is bare.
    pub meta: u64,
    /// The A/D write-back, if one was needed.
    pub update: Option<PteUpdate>,
}

/// Truncates `vaddr` to `xlen` bits, as seen by machine mode.
pub const fn zero_extend(vaddr: u64, xlen: u32) -> u64 {
    if xlen >= 64 {
        vaddr
    } else {
        vaddr & ((1u64 << xlen) - 1)
    }
}

/// Performs a page table walk.
///
/// Traverses the page table tree starting from the root PPN of `state`. Leaf
/// entries found above the last level map superpages; the returned address is
/// synthesized from the superpage base plus the low VPN bits of `vaddr`.
///
/// A store to a writable page whose Dirty bit is clear is not a fault: the
/// walker sets D (and A) and writes the PTE back with its own width.
///
/// # Arguments
///
/// * `memory` - Main memory holding the page tables.
/// * `state` - Translation mode, root table, and status flags.
/// * `xlen` - Register width in bits.
/// * `vaddr` - The virtual address to translate.
/// * `access` - The type of memory access (Fetch, Read, Write).
/// * `privilege` - The effective privilege of the access.
///
/// # Errors
///
/// Returns the access fault for `access` when the address is not canonical,
/// a PTE lies outside main memory, an entry is invalid or reserved, a
/// superpage is misaligned, or the permissions deny the access.
pub fn walk(
    memory: &mut PhysicalMemory,
    state: &PrivilegeState,
    xlen: u32,
    vaddr: u64,
    access: AccessType,
    privilege: PrivilegeMode,
) -> Result<Translation, Trap> {
    let mode = state.translation;
    let levels = mode.levels();
    if levels == 0 {
        return Ok(Translation {
            paddr: zero_extend(vaddr, xlen),
            meta: 0,
            update: None,
        });
    }

    let fault = Trap::access_fault(access, vaddr);
    let idx_bits = u64::from(mode.index_bits());
    let pte_size = mode.pte_size();

    let va_bits = PAGE_SHIFT + u64::from(levels) * idx_bits;
    if let Some(msb_bits) = u64::from(xlen).checked_sub(va_bits - 1) {
        if msb_bits < 64 {
            let mask = (1u64 << msb_bits) - 1;
            let msbs = (vaddr >> (va_bits - 1)) & mask;
            if msbs != 0 && msbs != mask {
                tracing::trace!("non-canonical address {vaddr:#x}");
                return Err(fault);
            }
        }
    }

    let ctx = PermissionContext::new(privilege, state.pum, state.mxr);
    let mut base = state.root_ppn << PAGE_SHIFT;

    for level in (0..u64::from(levels)).rev() {
        let ptshift = level * idx_bits;
        let idx = (vaddr >> (PAGE_SHIFT + ptshift)) & ((1 << idx_bits) - 1);
        let pte_addr = base.wrapping_add(idx * pte_size as u64);

        let offset = memory.offset_of(pte_addr, pte_size).ok_or(fault)?;
        let pte = PageTableEntry::new(memory.read_bits(offset, pte_size).ok_or(fault)?);

        if pte.is_table() {
            base = pte.ppn() << PAGE_SHIFT;
            continue;
        }

        if evaluate(pte.meta(), access, ctx) == Verdict::Fault {
            break;
        }

        let superpage_mask = (1u64 << ptshift) - 1;
        if pte.ppn() & superpage_mask != 0 {
            tracing::trace!(level, "misaligned superpage at {vaddr:#x}");
            break;
        }

        let ad = if access == AccessType::Write {
            PTE_A | PTE_D
        } else {
            PTE_A
        };
        let mut leaf = pte;
        let mut update = None;
        if pte.raw() & ad != ad {
            leaf = pte.with_flags(ad);
            if !memory.write_bits(offset, pte_size, leaf.raw()) {
                return Err(fault);
            }
            update = Some(PteUpdate {
                paddr: pte_addr,
                len: pte_size,
                old: pte.raw(),
                new: leaf.raw(),
            });
        }

        let vpn = vaddr >> PAGE_SHIFT;
        let ppn = leaf.ppn() | (vpn & superpage_mask);
        return Ok(Translation {
            paddr: (ppn << PAGE_SHIFT) | (vaddr & PAGE_OFFSET_MASK),
            meta: leaf.meta(),
            update,
        });
    }

    tracing::trace!(access = %access, "page walk denied {vaddr:#x}");
    Err(fault)
}
