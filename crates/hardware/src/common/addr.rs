//! Physical and Virtual Address types.
//!
//! Strong wrappers that keep the two address spaces apart at compile time.
//! The MMU's public API takes raw `u64` values; these types carry the page
//! arithmetic and alignment checks behind it.

use super::constants::{PAGE_OFFSET_MASK, PAGE_SHIFT};

/// A virtual address as issued by the executing core.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VirtAddr(pub u64);

/// A physical address on the system bus.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PhysAddr(pub u64);

impl VirtAddr {
    /// Creates a new virtual address from a raw 64-bit value.
    #[inline(always)]
    pub const fn new(addr: u64) -> Self {
        Self(addr)
    }

    /// Returns the raw 64-bit address value.
    #[inline(always)]
    pub const fn val(&self) -> u64 {
        self.0
    }

    /// Returns the virtual page number (all bits above the page offset).
    #[inline(always)]
    pub const fn vpn(&self) -> u64 {
        self.0 >> PAGE_SHIFT
    }

    /// Extracts the byte offset within a 4 KiB page.
    #[inline(always)]
    pub const fn page_offset(&self) -> u64 {
        self.0 & PAGE_OFFSET_MASK
    }

    /// Returns `true` if the address is a multiple of `width` bytes.
    ///
    /// # Arguments
    ///
    /// * `width` - Access width in bytes; must be a power of two.
    #[inline(always)]
    pub const fn is_aligned(&self, width: u64) -> bool {
        self.0 & (width - 1) == 0
    }
}

impl PhysAddr {
    /// Creates a new physical address from a raw 64-bit value.
    #[inline(always)]
    pub const fn new(addr: u64) -> Self {
        Self(addr)
    }

    /// Returns the raw 64-bit address value.
    #[inline(always)]
    pub const fn val(&self) -> u64 {
        self.0
    }

    /// Returns the physical page number.
    #[inline(always)]
    pub const fn ppn(&self) -> u64 {
        self.0 >> PAGE_SHIFT
    }

    /// Returns the address rounded down to its page base.
    #[inline(always)]
    pub const fn page_base(&self) -> u64 {
        self.0 & !PAGE_OFFSET_MASK
    }
}
