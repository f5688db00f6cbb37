//! Global MMU Constants.
//!
//! This module defines the constants shared by the translation caches, the
//! page-table walker, and the instruction cache. It includes:
//! 1. **Page Geometry:** Page size, shift, and offset mask.
//! 2. **Table Sizes:** Default entry counts for the TLB, icache, and permission tables.
//! 3. **Tag Sentinels:** Reserved tag values for invalid and trigger-checked entries.

/// Page size in bytes (4 KiB).
pub const PAGE_SIZE: u64 = 1 << PAGE_SHIFT;

/// Number of bits to shift to convert between bytes and pages.
pub const PAGE_SHIFT: u64 = 12;

/// Mask for extracting the page offset from an address.
pub const PAGE_OFFSET_MASK: u64 = PAGE_SIZE - 1;

/// Default number of slots in each direct-mapped TLB tag table.
pub const TLB_ENTRIES: usize = 256;

/// Default number of slots in the decoded-instruction cache.
pub const ICACHE_ENTRIES: usize = 1024;

/// Default number of slots in each cached permission table.
pub const PERMISSION_ENTRIES: usize = 256;

/// Default instruction alignment in bytes (compressed instructions enabled).
pub const PC_ALIGN: u64 = 2;

/// Tag flag marking a TLB entry whose accesses must be checked against debug triggers.
///
/// A VPN never reaches bit 63, so the flag cannot collide with a real page number.
pub const TLB_CHECK_TRIGGERS: u64 = 1 << 63;

/// Tag value of an empty TLB slot.
pub const TLB_INVALID_TAG: u64 = u64::MAX;

/// Tag value of an empty or always-refetch icache slot.
pub const ICACHE_INVALID_TAG: u64 = u64::MAX;

/// Tag value of an empty permission-table slot.
pub const PERMISSION_INVALID_TAG: u64 = u64::MAX;
