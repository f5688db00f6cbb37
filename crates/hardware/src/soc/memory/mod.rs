//! Physical System Memory (RAM).
//!
//! This module implements the main memory the MMU fast path reads and writes.
//! It provides:
//! 1. **Ownership:** A single owned byte buffer mapped at a physical base address.
//! 2. **Mapping:** Conversion between physical addresses and buffer offsets, the
//!    safe counterpart of host-pointer arithmetic.
//! 3. **Checked Access:** Width-parameterized little-endian reads and writes that
//!    report out-of-range accesses instead of panicking.

/// System memory: an owned byte buffer mapped at `base`.
#[derive(Clone, PartialEq, Eq)]
pub struct PhysicalMemory {
    /// Backing storage.
    data: Vec<u8>,
    /// The physical address of `data[0]`.
    base: u64,
}

impl PhysicalMemory {
    /// Creates zero-filled memory.
    ///
    /// # Arguments
    ///
    /// * `base` - Starting physical address.
    /// * `size` - Size in bytes.
    pub fn new(base: u64, size: usize) -> Self {
        Self {
            data: vec![0; size],
            base,
        }
    }

    /// Returns the physical base address.
    pub const fn base(&self) -> u64 {
        self.base
    }

    /// Returns the size of memory in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if memory has zero size.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the buffer offset of `len` bytes at `paddr`, if they are all RAM.
    ///
    /// This is the MMU's "address to memory" query: `None` means the address
    /// belongs to a device (or nothing) and must go through the bus.
    #[inline]
    pub fn offset_of(&self, paddr: u64, len: usize) -> Option<usize> {
        let offset = usize::try_from(paddr.checked_sub(self.base)?).ok()?;
        let end = offset.checked_add(len)?;
        (end <= self.data.len()).then_some(offset)
    }

    /// Returns `true` if `paddr` is backed by RAM.
    #[inline]
    pub fn contains(&self, paddr: u64) -> bool {
        self.offset_of(paddr, 1).is_some()
    }

    /// Maps a buffer offset back to its physical address.
    #[inline]
    pub const fn addr_of(&self, offset: usize) -> u64 {
        self.base.wrapping_add(offset as u64)
    }

    /// Reads `len` (at most 8) bytes at a buffer offset as a little-endian value.
    ///
    /// Returns `None` if the range leaves the buffer.
    #[inline]
    pub fn read_bits(&self, offset: usize, len: usize) -> Option<u64> {
        if len > 8 {
            return None;
        }
        let bytes = self.data.get(offset..offset.checked_add(len)?)?;
        Some(
            bytes
                .iter()
                .rev()
                .fold(0u64, |acc, &b| (acc << 8) | u64::from(b)),
        )
    }

    /// Writes the low `len` (at most 8) bytes of `bits` at a buffer offset.
    ///
    /// Returns `false`, leaving memory untouched, if the range leaves the buffer.
    #[inline]
    pub fn write_bits(&mut self, offset: usize, len: usize, bits: u64) -> bool {
        if len > 8 {
            return false;
        }
        let Some(end) = offset.checked_add(len) else {
            return false;
        };
        match self.data.get_mut(offset..end) {
            Some(dest) => {
                dest.copy_from_slice(&bits.to_le_bytes()[..len]);
                true
            }
            None => false,
        }
    }

    /// Reads `len` bytes at a physical address.
    pub fn read_phys(&self, paddr: u64, len: usize) -> Option<u64> {
        self.read_bits(self.offset_of(paddr, len)?, len)
    }

    /// Writes `len` bytes at a physical address. Returns `false` outside RAM.
    pub fn write_phys(&mut self, paddr: u64, len: usize, bits: u64) -> bool {
        self.offset_of(paddr, len)
            .is_some_and(|offset| self.write_bits(offset, len, bits))
    }

    /// Copies a binary image into memory at a physical address.
    ///
    /// Used for loading programs and page tables during setup. Returns `false`
    /// if the image does not fit.
    pub fn load(&mut self, paddr: u64, image: &[u8]) -> bool {
        match self.offset_of(paddr, image.len()) {
            Some(offset) => {
                self.data[offset..offset + image.len()].copy_from_slice(image);
                true
            }
            None => false,
        }
    }

    /// Returns a read-only view of `len` bytes at a physical address.
    pub fn slice(&self, paddr: u64, len: usize) -> Option<&[u8]> {
        let offset = self.offset_of(paddr, len)?;
        self.data.get(offset..offset + len)
    }
}

impl std::fmt::Debug for PhysicalMemory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhysicalMemory")
            .field("base", &format_args!("{:#x}", self.base))
            .field("size", &format_args!("{:#x}", self.data.len()))
            .finish()
    }
}
