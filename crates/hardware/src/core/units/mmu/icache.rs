//! Decoded-instruction cache.
//!
//! A direct-mapped cache from virtual PC to the decoded handle and raw bits of
//! the instruction at that PC. Slot selection is `(pc / pc_align) mod size`.
//! An entry whose fetch was traced or trigger-checked is stored with
//! [`ICACHE_INVALID_TAG`] so the next fetch of that PC refills (and re-traces).

use crate::common::constants::ICACHE_INVALID_TAG;

/// A fetched and decoded instruction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchedInsn<H> {
    /// Decoder output.
    pub insn: H,
    /// Raw instruction bits, sign-extended from the top halfword.
    pub bits: u64,
    /// Encoded length in bytes (2, 4, 6, or 8).
    pub length: u64,
}

#[derive(Clone, Debug)]
struct Entry<H> {
    tag: u64,
    data: Option<FetchedInsn<H>>,
}

impl<H> Default for Entry<H> {
    fn default() -> Self {
        Self {
            tag: ICACHE_INVALID_TAG,
            data: None,
        }
    }
}

/// Direct-mapped instruction cache.
#[derive(Clone, Debug)]
pub struct InstructionCache<H> {
    entries: Vec<Entry<H>>,
    mask: usize,
    pc_align: u64,
}

impl<H> InstructionCache<H> {
    /// Creates an empty cache.
    ///
    /// # Arguments
    ///
    /// * `size` - Number of entries (rounded up to the next power of two).
    /// * `pc_align` - Instruction alignment in bytes.
    pub fn new(size: usize, pc_align: u64) -> Self {
        let size = size.max(1).next_power_of_two();
        Self {
            entries: std::iter::repeat_with(Entry::default).take(size).collect(),
            mask: size - 1,
            pc_align: pc_align.max(1),
        }
    }

    /// Returns the slot `pc` maps to.
    #[inline(always)]
    pub const fn index(&self, pc: u64) -> usize {
        ((pc / self.pc_align) as usize) & self.mask
    }

    /// Returns the cached instruction at `pc` if its tag matches.
    #[inline]
    pub fn lookup(&self, pc: u64) -> Option<&FetchedInsn<H>> {
        let entry = &self.entries[self.index(pc)];
        if entry.tag == pc {
            entry.data.as_ref()
        } else {
            None
        }
    }

    /// Stores `fetched` in the slot for `pc`.
    ///
    /// When `cacheable` is false the slot keeps the instruction but carries
    /// the invalid tag, so the next lookup misses.
    pub fn fill(&mut self, pc: u64, fetched: FetchedInsn<H>, cacheable: bool) {
        let idx = self.index(pc);
        let entry = &mut self.entries[idx];
        entry.tag = if cacheable { pc } else { ICACHE_INVALID_TAG };
        entry.data = Some(fetched);
    }

    /// Invalidates every entry.
    pub fn flush(&mut self) {
        for entry in &mut self.entries {
            entry.tag = ICACHE_INVALID_TAG;
        }
    }

    /// Number of entries holding a valid tag.
    pub fn occupancy(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.tag != ICACHE_INVALID_TAG)
            .count()
    }
}
