//! MMU statistics collection and reporting.
//!
//! This module tracks how often the MMU's caches serve an access. It provides:
//! 1. **Translation:** TLB hit/miss counts and page walks.
//! 2. **Instruction cache:** Hit/miss counts for decoded fetches.
//! 3. **Page tables:** Dirty-bit write-backs performed by the walker.
//! 4. **Time-warp:** Recorded stores, snapshots, rollbacks, and collected fossils.

use std::fmt;

use serde::Serialize;

/// Counters kept by one MMU.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MmuStats {
    /// Accesses served by the fast-path TLB.
    pub tlb_hits: u64,
    /// Accesses that fell to the slow path.
    pub tlb_misses: u64,
    /// Fetches served by the instruction cache.
    pub icache_hits: u64,
    /// Fetches that refilled the instruction cache.
    pub icache_misses: u64,
    /// Page-table walks performed.
    pub page_walks: u64,
    /// Walks that set a PTE's dirty bit.
    pub dirty_updates: u64,
    /// Store records appended to the time-warp log.
    pub records: u64,
    /// Snapshots taken.
    pub snapshots: u64,
    /// Rollbacks performed.
    pub rollbacks: u64,
    /// History entries discarded by fossil collection.
    pub fossils_collected: u64,
}

impl MmuStats {
    /// Fraction of TLB probes that hit, or 0 when nothing was probed.
    pub fn tlb_hit_rate(&self) -> f64 {
        ratio(self.tlb_hits, self.tlb_hits + self.tlb_misses)
    }

    /// Fraction of fetches served by the icache, or 0 when nothing was fetched.
    pub fn icache_hit_rate(&self) -> f64 {
        ratio(self.icache_hits, self.icache_hits + self.icache_misses)
    }

    /// Zeroes every counter.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[allow(clippy::cast_precision_loss)]
fn ratio(num: u64, den: u64) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

impl fmt::Display for MmuStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "MMU")?;
        writeln!(f, "  tlb.hits               {}", self.tlb_hits)?;
        writeln!(f, "  tlb.misses             {}", self.tlb_misses)?;
        writeln!(f, "  tlb.hit_rate           {:.2}%", self.tlb_hit_rate() * 100.0)?;
        writeln!(f, "  icache.hits            {}", self.icache_hits)?;
        writeln!(f, "  icache.misses          {}", self.icache_misses)?;
        writeln!(f, "  ptw.walks              {}", self.page_walks)?;
        writeln!(f, "  ptw.dirty_updates      {}", self.dirty_updates)?;
        writeln!(f, "TIME WARP")?;
        writeln!(f, "  tw.records             {}", self.records)?;
        writeln!(f, "  tw.snapshots           {}", self.snapshots)?;
        writeln!(f, "  tw.rollbacks           {}", self.rollbacks)?;
        write!(f, "  tw.fossils             {}", self.fossils_collected)
    }
}
