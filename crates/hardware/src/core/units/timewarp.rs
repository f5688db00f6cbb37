//! Time-warp history.
//!
//! Two timestamp-ordered logs back optimistic execution:
//! 1. **Store Records:** the pre-write value of every recorded store, undone
//!    newest-first on rollback.
//! 2. **Snapshots:** copies of the MMU's translation state, restored from the
//!    latest one at or before the rollback target.
//!
//! Timestamps are expected to be non-decreasing between rollbacks. A rollback
//! truncates both logs to the target, so appends after it stay ordered.

use std::collections::VecDeque;

/// The pre-write contents of one store.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StoreRecord {
    /// Logical time of the store.
    pub timestamp: u64,
    /// Store width in bytes.
    pub len: usize,
    /// Physical address written.
    pub paddr: u64,
    /// Value at `paddr` before the store (little-endian, `len` bytes).
    pub old: u64,
}

/// A timestamped copy of translation state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Snapshot<S> {
    /// Logical time the snapshot was taken.
    pub timestamp: u64,
    /// Captured state.
    pub state: S,
}

/// Rollback log of one core.
#[derive(Clone, Debug)]
pub struct TimeWarpLog<S> {
    records: VecDeque<StoreRecord>,
    snapshots: VecDeque<Snapshot<S>>,
}

impl<S> Default for TimeWarpLog<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> TimeWarpLog<S> {
    /// Creates an empty log.
    pub const fn new() -> Self {
        Self {
            records: VecDeque::new(),
            snapshots: VecDeque::new(),
        }
    }

    /// Appends a store record.
    pub fn record(&mut self, timestamp: u64, len: usize, paddr: u64, old: u64) {
        self.records.push_back(StoreRecord {
            timestamp,
            len,
            paddr,
            old,
        });
    }

    /// Appends a snapshot.
    pub fn snapshot(&mut self, timestamp: u64, state: S) {
        self.snapshots.push_back(Snapshot { timestamp, state });
    }

    /// Removes and returns the newest record if it is later than `timestamp`.
    ///
    /// Calling this until it returns `None` yields every record after
    /// `timestamp` in reverse chronological order.
    pub fn pop_record_after(&mut self, timestamp: u64) -> Option<StoreRecord> {
        if self.records.back()?.timestamp > timestamp {
            self.records.pop_back()
        } else {
            None
        }
    }

    /// Drops snapshots later than `timestamp` and returns the newest remaining one.
    pub fn restore_point(&mut self, timestamp: u64) -> Option<&Snapshot<S>> {
        while self
            .snapshots
            .back()
            .is_some_and(|s| s.timestamp > timestamp)
        {
            let _ = self.snapshots.pop_back();
        }
        self.snapshots.back()
    }

    /// Discards history that no rollback at or after `gvt` can reference.
    ///
    /// Every record older than `gvt` is dropped. Snapshots older than `gvt`
    /// are dropped except the newest of them, which remains the restore point
    /// for rollbacks to timestamps between it and the next snapshot.
    ///
    /// Returns the number of entries discarded.
    pub fn collect_fossils(&mut self, gvt: u64) -> usize {
        let mut collected = 0;
        while self.records.front().is_some_and(|r| r.timestamp < gvt) {
            let _ = self.records.pop_front();
            collected += 1;
        }
        while self.snapshots.len() > 1 && self.snapshots[1].timestamp < gvt {
            let _ = self.snapshots.pop_front();
            collected += 1;
        }
        collected
    }

    /// Returns the store records, oldest first.
    pub fn records(&self) -> impl Iterator<Item = &StoreRecord> {
        self.records.iter()
    }

    /// Returns the timestamps of retained snapshots, oldest first.
    pub fn snapshot_times(&self) -> impl Iterator<Item = u64> + '_ {
        self.snapshots.iter().map(|s| s.timestamp)
    }

    /// Number of retained store records.
    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    /// Number of retained snapshots.
    pub fn snapshot_count(&self) -> usize {
        self.snapshots.len()
    }

    /// Returns `true` if the log holds nothing.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty() && self.snapshots.is_empty()
    }
}
