//! Debug-trigger evaluation.
//!
//! The MMU consults a [`TriggerMatcher`] on accesses whose TLB tag carries the
//! trigger flag and on every slow-path access to a watched operation.

use crate::common::TriggerOperation;

/// When a matched trigger fires relative to its access.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TriggerTiming {
    /// Raise before the access takes effect; the access is aborted.
    #[default]
    Before,
    /// Raise after the access has completed.
    After,
}

/// Evaluator for the debug triggers of one hart.
pub trait TriggerMatcher: Send {
    /// Returns the index of the first trigger matching the operation, or `None`.
    fn trigger_match(&self, operation: TriggerOperation, address: u64, data: u64) -> Option<usize>;

    /// Returns the timing configured for trigger `index`.
    fn timing(&self, index: usize) -> TriggerTiming;

    /// Returns `true` if any trigger watches `operation`.
    ///
    /// TLB entries installed for a watched operation are flagged so that hits
    /// still reach [`TriggerMatcher::trigger_match`].
    fn watches(&self, operation: TriggerOperation) -> bool;
}

/// A matcher with no triggers installed.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoTriggers;

impl TriggerMatcher for NoTriggers {
    fn trigger_match(&self, _: TriggerOperation, _: u64, _: u64) -> Option<usize> {
        None
    }

    fn timing(&self, _: usize) -> TriggerTiming {
        TriggerTiming::Before
    }

    fn watches(&self, _: TriggerOperation) -> bool {
        false
    }
}

/// An address watchpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Trigger {
    /// Operation watched.
    pub operation: TriggerOperation,
    /// First address matched.
    pub start: u64,
    /// Last address matched (inclusive).
    pub end: u64,
    /// Required data value, if any.
    pub data: Option<u64>,
    /// When the trigger fires.
    pub timing: TriggerTiming,
}

impl Trigger {
    /// Watches a single address.
    pub const fn new(operation: TriggerOperation, address: u64) -> Self {
        Self {
            operation,
            start: address,
            end: address,
            data: None,
            timing: TriggerTiming::Before,
        }
    }

    /// Extends the watch to `[start, end]`.
    #[must_use]
    pub const fn with_end(mut self, end: u64) -> Self {
        self.end = end;
        self
    }

    /// Only match when the access carries `data`.
    #[must_use]
    pub const fn with_data(mut self, data: u64) -> Self {
        self.data = Some(data);
        self
    }

    /// Sets the timing.
    #[must_use]
    pub const fn with_timing(mut self, timing: TriggerTiming) -> Self {
        self.timing = timing;
        self
    }

    /// Returns `true` if this trigger matches the access.
    pub fn matches(&self, operation: TriggerOperation, address: u64, data: u64) -> bool {
        self.operation == operation
            && (self.start..=self.end).contains(&address)
            && self.data.is_none_or(|d| d == data)
    }
}

/// A list of watchpoints, checked in order.
#[derive(Clone, Debug, Default)]
pub struct TriggerUnit {
    triggers: Vec<Trigger>,
}

impl TriggerUnit {
    /// Creates an empty unit.
    pub const fn new() -> Self {
        Self {
            triggers: Vec::new(),
        }
    }

    /// Appends a trigger and returns its index.
    pub fn push(&mut self, trigger: Trigger) -> usize {
        self.triggers.push(trigger);
        self.triggers.len() - 1
    }

    /// Returns the installed triggers.
    pub fn triggers(&self) -> &[Trigger] {
        &self.triggers
    }

    /// Returns the number of installed triggers.
    pub fn len(&self) -> usize {
        self.triggers.len()
    }

    /// Returns `true` if no trigger is installed.
    pub fn is_empty(&self) -> bool {
        self.triggers.is_empty()
    }
}

impl FromIterator<Trigger> for TriggerUnit {
    fn from_iter<I: IntoIterator<Item = Trigger>>(iter: I) -> Self {
        Self {
            triggers: iter.into_iter().collect(),
        }
    }
}

impl TriggerMatcher for TriggerUnit {
    fn trigger_match(&self, operation: TriggerOperation, address: u64, data: u64) -> Option<usize> {
        self.triggers
            .iter()
            .position(|t| t.matches(operation, address, data))
    }

    fn timing(&self, index: usize) -> TriggerTiming {
        self.triggers
            .get(index)
            .map_or(TriggerTiming::Before, |t| t.timing)
    }

    fn watches(&self, operation: TriggerOperation) -> bool {
        self.triggers.iter().any(|t| t.operation == operation)
    }
}
