//! Memory tracers.
//!
//! A tracer observes physical accesses. Pages a tracer is interested in are
//! never installed in the TLB or icache, so every access to them takes the
//! slow path and is reported.

use crate::common::AccessType;

/// Observer of physical memory accesses.
pub trait MemTracer: Send {
    /// Returns `true` if accesses of kind `access` to `[begin, end)` should be traced.
    fn interested_in_range(&self, begin: u64, end: u64, access: AccessType) -> bool;

    /// Records an access of `len` bytes at physical address `addr`.
    fn trace(&mut self, addr: u64, len: usize, access: AccessType);
}

/// The tracers registered with one MMU.
#[derive(Default)]
pub struct MemTracerList {
    list: Vec<Box<dyn MemTracer>>,
}

impl MemTracerList {
    /// Creates an empty list.
    pub const fn new() -> Self {
        Self { list: Vec::new() }
    }

    /// Returns `true` if no tracer is registered.
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// Returns the number of registered tracers.
    pub fn len(&self) -> usize {
        self.list.len()
    }

    /// Adds a tracer.
    pub fn hook(&mut self, tracer: Box<dyn MemTracer>) {
        self.list.push(tracer);
    }

    /// Returns `true` if any tracer wants `[begin, end)` for `access`.
    pub fn interested_in_range(&self, begin: u64, end: u64, access: AccessType) -> bool {
        self.list
            .iter()
            .any(|t| t.interested_in_range(begin, end, access))
    }

    /// Forwards an access to every tracer.
    pub fn trace(&mut self, addr: u64, len: usize, access: AccessType) {
        for tracer in &mut self.list {
            tracer.trace(addr, len, access);
        }
    }
}

impl std::fmt::Debug for MemTracerList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemTracerList")
            .field("tracers", &self.list.len())
            .finish()
    }
}
