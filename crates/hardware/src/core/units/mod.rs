//! Functional units of the memory system.
//!
//! This module contains the memory management unit and the time-warp history
//! that lets a hart's memory state be rolled back.

/// Memory Management Unit with TLB, instruction cache and page table walker.
pub mod mmu;

/// Time-warp store records and translation snapshots.
pub mod timewarp;
