//! Time-warp capable RISC-V memory management unit.
//!
//! This crate implements the memory port of an instruction-set simulator hart:
//! 1. **Translation:** Sv32/Sv39/Sv48 page-table walks with permission checks and A/D updates.
//! 2. **Caching:** Per-access-type TLBs, cached permission tables, and a decoded-instruction cache.
//! 3. **Debug:** Trigger matching on loads, stores and fetches; memory tracers.
//! 4. **Time Warp:** Store logging, TLB snapshots, rollback, and fossil collection.
//! 5. **SoC:** Owned physical memory, an MMIO bus, and a UART stub.

/// Common types and constants (addresses, access types, traps).
pub mod common;
/// MMU and memory configuration (defaults, validation, JSON).
pub mod config;
/// MMU core (privilege state, TLB, walker, icache, time-warp).
pub mod core;
/// Instruction length decoding and the decoder seam.
pub mod isa;
/// System-on-chip collaborators (bus, memory, devices, traits).
pub mod soc;
/// MMU statistics collection and reporting.
pub mod stats;

/// Root configuration type; use `Config::default()` or deserialize from JSON.
pub use crate::config::Config;
/// Memory management unit of one hart.
pub use crate::core::Mmu;
/// Access result carrying a deferred trigger match.
pub use crate::core::units::mmu::Access;
/// Fault taxonomy of every MMU operation.
pub use crate::common::Trap;
