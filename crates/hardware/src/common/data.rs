//! Memory Access Types.
//!
//! This module defines how memory accesses are classified and sized:
//! 1. **Permission Validation:** `AccessType` selects the R/W/X rule and the TLB table.
//! 2. **Trigger Matching:** `TriggerOperation` names the operation a debug trigger watches.
//! 3. **Access Width:** `MemoryWord` lets one generic load/store path serve every integer width.

use std::fmt;

/// Type of memory access operation.
///
/// Distinguishes instruction fetches, data loads, and data stores. Each kind has
/// its own TLB tag table because the page permissions they require differ.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AccessType {
    /// Instruction fetch; requires Execute (X) permission.
    Fetch,

    /// Data load; requires Read (R) permission, or X when MXR is set.
    Read,

    /// Data store; requires Read and Write (R+W) permission and a dirty PTE.
    Write,
}

impl AccessType {
    /// Returns the short lowercase name used in log output.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Fetch => "fetch",
            Self::Read => "load",
            Self::Write => "store",
        }
    }
}

impl fmt::Display for AccessType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Memory operation observed by a debug trigger.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TriggerOperation {
    /// Data load.
    Load,
    /// Data store.
    Store,
    /// Instruction execution (fetch).
    Execute,
}

impl From<AccessType> for TriggerOperation {
    fn from(access: AccessType) -> Self {
        match access {
            AccessType::Fetch => Self::Execute,
            AccessType::Read => Self::Load,
            AccessType::Write => Self::Store,
        }
    }
}

impl fmt::Display for TriggerOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Load => f.write_str("load"),
            Self::Store => f.write_str("store"),
            Self::Execute => f.write_str("execute"),
        }
    }
}

/// An integer type that can be loaded from or stored to guest memory.
///
/// Values travel through the MMU as zero-extended little-endian bit patterns
/// (`u64`); this trait converts between that representation and the typed
/// value the caller asked for.
pub trait MemoryWord: Copy + fmt::Debug + PartialEq + Send + 'static {
    /// Width of the access in bytes.
    const SIZE: usize;

    /// Returns the raw bit pattern of the value, zero-extended to 64 bits.
    fn to_bits(self) -> u64;

    /// Reconstructs a value from the low `SIZE` bytes of `bits`.
    fn from_bits(bits: u64) -> Self;
}

macro_rules! impl_memory_word {
    ($($ty:ty => $raw:ty),* $(,)?) => {
        $(
            impl MemoryWord for $ty {
                const SIZE: usize = std::mem::size_of::<$ty>();

                #[inline(always)]
                fn to_bits(self) -> u64 {
                    self as $raw as u64
                }

                #[inline(always)]
                fn from_bits(bits: u64) -> Self {
                    bits as $raw as $ty
                }
            }
        )*
    };
}

impl_memory_word! {
    u8 => u8,
    u16 => u16,
    u32 => u32,
    u64 => u64,
    i8 => u8,
    i16 => u16,
    i32 => u32,
    i64 => u64,
}
