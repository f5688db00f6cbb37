//! Instruction Set Architecture (ISA) hooks used by instruction fetch.
//!
//! The MMU never interprets instructions. It needs two things from the ISA:
//!
//! * `length`: the encoded length of an instruction from its first halfword.
//! * `decoder`: the seam through which assembled bits become an executable handle.

/// Decoder seam for the instruction cache.
pub mod decoder;

/// Instruction length decoding.
pub mod length;

pub use decoder::{Decoder, RawDecoder};
pub use length::insn_length;
