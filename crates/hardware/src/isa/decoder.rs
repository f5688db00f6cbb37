//! Decoder seam.
//!
//! Instruction decoding lives outside the MMU. The icache only needs to turn
//! assembled instruction bits into something the execution layer can run and
//! to keep a copy of that handle per cached PC.

/// Turns raw instruction bits into an executable handle.
pub trait Decoder {
    /// Decoded instruction handle stored in the icache.
    type Insn: Clone;

    /// Decodes `bits`, the little-endian instruction word sign-extended from
    /// its top halfword.
    fn decode(&mut self, bits: u64) -> Self::Insn;
}

/// Decoder that keeps the raw bits as the handle.
///
/// Useful when the caller dispatches on the bits itself, and in tests.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RawDecoder;

impl Decoder for RawDecoder {
    type Insn = u64;

    #[inline]
    fn decode(&mut self, bits: u64) -> u64 {
        bits
    }
}
