//! # Instruction Length Tests
//!
//! Verifies the encoded-length rule over the low bits of the first halfword.

use rstest::rstest;
use warpsim_core::isa::{Decoder, RawDecoder, insn_length};

#[rstest]
#[case::c_addi(0x0505, 2)]
#[case::c_lw(0x4188, 2)]
#[case::c_jr(0x8082, 2)]
#[case::addi(0x0013, 4)]
#[case::jal(0x006f, 4)]
#[case::len48(0x001f, 6)]
#[case::len64(0x003f, 8)]
#[case::reserved_long(0x007f, 8)]
fn length_from_low_bits(#[case] bits: u64, #[case] length: u64) {
    assert_eq!(insn_length(bits), length);
}

#[test]
fn only_first_halfword_matters() {
    assert_eq!(insn_length(0xFFFF_0013), 4);
    assert_eq!(insn_length(0x1234_0001), 2);
}

#[test]
fn raw_decoder_returns_bits() {
    let mut decoder = RawDecoder;
    assert_eq!(decoder.decode(0x0000_0513), 0x0000_0513);
}
