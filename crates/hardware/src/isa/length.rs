//! Instruction length decoding.
//!
//! RISC-V encodes an instruction's length in the low bits of its first
//! halfword. The icache refill path reads that halfword first and then
//! fetches the remaining halfwords one by one.

/// Low two bits below this value mark a 16-bit (compressed) instruction.
const LEN16_MASK: u64 = 0x03;
/// Low five bits below this value mark a 32-bit instruction.
const LEN32_MASK: u64 = 0x1f;
/// Low six bits below this value mark a 48-bit instruction.
const LEN48_MASK: u64 = 0x3f;

/// Returns the length in bytes (2, 4, 6, or 8) of the instruction whose first
/// halfword is `bits`.
///
/// # Examples
///
/// ```
/// use warpsim_core::isa::insn_length;
///
/// assert_eq!(insn_length(0x4501), 2); // c.li a0, 0
/// assert_eq!(insn_length(0x0513), 4); // addi a0, ...
/// assert_eq!(insn_length(0x001f), 6);
/// assert_eq!(insn_length(0x003f), 8);
/// ```
#[inline(always)]
pub const fn insn_length(bits: u64) -> u64 {
    if bits & LEN16_MASK < LEN16_MASK {
        2
    } else if bits & LEN32_MASK < LEN32_MASK {
        4
    } else if bits & LEN48_MASK < LEN48_MASK {
        6
    } else {
        8
    }
}
