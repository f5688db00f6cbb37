//! # ISA Hook Tests
//!
//! Covers the instruction-length rule used by the icache refill and the raw
//! decoder.

/// Unit tests for instruction length decoding.
pub mod length;
