//! # Architectural State
//!
//! Privilege-mode encodings and the effective-privilege rules applied to
//! each access type.

/// Unit tests for privilege mode conversions.
pub mod mode;
