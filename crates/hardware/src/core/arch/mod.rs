//! Architectural state consumed by the MMU.
//!
//! Privilege levels and the translation-mode/status snapshot that the
//! execution layer supplies on every mode or address-space change.

/// Privilege mode definitions (User, Supervisor, Machine).
pub mod mode;

/// Translation mode and privilege/status state.
pub mod status;
