//! # Unit Components
//!
//! This module serves as the central hub for the per-component test suites:
//! shared types, configuration, the MMU core, ISA hooks, and SoC collaborators.


/// Unit tests for configuration parsing and validation.
pub mod config;


/// Unit tests for instruction length decoding.
pub mod isa;
