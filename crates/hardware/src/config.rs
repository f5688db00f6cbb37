//! Configuration system for the MMU.
//!
//! This module defines the configuration structures used to parameterize an
//! [`Mmu`](crate::core::units::mmu::Mmu) and the physical memory behind it. It provides:
//! 1. **Defaults:** Baseline table sizes and memory map.
//! 2. **Structures:** `MmuConfig` (caches, modes) and `MemoryConfig` (RAM region).
//! 3. **Validation:** Rejection of sizes the direct-mapped tables cannot index.
//!
//! Configuration is usually supplied as JSON by the simulator front end, or built
//! with `Config::default()` and adjusted in code.

use serde::{Deserialize, Serialize};

use crate::common::ConfigError;
use crate::common::constants::PAGE_OFFSET_MASK;

/// Default configuration constants.
mod defaults {
    use crate::common::constants;

    /// Base address of main system RAM (2 GiB).
    pub const RAM_BASE: u64 = 0x8000_0000;

    /// Total size of main system RAM (16 MiB).
    pub const RAM_SIZE: u64 = 16 * 1024 * 1024;

    /// Slots per TLB tag table.
    pub const TLB_ENTRIES: usize = constants::TLB_ENTRIES;

    /// Slots in the decoded-instruction cache.
    pub const ICACHE_ENTRIES: usize = constants::ICACHE_ENTRIES;

    /// Slots per cached permission table.
    pub const PERMISSION_ENTRIES: usize = constants::PERMISSION_ENTRIES;

    /// Instruction alignment (compressed instructions enabled).
    pub const PC_ALIGN: u64 = constants::PC_ALIGN;

    /// Register width in bits.
    pub const XLEN: u32 = 64;
}

/// Root configuration.
///
/// # Examples
///
/// ```
/// use warpsim_core::config::Config;
///
/// let json = r#"{
///     "mmu": { "tlb_entries": 64, "timewarp": true },
///     "memory": { "base": 2147483648, "size": 1048576 }
/// }"#;
///
/// let config = Config::from_json(json).unwrap();
/// assert_eq!(config.mmu.tlb_entries, 64);
/// assert!(config.mmu.timewarp);
/// assert_eq!(config.mmu.icache_entries, 1024);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Translation caches and operating modes.
    #[serde(default)]
    pub mmu: MmuConfig,
    /// Main memory region.
    #[serde(default)]
    pub memory: MemoryConfig,
}

impl Config {
    /// Parses and validates a JSON configuration document.
    ///
    /// Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Json`] on malformed input, or the validation error
    /// of the first invalid field.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Validates every section.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.mmu.validate()?;
        self.memory.validate()
    }
}

/// MMU cache geometry and operating modes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MmuConfig {
    /// Slots per TLB tag table (fetch, load, store). Must be a power of two.
    #[serde(default = "MmuConfig::default_tlb_entries")]
    pub tlb_entries: usize,

    /// Slots in the decoded-instruction cache. Must be a power of two.
    #[serde(default = "MmuConfig::default_icache_entries")]
    pub icache_entries: usize,

    /// Slots per cached permission table. Must be a power of two.
    #[serde(default = "MmuConfig::default_permission_entries")]
    pub permission_entries: usize,

    /// Instruction alignment in bytes (2 with compressed instructions, else 4).
    #[serde(default = "MmuConfig::default_pc_align")]
    pub pc_align: u64,

    /// Register width in bits; machine-mode addresses are zero-extended from it.
    #[serde(default = "MmuConfig::default_xlen")]
    pub xlen: u32,

    /// When false, no fast-path TLB entries are ever installed and every access
    /// takes the slow path.
    #[serde(default = "MmuConfig::default_tlb_enabled")]
    pub tlb_enabled: bool,

    /// Record every store into the time-warp history.
    #[serde(default)]
    pub timewarp: bool,

    /// Run the cached-permission check before consulting the TLB.
    #[serde(default)]
    pub check_permissions: bool,
}

impl MmuConfig {
    fn default_tlb_entries() -> usize {
        defaults::TLB_ENTRIES
    }

    fn default_icache_entries() -> usize {
        defaults::ICACHE_ENTRIES
    }

    fn default_permission_entries() -> usize {
        defaults::PERMISSION_ENTRIES
    }

    fn default_pc_align() -> u64 {
        defaults::PC_ALIGN
    }

    fn default_xlen() -> u32 {
        defaults::XLEN
    }

    fn default_tlb_enabled() -> bool {
        true
    }

    /// Checks table sizes, alignment, and register width.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotPowerOfTwo`], [`ConfigError::InvalidPcAlign`],
    /// or [`ConfigError::UnsupportedXlen`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("tlb_entries", self.tlb_entries),
            ("icache_entries", self.icache_entries),
            ("permission_entries", self.permission_entries),
        ] {
            if !value.is_power_of_two() {
                return Err(ConfigError::NotPowerOfTwo { field, value });
            }
        }
        if !matches!(self.pc_align, 2 | 4) {
            return Err(ConfigError::InvalidPcAlign(self.pc_align));
        }
        if !matches!(self.xlen, 32 | 64) {
            return Err(ConfigError::UnsupportedXlen(self.xlen));
        }
        Ok(())
    }
}

impl Default for MmuConfig {
    fn default() -> Self {
        Self {
            tlb_entries: defaults::TLB_ENTRIES,
            icache_entries: defaults::ICACHE_ENTRIES,
            permission_entries: defaults::PERMISSION_ENTRIES,
            pc_align: defaults::PC_ALIGN,
            xlen: defaults::XLEN,
            tlb_enabled: true,
            timewarp: false,
            check_permissions: false,
        }
    }
}

/// Main memory region backing the MMU fast path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Physical base address of RAM.
    #[serde(default = "MemoryConfig::default_base")]
    pub base: u64,

    /// RAM size in bytes.
    #[serde(default = "MemoryConfig::default_size")]
    pub size: u64,
}

impl MemoryConfig {
    fn default_base() -> u64 {
        defaults::RAM_BASE
    }

    fn default_size() -> u64 {
        defaults::RAM_SIZE
    }

    /// Checks that the region is non-empty and page-granular.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidMemoryRegion`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        let overflows = self.base.checked_add(self.size).is_none();
        if self.size == 0
            || overflows
            || self.base & PAGE_OFFSET_MASK != 0
            || self.size & PAGE_OFFSET_MASK != 0
        {
            return Err(ConfigError::InvalidMemoryRegion {
                base: self.base,
                size: self.size,
            });
        }
        Ok(())
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            base: defaults::RAM_BASE,
            size: defaults::RAM_SIZE,
        }
    }
}
