//! # Configuration Tests
//!
//! Verifies JSON parsing, defaults, and validation of MMU and memory settings.

use pretty_assertions::assert_eq;
use warpsim_core::common::ConfigError;
use warpsim_core::config::{Config, MemoryConfig, MmuConfig};
use warpsim_core::isa::RawDecoder;
use warpsim_core::Mmu;

#[test]
fn empty_document_takes_defaults() {
    let config = Config::from_json("{}").unwrap();
    assert_eq!(config, Config::default());
    assert_eq!(config.mmu.tlb_entries, 256);
    assert_eq!(config.mmu.icache_entries, 1024);
    assert_eq!(config.mmu.pc_align, 2);
    assert!(config.mmu.tlb_enabled);
    assert!(!config.mmu.timewarp);
    assert!(!config.mmu.check_permissions);
    assert_eq!(config.memory.base, 0x8000_0000);
}

#[test]
fn partial_sections_merge_with_defaults() {
    let config = Config::from_json(r#"{ "mmu": { "xlen": 32, "check_permissions": true } }"#).unwrap();
    assert_eq!(config.mmu.xlen, 32);
    assert!(config.mmu.check_permissions);
    assert_eq!(config.mmu.permission_entries, 256);
}

#[test]
fn non_power_of_two_table_is_rejected() {
    let err = Config::from_json(r#"{ "mmu": { "icache_entries": 1000 } }"#).unwrap_err();
    assert!(matches!(
        err,
        ConfigError::NotPowerOfTwo {
            field: "icache_entries",
            value: 1000
        }
    ));
}

#[test]
fn zero_sized_table_is_rejected() {
    let config = MmuConfig {
        tlb_entries: 0,
        ..MmuConfig::default()
    };
    assert!(config.validate().is_err());
}

#[test]
fn bad_xlen_and_pc_align_are_rejected() {
    let xlen = MmuConfig {
        xlen: 128,
        ..MmuConfig::default()
    };
    assert!(matches!(xlen.validate(), Err(ConfigError::UnsupportedXlen(128))));

    let align = MmuConfig {
        pc_align: 3,
        ..MmuConfig::default()
    };
    assert!(matches!(align.validate(), Err(ConfigError::InvalidPcAlign(3))));
}

#[test]
fn memory_region_must_be_page_granular() {
    let unaligned = MemoryConfig {
        base: 0x8000_0800,
        size: 0x1000,
    };
    assert!(matches!(
        unaligned.validate(),
        Err(ConfigError::InvalidMemoryRegion { .. })
    ));
    let empty = MemoryConfig { base: 0, size: 0 };
    assert!(empty.validate().is_err());
    let wraps = MemoryConfig {
        base: u64::MAX & !0xFFF,
        size: 0x2000,
    };
    assert!(wraps.validate().is_err());
}

#[test]
fn malformed_json_is_reported() {
    let err = Config::from_json("{ mmu: }").unwrap_err();
    assert!(matches!(err, ConfigError::Json(_)));
    assert!(err.to_string().starts_with("invalid configuration JSON"));
}

#[test]
fn serialized_config_parses_back() {
    let config = Config {
        mmu: MmuConfig {
            tlb_entries: 32,
            timewarp: true,
            ..MmuConfig::default()
        },
        memory: MemoryConfig {
            base: 0x8000_0000,
            size: 0x10_0000,
        },
    };
    let json = serde_json::to_string(&config).unwrap();
    assert_eq!(Config::from_json(&json).unwrap(), config);
}

#[test]
fn mmu_from_config_allocates_memory() {
    let config = Config::from_json(r#"{ "memory": { "size": 65536 }, "mmu": { "timewarp": true } }"#)
        .unwrap();
    let mmu = Mmu::from_config(&config, RawDecoder).unwrap();
    assert_eq!(mmu.bus().memory().len(), 65536);
    assert_eq!(mmu.bus().memory().base(), 0x8000_0000);
    assert!(mmu.timewarp());
}

#[test]
fn mmu_rejects_invalid_config() {
    let config = MmuConfig {
        tlb_entries: 6,
        ..MmuConfig::default()
    };
    let bus = warpsim_core::soc::Bus::new(warpsim_core::soc::PhysicalMemory::new(0, 0x1000));
    assert!(Mmu::new(config, bus, RawDecoder).is_err());
}
