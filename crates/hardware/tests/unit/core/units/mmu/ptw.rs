//! # Page Table Walker Tests
//!
//! Verifies address translation across the three paged formats:
//! - Multi-level walks for Sv32, Sv39 and Sv48
//! - Superpages and misaligned superpages
//! - Permission rules (R/W/X/U, PUM, MXR, MPRV)
//! - Canonical address checks
//! - Bare and machine-mode identity mapping

use crate::common::harness::{DATA_PA, RAM_BASE, TestContext};
use pretty_assertions::assert_eq;
use rstest::rstest;
use warpsim_core::common::{AccessType, Trap};
use warpsim_core::config::MmuConfig;
use warpsim_core::core::arch::mode::PrivilegeMode;
use warpsim_core::core::arch::status::TranslationMode;
use warpsim_core::core::units::mmu::ptw::{
    self, PTE_A, PTE_D, PTE_R, PTE_U, PTE_V, PTE_W, PTE_X, PageTableEntry,
};

// ══════════════════════════════════════════════════════════
// Helpers
// ══════════════════════════════════════════════════════════

fn context(mode: TranslationMode) -> TestContext {
    let xlen = if mode == TranslationMode::Sv32 { 32 } else { 64 };
    let config = MmuConfig {
        xlen,
        ..MmuConfig::default()
    };
    TestContext::paged_with_config(mode, config)
}

// ══════════════════════════════════════════════════════════
// 1. Basic walks
// ══════════════════════════════════════════════════════════

#[rstest]
#[case::sv32(TranslationMode::Sv32)]
#[case::sv39(TranslationMode::Sv39)]
#[case::sv48(TranslationMode::Sv48)]
fn walk_maps_page_offset(#[case] mode: TranslationMode) {
    let mut ctx = context(mode);
    ctx.map(0x40_3000, DATA_PA, PTE_R | PTE_W);

    assert_eq!(ctx.mmu.translate(0x40_3123, AccessType::Read), Ok(DATA_PA + 0x123));
    ctx.store_u32(0x40_3ff0, 0xFEED_F00D);
    assert_eq!(ctx.peek(DATA_PA + 0xff0, 4), 0xFEED_F00D);
}

#[rstest]
#[case::sv32(TranslationMode::Sv32)]
#[case::sv39(TranslationMode::Sv39)]
#[case::sv48(TranslationMode::Sv48)]
fn accessed_and_dirty_written_at_pte_width(#[case] mode: TranslationMode) {
    let mut ctx = context(mode);
    let leaf = ctx.map_leaf(0x40_3000, DATA_PA, PTE_R | PTE_W);
    let width = mode.pte_size();

    let _ = ctx.load_u32(0x40_3000);
    let pte = ctx.peek(leaf, width);
    assert_eq!(pte & (PTE_A | PTE_D), PTE_A);

    ctx.store_u32(0x40_3000, 1);
    let pte = ctx.peek(leaf, width);
    assert_eq!(pte & (PTE_A | PTE_D), PTE_A | PTE_D);
    assert_eq!(pte >> 10, DATA_PA >> 12);
}

#[rstest]
#[case::sv32(TranslationMode::Sv32)]
#[case::sv39(TranslationMode::Sv39)]
#[case::sv48(TranslationMode::Sv48)]
fn table_pointer_at_last_level_faults(#[case] mode: TranslationMode) {
    let mut ctx = context(mode);
    ctx.map_at_level(0x40_3000, DATA_PA, 0, 0);
    assert_eq!(
        ctx.mmu.translate(0x40_3000, AccessType::Read),
        Err(Trap::LoadAccessFault(0x40_3000))
    );
}

#[test]
fn walk_reports_pte_update() {
    let mut ctx = TestContext::paged(TranslationMode::Sv39);
    let leaf = ctx.map_leaf(0x5000, DATA_PA, PTE_R | PTE_W | PTE_A);
    let state = *ctx.mmu.privilege_state();

    let walked = ptw::walk(
        ctx.mmu.bus_mut().memory_mut(),
        &state,
        64,
        0x5008,
        AccessType::Write,
        PrivilegeMode::Supervisor,
    )
    .unwrap();

    assert_eq!(walked.paddr, DATA_PA + 8);
    assert_eq!(walked.meta, PTE_V | PTE_R | PTE_W | PTE_A | PTE_D);
    let update = walked.update.unwrap();
    assert_eq!(update.paddr, leaf);
    assert_eq!(update.len, 8);
    assert!(update.set_dirty());
    assert_eq!(PageTableEntry::new(update.new).ppn(), DATA_PA >> 12);

    let again = ptw::walk(
        ctx.mmu.bus_mut().memory_mut(),
        &state,
        64,
        0x5008,
        AccessType::Write,
        PrivilegeMode::Supervisor,
    )
    .unwrap();
    assert_eq!(again.update, None);
}

// ══════════════════════════════════════════════════════════
// 2. Superpages
// ══════════════════════════════════════════════════════════

#[test]
fn megapage_synthesizes_low_vpn_bits() {
    let mut ctx = TestContext::paged(TranslationMode::Sv39);
    ctx.map_at_level(0x4000_0000, RAM_BASE, PTE_R | PTE_W, 1);

    assert_eq!(
        ctx.mmu.translate(0x4012_3458, AccessType::Read),
        Ok(RAM_BASE + 0x12_3458)
    );
    ctx.store_u32(0x4012_3458, 0xAA55);
    assert_eq!(ctx.peek(RAM_BASE + 0x12_3458, 4), 0xAA55);
}

#[test]
fn sv32_megapage_covers_four_mib() {
    let mut ctx = context(TranslationMode::Sv32);
    ctx.map_at_level(0x0040_0000, RAM_BASE, PTE_R, 1);
    assert_eq!(
        ctx.mmu.translate(0x0052_3004, AccessType::Read),
        Ok(RAM_BASE + 0x12_3004)
    );
}

#[test]
fn misaligned_superpage_faults() {
    let mut ctx = TestContext::paged(TranslationMode::Sv39);
    ctx.map_at_level(0x4000_0000, RAM_BASE + 0x1000, PTE_R | PTE_W | PTE_X, 1);

    assert_eq!(
        ctx.mmu.translate(0x4000_0000, AccessType::Read),
        Err(Trap::LoadAccessFault(0x4000_0000))
    );
    assert_eq!(
        ctx.mmu.translate(0x4000_1000, AccessType::Fetch),
        Err(Trap::InstructionAccessFault(0x4000_1000))
    );
}

// ══════════════════════════════════════════════════════════
// 3. Canonical addresses
// ══════════════════════════════════════════════════════════

#[rstest]
#[case::sv39(TranslationMode::Sv39, 0x0000_0040_0000_0000)]
#[case::sv39_high(TranslationMode::Sv39, 0xFFFF_FF80_0000_0000 ^ (1 << 60))]
#[case::sv48(TranslationMode::Sv48, 0x0000_8000_0000_0000)]
fn non_canonical_address_faults(#[case] mode: TranslationMode, #[case] vaddr: u64) {
    let mut ctx = context(mode);
    assert_eq!(ctx.mmu.translate(vaddr, AccessType::Read), Err(Trap::LoadAccessFault(vaddr)));
    assert_eq!(ctx.mmu.stats().page_walks, 1);
}

#[test]
fn sign_extended_high_address_translates() {
    let mut ctx = TestContext::paged(TranslationMode::Sv39);
    ctx.map(0xFFFF_FFFF_FFFF_E000, DATA_PA, PTE_R | PTE_W);
    ctx.store_u32(0xFFFF_FFFF_FFFF_E010, 0x1234);
    assert_eq!(ctx.load_u32(0xFFFF_FFFF_FFFF_E010), 0x1234);
    assert_eq!(ctx.peek(DATA_PA + 0x10, 4), 0x1234);
}

// ══════════════════════════════════════════════════════════
// 4. Permissions
// ══════════════════════════════════════════════════════════

#[test]
fn write_without_read_is_reserved() {
    let mut ctx = TestContext::paged(TranslationMode::Sv39);
    ctx.map(0x3000, DATA_PA, PTE_W | PTE_D | PTE_A);
    assert_eq!(ctx.mmu.load::<u32>(0x3000), Err(Trap::LoadAccessFault(0x3000)));
    assert_eq!(ctx.mmu.store(0x3000, 1u32), Err(Trap::StoreAccessFault(0x3000)));
}

#[test]
fn invalid_leaf_faults() {
    let mut ctx = TestContext::paged(TranslationMode::Sv39);
    let leaf = ctx.map_leaf(0x3000, DATA_PA, PTE_R);
    ctx.poke(leaf, 8, (DATA_PA >> 12) << 10 | PTE_R);
    assert_eq!(
        ctx.mmu.translate(0x3000, AccessType::Read),
        Err(Trap::LoadAccessFault(0x3000))
    );
}

#[test]
fn supervisor_and_user_pages() {
    let mut ctx = TestContext::paged(TranslationMode::Sv39);
    ctx.map(0x3000, DATA_PA, PTE_R);
    ctx.map(0x4000, DATA_PA, PTE_R | PTE_U);

    assert!(ctx.mmu.translate(0x3000, AccessType::Read).is_ok());
    assert!(ctx.mmu.translate(0x4000, AccessType::Read).is_ok());

    ctx.update_state(|s| s.pum = true);
    assert!(ctx.mmu.translate(0x3000, AccessType::Read).is_ok());
    assert_eq!(
        ctx.mmu.translate(0x4000, AccessType::Read),
        Err(Trap::LoadAccessFault(0x4000))
    );

    ctx.enable(TranslationMode::Sv39, PrivilegeMode::User);
    assert_eq!(
        ctx.mmu.translate(0x3000, AccessType::Read),
        Err(Trap::LoadAccessFault(0x3000))
    );
    assert!(ctx.mmu.translate(0x4000, AccessType::Read).is_ok());
}

#[test]
fn execute_requires_x() {
    let mut ctx = TestContext::paged(TranslationMode::Sv39);
    ctx.map(0x3000, DATA_PA, PTE_R | PTE_W);
    ctx.map(0x4000, DATA_PA, PTE_X);
    assert_eq!(
        ctx.mmu.translate(0x3000, AccessType::Fetch),
        Err(Trap::InstructionAccessFault(0x3000))
    );
    assert_eq!(ctx.mmu.translate(0x4000, AccessType::Fetch), Ok(DATA_PA));
}

#[test]
fn mxr_makes_execute_only_readable() {
    let mut ctx = TestContext::paged(TranslationMode::Sv39);
    ctx.map(0x3000, DATA_PA, PTE_X);
    assert_eq!(
        ctx.mmu.translate(0x3000, AccessType::Read),
        Err(Trap::LoadAccessFault(0x3000))
    );

    ctx.update_state(|s| s.mxr = true);
    assert_eq!(ctx.mmu.translate(0x3000, AccessType::Read), Ok(DATA_PA));
    assert_eq!(
        ctx.mmu.translate(0x3000, AccessType::Write),
        Err(Trap::StoreAccessFault(0x3000))
    );
}

#[test]
fn mprv_translates_data_but_not_fetch() {
    let mut ctx = TestContext::paged(TranslationMode::Sv39);
    ctx.map(0x3000, DATA_PA, PTE_R | PTE_X);
    ctx.enable(TranslationMode::Sv39, PrivilegeMode::Machine);
    assert_eq!(ctx.mmu.translate(0x3000, AccessType::Read), Ok(0x3000));

    ctx.update_state(|s| {
        s.mprv = true;
        s.mpp = PrivilegeMode::Supervisor;
    });
    assert_eq!(ctx.mmu.translate(0x3000, AccessType::Read), Ok(DATA_PA));
    assert_eq!(ctx.mmu.translate(0x3000, AccessType::Fetch), Ok(0x3000));

    ctx.update_state(|s| s.debug_mode = true);
    assert_eq!(ctx.mmu.translate(0x3000, AccessType::Read), Ok(0x3000));
}

// ══════════════════════════════════════════════════════════
// 5. Identity mapping and walker faults
// ══════════════════════════════════════════════════════════

#[test]
fn machine_mode_zero_extends_from_xlen() {
    let config = MmuConfig {
        xlen: 32,
        ..MmuConfig::default()
    };
    let mut ctx = TestContext::with_config(config);
    ctx.poke(RAM_BASE + 0x40, 4, 0x77);

    assert_eq!(
        ctx.mmu.translate(0xFFFF_FFFF_8000_0040, AccessType::Read),
        Ok(RAM_BASE + 0x40)
    );
    assert_eq!(ctx.load_u32(0xFFFF_FFFF_8000_0040), 0x77);
    assert_eq!(ctx.load_u32(0xFFFF_FFFF_8000_0040), 0x77);
    assert_eq!(ctx.mmu.stats().page_walks, 0);
}

#[test]
fn bare_supervisor_is_identity() {
    let mut ctx = TestContext::new();
    ctx.enable(TranslationMode::Bare, PrivilegeMode::Supervisor);
    assert_eq!(ctx.mmu.translate(0x1234_5678, AccessType::Write), Ok(0x1234_5678));
    assert_eq!(ctx.mmu.stats().page_walks, 0);
}

#[test]
fn page_table_outside_memory_faults() {
    let mut ctx = TestContext::paged(TranslationMode::Sv39);
    ctx.update_state(|s| s.root_ppn = 0x1000);
    assert_eq!(
        ctx.mmu.translate(0x3000, AccessType::Write),
        Err(Trap::StoreAccessFault(0x3000))
    );
}
