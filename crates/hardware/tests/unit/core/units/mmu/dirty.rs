//! # Accessed/Dirty Bit Tests
//!
//! The walker sets A on first use and D on first store; the fast path must
//! never let a store land on a page whose D bit is still clear.

use crate::common::harness::{DATA_PA, TestContext};
use pretty_assertions::assert_eq;
use warpsim_core::common::AccessType;
use warpsim_core::config::MmuConfig;
use warpsim_core::core::arch::status::TranslationMode;
use warpsim_core::core::units::mmu::ptw::{PTE_A, PTE_D, PTE_R, PTE_W, PTE_X};

#[test]
fn load_sets_only_accessed() {
    let mut ctx = TestContext::paged(TranslationMode::Sv39);
    let leaf = ctx.map_leaf(0x6000, DATA_PA, PTE_R | PTE_W);
    let _ = ctx.load_u32(0x6000);
    assert_eq!(ctx.peek(leaf, 8) & (PTE_A | PTE_D), PTE_A);
    assert_eq!(ctx.mmu.stats().dirty_updates, 0);
}

#[test]
fn first_store_sets_dirty_once() {
    let mut ctx = TestContext::paged(TranslationMode::Sv39);
    let leaf = ctx.map_leaf(0x6000, DATA_PA, PTE_R | PTE_W);

    for i in 0..8 {
        ctx.store_u32(0x6000 + 4 * i, i as u32);
    }
    assert_eq!(ctx.peek(leaf, 8) & (PTE_A | PTE_D), PTE_A | PTE_D);
    assert_eq!(ctx.mmu.stats().dirty_updates, 1);
    assert_eq!(ctx.mmu.stats().page_walks, 1);
}

#[test]
fn fetch_sets_accessed() {
    let mut ctx = TestContext::paged(TranslationMode::Sv39);
    let leaf = ctx.map_leaf(0x6000, DATA_PA, PTE_X);
    let _ = ctx.mmu.fetch(0x6000).unwrap();
    assert_eq!(ctx.peek(leaf, 8) & (PTE_A | PTE_D), PTE_A);
}

#[test]
fn already_dirty_page_is_not_rewritten() {
    let mut ctx = TestContext::paged(TranslationMode::Sv39);
    let leaf = ctx.map_leaf(0x6000, DATA_PA, PTE_R | PTE_W | PTE_A | PTE_D);
    let before = ctx.peek(leaf, 8);
    ctx.store_u32(0x6000, 9);
    assert_eq!(ctx.peek(leaf, 8), before);
    assert_eq!(ctx.mmu.stats().dirty_updates, 0);
}

#[test]
fn store_after_load_walks_for_dirty() {
    let config = MmuConfig {
        check_permissions: true,
        ..MmuConfig::default()
    };
    let mut ctx = TestContext::paged_with_config(TranslationMode::Sv39, config);
    let leaf = ctx.map_leaf(0x6000, DATA_PA, PTE_R | PTE_W);

    let _ = ctx.load_u32(0x6000);
    assert_eq!(ctx.mmu.tlb().occupancy(AccessType::Write), 0);

    ctx.store_u32(0x6004, 3);
    assert_eq!(ctx.peek(leaf, 8) & PTE_D, PTE_D);
    assert_eq!(ctx.mmu.stats().page_walks, 2);
    assert_eq!(ctx.load_u32(0x6004), 3);
}
