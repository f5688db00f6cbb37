//! # MMU Properties
//!
//! Randomized access sequences checked against a flat byte-array model:
//! - Loads return the last value stored
//! - Misaligned accesses never touch memory
//! - Disabling the fast path changes nothing observable

use crate::common::harness::{DATA_PA, TestContext};
use proptest::prelude::*;
use warpsim_core::common::Trap;
use warpsim_core::config::MmuConfig;
use warpsim_core::core::arch::status::TranslationMode;
use warpsim_core::core::units::mmu::ptw::{PTE_R, PTE_W};

const PAGES: [(u64, u64); 3] = [(0x3000, PTE_R | PTE_W), (0x4000, PTE_R | PTE_W), (0x5000, PTE_R)];
const MODEL_SIZE: usize = 3 * 0x1000;

#[derive(Clone, Copy, Debug)]
enum Op {
    Load { addr: u64, width: usize },
    Store { addr: u64, width: usize, value: u64 },
}

fn arb_width() -> impl Strategy<Value = usize> {
    prop_oneof![Just(1usize), Just(2), Just(4), Just(8)]
}

prop_compose! {
    fn arb_addr()(page in 0u64..3, offset in 0u64..0x1000) -> u64 {
        0x3000 + page * 0x1000 + offset
    }
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (arb_addr(), arb_width()).prop_map(|(addr, width)| Op::Load { addr, width }),
        (arb_addr(), arb_width(), any::<u64>())
            .prop_map(|(addr, width, value)| Op::Store { addr, width, value }),
    ]
}

fn context(tlb_enabled: bool) -> TestContext {
    let config = MmuConfig {
        tlb_enabled,
        ..MmuConfig::default()
    };
    let mut ctx = TestContext::paged_with_config(TranslationMode::Sv39, config);
    for (i, &(va, flags)) in PAGES.iter().enumerate() {
        ctx.map(va, DATA_PA + 0x1000 * i as u64, flags);
    }
    ctx
}

fn apply(ctx: &mut TestContext, op: Op) -> Result<u64, Trap> {
    let mmu = &mut ctx.mmu;
    match op {
        Op::Load { addr, width: 1 } => mmu.load::<u8>(addr)?.into_result().map(u64::from),
        Op::Load { addr, width: 2 } => mmu.load::<u16>(addr)?.into_result().map(u64::from),
        Op::Load { addr, width: 4 } => mmu.load::<u32>(addr)?.into_result().map(u64::from),
        Op::Load { addr, .. } => mmu.load::<u64>(addr)?.into_result(),
        Op::Store { addr, width, value } => {
            let access = match width {
                1 => mmu.store(addr, value as u8)?,
                2 => mmu.store(addr, value as u16)?,
                4 => mmu.store(addr, value as u32)?,
                _ => mmu.store(addr, value)?,
            };
            access.into_result().map(|()| 0)
        }
    }
}

fn model(mem: &mut [u8], op: Op) -> Result<u64, Trap> {
    match op {
        Op::Load { addr, width } => {
            if addr % width as u64 != 0 {
                return Err(Trap::LoadAddressMisaligned(addr));
            }
            let at = (addr - 0x3000) as usize;
            let mut bytes = [0u8; 8];
            bytes[..width].copy_from_slice(&mem[at..at + width]);
            Ok(u64::from_le_bytes(bytes))
        }
        Op::Store { addr, width, value } => {
            if addr % width as u64 != 0 {
                return Err(Trap::StoreAddressMisaligned(addr));
            }
            if addr >= 0x5000 {
                return Err(Trap::StoreAccessFault(addr));
            }
            let at = (addr - 0x3000) as usize;
            mem[at..at + width].copy_from_slice(&value.to_le_bytes()[..width]);
            Ok(0)
        }
    }
}

fn memory(ctx: &TestContext) -> Vec<u8> {
    ctx.mmu
        .bus()
        .memory()
        .slice(DATA_PA, MODEL_SIZE)
        .map(<[u8]>::to_vec)
        .unwrap_or_default()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn accesses_match_flat_model(ops in prop::collection::vec(arb_op(), 1..64)) {
        let mut ctx = context(true);
        let mut shadow = vec![0u8; MODEL_SIZE];

        for op in ops {
            prop_assert_eq!(apply(&mut ctx, op), model(&mut shadow, op), "{:?}", op);
        }
        prop_assert_eq!(memory(&ctx), shadow);
    }

    #[test]
    fn misaligned_store_never_mutates(
        addr in arb_addr(),
        width in prop_oneof![Just(2usize), Just(4), Just(8)],
        value in any::<u64>(),
    ) {
        prop_assume!(addr % width as u64 != 0);
        let mut ctx = context(true);
        let before = memory(&ctx);

        let result = apply(&mut ctx, Op::Store { addr, width, value });
        prop_assert_eq!(result, Err(Trap::StoreAddressMisaligned(addr)));
        prop_assert_eq!(memory(&ctx), before);
        prop_assert_eq!(ctx.mmu.stats().page_walks, 0);
    }

    #[test]
    fn fast_path_is_transparent(ops in prop::collection::vec(arb_op(), 1..64)) {
        let mut fast = context(true);
        let mut slow = context(false);

        for op in ops {
            prop_assert_eq!(apply(&mut fast, op), apply(&mut slow, op), "{:?}", op);
        }
        prop_assert_eq!(memory(&fast), memory(&slow));
        prop_assert_eq!(slow.mmu.stats().tlb_hits, 0);
    }
}
