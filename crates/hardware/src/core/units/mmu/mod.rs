//! Memory Management Unit (MMU).
//!
//! This module implements a hart's port into the memory system. Every load,
//! store, AMO and instruction fetch goes through it:
//! 1. **Fast Path:** A direct-mapped TLB per access type maps a VPN to an offset
//!    into main memory; a hit reads or writes RAM without translating.
//! 2. **Slow Path:** On a miss the page-table walker translates the address,
//!    the access is performed (RAM or MMIO), and the TLB is refilled unless a
//!    tracer watches the page.
//! 3. **Instruction Cache:** Decoded instructions keyed by PC, refilled one
//!    halfword at a time through the fetch TLB.
//! 4. **Triggers:** Debug triggers are evaluated on flagged TLB hits and on
//!    every slow-path access.
//! 5. **Time Warp:** Stores can be logged and TLB state snapshotted so that a
//!    coordinator can roll the hart back to an earlier logical time.

/// Cached page permissions (the modelled hardware TLB).
pub mod permission;

/// Page table walker for Sv32, Sv39 and Sv48.
pub mod ptw;

/// Translation Lookaside Buffer (TLB) for the fast path.
pub mod tlb;

/// Decoded-instruction cache.
pub mod icache;

/// Debug-trigger evaluation.
pub mod trigger;

/// Memory access tracers.
pub mod tracer;

use tracing::{debug, trace, warn};

use crate::common::constants::PAGE_SIZE;
use crate::common::{
    AccessType, ConfigError, MemoryWord, PhysAddr, Trap, TriggerMatch, TriggerOperation, VirtAddr,
};
use crate::config::{Config, MmuConfig};
use crate::core::arch::mode::PrivilegeMode;
use crate::core::arch::status::PrivilegeState;
use crate::core::units::timewarp::TimeWarpLog;
use crate::isa::{Decoder, insn_length};
use crate::soc::{Bus, PhysicalMemory};
use crate::stats::MmuStats;

use self::icache::{FetchedInsn, InstructionCache};
use self::permission::{PermissionContext, PermissionTable, TlbKind, Verdict, evaluate};
use self::ptw::zero_extend;
use self::tlb::{Tlb, TlbLookup};
use self::tracer::{MemTracer, MemTracerList};
use self::trigger::{NoTriggers, TriggerMatcher, TriggerTiming};

/// The value of a completed access plus any trigger match it deferred.
///
/// A trigger with "after" timing lets the access finish and hands the match
/// back here. The caller must raise it once the access has retired. Within
/// one access only the first match is reported; the next top-level access
/// starts with trigger checks enabled again.
#[must_use = "a pending trigger match must be raised by the caller"]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Access<T> {
    /// Loaded value (or `()` for stores).
    pub value: T,
    /// Trigger match to raise after the access.
    pub pending: Option<TriggerMatch>,
}

impl<T> Access<T> {
    const fn ready(value: T) -> Self {
        Self {
            value,
            pending: None,
        }
    }

    /// Converts a pending match into [`Trap::TriggerMatched`].
    ///
    /// # Errors
    ///
    /// Returns the deferred trigger match, if any.
    pub fn into_result(self) -> Result<T, Trap> {
        match self.pending {
            Some(m) => Err(Trap::TriggerMatched(m)),
            None => Ok(self.value),
        }
    }

    /// Maps the value, keeping the pending match.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Access<U> {
        Access {
            value: f(self.value),
            pending: self.pending,
        }
    }
}

/// Translation state captured by [`Mmu::snapshot`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TranslationSnapshot {
    /// Fast-path TLB.
    pub tlb: Tlb,
    /// Instruction-side permission table.
    pub itlb: PermissionTable,
    /// Data-side permission table.
    pub dtlb: PermissionTable,
    /// Privilege state the tables were filled under.
    pub state: PrivilegeState,
}

/// One instruction halfword read through the fetch TLB.
struct Halfword {
    bits: u64,
    /// Physical address, when the halfword came from RAM.
    paddr: Option<u64>,
    cacheable: bool,
    pending: Option<TriggerMatch>,
}

/// Memory Management Unit of one hart.
pub struct Mmu<D: Decoder> {
    bus: Bus,
    decoder: D,
    config: MmuConfig,
    state: PrivilegeState,

    tlb: Tlb,
    itlb: PermissionTable,
    dtlb: PermissionTable,
    icache: InstructionCache<D::Insn>,

    tracer: MemTracerList,
    triggers: Box<dyn TriggerMatcher>,
    /// Match deferred by an "after" trigger, not yet taken by the caller.
    matched_trigger: Option<TriggerMatch>,

    timewarp: bool,
    timestamp: u64,
    history: TimeWarpLog<TranslationSnapshot>,

    stats: MmuStats,
}

impl<D: Decoder> Mmu<D> {
    /// Creates an MMU in machine mode with empty caches.
    ///
    /// # Arguments
    ///
    /// * `config` - Table sizes and modes.
    /// * `bus` - Main memory and MMIO devices.
    /// * `decoder` - Decoder used to fill the instruction cache.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `config` fails validation.
    pub fn new(config: MmuConfig, bus: Bus, decoder: D) -> Result<Self, ConfigError> {
        config.validate()?;
        debug!(
            tlb = config.tlb_entries,
            icache = config.icache_entries,
            timewarp = config.timewarp,
            check_permissions = config.check_permissions,
            "mmu created"
        );
        Ok(Self {
            bus,
            decoder,
            state: PrivilegeState::machine(),
            tlb: Tlb::new(config.tlb_entries),
            itlb: PermissionTable::new(config.permission_entries),
            dtlb: PermissionTable::new(config.permission_entries),
            icache: InstructionCache::new(config.icache_entries, config.pc_align),
            tracer: MemTracerList::new(),
            triggers: Box::new(NoTriggers),
            matched_trigger: None,
            timewarp: config.timewarp,
            timestamp: 0,
            history: TimeWarpLog::new(),
            stats: MmuStats::default(),
            config,
        })
    }

    /// Creates an MMU with freshly allocated main memory and no devices.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if either part of `config` fails validation.
    pub fn from_config(config: &Config, decoder: D) -> Result<Self, ConfigError> {
        config.validate()?;
        let size = usize::try_from(config.memory.size).map_err(|_| {
            ConfigError::InvalidMemoryRegion {
                base: config.memory.base,
                size: config.memory.size,
            }
        })?;
        let bus = Bus::new(PhysicalMemory::new(config.memory.base, size));
        Self::new(config.mmu.clone(), bus, decoder)
    }

    /// Returns the configuration.
    pub const fn config(&self) -> &MmuConfig {
        &self.config
    }

    /// Returns the bus.
    pub const fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Returns the bus mutably.
    ///
    /// Writes made through it bypass the time-warp log and do not invalidate
    /// cached translations.
    pub const fn bus_mut(&mut self) -> &mut Bus {
        &mut self.bus
    }

    /// Returns the decoder.
    pub const fn decoder(&self) -> &D {
        &self.decoder
    }

    /// Returns the fast-path TLB.
    pub const fn tlb(&self) -> &Tlb {
        &self.tlb
    }

    /// Returns the cached permission table for `kind`.
    pub const fn permissions(&self, kind: TlbKind) -> &PermissionTable {
        match kind {
            TlbKind::Instruction => &self.itlb,
            TlbKind::Data => &self.dtlb,
        }
    }

    /// Returns the time-warp history.
    pub const fn history(&self) -> &TimeWarpLog<TranslationSnapshot> {
        &self.history
    }

    /// Returns the counters.
    pub const fn stats(&self) -> &MmuStats {
        &self.stats
    }

    /// Zeroes the counters.
    pub fn reset_stats(&mut self) {
        self.stats.reset();
    }

    /// Returns the privilege state translation runs under.
    pub const fn privilege_state(&self) -> &PrivilegeState {
        &self.state
    }

    /// Replaces the privilege state.
    ///
    /// Cached translations are flushed when the state actually changes.
    pub fn set_privilege_state(&mut self, state: PrivilegeState) {
        if state != self.state {
            debug!(
                privilege = %state.privilege,
                translation = ?state.translation,
                "privilege state changed"
            );
            self.state = state;
            self.flush_tlb();
        }
    }

    /// Loads an aligned value.
    ///
    /// # Errors
    ///
    /// * [`Trap::LoadAddressMisaligned`] if `addr` is not aligned to the width.
    /// * [`Trap::LoadAccessFault`] if translation or the device denies the load.
    /// * [`Trap::TriggerMatched`] for a "before" trigger.
    pub fn load<T: MemoryWord>(&mut self, addr: u64) -> Result<Access<T>, Trap> {
        self.matched_trigger = None;
        self.load_word(addr)
    }

    fn load_word<T: MemoryWord>(&mut self, addr: u64) -> Result<Access<T>, Trap> {
        let va = VirtAddr::new(addr);
        if !va.is_aligned(T::SIZE as u64) {
            return Err(Trap::LoadAddressMisaligned(addr));
        }
        if self.config.check_permissions {
            self.check_permission(addr, AccessType::Read)?;
        }

        match self.tlb.lookup(AccessType::Read, va.vpn()) {
            TlbLookup::Hit(base) => {
                self.stats.tlb_hits += 1;
                let bits = self.read_ram(base, addr, T::SIZE, AccessType::Read)?;
                Ok(Access::ready(T::from_bits(bits)))
            }
            TlbLookup::HitCheckTriggers(base) => {
                self.stats.tlb_hits += 1;
                let bits = self.read_ram(base, addr, T::SIZE, AccessType::Read)?;
                let pending = self.check_trigger(TriggerOperation::Load, addr, bits)?;
                Ok(Access {
                    value: T::from_bits(bits),
                    pending,
                })
            }
            TlbLookup::Miss => {
                self.stats.tlb_misses += 1;
                Ok(self.load_slow_path(addr, T::SIZE)?.map(T::from_bits))
            }
        }
    }

    /// Stores an aligned value.
    ///
    /// In time-warp mode the previous contents are recorded before the write.
    ///
    /// # Errors
    ///
    /// * [`Trap::StoreAddressMisaligned`] if `addr` is not aligned to the width.
    /// * [`Trap::StoreAccessFault`] if translation or the device denies the store.
    /// * [`Trap::TriggerMatched`] for a "before" trigger; memory is unchanged.
    pub fn store<T: MemoryWord>(&mut self, addr: u64, value: T) -> Result<Access<()>, Trap> {
        self.matched_trigger = None;
        self.store_word(addr, value)
    }

    fn store_word<T: MemoryWord>(&mut self, addr: u64, value: T) -> Result<Access<()>, Trap> {
        let va = VirtAddr::new(addr);
        if !va.is_aligned(T::SIZE as u64) {
            return Err(Trap::StoreAddressMisaligned(addr));
        }
        if self.config.check_permissions {
            self.check_permission(addr, AccessType::Write)?;
        }

        let bits = value.to_bits();
        match self.tlb.lookup(AccessType::Write, va.vpn()) {
            TlbLookup::Hit(base) => {
                self.stats.tlb_hits += 1;
                self.write_ram(base, addr, T::SIZE, bits)?;
                Ok(Access::ready(()))
            }
            TlbLookup::HitCheckTriggers(base) => {
                self.stats.tlb_hits += 1;
                let pending = self.check_trigger(TriggerOperation::Store, addr, bits)?;
                self.write_ram(base, addr, T::SIZE, bits)?;
                Ok(Access { value: (), pending })
            }
            TlbLookup::Miss => {
                self.stats.tlb_misses += 1;
                self.store_slow_path(addr, T::SIZE, bits)
            }
        }
    }

    /// Performs an atomic read-modify-write and returns the old value.
    ///
    /// # Errors
    ///
    /// * [`Trap::StoreAddressMisaligned`] if `addr` is not aligned to the width.
    /// * [`Trap::StoreAccessFault`] if either half is denied; a load-side
    ///   fault is reported as a store fault at the same address.
    /// * [`Trap::TriggerMatched`] for a "before" trigger.
    pub fn amo<T: MemoryWord>(
        &mut self,
        addr: u64,
        f: impl FnOnce(T) -> T,
    ) -> Result<Access<T>, Trap> {
        if !VirtAddr::new(addr).is_aligned(T::SIZE as u64) {
            return Err(Trap::StoreAddressMisaligned(addr));
        }
        self.matched_trigger = None;
        self.read_modify_write(addr, f)
            .map_err(Trap::into_store_fault)
    }

    fn read_modify_write<T: MemoryWord>(
        &mut self,
        addr: u64,
        f: impl FnOnce(T) -> T,
    ) -> Result<Access<T>, Trap> {
        let lhs = self.load_word::<T>(addr)?;
        let stored = self.store_word(addr, f(lhs.value))?;
        Ok(Access {
            value: lhs.value,
            pending: lhs.pending.or(stored.pending),
        })
    }

    /// Fetches and decodes the instruction at `pc` through the icache.
    ///
    /// # Errors
    ///
    /// * [`Trap::InstructionAddressMisaligned`] if `pc` is not instruction-aligned.
    /// * [`Trap::InstructionAccessFault`] carrying the address of the
    ///   halfword whose fetch was denied.
    /// * [`Trap::TriggerMatched`] for a "before" execute trigger.
    pub fn fetch(&mut self, pc: u64) -> Result<Access<FetchedInsn<D::Insn>>, Trap> {
        if pc % self.config.pc_align != 0 {
            return Err(Trap::InstructionAddressMisaligned(pc));
        }
        self.matched_trigger = None;
        if self.config.check_permissions {
            self.check_permission(pc, AccessType::Fetch)?;
        }

        if let Some(hit) = self.icache.lookup(pc) {
            self.stats.icache_hits += 1;
            return Ok(Access::ready(hit.clone()));
        }

        self.stats.icache_misses += 1;
        let (fetched, cacheable, pending) = self.refill_icache(pc)?;
        self.icache.fill(pc, fetched.clone(), cacheable);
        Ok(Access {
            value: fetched,
            pending,
        })
    }

    /// Fetches and decodes the instruction at `pc` without touching the icache.
    ///
    /// # Errors
    ///
    /// Same as [`Mmu::fetch`].
    pub fn load_insn(&mut self, pc: u64) -> Result<Access<FetchedInsn<D::Insn>>, Trap> {
        if pc % self.config.pc_align != 0 {
            return Err(Trap::InstructionAddressMisaligned(pc));
        }
        self.matched_trigger = None;
        let (fetched, _, pending) = self.refill_icache(pc)?;
        Ok(Access {
            value: fetched,
            pending,
        })
    }

    /// Translates `vaddr` for `access`, walking the page tables if needed.
    ///
    /// Machine mode (including bare translation) maps the address to itself,
    /// zero-extended from XLEN. A successful walk refreshes the cached
    /// permission table; Accessed/Dirty updates are recorded in time-warp mode.
    ///
    /// # Errors
    ///
    /// Returns the access fault for `access` if the walk denies it.
    pub fn translate(&mut self, vaddr: u64, access: AccessType) -> Result<u64, Trap> {
        let privilege = self.state.effective_privilege(access);
        if privilege == PrivilegeMode::Machine {
            return Ok(zero_extend(vaddr, self.config.xlen));
        }

        self.stats.page_walks += 1;
        let walked = ptw::walk(
            self.bus.memory_mut(),
            &self.state,
            self.config.xlen,
            vaddr,
            access,
            privilege,
        )?;

        if let Some(update) = walked.update {
            if self.timewarp {
                self.record(update.len, update.paddr, update.old);
            }
            if update.set_dirty() {
                self.stats.dirty_updates += 1;
            }
        }

        let tag = VirtAddr::new(vaddr).vpn() & self.state.translation.vpn_mask();
        self.permission_table_mut(TlbKind::from(access))
            .insert(tag, walked.meta);

        trace!(
            access = %access,
            "walk {vaddr:#x} -> {:#x} (meta {:#x})",
            walked.paddr,
            walked.meta
        );
        Ok(walked.paddr)
    }

    /// Invalidates every TLB, permission-table and icache entry.
    pub fn flush_tlb(&mut self) {
        debug!("flush tlb");
        self.tlb.flush();
        self.itlb.flush();
        self.dtlb.flush();
        self.flush_icache();
    }

    /// Invalidates every icache entry.
    pub fn flush_icache(&mut self) {
        self.icache.flush();
    }

    /// Writes one slot of a cached permission table.
    ///
    /// # Arguments
    ///
    /// * `slot` - Slot index.
    /// * `tag` - VPN masked to the active format's VPN width.
    /// * `meta` - Low PTE bits (V/R/W/X/U/G/A/D).
    /// * `kind` - Table to write.
    pub fn set_permission(&mut self, slot: usize, tag: u64, meta: u64, kind: TlbKind) {
        self.permission_table_mut(kind).set(slot, tag, meta);
    }

    /// Drops every cached permission.
    pub fn flush_permission(&mut self) {
        self.itlb.flush();
        self.dtlb.flush();
    }

    /// Registers a memory tracer. Cached translations are flushed so that
    /// pages it watches are no longer served by the fast path.
    pub fn register_memtracer(&mut self, tracer: Box<dyn MemTracer>) {
        self.flush_tlb();
        self.tracer.hook(tracer);
    }

    /// Installs a trigger evaluator and flushes cached translations so new
    /// TLB entries carry the trigger flag for watched operations.
    pub fn set_triggers(&mut self, triggers: Box<dyn TriggerMatcher>) {
        self.triggers = triggers;
        self.matched_trigger = None;
        self.flush_tlb();
    }

    /// Returns the trigger match deferred by the most recent access, if any.
    pub const fn matched_trigger(&self) -> Option<&TriggerMatch> {
        self.matched_trigger.as_ref()
    }

    /// Takes the trigger match deferred by the most recent access.
    pub const fn take_matched_trigger(&mut self) -> Option<TriggerMatch> {
        self.matched_trigger.take()
    }

    /// Enables or disables store recording.
    pub fn set_timewarp(&mut self, enabled: bool) {
        self.timewarp = enabled;
    }

    /// Returns `true` if stores are being recorded.
    pub const fn timewarp(&self) -> bool {
        self.timewarp
    }

    /// Sets the logical time attached to new records.
    pub const fn set_timestamp(&mut self, timestamp: u64) {
        self.timestamp = timestamp;
    }

    /// Returns the current logical time.
    pub const fn timestamp(&self) -> u64 {
        self.timestamp
    }

    /// Appends a store record at the current timestamp.
    ///
    /// # Arguments
    ///
    /// * `len` - Store width in bytes.
    /// * `paddr` - Physical address written.
    /// * `old` - Value at `paddr` before the write.
    pub fn record(&mut self, len: usize, paddr: u64, old: u64) {
        self.history.record(self.timestamp, len, paddr, old);
        self.stats.records += 1;
    }

    /// Captures the TLB and permission tables at `timestamp`.
    pub fn snapshot(&mut self, timestamp: u64) {
        self.history.snapshot(
            timestamp,
            TranslationSnapshot {
                tlb: self.tlb.clone(),
                itlb: self.itlb.clone(),
                dtlb: self.dtlb.clone(),
                state: self.state,
            },
        );
        self.stats.snapshots += 1;
    }

    /// Restores memory and translation state as of `timestamp`.
    ///
    /// Every store recorded after `timestamp` is undone newest-first. The
    /// tables are then restored from the latest snapshot at or before
    /// `timestamp`; if there is none, or it was taken under a different
    /// privilege state, they are flushed instead. The icache is always
    /// flushed and any deferred trigger match is dropped.
    pub fn rollback(&mut self, timestamp: u64) {
        let mut undone = 0usize;
        while let Some(rec) = self.history.pop_record_after(timestamp) {
            if !self
                .bus
                .memory_mut()
                .write_phys(rec.paddr, rec.len, rec.old)
            {
                warn!("rollback record outside memory at {:#x}", rec.paddr);
            }
            undone += 1;
        }

        let restored = self
            .history
            .restore_point(timestamp)
            .filter(|snap| snap.state.state == self.state)
            .map(|snap| snap.state.clone());
        match restored {
            Some(snap) => {
                self.tlb = snap.tlb;
                self.itlb = snap.itlb;
                self.dtlb = snap.dtlb;
            }
            None => {
                self.tlb.flush();
                self.itlb.flush();
                self.dtlb.flush();
            }
        }

        self.icache.flush();
        self.matched_trigger = None;
        self.timestamp = timestamp;
        self.stats.rollbacks += 1;
        debug!(timestamp, undone, "rollback");
    }

    /// Discards history older than `gvt`. Rollback to any timestamp at or
    /// after `gvt` stays exact.
    pub fn collect_fossils(&mut self, gvt: u64) {
        let collected = self.history.collect_fossils(gvt);
        self.stats.fossils_collected += collected as u64;
        debug!(gvt, collected, "collect fossils");
    }

    fn permission_table_mut(&mut self, kind: TlbKind) -> &mut PermissionTable {
        match kind {
            TlbKind::Instruction => &mut self.itlb,
            TlbKind::Data => &mut self.dtlb,
        }
    }

    /// Checks `vaddr` against the cached permission table.
    ///
    /// A page with no cached entry passes; the walker checks it on a miss. A
    /// store to a clean page drops its store TLB entry so the walker can set D.
    fn check_permission(&mut self, vaddr: u64, access: AccessType) -> Result<(), Trap> {
        let privilege = self.state.effective_privilege(access);
        if privilege == PrivilegeMode::Machine {
            return Ok(());
        }

        let tag = VirtAddr::new(vaddr).vpn() & self.state.translation.vpn_mask();
        let Some(meta) = self.permissions(TlbKind::from(access)).lookup(tag) else {
            return Ok(());
        };

        let ctx = PermissionContext::new(privilege, self.state.pum, self.state.mxr);
        match evaluate(meta, access, ctx) {
            Verdict::Allow => Ok(()),
            Verdict::DirtyMiss => {
                self.tlb.invalidate(AccessType::Write, VirtAddr::new(vaddr).vpn());
                Ok(())
            }
            Verdict::Fault => Err(Trap::access_fault(access, vaddr)),
        }
    }

    /// Evaluates debug triggers for one access.
    ///
    /// Skipped once an earlier sub-access of the same access has matched,
    /// such as a prior halfword of one instruction. A "before" match is
    /// returned as an error; an "after" match is remembered and returned.
    fn check_trigger(
        &mut self,
        operation: TriggerOperation,
        address: u64,
        data: u64,
    ) -> Result<Option<TriggerMatch>, Trap> {
        if self.matched_trigger.is_some() {
            return Ok(None);
        }
        let Some(index) = self.triggers.trigger_match(operation, address, data) else {
            return Ok(None);
        };

        let matched = TriggerMatch {
            index,
            operation,
            address,
            data,
        };
        debug!(%matched, "trigger matched");
        match self.triggers.timing(index) {
            TriggerTiming::Before => Err(Trap::TriggerMatched(matched)),
            TriggerTiming::After => {
                self.matched_trigger = Some(matched);
                Ok(Some(matched))
            }
        }
    }

    fn read_ram(&self, base: u64, addr: u64, len: usize, access: AccessType) -> Result<u64, Trap> {
        if cfg!(feature = "always-trace") {
            trace!(access = %access, len, "tlb hit {addr:#x}");
        }
        usize::try_from(base.wrapping_add(addr))
            .ok()
            .and_then(|offset| self.bus.memory().read_bits(offset, len))
            .ok_or(Trap::access_fault(access, addr))
    }

    fn write_ram(&mut self, base: u64, addr: u64, len: usize, bits: u64) -> Result<(), Trap> {
        if cfg!(feature = "always-trace") {
            trace!(len, "tlb hit store {addr:#x}");
        }
        let fault = Trap::StoreAccessFault(addr);
        let offset = usize::try_from(base.wrapping_add(addr)).map_err(|_| fault)?;
        self.write_offset(offset, len, bits)
            .then_some(())
            .ok_or(fault)
    }

    /// Writes RAM at a buffer offset, recording the old contents first in
    /// time-warp mode. Returns `false` if the range leaves RAM.
    fn write_offset(&mut self, offset: usize, len: usize, bits: u64) -> bool {
        if self.timewarp {
            let Some(old) = self.bus.memory().read_bits(offset, len) else {
                return false;
            };
            let paddr = self.bus.memory().addr_of(offset);
            self.record(len, paddr, old);
        }
        self.bus.memory_mut().write_bits(offset, len, bits)
    }

    /// Installs a fast-path entry for the page of `vaddr`, unless the TLB is
    /// disabled or a tracer watches the page.
    ///
    /// Returns `true` if the page is traced.
    fn refill_tlb(&mut self, vaddr: u64, paddr: u64, offset: usize, access: AccessType) -> bool {
        let page = PhysAddr::new(paddr).page_base();
        if self
            .tracer
            .interested_in_range(page, page + PAGE_SIZE, access)
        {
            return true;
        }
        if self.config.tlb_enabled {
            let base = (offset as u64).wrapping_sub(vaddr);
            let check = self.triggers.watches(TriggerOperation::from(access));
            self.tlb.refill(VirtAddr::new(vaddr).vpn(), base, access, check);
        }
        false
    }

    fn load_slow_path(&mut self, addr: u64, len: usize) -> Result<Access<u64>, Trap> {
        let fault = Trap::LoadAccessFault(addr);
        let paddr = self.translate(addr, AccessType::Read)?;

        let bits = if let Some(offset) = self.bus.memory().offset_of(paddr, len) {
            let bits = self
                .bus
                .memory()
                .read_bits(offset, len)
                .ok_or(fault)?;
            if self.refill_tlb(addr, paddr, offset, AccessType::Read) {
                self.tracer.trace(paddr, len, AccessType::Read);
            }
            bits
        } else {
            let mut bytes = [0u8; 8];
            if !self.bus.mmio_load(paddr, &mut bytes[..len]) {
                return Err(fault);
            }
            u64::from_le_bytes(bytes)
        };

        let pending = self.check_trigger(TriggerOperation::Load, addr, bits)?;
        Ok(Access {
            value: bits,
            pending,
        })
    }

    fn store_slow_path(&mut self, addr: u64, len: usize, bits: u64) -> Result<Access<()>, Trap> {
        let fault = Trap::StoreAccessFault(addr);
        let paddr = self.translate(addr, AccessType::Write)?;
        let pending = self.check_trigger(TriggerOperation::Store, addr, bits)?;

        if let Some(offset) = self.bus.memory().offset_of(paddr, len) {
            if !self.write_offset(offset, len, bits) {
                return Err(fault);
            }
            if self.refill_tlb(addr, paddr, offset, AccessType::Write) {
                self.tracer.trace(paddr, len, AccessType::Write);
            }
        } else if !self
            .bus
            .mmio_store(paddr, &bits.to_le_bytes()[..len])
        {
            return Err(fault);
        }

        Ok(Access { value: (), pending })
    }

    /// Reads one instruction halfword through the fetch TLB.
    fn fetch_halfword(&mut self, addr: u64) -> Result<Halfword, Trap> {
        if self.config.check_permissions {
            self.check_permission(addr, AccessType::Fetch)?;
        }

        match self.tlb.lookup(AccessType::Fetch, VirtAddr::new(addr).vpn()) {
            TlbLookup::Hit(base) => {
                self.stats.tlb_hits += 1;
                let bits = self.read_ram(base, addr, 2, AccessType::Fetch)?;
                let paddr = self.fast_path_paddr(base, addr);
                Ok(Halfword {
                    bits,
                    paddr,
                    cacheable: true,
                    pending: None,
                })
            }
            TlbLookup::HitCheckTriggers(base) => {
                self.stats.tlb_hits += 1;
                let bits = self.read_ram(base, addr, 2, AccessType::Fetch)?;
                let paddr = self.fast_path_paddr(base, addr);
                let pending = self.check_trigger(TriggerOperation::Execute, addr, bits)?;
                Ok(Halfword {
                    bits,
                    paddr,
                    cacheable: false,
                    pending,
                })
            }
            TlbLookup::Miss => {
                self.stats.tlb_misses += 1;
                self.fetch_slow_path(addr)
            }
        }
    }

    fn fast_path_paddr(&self, base: u64, addr: u64) -> Option<u64> {
        let offset = usize::try_from(base.wrapping_add(addr)).ok()?;
        Some(self.bus.memory().addr_of(offset))
    }

    fn fetch_slow_path(&mut self, addr: u64) -> Result<Halfword, Trap> {
        let fault = Trap::InstructionAccessFault(addr);
        let paddr = self.translate(addr, AccessType::Fetch)?;

        let (bits, in_ram, traced) = if let Some(offset) = self.bus.memory().offset_of(paddr, 2)
        {
            let bits = self.bus.memory().read_bits(offset, 2).ok_or(fault)?;
            let traced = self.refill_tlb(addr, paddr, offset, AccessType::Fetch);
            (bits, true, traced)
        } else {
            let mut bytes = [0u8; 2];
            if !self.bus.mmio_load(paddr, &mut bytes) {
                return Err(fault);
            }
            (u64::from(u16::from_le_bytes(bytes)), false, false)
        };

        let watched = self.triggers.watches(TriggerOperation::Execute);
        let pending = self.check_trigger(TriggerOperation::Execute, addr, bits)?;
        Ok(Halfword {
            bits,
            paddr: in_ram.then_some(paddr),
            cacheable: !traced && !watched,
            pending,
        })
    }

    /// Assembles and decodes the instruction at `pc`.
    ///
    /// Returns the instruction, whether it may be cached, and any deferred
    /// trigger match.
    fn refill_icache(
        &mut self,
        pc: u64,
    ) -> Result<(FetchedInsn<D::Insn>, bool, Option<TriggerMatch>), Trap> {
        let first = self.fetch_halfword(pc)?;
        let length = insn_length(first.bits);

        let mut bits = first.bits;
        let mut cacheable = first.cacheable;
        let mut pending = first.pending;
        for offset in (2..length).step_by(2) {
            let half = self.fetch_halfword(pc.wrapping_add(offset))?;
            bits |= half.bits << (8 * offset);
            cacheable &= half.cacheable;
            pending = pending.or(half.pending);
        }

        if let Some(paddr) = first.paddr {
            if self
                .tracer
                .interested_in_range(paddr, paddr + 1, AccessType::Fetch)
            {
                cacheable = false;
                self.tracer.trace(paddr, length as usize, AccessType::Fetch);
            }
        }

        let shift = 64 - 8 * length;
        let bits = (((bits << shift) as i64) >> shift) as u64;
        let insn = self.decoder.decode(bits);
        Ok((
            FetchedInsn {
                insn,
                bits,
                length,
            },
            cacheable,
            pending,
        ))
    }
}

impl<D: Decoder> std::fmt::Debug for Mmu<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mmu")
            .field("state", &self.state)
            .field("timewarp", &self.timewarp)
            .field("timestamp", &self.timestamp)
            .field("tracers", &self.tracer.len())
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}
