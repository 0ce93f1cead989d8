//! Low-power timer (LPTMR) in free-running compare mode.
//!
//! `CSR[TFC]` keeps the 16-bit counter running through compare matches.
//! `CSR[TCF]` is write-1-to-clear, so every read-modify-write of `CSR` has to
//! mask it out unless it means to acknowledge the match.

use core::sync::atomic::{AtomicU32, Ordering};

use super::{elapsed_since_start, Elapsed, TimerIp, Unsupported};
use crate::{
    config::{HwChannel, IpChannelConfig},
    counter::WrappingCounter,
    mmio::{flag_barrier, Mmio},
};

const BASE: usize = 0x4004_0000;

pub(crate) const CSR: usize = BASE;
pub(crate) const PSR: usize = BASE + 0x04;
pub(crate) const CMR: usize = BASE + 0x08;
pub(crate) const CNR: usize = BASE + 0x0c;

const CSR_TEN: u32 = 1 << 0;
const CSR_TFC: u32 = 1 << 2;
pub(crate) const CSR_TIE: u32 = 1 << 6;
pub(crate) const CSR_TCF: u32 = 1 << 7;

const PSR_PCS_MASK: u32 = 0x3;
const PSR_PBYP: u32 = 1 << 2;
const PSR_PRESCALE_SHIFT: u32 = 3;
const PSR_PRESCALE_MASK: u32 = 0xf << PSR_PRESCALE_SHIFT;

const COUNTER: WrappingCounter = WrappingCounter::U16;

/// `PSR` value for a clock source and prescaler. Prescaler `0` bypasses the
/// divider; `n` divides by `2^n`.
fn psr(clock_source: u8, prescaler: u8) -> u32 {
    let pcs = u32::from(clock_source) & PSR_PCS_MASK;
    match prescaler {
        0 => pcs | PSR_PBYP,
        n => pcs | ((u32::from(n - 1) << PSR_PRESCALE_SHIFT) & PSR_PRESCALE_MASK),
    }
}

pub(crate) struct Lptmr {
    target: AtomicU32,
    next_target: AtomicU32,
}

impl Lptmr {
    pub(crate) const fn new() -> Self {
        Lptmr {
            target: AtomicU32::new(0),
            next_target: AtomicU32::new(0),
        }
    }

    /// Latches and reads the counter.
    fn now<B: Mmio>(bus: &B) -> u32 {
        bus.write(CNR, 0);
        COUNTER.mask(bus.read(CNR))
    }

    fn run_counter<B: Mmio>(bus: &B, ip: &IpChannelConfig) {
        // PSR and CMR are only writable with the timer disabled.
        bus.write(CSR, CSR_TCF);
        bus.write(PSR, psr(ip.clock_source, ip.prescaler));
        bus.write(CMR, 0);
        bus.write(CSR, CSR_TFC | CSR_TEN);
    }
}

impl<B: Mmio> TimerIp<B> for Lptmr {
    fn counter(&self) -> WrappingCounter {
        COUNTER
    }

    fn init(&self, bus: &B, _hw: HwChannel, ip: &IpChannelConfig) {
        self.target.store(0, Ordering::Relaxed);
        self.next_target.store(0, Ordering::Relaxed);
        Self::run_counter(bus, ip);
    }

    fn deinit(&self, bus: &B, _hw: HwChannel) {
        bus.write(CSR, CSR_TCF);
        bus.write(PSR, 0);
        bus.write(CMR, 0);
        self.target.store(0, Ordering::Relaxed);
        self.next_target.store(0, Ordering::Relaxed);
    }

    fn start_timer(&self, bus: &B, _hw: HwChannel, ticks: u32) {
        critical_section::with(|_| {
            let now = Self::now(bus);
            bus.write(CMR, COUNTER.add(now, ticks));
            self.target.store(ticks, Ordering::Relaxed);
            self.next_target.store(0, Ordering::Relaxed);

            bus.modify(CSR, |v| v | CSR_TCF | CSR_TIE);
        });
    }

    fn stop_timer(&self, bus: &B, _hw: HwChannel) {
        bus.modify(CSR, |v| (v & !CSR_TIE) | CSR_TCF);
        flag_barrier();
    }

    fn time_elapsed(&self, bus: &B, _hw: HwChannel) -> Elapsed {
        let now = Self::now(bus);
        let compare = COUNTER.mask(bus.read(CMR));
        let rollover = bus.is_set(CSR, CSR_TCF);
        let target = self.target.load(Ordering::Relaxed);

        Elapsed {
            ticks: elapsed_since_start(COUNTER, now, compare, target),
            rollover,
            target,
        }
    }

    fn enable_interrupt(&self, bus: &B, _hw: HwChannel) {
        bus.modify(CSR, |v| (v & !CSR_TCF) | CSR_TIE);
    }

    fn disable_interrupt(&self, bus: &B, _hw: HwChannel) {
        bus.modify(CSR, |v| v & !(CSR_TCF | CSR_TIE));
    }

    fn change_next_timeout_value(
        &self,
        _bus: &B,
        _hw: HwChannel,
        ticks: u32,
    ) -> Result<(), Unsupported> {
        self.next_target.store(ticks, Ordering::Relaxed);
        Ok(())
    }

    fn set_prescaler(&self, bus: &B, _hw: HwChannel, prescaler: u8) {
        // Disabling the timer resets the counter; the running match is lost.
        let clock_source = (bus.read(PSR) & PSR_PCS_MASK) as u8;
        let csr = bus.read(CSR) & !CSR_TCF;
        bus.write(CSR, csr & !CSR_TEN);
        bus.write(PSR, psr(clock_source, prescaler));
        bus.write(CSR, csr | CSR_TEN);
    }

    fn interrupt_pending(&self, bus: &B, _hw: HwChannel) -> bool {
        bus.is_set(CSR, CSR_TCF | CSR_TIE)
    }

    fn process_interrupt(&self, bus: &B, _hw: HwChannel, notify: &mut dyn FnMut()) {
        let fired = COUNTER.mask(bus.read(CMR));
        let next = self.next_target.swap(0, Ordering::Relaxed);
        if next != 0 {
            self.target.store(next, Ordering::Relaxed);
        }
        let target = self.target.load(Ordering::Relaxed);
        bus.write(CMR, COUNTER.add(fired, target));

        notify();

        critical_section::with(|_| bus.modify(CSR, |v| v | CSR_TCF));
        flag_barrier();
    }

    fn start_predef(&self, bus: &B, _hw: HwChannel, ip: &IpChannelConfig) {
        Self::run_counter(bus, ip);
    }

    fn stop_predef(&self, bus: &B, _hw: HwChannel) {
        bus.write(CSR, CSR_TCF);
    }

    fn predef_value(&self, bus: &B, _hw: HwChannel) -> u32 {
        Self::now(bus)
    }
}
