//! FlexTimer (FTM) output-compare channels.
//!
//! Each instance has one 16-bit counter running over `0..=MOD` with
//! `MOD = 0xffff`, shared by eight compare channels. The first channel (or
//! predefined timer) initialized on an instance configures its clock,
//! prescaler and debug behaviour; later ones join the running counter.

use core::sync::atomic::{AtomicU32, Ordering};

use super::{elapsed_since_start, Elapsed, TimerIp, Unsupported, ZERO};
use crate::{
    config::{HwChannel, IpChannelConfig, FTM_CHANNELS, FTM_INSTANCES},
    counter::WrappingCounter,
    mmio::{flag_barrier, Mmio},
};

const BASES: [usize; FTM_INSTANCES] = [0x4003_8000, 0x4003_9000, 0x4003_a000, 0x4002_6000];

const SC: usize = 0x00;
const CNT: usize = 0x04;
const MOD: usize = 0x08;
const CNTIN: usize = 0x4c;
const CONF: usize = 0x84;

pub(crate) const SC_PS_MASK: u32 = 0x7;
const SC_CLKS_SHIFT: u32 = 3;
const SC_CLKS_MASK: u32 = 0x3 << SC_CLKS_SHIFT;

pub(crate) const CSC_CHF: u32 = 1 << 7;
pub(crate) const CSC_CHIE: u32 = 1 << 6;
const CSC_MSA: u32 = 1 << 4;

const CONF_BDMMODE_SHIFT: u32 = 6;
/// Counter keeps running while the core is halted.
const BDMMODE_RUN: u32 = 0b11;

/// `in_use` bit claimed by a predefined timer.
const PREDEF: u32 = 1 << 31;

/// The counter passes through both `0xffff` and `0`, one tick more than the
/// shared wrap policy accounts for.
const COUNTER: WrappingCounter = WrappingCounter::U16.with_overflow_pad(1);

#[inline(always)]
pub(crate) const fn sc(instance: u8) -> usize {
    BASES[instance as usize] + SC
}

#[inline(always)]
pub(crate) const fn cnt(instance: u8) -> usize {
    BASES[instance as usize] + CNT
}

#[inline(always)]
pub(crate) const fn csc(hw: HwChannel) -> usize {
    BASES[hw.instance as usize] + 0x0c + 8 * hw.channel as usize
}

#[inline(always)]
pub(crate) const fn cv(hw: HwChannel) -> usize {
    BASES[hw.instance as usize] + 0x10 + 8 * hw.channel as usize
}

#[inline(always)]
fn slot(hw: HwChannel) -> usize {
    hw.instance as usize * FTM_CHANNELS + hw.channel as usize
}

pub(crate) struct Ftm {
    /// Ticks programmed at the last start or reload, per channel.
    target: [AtomicU32; FTM_INSTANCES * FTM_CHANNELS],
    /// Period queued by `change_next_timeout_value`, zero when none.
    next_target: [AtomicU32; FTM_INSTANCES * FTM_CHANNELS],
    /// Channels (and the predefined timer bit) using each instance's counter.
    in_use: [AtomicU32; FTM_INSTANCES],
}

impl Ftm {
    pub(crate) const fn new() -> Self {
        Ftm {
            target: [ZERO; FTM_INSTANCES * FTM_CHANNELS],
            next_target: [ZERO; FTM_INSTANCES * FTM_CHANNELS],
            in_use: [ZERO; FTM_INSTANCES],
        }
    }

    /// Adds `user` to the instance, bringing up the counter if it is the first.
    fn claim<B: Mmio>(&self, bus: &B, instance: u8, user: u32, ip: &IpChannelConfig) {
        let previous = self.in_use[instance as usize].fetch_or(user, Ordering::Relaxed);
        if previous != 0 {
            return;
        }

        let base = BASES[instance as usize];
        // Stop the counter before touching MOD and CNTIN.
        bus.write(base + SC, 0);
        bus.write(base + CNTIN, 0);
        bus.write(base + MOD, COUNTER.max());
        bus.write(base + CNT, 0);

        let bdm = if ip.freeze { 0 } else { BDMMODE_RUN };
        bus.write(base + CONF, bdm << CONF_BDMMODE_SHIFT);

        bus.write(
            base + SC,
            ((u32::from(ip.clock_source) << SC_CLKS_SHIFT) & SC_CLKS_MASK)
                | (u32::from(ip.prescaler) & SC_PS_MASK),
        );
    }

    /// Removes `user`; the last one out stops the counter.
    fn release<B: Mmio>(&self, bus: &B, instance: u8, user: u32) {
        let previous = self.in_use[instance as usize].fetch_and(!user, Ordering::Relaxed);
        if previous & !user != 0 {
            return;
        }

        let base = BASES[instance as usize];
        bus.write(base + SC, 0);
        bus.write(base + CNT, 0);
        bus.write(base + MOD, 0);
        bus.write(base + CONF, 0);
    }
}

impl<B: Mmio> TimerIp<B> for Ftm {
    fn counter(&self) -> WrappingCounter {
        COUNTER
    }

    fn init(&self, bus: &B, hw: HwChannel, ip: &IpChannelConfig) {
        // Output compare, software only, interrupt off, flag clear.
        bus.write(csc(hw), CSC_MSA);
        bus.write(cv(hw), 0);
        self.target[slot(hw)].store(0, Ordering::Relaxed);
        self.next_target[slot(hw)].store(0, Ordering::Relaxed);

        self.claim(bus, hw.instance, 1 << hw.channel, ip);
    }

    fn deinit(&self, bus: &B, hw: HwChannel) {
        bus.write(csc(hw), 0);
        bus.write(cv(hw), 0);
        self.target[slot(hw)].store(0, Ordering::Relaxed);
        self.next_target[slot(hw)].store(0, Ordering::Relaxed);

        self.release(bus, hw.instance, 1 << hw.channel);
    }

    fn start_timer(&self, bus: &B, hw: HwChannel, ticks: u32) {
        // Nothing may run between sampling the counter and writing the match
        // value, or the timeout is stretched by the interrupt latency.
        critical_section::with(|_| {
            let now = COUNTER.mask(bus.read(cnt(hw.instance)));
            bus.write(cv(hw), COUNTER.add(now, ticks));
            self.target[slot(hw)].store(ticks, Ordering::Relaxed);
            self.next_target[slot(hw)].store(0, Ordering::Relaxed);

            bus.clear_bits(csc(hw), CSC_CHF);
            bus.set_bits(csc(hw), CSC_CHIE);
        });
    }

    fn stop_timer(&self, bus: &B, hw: HwChannel) {
        bus.clear_bits(csc(hw), CSC_CHIE | CSC_CHF);
        flag_barrier();
    }

    fn time_elapsed(&self, bus: &B, hw: HwChannel) -> Elapsed {
        let now = COUNTER.mask(bus.read(cnt(hw.instance)));
        let compare = COUNTER.mask(bus.read(cv(hw)));
        // Flag last: a match between the reads shows up as a rollover.
        let rollover = bus.is_set(csc(hw), CSC_CHF);
        let target = self.target[slot(hw)].load(Ordering::Relaxed);

        Elapsed {
            ticks: elapsed_since_start(COUNTER, now, compare, target),
            rollover,
            target,
        }
    }

    fn enable_interrupt(&self, bus: &B, hw: HwChannel) {
        bus.set_bits(csc(hw), CSC_CHIE);
    }

    fn disable_interrupt(&self, bus: &B, hw: HwChannel) {
        bus.clear_bits(csc(hw), CSC_CHIE);
    }

    fn change_next_timeout_value(
        &self,
        _bus: &B,
        hw: HwChannel,
        ticks: u32,
    ) -> Result<(), Unsupported> {
        self.next_target[slot(hw)].store(ticks, Ordering::Relaxed);
        Ok(())
    }

    fn set_prescaler(&self, bus: &B, hw: HwChannel, prescaler: u8) {
        bus.modify(sc(hw.instance), |v| {
            (v & !SC_PS_MASK) | (u32::from(prescaler) & SC_PS_MASK)
        });
    }

    fn interrupt_pending(&self, bus: &B, hw: HwChannel) -> bool {
        bus.is_set(csc(hw), CSC_CHF | CSC_CHIE)
    }

    fn process_interrupt(&self, bus: &B, hw: HwChannel, notify: &mut dyn FnMut()) {
        let fired = COUNTER.mask(bus.read(cv(hw)));
        let next = self.next_target[slot(hw)].swap(0, Ordering::Relaxed);
        if next != 0 {
            self.target[slot(hw)].store(next, Ordering::Relaxed);
        }
        let target = self.target[slot(hw)].load(Ordering::Relaxed);
        bus.write(cv(hw), COUNTER.add(fired, target));

        notify();

        critical_section::with(|_| bus.clear_bits(csc(hw), CSC_CHF));
        flag_barrier();
    }

    fn start_predef(&self, bus: &B, hw: HwChannel, ip: &IpChannelConfig) {
        self.claim(bus, hw.instance, PREDEF, ip);
    }

    fn stop_predef(&self, bus: &B, hw: HwChannel) {
        self.release(bus, hw.instance, PREDEF);
    }

    fn predef_value(&self, bus: &B, hw: HwChannel) -> u32 {
        COUNTER.mask(bus.read(cnt(hw.instance)))
    }
}
