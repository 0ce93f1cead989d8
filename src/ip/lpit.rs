//! Low-power periodic interrupt timer (LPIT) channels.
//!
//! Channels are run as free-running 32-bit counters sampled through `CVALn`;
//! `TVALn` holds the match value and `MSR[TIFn]` (write 1 to clear) is the
//! match flag.

use core::sync::atomic::{AtomicU32, Ordering};

use super::{elapsed_since_start, Elapsed, TimerIp, Unsupported, ZERO};
use crate::{
    config::{HwChannel, IpChannelConfig, LPIT_CHANNELS},
    counter::WrappingCounter,
    mmio::{flag_barrier, Mmio},
};

const BASE: usize = 0x4003_7000;

pub(crate) const MCR: usize = BASE + 0x08;
pub(crate) const MSR: usize = BASE + 0x0c;
pub(crate) const MIER: usize = BASE + 0x10;

const MCR_M_CEN: u32 = 1 << 0;
const MCR_DBG_EN: u32 = 1 << 3;

pub(crate) const TCTRL_T_EN: u32 = 1 << 0;

const COUNTER: WrappingCounter = WrappingCounter::U32;

#[inline(always)]
pub(crate) const fn tval(channel: u8) -> usize {
    BASE + 0x20 + 0x10 * channel as usize
}

#[inline(always)]
pub(crate) const fn cval(channel: u8) -> usize {
    BASE + 0x24 + 0x10 * channel as usize
}

#[inline(always)]
pub(crate) const fn tctrl(channel: u8) -> usize {
    BASE + 0x28 + 0x10 * channel as usize
}

#[inline(always)]
pub(crate) const fn bit(channel: u8) -> u32 {
    1 << channel
}

pub(crate) struct Lpit {
    target: [AtomicU32; LPIT_CHANNELS],
    next_target: [AtomicU32; LPIT_CHANNELS],
}

impl Lpit {
    pub(crate) const fn new() -> Self {
        Lpit {
            target: [ZERO; LPIT_CHANNELS],
            next_target: [ZERO; LPIT_CHANNELS],
        }
    }

    fn run_counter<B: Mmio>(&self, bus: &B, channel: u8, ip: &IpChannelConfig) {
        if ip.freeze {
            bus.clear_bits(MCR, MCR_DBG_EN);
        } else {
            bus.set_bits(MCR, MCR_DBG_EN);
        }
        bus.set_bits(MCR, MCR_M_CEN);
        bus.write(tctrl(channel), TCTRL_T_EN);
    }
}

impl<B: Mmio> TimerIp<B> for Lpit {
    fn counter(&self) -> WrappingCounter {
        COUNTER
    }

    fn init(&self, bus: &B, hw: HwChannel, ip: &IpChannelConfig) {
        let ch = hw.channel;
        bus.clear_bits(MIER, bit(ch));
        bus.write(MSR, bit(ch));
        bus.write(tctrl(ch), 0);
        bus.write(tval(ch), 0);
        self.target[ch as usize].store(0, Ordering::Relaxed);
        self.next_target[ch as usize].store(0, Ordering::Relaxed);

        self.run_counter(bus, ch, ip);
    }

    fn deinit(&self, bus: &B, hw: HwChannel) {
        let ch = hw.channel;
        bus.clear_bits(MIER, bit(ch));
        bus.write(MSR, bit(ch));
        bus.write(tctrl(ch), 0);
        bus.write(tval(ch), 0);
        self.target[ch as usize].store(0, Ordering::Relaxed);
        self.next_target[ch as usize].store(0, Ordering::Relaxed);
    }

    fn start_timer(&self, bus: &B, hw: HwChannel, ticks: u32) {
        let ch = hw.channel;
        critical_section::with(|_| {
            let now = bus.read(cval(ch));
            bus.write(tval(ch), COUNTER.add(now, ticks));
            self.target[ch as usize].store(ticks, Ordering::Relaxed);
            self.next_target[ch as usize].store(0, Ordering::Relaxed);

            bus.write(MSR, bit(ch));
            bus.set_bits(MIER, bit(ch));
        });
    }

    fn stop_timer(&self, bus: &B, hw: HwChannel) {
        bus.clear_bits(MIER, bit(hw.channel));
        bus.write(MSR, bit(hw.channel));
        flag_barrier();
    }

    fn time_elapsed(&self, bus: &B, hw: HwChannel) -> Elapsed {
        let ch = hw.channel;
        let now = bus.read(cval(ch));
        let compare = bus.read(tval(ch));
        let rollover = bus.is_set(MSR, bit(ch));
        let target = self.target[ch as usize].load(Ordering::Relaxed);

        Elapsed {
            ticks: elapsed_since_start(COUNTER, now, compare, target),
            rollover,
            target,
        }
    }

    fn enable_interrupt(&self, bus: &B, hw: HwChannel) {
        let ch = hw.channel;
        if bus.is_set(MIER, bit(ch)) {
            return;
        }
        // A flag latched while the interrupt was off is stale. Rewriting the
        // match value restarts the compare before the flag is dropped.
        critical_section::with(|_| {
            bus.modify(tval(ch), |v| v);
            bus.write(MSR, bit(ch));
            bus.set_bits(MIER, bit(ch));
        });
    }

    fn disable_interrupt(&self, bus: &B, hw: HwChannel) {
        bus.clear_bits(MIER, bit(hw.channel));
    }

    fn change_next_timeout_value(
        &self,
        _bus: &B,
        hw: HwChannel,
        ticks: u32,
    ) -> Result<(), Unsupported> {
        self.next_target[hw.channel as usize].store(ticks, Ordering::Relaxed);
        Ok(())
    }

    fn set_prescaler(&self, _bus: &B, _hw: HwChannel, _prescaler: u8) {
        // Divided at the PCC, not in the timer.
    }

    fn interrupt_pending(&self, bus: &B, hw: HwChannel) -> bool {
        let mask = bit(hw.channel);
        bus.is_set(MSR, mask) && bus.is_set(MIER, mask)
    }

    fn process_interrupt(&self, bus: &B, hw: HwChannel, notify: &mut dyn FnMut()) {
        let ch = hw.channel;
        let fired = bus.read(tval(ch));
        let next = self.next_target[ch as usize].swap(0, Ordering::Relaxed);
        if next != 0 {
            self.target[ch as usize].store(next, Ordering::Relaxed);
        }
        let target = self.target[ch as usize].load(Ordering::Relaxed);
        bus.write(tval(ch), COUNTER.add(fired, target));

        notify();

        critical_section::with(|_| bus.write(MSR, bit(ch)));
        flag_barrier();
    }

    fn start_predef(&self, bus: &B, hw: HwChannel, ip: &IpChannelConfig) {
        self.run_counter(bus, hw.channel, ip);
    }

    fn stop_predef(&self, bus: &B, hw: HwChannel) {
        bus.write(tctrl(hw.channel), 0);
    }

    fn predef_value(&self, bus: &B, hw: HwChannel) -> u32 {
        bus.read(cval(hw.channel))
    }
}
