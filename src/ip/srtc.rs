//! Secure real-time clock (SRTC) alarm.
//!
//! The SRTC counts whole seconds in `TSR` and raises `SR[TAF]` when `TSR`
//! reaches `TAR`. The flag is cleared by writing `TAR`; it is not write-1-to-
//! clear like the other IPs.

use core::sync::atomic::{AtomicU32, Ordering};

use super::{elapsed_since_start, Elapsed, TimerIp, Unsupported};
use crate::{
    config::{HwChannel, IpChannelConfig},
    counter::WrappingCounter,
    mmio::{flag_barrier, Mmio},
};

const BASE: usize = 0x4003_d000;

pub(crate) const TSR: usize = BASE;
pub(crate) const TAR: usize = BASE + 0x08;
pub(crate) const CR: usize = BASE + 0x10;
pub(crate) const SR: usize = BASE + 0x14;
pub(crate) const IER: usize = BASE + 0x1c;

const CR_LPOS: u32 = 1 << 7;

pub(crate) const SR_TAF: u32 = 1 << 2;
const SR_TCE: u32 = 1 << 4;

pub(crate) const IER_TAIE: u32 = 1 << 2;

const COUNTER: WrappingCounter = WrappingCounter::U32;

pub(crate) struct Srtc {
    target: AtomicU32,
}

impl Srtc {
    pub(crate) const fn new() -> Self {
        Srtc {
            target: AtomicU32::new(0),
        }
    }

    /// ERR_IPV_RTC_0001: a single `TAR` write can leave `TAF` set.
    fn clear_alarm_flag<B: Mmio>(bus: &B) {
        let alarm = bus.read(TAR);
        bus.write(TAR, alarm);
        bus.write(TAR, alarm);
    }
}

impl<B: Mmio> TimerIp<B> for Srtc {
    fn counter(&self) -> WrappingCounter {
        COUNTER
    }

    fn init(&self, bus: &B, _hw: HwChannel, ip: &IpChannelConfig) {
        bus.clear_bits(IER, IER_TAIE);
        // TSR is only writable with the counter stopped.
        bus.clear_bits(SR, SR_TCE);
        bus.write(TSR, 0);
        bus.write(TAR, 0);
        if ip.clock_source != 0 {
            bus.set_bits(CR, CR_LPOS);
        } else {
            bus.clear_bits(CR, CR_LPOS);
        }
        self.target.store(0, Ordering::Relaxed);
        bus.set_bits(SR, SR_TCE);
    }

    fn deinit(&self, bus: &B, _hw: HwChannel) {
        bus.clear_bits(IER, IER_TAIE);
        bus.clear_bits(SR, SR_TCE);
        bus.write(TSR, 0);
        bus.write(TAR, 0);
        bus.clear_bits(CR, CR_LPOS);
        self.target.store(0, Ordering::Relaxed);
    }

    fn start_timer(&self, bus: &B, _hw: HwChannel, ticks: u32) {
        critical_section::with(|_| {
            let now = bus.read(TSR);
            bus.write(TAR, COUNTER.add(now, ticks));
            Self::clear_alarm_flag(bus);
            self.target.store(ticks, Ordering::Relaxed);
            bus.set_bits(IER, IER_TAIE);
        });
    }

    fn stop_timer(&self, bus: &B, _hw: HwChannel) {
        bus.clear_bits(IER, IER_TAIE);
        Self::clear_alarm_flag(bus);
        flag_barrier();
    }

    fn time_elapsed(&self, bus: &B, _hw: HwChannel) -> Elapsed {
        let now = bus.read(TSR);
        let alarm = bus.read(TAR);
        let rollover = bus.is_set(SR, SR_TAF);
        let target = self.target.load(Ordering::Relaxed);

        let ticks = if rollover {
            elapsed_since_start(COUNTER, now, alarm, target)
        } else {
            // Once past the alarm the distance wraps to nearly the full range.
            let remaining = COUNTER.distance(now, alarm);
            target.saturating_sub(remaining)
        };

        Elapsed {
            ticks,
            rollover,
            target,
        }
    }

    fn enable_interrupt(&self, bus: &B, _hw: HwChannel) {
        if bus.is_set(IER, IER_TAIE) {
            return;
        }
        critical_section::with(|_| {
            Self::clear_alarm_flag(bus);
            bus.set_bits(IER, IER_TAIE);
        });
    }

    fn disable_interrupt(&self, bus: &B, _hw: HwChannel) {
        bus.clear_bits(IER, IER_TAIE);
    }

    fn change_next_timeout_value(
        &self,
        _bus: &B,
        _hw: HwChannel,
        _ticks: u32,
    ) -> Result<(), Unsupported> {
        // The alarm is a single absolute register; there is no reload slot.
        Err(Unsupported)
    }

    fn set_prescaler(&self, _bus: &B, _hw: HwChannel, _prescaler: u8) {}

    fn interrupt_pending(&self, bus: &B, _hw: HwChannel) -> bool {
        bus.is_set(SR, SR_TAF) && bus.is_set(IER, IER_TAIE)
    }

    fn process_interrupt(&self, bus: &B, _hw: HwChannel, notify: &mut dyn FnMut()) {
        let fired = bus.read(TAR);
        let target = self.target.load(Ordering::Relaxed);
        bus.write(TAR, COUNTER.add(fired, target));

        notify();

        critical_section::with(|_| Self::clear_alarm_flag(bus));
        flag_barrier();
    }

    fn supports_predef(&self) -> bool {
        false
    }

    fn start_predef(&self, _bus: &B, _hw: HwChannel, _ip: &IpChannelConfig) {}

    fn stop_predef(&self, _bus: &B, _hw: HwChannel) {}

    fn predef_value(&self, bus: &B, _hw: HwChannel) -> u32 {
        bus.read(TSR)
    }
}
