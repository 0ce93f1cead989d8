//! Per-IP timer drivers.
//!
//! Every IP keeps its counter free-running and realises a timeout by
//! programming a match value `counter + ticks`. None of these functions
//! validate their inputs: the high-level driver has already checked the
//! channel, the state and the tick value, and an out-of-range hardware index
//! here is a configuration bug.

use crate::{
    config::{HwChannel, IpChannelConfig},
    counter::WrappingCounter,
    mmio::Mmio,
};

#[cfg(feature = "ftm")]
pub(crate) mod ftm;
#[cfg(feature = "lpit")]
pub(crate) mod lpit;
#[cfg(feature = "lptmr")]
pub(crate) mod lptmr;
#[cfg(feature = "srtc")]
pub(crate) mod srtc;

/// Hardware view of a running channel, sampled in one pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Elapsed {
    /// Ticks since the last (re)start or reload.
    pub ticks: u32,
    /// The match flag was set when sampled.
    pub rollover: bool,
    /// Ticks programmed for the current period.
    pub target: u32,
}

/// The IP rejected a request it has no hardware support for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Unsupported;

/// Operations every timer IP provides for one of its channels.
pub(crate) trait TimerIp<B: Mmio> {
    /// Range and wrap policy of the IP's counter.
    fn counter(&self) -> WrappingCounter;

    /// Quiesces the channel, resets its registers and starts the counter.
    fn init(&self, bus: &B, hw: HwChannel, ip: &IpChannelConfig);

    fn deinit(&self, bus: &B, hw: HwChannel);

    /// Arms a match `ticks` from now and enables its interrupt.
    fn start_timer(&self, bus: &B, hw: HwChannel, ticks: u32);

    /// Disables and clears the match interrupt.
    fn stop_timer(&self, bus: &B, hw: HwChannel);

    /// Samples counter, match value and flag, in that order.
    fn time_elapsed(&self, bus: &B, hw: HwChannel) -> Elapsed;

    fn enable_interrupt(&self, bus: &B, hw: HwChannel);

    fn disable_interrupt(&self, bus: &B, hw: HwChannel);

    /// Queues `ticks` as the period applied at the next match.
    fn change_next_timeout_value(
        &self,
        bus: &B,
        hw: HwChannel,
        ticks: u32,
    ) -> Result<(), Unsupported>;

    fn set_prescaler(&self, bus: &B, hw: HwChannel, prescaler: u8);

    /// Match flag and match interrupt are both set.
    fn interrupt_pending(&self, bus: &B, hw: HwChannel) -> bool;

    /// Reloads the next match from the one that just fired, runs `notify` and
    /// then acknowledges the flag.
    fn process_interrupt(&self, bus: &B, hw: HwChannel, notify: &mut dyn FnMut());

    /// Whether the counter ticks fast enough to back a predefined timer.
    fn supports_predef(&self) -> bool {
        true
    }

    fn start_predef(&self, bus: &B, hw: HwChannel, ip: &IpChannelConfig);

    fn stop_predef(&self, bus: &B, hw: HwChannel);

    fn predef_value(&self, bus: &B, hw: HwChannel) -> u32;
}

/// Elapsed ticks for a channel armed with `target` whose match value is
/// `compare` and whose counter now reads `now`.
#[inline]
pub(crate) fn elapsed_since_start(
    counter: WrappingCounter,
    now: u32,
    compare: u32,
    target: u32,
) -> u32 {
    let start = counter.sub(compare, target);
    counter.distance(start, now)
}

#[allow(clippy::declare_interior_mutable_const)]
pub(crate) const ZERO: core::sync::atomic::AtomicU32 = core::sync::atomic::AtomicU32::new(0);
