//! IP wrapper: routes a channel to the driver of the IP that backs it.
//!
//! Holds the per-IP drivers (and through them the per-IP shadow state) but no
//! logical state. Nothing is validated here.

use crate::{
    config::{ChannelConfig, HwChannel, HwModule, IpChannelConfig, PredefTimerConfig},
    counter::WrappingCounter,
    ip::{Elapsed, TimerIp, Unsupported},
    mmio::Mmio,
    ClockMode,
};

#[cfg(feature = "ftm")]
use crate::ip::ftm::Ftm;
#[cfg(feature = "lpit")]
use crate::ip::lpit::Lpit;
#[cfg(feature = "lptmr")]
use crate::ip::lptmr::Lptmr;
#[cfg(feature = "srtc")]
use crate::ip::srtc::Srtc;

pub(crate) struct Ipw<B> {
    bus: B,
    #[cfg(feature = "ftm")]
    ftm: Ftm,
    #[cfg(feature = "lpit")]
    lpit: Lpit,
    #[cfg(feature = "lptmr")]
    lptmr: Lptmr,
    #[cfg(feature = "srtc")]
    srtc: Srtc,
}

impl<B: Mmio> Ipw<B> {
    pub(crate) const fn new(bus: B) -> Self {
        Ipw {
            bus,
            #[cfg(feature = "ftm")]
            ftm: Ftm::new(),
            #[cfg(feature = "lpit")]
            lpit: Lpit::new(),
            #[cfg(feature = "lptmr")]
            lptmr: Lptmr::new(),
            #[cfg(feature = "srtc")]
            srtc: Srtc::new(),
        }
    }

    #[cfg(test)]
    pub(crate) fn bus(&self) -> &B {
        &self.bus
    }

    #[inline]
    fn ip(&self, module: HwModule) -> &dyn TimerIp<B> {
        match module {
            #[cfg(feature = "ftm")]
            HwModule::Ftm => &self.ftm,
            #[cfg(feature = "lpit")]
            HwModule::Lpit => &self.lpit,
            #[cfg(feature = "lptmr")]
            HwModule::Lptmr => &self.lptmr,
            #[cfg(feature = "srtc")]
            HwModule::Srtc => &self.srtc,
        }
    }

    pub(crate) fn counter(&self, hw: HwChannel) -> WrappingCounter {
        self.ip(hw.module).counter()
    }

    pub(crate) fn init(&self, channel: &ChannelConfig) {
        self.ip(channel.hw.module).init(&self.bus, channel.hw, &channel.ip);
    }

    pub(crate) fn deinit(&self, channel: &ChannelConfig) {
        self.ip(channel.hw.module).deinit(&self.bus, channel.hw);
    }

    pub(crate) fn start_timer(&self, channel: &ChannelConfig, ticks: u32) {
        self.ip(channel.hw.module).start_timer(&self.bus, channel.hw, ticks);
    }

    pub(crate) fn stop_timer(&self, channel: &ChannelConfig) {
        self.ip(channel.hw.module).stop_timer(&self.bus, channel.hw);
    }

    pub(crate) fn time_elapsed(&self, channel: &ChannelConfig) -> Elapsed {
        self.ip(channel.hw.module).time_elapsed(&self.bus, channel.hw)
    }

    pub(crate) fn enable_interrupt(&self, channel: &ChannelConfig) {
        self.ip(channel.hw.module).enable_interrupt(&self.bus, channel.hw);
    }

    pub(crate) fn disable_interrupt(&self, channel: &ChannelConfig) {
        self.ip(channel.hw.module).disable_interrupt(&self.bus, channel.hw);
    }

    pub(crate) fn change_next_timeout_value(
        &self,
        channel: &ChannelConfig,
        ticks: u32,
    ) -> Result<(), Unsupported> {
        self.ip(channel.hw.module)
            .change_next_timeout_value(&self.bus, channel.hw, ticks)
    }

    pub(crate) fn set_prescaler(&self, channel: &ChannelConfig, prescaler: u8) {
        self.ip(channel.hw.module)
            .set_prescaler(&self.bus, channel.hw, prescaler);
    }

    pub(crate) fn interrupt_pending(&self, hw: HwChannel) -> bool {
        self.ip(hw.module).interrupt_pending(&self.bus, hw)
    }

    pub(crate) fn process_interrupt(&self, hw: HwChannel, notify: &mut dyn FnMut()) {
        self.ip(hw.module).process_interrupt(&self.bus, hw, notify);
    }

    pub(crate) fn supports_predef(&self, hw: HwChannel) -> bool {
        self.ip(hw.module).supports_predef()
    }

    pub(crate) fn start_predef(&self, predef: &PredefTimerConfig) {
        self.ip(predef.hw.module)
            .start_predef(&self.bus, predef.hw, &predef.ip);
    }

    pub(crate) fn stop_predef(&self, predef: &PredefTimerConfig) {
        self.ip(predef.hw.module).stop_predef(&self.bus, predef.hw);
    }

    pub(crate) fn predef_value(&self, predef: &PredefTimerConfig) -> u32 {
        self.ip(predef.hw.module).predef_value(&self.bus, predef.hw)
    }
}

/// Prescaler a channel runs with in `mode`.
#[inline]
pub(crate) fn prescaler_for(ip: &IpChannelConfig, mode: ClockMode) -> u8 {
    match mode {
        ClockMode::Normal => ip.prescaler,
        ClockMode::Alternate => ip.alternate_prescaler,
    }
}
