//! Interrupt entry points.
//!
//! Each vector handler forwards to one of these. A handler checks the match
//! flag together with the interrupt enable, so a flag latched while the
//! channel's interrupt was masked (or a vector shared with another channel)
//! is ignored.

use crate::{
    config::HwChannel,
    det::Det,
    ecum::EcuM,
    gpt::Gpt,
    mmio::Mmio,
};

#[cfg(feature = "ftm")]
use crate::config::FTM_CHANNELS;

impl<B: Mmio, D: Det, E: EcuM> Gpt<B, D, E> {
    /// FTM instance `instance`. The FTM compare vectors are shared between
    /// channel pairs, so every channel of the instance is checked.
    #[cfg(feature = "ftm")]
    pub fn on_ftm_interrupt(&self, instance: u8) {
        for channel in 0..FTM_CHANNELS as u8 {
            self.dispatch(HwChannel::ftm(instance, channel));
        }
    }

    /// LPIT channel `channel`.
    #[cfg(feature = "lpit")]
    pub fn on_lpit_interrupt(&self, channel: u8) {
        self.dispatch(HwChannel::lpit(channel));
    }

    /// The LPTMR vector.
    #[cfg(feature = "lptmr")]
    pub fn on_lptmr_interrupt(&self) {
        self.dispatch(HwChannel::lptmr());
    }

    /// The SRTC alarm vector.
    #[cfg(feature = "srtc")]
    pub fn on_srtc_interrupt(&self) {
        self.dispatch(HwChannel::srtc());
    }

    #[allow(dead_code)]
    fn dispatch(&self, hw: HwChannel) {
        // Channels of a shared vector that the driver does not own are left alone.
        if !self.ipw.interrupt_pending(hw) || !self.owns(hw.index()) {
            return;
        }
        self.ipw
            .process_interrupt(hw, &mut || self.process_common_interrupt(hw.index()));
    }
}
