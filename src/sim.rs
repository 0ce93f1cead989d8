//! Simulated register file for host tests.
//!
//! Plain registers just store what is written. The few registers whose writes
//! have side effects the drivers rely on are modelled explicitly.

use std::{cell::RefCell, collections::HashMap, vec::Vec};

use crate::{
    det::{Det, ServiceId},
    ecum::{EcuM, WakeupSource},
    mmio::Mmio,
    Error,
};

#[cfg(feature = "ftm")]
use crate::{config::HwChannel, ip::ftm};
#[cfg(feature = "lpit")]
use crate::ip::lpit;
#[cfg(feature = "lptmr")]
use crate::ip::lptmr;
#[cfg(feature = "srtc")]
use crate::ip::srtc;

#[derive(Debug, Default)]
pub(crate) struct SimBus {
    regs: RefCell<HashMap<usize, u32>>,
    writes: RefCell<HashMap<usize, usize>>,
}

impl SimBus {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Reads a register without side effects.
    pub(crate) fn peek(&self, addr: usize) -> u32 {
        self.regs.borrow().get(&addr).copied().unwrap_or(0)
    }

    /// Sets a register as the hardware would, bypassing write side effects.
    pub(crate) fn poke(&self, addr: usize, value: u32) {
        self.regs.borrow_mut().insert(addr, value);
    }

    /// Number of bus writes to `addr` so far.
    pub(crate) fn writes(&self, addr: usize) -> usize {
        self.writes.borrow().get(&addr).copied().unwrap_or(0)
    }

    fn poke_bits(&self, addr: usize, mask: u32) {
        let value = self.peek(addr);
        self.poke(addr, value | mask);
    }

    /// FTM counter reaches the channel's match value.
    #[cfg(feature = "ftm")]
    pub(crate) fn ftm_match(&self, hw: HwChannel) {
        self.poke(ftm::cnt(hw.instance), self.peek(ftm::cv(hw)));
        self.poke_bits(ftm::csc(hw), 1 << 7);
    }

    #[cfg(feature = "lpit")]
    pub(crate) fn lpit_match(&self, channel: u8) {
        self.poke(lpit::cval(channel), self.peek(lpit::tval(channel)));
        self.poke_bits(lpit::MSR, lpit::bit(channel));
    }

    #[cfg(feature = "lptmr")]
    pub(crate) fn lptmr_match(&self) {
        self.poke(lptmr::CNR, self.peek(lptmr::CMR));
        self.poke_bits(lptmr::CSR, lptmr::CSR_TCF);
    }

    #[cfg(feature = "srtc")]
    pub(crate) fn srtc_match(&self) {
        self.poke(srtc::TSR, self.peek(srtc::TAR));
        self.poke_bits(srtc::SR, srtc::SR_TAF);
    }
}

impl Mmio for SimBus {
    fn read(&self, addr: usize) -> u32 {
        self.peek(addr)
    }

    fn write(&self, addr: usize, value: u32) {
        *self.writes.borrow_mut().entry(addr).or_insert(0) += 1;
        #[cfg(feature = "lpit")]
        if addr == lpit::MSR {
            self.poke(addr, self.peek(addr) & !value);
            return;
        }
        #[cfg(feature = "lptmr")]
        {
            if addr == lptmr::CNR {
                // Writes only latch the counter.
                return;
            }
            if addr == lptmr::CSR {
                let old = self.peek(addr);
                let flag = old & lptmr::CSR_TCF & !value;
                self.poke(addr, (value & !lptmr::CSR_TCF) | flag);
                return;
            }
        }
        #[cfg(feature = "srtc")]
        if addr == srtc::TAR {
            self.poke(addr, value);
            self.poke(srtc::SR, self.peek(srtc::SR) & !srtc::SR_TAF);
            return;
        }
        self.poke(addr, value);
    }
}

/// Keeps every DET report.
#[derive(Debug, Default)]
pub(crate) struct RecordingDet {
    reports: RefCell<Vec<(ServiceId, Error)>>,
}

impl RecordingDet {
    pub(crate) fn take(&self) -> Vec<(ServiceId, Error)> {
        self.reports.borrow_mut().drain(..).collect()
    }
}

impl Det for RecordingDet {
    fn report_error(&self, module_id: u16, _instance_id: u8, service: ServiceId, error: Error) {
        assert_eq!(module_id, crate::det::MODULE_ID);
        self.reports.borrow_mut().push((service, error));
    }
}

/// Keeps every wakeup forwarded to the ECU manager.
#[derive(Debug, Default)]
pub(crate) struct RecordingEcuM {
    pub(crate) checked: RefCell<Vec<WakeupSource>>,
    pub(crate) events: RefCell<Vec<WakeupSource>>,
}

impl EcuM for RecordingEcuM {
    fn check_wakeup(&self, source: WakeupSource) {
        self.checked.borrow_mut().push(source);
    }

    fn set_wakeup_event(&self, source: WakeupSource) {
        self.events.borrow_mut().push(source);
    }
}
