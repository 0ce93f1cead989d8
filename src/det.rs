//! Development error reporting.

use crate::Error;

/// AUTOSAR module id of the GPT driver.
pub const MODULE_ID: u16 = 100;
/// NXP vendor id.
pub const VENDOR_ID: u16 = 43;
/// The driver has a single instance.
pub const INSTANCE_ID: u8 = 0;

/// The API that detected an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ServiceId {
    Init = 0x01,
    DeInit = 0x02,
    GetTimeElapsed = 0x03,
    GetTimeRemaining = 0x04,
    StartTimer = 0x05,
    StopTimer = 0x06,
    EnableNotification = 0x07,
    DisableNotification = 0x08,
    SetMode = 0x09,
    DisableWakeup = 0x0a,
    EnableWakeup = 0x0b,
    CheckWakeup = 0x0c,
    GetPredefTimerValue = 0x0d,
    ChangeNextTimeoutValue = 0x0e,
    SetClockMode = 0x0f,
}

/// Sink for development errors.
///
/// Reports are fire-and-forget: whatever the sink does, the failed call has
/// already been turned into a no-op.
pub trait Det {
    fn report_error(&self, module_id: u16, instance_id: u8, service: ServiceId, error: Error);
}

impl<T: Det> Det for &T {
    #[inline]
    fn report_error(&self, module_id: u16, instance_id: u8, service: ServiceId, error: Error) {
        T::report_error(self, module_id, instance_id, service, error)
    }
}

/// Forwards development errors to the `log` facade.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogDet;

impl Det for LogDet {
    fn report_error(&self, module_id: u16, instance_id: u8, service: ServiceId, error: Error) {
        log::warn!(
            "det: module {} instance {} service {:?}: {}",
            module_id,
            instance_id,
            service,
            error
        );
    }
}
