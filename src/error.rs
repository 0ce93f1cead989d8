use core::fmt;

/// Development errors detected by the driver.
///
/// The discriminants are the numeric codes handed to the DET.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Error {
    /// The driver has not been initialized.
    Uninit = 0x0a,
    /// The channel is already running.
    Busy = 0x0b,
    /// The operation is not available in the current driver mode.
    Mode = 0x0c,
    /// `init` was called on an initialized driver.
    AlreadyInitialized = 0x0d,
    /// The configuration was missing, unexpected or inconsistent.
    InitFailed = 0x0e,
    /// Channel index out of range, or the channel lacks the requested capability.
    ParamChannel = 0x14,
    /// Tick value zero or beyond the channel's maximum.
    ParamValue = 0x15,
    /// Predefined timer type not configured.
    ParamPredefTimer = 0x17,
    /// Raw value does not name a driver mode.
    ParamMode = 0x1f,
    /// The channel is in the wrong state for this call.
    InvalidCall = 0x20,
    /// Raw value does not name a clock mode.
    ParamClockMode = 0x21,
}

impl Error {
    /// The DET error code.
    #[inline]
    pub const fn code(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Error::Uninit => "driver not initialized",
            Error::Busy => "channel already running",
            Error::Mode => "not allowed in current mode",
            Error::AlreadyInitialized => "driver already initialized",
            Error::InitFailed => "invalid configuration",
            Error::ParamChannel => "invalid channel",
            Error::ParamValue => "invalid tick value",
            Error::ParamPredefTimer => "predefined timer not configured",
            Error::ParamMode => "invalid mode",
            Error::InvalidCall => "invalid call for channel state",
            Error::ParamClockMode => "invalid clock mode",
        };
        write!(f, "{} (0x{:02x})", msg, self.code())
    }
}
