//! The high-level driver: logical channel state machine and public API.
//!
//! Every call is checked in the same order before it touches anything:
//! the driver is initialized, the channel exists (and has the capability the
//! call needs), the channel is in a state that allows the call, and finally
//! the tick value is in range. A failed check is reported to the DET and the
//! call returns the error without side effects.
//!
//! Hardware is always sampled before the logical status is inspected. The
//! sample and the status read happen inside the same exclusive area, so the
//! interrupt handler cannot slip an expiry in between.

use core::{cell::RefCell, convert::TryFrom};

use critical_section::Mutex;

use crate::{
    config::{
        ChannelConfig, ChannelId, ChannelMode, Config, Options, PredefTimer, HW_CHANNEL_COUNT,
    },
    det::{self, Det, LogDet, ServiceId},
    ecum::{EcuM, NoEcuM, WakeupSource},
    ip::Elapsed,
    ipw::{prescaler_for, Ipw},
    mmio::Mmio,
    Error,
};

/// Logical state of a channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChannelStatus {
    /// No configuration is bound.
    Uninitialized,
    /// Configured and never started since `init`.
    Initialized,
    /// Counting towards its target.
    Running,
    /// Stopped by the caller before reaching the target.
    Stopped,
    /// A oneshot channel reached its target.
    Expired,
}

/// Driver power mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Mode {
    /// Notifications are delivered and predefined timers run.
    Normal = 0,
    /// Only wakeup-enabled channels keep running; their expiry is a wakeup.
    Sleep = 1,
}

impl TryFrom<u8> for Mode {
    type Error = Error;

    fn try_from(raw: u8) -> Result<Self, Error> {
        match raw {
            0 => Ok(Mode::Normal),
            1 => Ok(Mode::Sleep),
            _ => Err(Error::ParamMode),
        }
    }
}

/// Prescaler selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ClockMode {
    /// Every channel runs with its `prescaler`.
    Normal = 0,
    /// Every channel runs with its `alternate_prescaler`.
    Alternate = 1,
}

impl TryFrom<u8> for ClockMode {
    type Error = Error;

    fn try_from(raw: u8) -> Result<Self, Error> {
        match raw {
            0 => Ok(ClockMode::Normal),
            1 => Ok(ClockMode::Alternate),
            _ => Err(Error::ParamClockMode),
        }
    }
}

/// Module identification returned by [`Gpt::get_version_info`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct VersionInfo {
    /// NXP's AUTOSAR vendor id.
    pub vendor_id: u16,
    /// The GPT module id.
    pub module_id: u16,
    /// Software version, major part.
    pub sw_major_version: u8,
    /// Software version, minor part.
    pub sw_minor_version: u8,
    /// Software version, patch part.
    pub sw_patch_version: u8,
}

const VERSION_INFO: VersionInfo = VersionInfo {
    vendor_id: det::VENDOR_ID,
    module_id: det::MODULE_ID,
    sw_major_version: 1,
    sw_minor_version: 0,
    sw_patch_version: 0,
};

#[derive(Clone, Copy, Debug)]
struct ChannelInfo {
    status: ChannelStatus,
    notification_enabled: bool,
    wakeup_enabled: bool,
    wakeup_generated: bool,
}

impl ChannelInfo {
    const RESET: ChannelInfo = ChannelInfo {
        status: ChannelStatus::Uninitialized,
        notification_enabled: false,
        wakeup_enabled: false,
        wakeup_generated: false,
    };
}

/// Everything the driver mutates, behind one exclusive area.
struct State {
    /// `None` until `init` binds a configuration; gates every other call.
    config: Option<&'static Config>,
    options: Options,
    mode: Mode,
    clock_mode: ClockMode,
    channels: [ChannelInfo; HW_CHANNEL_COUNT],
    /// Elapsed ticks captured when a channel stopped; only meaningful while
    /// the channel is `Stopped`.
    stop_time: [u32; HW_CHANNEL_COUNT],
    /// Hardware index to logical channel, built when the configuration is bound.
    hw_map: [Option<ChannelId>; HW_CHANNEL_COUNT],
}

impl State {
    const fn new(options: Options) -> Self {
        State {
            config: None,
            options,
            mode: Mode::Normal,
            clock_mode: ClockMode::Normal,
            channels: [ChannelInfo::RESET; HW_CHANNEL_COUNT],
            stop_time: [0; HW_CHANNEL_COUNT],
            hw_map: [None; HW_CHANNEL_COUNT],
        }
    }

    fn config(&self) -> Result<&'static Config, Error> {
        self.config.ok_or(Error::Uninit)
    }

    fn lookup(&self, channel: ChannelId) -> Result<(usize, &'static ChannelConfig), Error> {
        let config = self.config()?;
        let index = usize::from(channel);
        config
            .channels
            .get(index)
            .map(|channel| (index, channel))
            .ok_or(Error::ParamChannel)
    }
}

/// Elapsed ticks of a running channel as seen by the caller.
fn running_elapsed(channel: &ChannelConfig, hw: &Elapsed) -> u32 {
    match (hw.rollover, channel.mode) {
        (false, _) => hw.ticks.min(hw.target),
        // Already expired, the interrupt just has not run yet.
        (true, ChannelMode::OneShot) => hw.target,
        // Already into the next period.
        (true, ChannelMode::Continuous) => hw.ticks.saturating_sub(hw.target).min(hw.target),
    }
}

enum Deferred {
    Notify(fn()),
    Wakeup(WakeupSource),
}

/// The GPT driver.
///
/// All methods take `&self`; the driver is meant to live in a `static` shared
/// by task code and the timer interrupt handlers.
///
/// ```no_run
/// # #[cfg(feature = "lpit")]
/// # fn main() {
/// use s32k_gpt::{
///     config::{ChannelConfig, ChannelMode, Config, HwChannel},
///     det::LogDet,
///     ecum::NoEcuM,
///     mmio::Volatile,
///     Gpt,
/// };
///
/// static CHANNELS: [ChannelConfig; 1] = [ChannelConfig::new(
///     HwChannel::lpit(0),
///     ChannelMode::OneShot,
///     u32::MAX,
/// )];
/// static CONFIG: Config = Config::new(&CHANNELS);
/// static GPT: Gpt<Volatile> = Gpt::new(unsafe { Volatile::new() }, LogDet, NoEcuM);
///
/// GPT.init(Some(&CONFIG)).unwrap();
/// GPT.start_timer(0, 48_000).unwrap();
///
/// // LPIT0 channel 0 vector
/// fn lpit0_ch0() {
///     GPT.on_lpit_interrupt(0);
/// }
/// # }
/// # #[cfg(not(feature = "lpit"))]
/// # fn main() {}
/// ```
pub struct Gpt<B, D = LogDet, E = NoEcuM> {
    pub(crate) ipw: Ipw<B>,
    det: D,
    ecum: E,
    /// Configuration compiled into the driver; `init` must then get `None`.
    precompiled: Option<&'static Config>,
    state: Mutex<RefCell<State>>,
}

impl<B: Mmio, D: Det, E: EcuM> Gpt<B, D, E> {
    /// Driver configured at link time: `init` takes the configuration.
    pub const fn new(bus: B, det: D, ecum: E) -> Self {
        Gpt {
            ipw: Ipw::new(bus),
            det,
            ecum,
            precompiled: None,
            state: Mutex::new(RefCell::new(State::new(Options::DEFAULT))),
        }
    }

    /// Driver with a precompiled configuration: `init` must be called with `None`.
    pub const fn new_precompiled(config: &'static Config, bus: B, det: D, ecum: E) -> Self {
        Gpt {
            ipw: Ipw::new(bus),
            det,
            ecum,
            precompiled: Some(config),
            state: Mutex::new(RefCell::new(State::new(config.options))),
        }
    }

    #[inline]
    fn with_state<R>(&self, f: impl FnOnce(&mut State) -> R) -> R {
        critical_section::with(|cs| f(&mut self.state.borrow_ref_mut(cs)))
    }

    /// Reports `result`'s error, if any, on behalf of `service`.
    fn checked<T>(&self, service: ServiceId, result: Result<T, Error>) -> Result<T, Error> {
        if let Err(error) = &result {
            let report = self.with_state(|state| state.options.dev_error_detect);
            if report {
                self.det
                    .report_error(det::MODULE_ID, det::INSTANCE_ID, service, *error);
            }
        }
        result
    }

    fn check_config(&self, config: &Config) -> Result<(), Error> {
        if config.channels.len() > HW_CHANNEL_COUNT {
            return Err(Error::InitFailed);
        }

        let mut claimed = [false; HW_CHANNEL_COUNT];
        for channel in config.channels {
            if !channel.hw.is_valid()
                || channel.max_ticks == 0
                || channel.max_ticks > self.ipw.counter(channel.hw).max()
            {
                return Err(Error::InitFailed);
            }
            let slot = &mut claimed[channel.hw.index()];
            if *slot {
                return Err(Error::InitFailed);
            }
            *slot = true;
        }

        for (timer, predef) in PredefTimer::ALL.iter().zip(config.predef_timers.iter()) {
            let predef = match predef {
                Some(predef) => predef,
                None => continue,
            };
            if !predef.hw.is_valid()
                || !self.ipw.supports_predef(predef.hw)
                || self.ipw.counter(predef.hw).max() < timer.mask()
                || config
                    .channels
                    .iter()
                    .any(|channel| channel.hw.shares_counter(&predef.hw))
            {
                return Err(Error::InitFailed);
            }
        }

        Ok(())
    }

    fn start_predef_timers(&self, config: &Config) {
        for predef in config.predef_timers.iter().flatten() {
            self.ipw.start_predef(predef);
        }
    }

    fn stop_predef_timers(&self, config: &Config) {
        for predef in config.predef_timers.iter().flatten() {
            self.ipw.stop_predef(predef);
        }
    }

    /// Stops a running channel. A oneshot channel whose match already fired
    /// expires instead, and its stop snapshot is left alone.
    fn stop_channel(&self, state: &mut State, index: usize, channel: &ChannelConfig, hw: &Elapsed) {
        self.ipw.stop_timer(channel);
        if channel.is_oneshot() && hw.rollover {
            state.channels[index].status = ChannelStatus::Expired;
        } else {
            state.stop_time[index] = running_elapsed(channel, hw);
            state.channels[index].status = ChannelStatus::Stopped;
        }
    }

    /// Binds the configuration and initializes every configured channel.
    pub fn init(&self, config: Option<&'static Config>) -> Result<(), Error> {
        let result = self.with_state(|state| {
            if state.config.is_some() {
                return Err(Error::AlreadyInitialized);
            }
            let config = match (self.precompiled, config) {
                (Some(config), None) | (None, Some(config)) => config,
                _ => return Err(Error::InitFailed),
            };
            self.check_config(config)?;

            state.config = Some(config);
            state.options = config.options;
            state.mode = Mode::Normal;
            state.clock_mode = ClockMode::Normal;
            state.hw_map = [None; HW_CHANNEL_COUNT];

            for (index, channel) in config.channels.iter().enumerate() {
                state.hw_map[channel.hw.index()] = Some(index as ChannelId);
                state.channels[index] = ChannelInfo {
                    status: ChannelStatus::Initialized,
                    ..ChannelInfo::RESET
                };
                state.stop_time[index] = 0;
                self.ipw.init(channel);
            }

            self.start_predef_timers(config);
            Ok(config.channels.len())
        });

        if let Ok(channels) = result {
            log::debug!("gpt: initialized with {} channels", channels);
        }
        self.checked(ServiceId::Init, result.map(drop))
    }

    /// Returns every channel's hardware to reset state and unbinds the
    /// configuration. Refused while any channel runs.
    pub fn deinit(&self) -> Result<(), Error> {
        let result = self.with_state(|state| {
            let config = state.config()?;
            let configured = config.channels.len();

            if state.options.validate_state {
                if let Some(index) = state.channels[..configured]
                    .iter()
                    .position(|info| info.status == ChannelStatus::Running)
                {
                    log::debug!("gpt: deinit refused, channel {} running", index);
                    return Err(Error::Busy);
                }
            }

            for (index, channel) in config.channels.iter().enumerate() {
                self.ipw.deinit(channel);
                state.channels[index] = ChannelInfo::RESET;
                state.stop_time[index] = 0;
            }
            self.stop_predef_timers(config);

            state.hw_map = [None; HW_CHANNEL_COUNT];
            state.mode = Mode::Normal;
            state.clock_mode = ClockMode::Normal;
            state.config = None;
            Ok(())
        });

        if result.is_ok() {
            log::debug!("gpt: deinitialized");
        }
        self.checked(ServiceId::DeInit, result)
    }

    /// Ticks since the channel was started.
    ///
    /// `Initialized` channels report zero, `Stopped` ones the value captured
    /// at stop, and `Expired` ones their full target. AUTOSAR callers that
    /// expect a plain value should map `Err` to zero.
    pub fn get_time_elapsed(&self, channel: ChannelId) -> Result<u32, Error> {
        let result = self.with_state(|state| {
            let (index, config) = state.lookup(channel)?;
            let hw = self.ipw.time_elapsed(config);
            Ok(match state.channels[index].status {
                ChannelStatus::Running => running_elapsed(config, &hw),
                ChannelStatus::Stopped => state.stop_time[index],
                ChannelStatus::Expired => hw.target,
                ChannelStatus::Initialized | ChannelStatus::Uninitialized => 0,
            })
        });
        self.checked(ServiceId::GetTimeElapsed, result)
    }

    /// Ticks left until the channel's target.
    pub fn get_time_remaining(&self, channel: ChannelId) -> Result<u32, Error> {
        let result = self.with_state(|state| {
            let (index, config) = state.lookup(channel)?;
            let hw = self.ipw.time_elapsed(config);
            Ok(match state.channels[index].status {
                ChannelStatus::Running => hw.target - running_elapsed(config, &hw),
                ChannelStatus::Stopped => hw.target.saturating_sub(state.stop_time[index]),
                ChannelStatus::Expired
                | ChannelStatus::Initialized
                | ChannelStatus::Uninitialized => 0,
            })
        });
        self.checked(ServiceId::GetTimeRemaining, result)
    }

    /// Starts the channel with a timeout of `ticks`.
    pub fn start_timer(&self, channel: ChannelId, ticks: u32) -> Result<(), Error> {
        let result = self.with_state(|state| {
            let (index, config) = state.lookup(channel)?;
            let info = state.channels[index];

            if state.options.validate_state {
                if info.status == ChannelStatus::Running {
                    return Err(Error::Busy);
                }
                if state.mode == Mode::Sleep && !info.wakeup_enabled {
                    return Err(Error::InvalidCall);
                }
            }
            if ticks == 0 || ticks > config.max_ticks {
                return Err(Error::ParamValue);
            }

            // Expiry is only ever observed through the match interrupt.
            if config.is_oneshot() {
                self.ipw.enable_interrupt(config);
            }
            // Running before the hardware starts, so an immediate match is
            // not taken for a stray one.
            state.channels[index].status = ChannelStatus::Running;
            self.ipw.start_timer(config, ticks);
            Ok(())
        });

        if result.is_ok() {
            log::trace!("gpt: channel {} started, {} ticks", channel, ticks);
        }
        self.checked(ServiceId::StartTimer, result)
    }

    /// Stops a running channel. Stopping a channel that does not run is a no-op.
    pub fn stop_timer(&self, channel: ChannelId) -> Result<(), Error> {
        let result = self.with_state(|state| {
            let (index, config) = state.lookup(channel)?;
            let hw = self.ipw.time_elapsed(config);
            if state.channels[index].status == ChannelStatus::Running {
                self.stop_channel(state, index, config, &hw);
                log::trace!("gpt: channel {} now {:?}", channel, state.channels[index].status);
            }
            Ok(())
        });
        self.checked(ServiceId::StopTimer, result)
    }

    fn set_notification(
        &self,
        service: ServiceId,
        channel: ChannelId,
        enabled: bool,
    ) -> Result<(), Error> {
        let result = self.with_state(|state| {
            let (index, config) = state.lookup(channel)?;
            if config.notification.is_none() {
                return Err(Error::ParamChannel);
            }
            state.channels[index].notification_enabled = enabled;
            Ok(())
        });
        self.checked(service, result)
    }

    /// Delivers the channel's notification on every match in normal mode.
    pub fn enable_notification(&self, channel: ChannelId) -> Result<(), Error> {
        self.set_notification(ServiceId::EnableNotification, channel, true)
    }

    /// Stops delivering the channel's notification. Disabling twice is allowed.
    pub fn disable_notification(&self, channel: ChannelId) -> Result<(), Error> {
        self.set_notification(ServiceId::DisableNotification, channel, false)
    }

    fn set_wakeup(
        &self,
        service: ServiceId,
        channel: ChannelId,
        enabled: bool,
    ) -> Result<(), Error> {
        let result = self.with_state(|state| {
            let (index, config) = state.lookup(channel)?;
            if config.wakeup.is_none() {
                return Err(Error::ParamChannel);
            }
            state.channels[index].wakeup_enabled = enabled;

            if state.mode == Mode::Sleep && state.channels[index].status == ChannelStatus::Running {
                if enabled {
                    self.ipw.enable_interrupt(config);
                } else {
                    // Same treatment the channel would have had on entering sleep.
                    let hw = self.ipw.time_elapsed(config);
                    self.stop_channel(state, index, config, &hw);
                    self.ipw.disable_interrupt(config);
                }
            }
            Ok(())
        });
        self.checked(service, result)
    }

    /// Lets the channel wake the ECU while the driver sleeps.
    pub fn enable_wakeup(&self, channel: ChannelId) -> Result<(), Error> {
        self.set_wakeup(ServiceId::EnableWakeup, channel, true)
    }

    /// Stops the channel from waking the ECU. In sleep mode a running channel
    /// is stopped as it would have been on entering sleep.
    pub fn disable_wakeup(&self, channel: ChannelId) -> Result<(), Error> {
        self.set_wakeup(ServiceId::DisableWakeup, channel, false)
    }

    /// Switches between normal and sleep mode.
    ///
    /// Entering sleep stops every channel that is not wakeup-enabled, as
    /// `stop_timer` would, masks its interrupt and stops the predefined
    /// timers. Leaving sleep unmasks the interrupts of channels that are
    /// still running, masks the rest and restarts the predefined timers.
    pub fn set_mode(&self, mode: Mode) -> Result<(), Error> {
        let result = self.with_state(|state| {
            let config = state.config()?;
            if state.mode == mode {
                return Ok(false);
            }

            match mode {
                Mode::Sleep => {
                    for (index, channel) in config.channels.iter().enumerate() {
                        if state.channels[index].wakeup_enabled {
                            continue;
                        }
                        let hw = self.ipw.time_elapsed(channel);
                        if state.channels[index].status == ChannelStatus::Running {
                            self.stop_channel(state, index, channel, &hw);
                        }
                        self.ipw.disable_interrupt(channel);
                    }
                    self.stop_predef_timers(config);
                }
                Mode::Normal => {
                    for (index, channel) in config.channels.iter().enumerate() {
                        if state.channels[index].status == ChannelStatus::Running {
                            self.ipw.enable_interrupt(channel);
                        } else {
                            self.ipw.disable_interrupt(channel);
                        }
                    }
                    self.start_predef_timers(config);
                }
            }
            state.mode = mode;
            Ok(true)
        });

        if let Ok(true) = result {
            log::debug!("gpt: mode {:?}", mode);
        }
        self.checked(ServiceId::SetMode, result.map(drop))
    }

    /// Confirms a latched wakeup: every channel configured with `source` that
    /// fired in sleep mode is cleared, and the event is forwarded to EcuM.
    pub fn check_wakeup(&self, source: WakeupSource) -> Result<(), Error> {
        let result = self.with_state(|state| {
            let config = state.config()?;
            let mut found = false;
            for (index, channel) in config.channels.iter().enumerate() {
                let info = &mut state.channels[index];
                if channel.wakeup == Some(source) && info.wakeup_generated {
                    info.wakeup_generated = false;
                    found = true;
                }
            }
            Ok(found)
        });

        if let Ok(true) = result {
            self.ecum.set_wakeup_event(source);
        }
        self.checked(ServiceId::CheckWakeup, result.map(drop))
    }

    /// Replaces the period of a running continuous channel from its next
    /// match on, without stopping it.
    pub fn change_next_timeout_value(&self, channel: ChannelId, ticks: u32) -> Result<(), Error> {
        let result = self.with_state(|state| {
            let (index, config) = state.lookup(channel)?;
            if config.is_oneshot() {
                return Err(Error::ParamChannel);
            }
            if state.options.validate_state
                && state.channels[index].status != ChannelStatus::Running
            {
                return Err(Error::InvalidCall);
            }
            if ticks == 0 || ticks > config.max_ticks {
                return Err(Error::ParamValue);
            }
            self.ipw
                .change_next_timeout_value(config, ticks)
                .map_err(|_| Error::InvalidCall)
        });
        self.checked(ServiceId::ChangeNextTimeoutValue, result)
    }

    /// Reprograms every channel's prescaler for `mode`.
    pub fn set_clock_mode(&self, mode: ClockMode) -> Result<(), Error> {
        let result = self.with_state(|state| {
            let config = state.config()?;
            for channel in config.channels {
                self.ipw.set_prescaler(channel, prescaler_for(&channel.ip, mode));
            }
            state.clock_mode = mode;
            Ok(())
        });

        if result.is_ok() {
            log::debug!("gpt: clock mode {:?}", mode);
        }
        self.checked(ServiceId::SetClockMode, result)
    }

    /// Current value of a predefined timer, masked to its width.
    pub fn get_predef_timer_value(&self, timer: PredefTimer) -> Result<u32, Error> {
        let result = self.with_state(|state| {
            let config = state.config()?;
            let predef = config.predef_timers[timer as usize]
                .as_ref()
                .ok_or(Error::ParamPredefTimer)?;
            if state.mode == Mode::Sleep {
                return Err(Error::Mode);
            }
            Ok(self.ipw.predef_value(predef) & timer.mask())
        });
        self.checked(ServiceId::GetPredefTimerValue, result)
    }

    /// The predefined timer's value as an instant on a 1 MHz time base.
    ///
    /// Instants wrap with the timer, so only differences between instants
    /// less than one wrap apart are meaningful.
    pub fn predef_instant_us(
        &self,
        timer: PredefTimer,
    ) -> Result<fugit::TimerInstantU32<1_000_000>, Error> {
        let value = self.get_predef_timer_value(timer)?;
        Ok(fugit::TimerInstantU32::from_ticks(
            value.wrapping_mul(timer.tick_us()),
        ))
    }

    /// Time since `since`, an earlier value of the same predefined timer.
    ///
    /// Correct as long as less than one full wrap of the timer has passed.
    pub fn predef_elapsed(
        &self,
        timer: PredefTimer,
        since: u32,
    ) -> Result<fugit::MicrosDurationU32, Error> {
        let now = self.get_predef_timer_value(timer)?;
        let ticks = now.wrapping_sub(since) & timer.mask();
        Ok(fugit::MicrosDurationU32::from_ticks(
            ticks.saturating_mul(timer.tick_us()),
        ))
    }

    /// Vendor, module and software version of the driver.
    pub fn get_version_info(&self) -> VersionInfo {
        VERSION_INFO
    }

    /// Logical state of `channel`; `Uninitialized` for unknown channels.
    pub fn channel_status(&self, channel: ChannelId) -> ChannelStatus {
        self.with_state(|state| match state.lookup(channel) {
            Ok((index, _)) => state.channels[index].status,
            Err(_) => ChannelStatus::Uninitialized,
        })
    }

    /// Current power mode.
    pub fn mode(&self) -> Mode {
        self.with_state(|state| state.mode)
    }

    /// Prescaler selection last set by `set_clock_mode`.
    pub fn clock_mode(&self) -> ClockMode {
        self.with_state(|state| state.clock_mode)
    }

    /// Whether a configuration is bound.
    pub fn is_initialized(&self) -> bool {
        self.with_state(|state| state.config.is_some())
    }

    /// Whether hardware channel `hw_index` backs a configured logical channel.
    pub(crate) fn owns(&self, hw_index: usize) -> bool {
        self.with_state(|state| {
            state.config.is_some() && matches!(state.hw_map.get(hw_index), Some(Some(_)))
        })
    }

    /// Runs the logical side of a match on hardware channel `hw_index`.
    ///
    /// Called from interrupt context, after the IP has reloaded its match
    /// value and before it acknowledges the flag. The notification or wakeup
    /// check runs after the exclusive area is left.
    pub(crate) fn process_common_interrupt(&self, hw_index: usize) {
        let deferred = self.with_state(|state| {
            let config = state.config?;
            let index = usize::from((*state.hw_map.get(hw_index)?)?);
            let channel = &config.channels[index];
            let mode = state.mode;
            let info = &mut state.channels[index];

            if info.status != ChannelStatus::Running {
                return None;
            }
            log::trace!("gpt: channel {} matched", index);
            if channel.is_oneshot() {
                self.ipw.stop_timer(channel);
                info.status = ChannelStatus::Expired;
            }

            match mode {
                Mode::Normal if info.notification_enabled => {
                    channel.notification.map(Deferred::Notify)
                }
                Mode::Sleep if info.wakeup_enabled => {
                    info.wakeup_generated = true;
                    channel.wakeup.map(Deferred::Wakeup)
                }
                _ => None,
            }
        });

        match deferred {
            Some(Deferred::Notify(notify)) => notify(),
            Some(Deferred::Wakeup(source)) => self.ecum.check_wakeup(source),
            None => {}
        }
    }
}

#[cfg(test)]
impl<B: Mmio, D: Det, E: EcuM> Gpt<B, D, E> {
    pub(crate) fn bus(&self) -> &B {
        self.ipw.bus()
    }

    pub(crate) fn det(&self) -> &D {
        &self.det
    }

    pub(crate) fn ecum(&self) -> &E {
        &self.ecum
    }

    pub(crate) fn stop_time(&self, channel: ChannelId) -> u32 {
        self.with_state(|state| state.stop_time[usize::from(channel)])
    }
}
