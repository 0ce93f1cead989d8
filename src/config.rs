//! Immutable driver configuration.
//!
//! A [`Config`] is normally generated offline and lives in flash; every type
//! here can be built in `const` context so a configuration can be a `static`.
//!
//! ```
//! # #[cfg(feature = "ftm")]
//! # mod config {
//! use s32k_gpt::config::{ChannelConfig, ChannelMode, Config, HwChannel};
//!
//! fn on_tick() {}
//!
//! static CHANNELS: [ChannelConfig; 1] = [
//!     ChannelConfig::new(HwChannel::ftm(0, 2), ChannelMode::Continuous, 0xffff)
//!         .with_notification(on_tick),
//! ];
//! static CONFIG: Config = Config::new(&CHANNELS);
//! # }
//! ```

use core::convert::TryFrom;

use crate::{ecum::WakeupSource, Error};

/// Number of FTM instances.
pub const FTM_INSTANCES: usize = 4;
/// Compare channels per FTM instance.
pub const FTM_CHANNELS: usize = 8;
/// LPIT timer channels.
pub const LPIT_CHANNELS: usize = 4;

const FTM_FIRST: usize = 0;
const LPIT_FIRST: usize = FTM_FIRST + FTM_INSTANCES * FTM_CHANNELS;
const LPTMR_FIRST: usize = LPIT_FIRST + LPIT_CHANNELS;
const SRTC_FIRST: usize = LPTMR_FIRST + 1;

/// Total hardware channels across all timer IPs; also the upper bound on
/// configured logical channels.
pub const HW_CHANNEL_COUNT: usize = SRTC_FIRST + 1;

/// Logical channel identifier: an index into [`Config::channels`].
pub type ChannelId = u8;

/// Hardware timer IP family.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HwModule {
    /// FlexTimer, 16-bit counter, eight compare channels per instance.
    #[cfg(feature = "ftm")]
    Ftm,
    /// Low-power periodic interrupt timer, 32-bit.
    #[cfg(feature = "lpit")]
    Lpit,
    /// Low-power timer, 16-bit, one channel.
    #[cfg(feature = "lptmr")]
    Lptmr,
    /// Secure real-time clock, 32-bit seconds counter with one alarm.
    #[cfg(feature = "srtc")]
    Srtc,
}

/// One physical compare channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HwChannel {
    pub module: HwModule,
    /// Peripheral instance; always `0` except for FTM.
    pub instance: u8,
    /// Channel within the instance.
    pub channel: u8,
}

impl HwChannel {
    /// Compare channel `channel` of FTM `instance`.
    #[cfg(feature = "ftm")]
    pub const fn ftm(instance: u8, channel: u8) -> Self {
        HwChannel {
            module: HwModule::Ftm,
            instance,
            channel,
        }
    }

    /// LPIT timer channel `channel`.
    #[cfg(feature = "lpit")]
    pub const fn lpit(channel: u8) -> Self {
        HwChannel {
            module: HwModule::Lpit,
            instance: 0,
            channel,
        }
    }

    /// The LPTMR compare.
    #[cfg(feature = "lptmr")]
    pub const fn lptmr() -> Self {
        HwChannel {
            module: HwModule::Lptmr,
            instance: 0,
            channel: 0,
        }
    }

    /// The SRTC alarm.
    #[cfg(feature = "srtc")]
    pub const fn srtc() -> Self {
        HwChannel {
            module: HwModule::Srtc,
            instance: 0,
            channel: 0,
        }
    }

    /// Whether the channel exists on the device.
    pub const fn is_valid(&self) -> bool {
        let (instance, channel) = (self.instance as usize, self.channel as usize);
        match self.module {
            #[cfg(feature = "ftm")]
            HwModule::Ftm => instance < FTM_INSTANCES && channel < FTM_CHANNELS,
            #[cfg(feature = "lpit")]
            HwModule::Lpit => instance == 0 && channel < LPIT_CHANNELS,
            #[cfg(feature = "lptmr")]
            HwModule::Lptmr => instance == 0 && channel == 0,
            #[cfg(feature = "srtc")]
            HwModule::Srtc => instance == 0 && channel == 0,
        }
    }

    /// Flat hardware index used by the interrupt demultiplexer.
    pub const fn index(&self) -> usize {
        match self.module {
            #[cfg(feature = "ftm")]
            HwModule::Ftm => {
                FTM_FIRST + self.instance as usize * FTM_CHANNELS + self.channel as usize
            }
            #[cfg(feature = "lpit")]
            HwModule::Lpit => LPIT_FIRST + self.channel as usize,
            #[cfg(feature = "lptmr")]
            HwModule::Lptmr => LPTMR_FIRST,
            #[cfg(feature = "srtc")]
            HwModule::Srtc => SRTC_FIRST,
        }
    }

    /// Whether `self` and `other` are driven by the same hardware counter.
    pub(crate) fn shares_counter(&self, other: &HwChannel) -> bool {
        if self.module != other.module {
            return false;
        }
        match self.module {
            #[cfg(feature = "ftm")]
            HwModule::Ftm => self.instance == other.instance,
            #[cfg(feature = "lpit")]
            HwModule::Lpit => self.channel == other.channel,
            #[cfg(feature = "lptmr")]
            HwModule::Lptmr => true,
            #[cfg(feature = "srtc")]
            HwModule::Srtc => true,
        }
    }
}

/// What a channel does when its target is reached.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChannelMode {
    /// Stops on the first match and reports expiry.
    OneShot,
    /// Reloads the same period on every match.
    Continuous,
}

/// IP-specific channel setup.
///
/// The meaning of `clock_source` and the prescalers depends on the IP:
/// FTM `SC[CLKS]`/`SC[PS]`, LPTMR `PSR[PCS]`/`PSR[PRESCALE]`, SRTC `CR[LPOS]`.
/// LPIT is clocked and divided outside the timer block and ignores them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct IpChannelConfig {
    /// Stop the counter while the core is halted in debug.
    pub freeze: bool,
    /// Counter clock selection.
    pub clock_source: u8,
    /// Prescaler used in [`ClockMode::Normal`](crate::ClockMode::Normal).
    pub prescaler: u8,
    /// Prescaler used in [`ClockMode::Alternate`](crate::ClockMode::Alternate).
    pub alternate_prescaler: u8,
}

impl IpChannelConfig {
    /// Frozen in debug, clock source `1`, no prescaling.
    pub const fn new() -> Self {
        IpChannelConfig {
            freeze: true,
            clock_source: 1,
            prescaler: 0,
            alternate_prescaler: 0,
        }
    }

    /// Sets [`IpChannelConfig::freeze`].
    pub const fn freeze(mut self, freeze: bool) -> Self {
        self.freeze = freeze;
        self
    }

    /// Sets [`IpChannelConfig::clock_source`].
    pub const fn clock_source(mut self, clock_source: u8) -> Self {
        self.clock_source = clock_source;
        self
    }

    /// Sets the normal and alternate prescalers.
    pub const fn prescaler(mut self, prescaler: u8, alternate: u8) -> Self {
        self.prescaler = prescaler;
        self.alternate_prescaler = alternate;
        self
    }
}

impl Default for IpChannelConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Static configuration of one logical channel.
#[derive(Clone, Copy, Debug)]
pub struct ChannelConfig {
    /// Backing hardware channel.
    pub hw: HwChannel,
    pub mode: ChannelMode,
    /// Largest tick value accepted by `start_timer`.
    pub max_ticks: u32,
    /// Called from interrupt context when the target is reached.
    pub notification: Option<fn()>,
    /// `Some` makes the channel wakeup capable.
    pub wakeup: Option<WakeupSource>,
    /// Clocking of the backing hardware.
    pub ip: IpChannelConfig,
}

impl ChannelConfig {
    /// A channel without notification or wakeup, with default clocking.
    pub const fn new(hw: HwChannel, mode: ChannelMode, max_ticks: u32) -> Self {
        ChannelConfig {
            hw,
            mode,
            max_ticks,
            notification: None,
            wakeup: None,
            ip: IpChannelConfig::new(),
        }
    }

    /// Makes the channel notification capable.
    pub const fn with_notification(mut self, notification: fn()) -> Self {
        self.notification = Some(notification);
        self
    }

    /// Makes the channel wakeup capable, reporting `source` to EcuM.
    pub const fn with_wakeup(mut self, source: WakeupSource) -> Self {
        self.wakeup = Some(source);
        self
    }

    /// Replaces the channel's clocking.
    pub const fn with_ip(mut self, ip: IpChannelConfig) -> Self {
        self.ip = ip;
        self
    }

    #[inline]
    pub(crate) fn is_oneshot(&self) -> bool {
        self.mode == ChannelMode::OneShot
    }
}

/// Free-running timers exposed through `Gpt::get_predef_timer_value`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum PredefTimer {
    /// 1 µs tick, 16 bits wide.
    Us1Bit16 = 0,
    /// 1 µs tick, 24 bits wide.
    Us1Bit24 = 1,
    /// 1 µs tick, 32 bits wide.
    Us1Bit32 = 2,
    /// 100 µs tick, 32 bits wide.
    Us100Bit32 = 3,
}

/// Number of [`PredefTimer`] kinds.
pub const PREDEF_TIMER_COUNT: usize = 4;

impl PredefTimer {
    /// Every kind, in discriminant order.
    pub const ALL: [PredefTimer; PREDEF_TIMER_COUNT] = [
        PredefTimer::Us1Bit16,
        PredefTimer::Us1Bit24,
        PredefTimer::Us1Bit32,
        PredefTimer::Us100Bit32,
    ];

    /// Mask applied to the raw counter.
    pub const fn mask(self) -> u32 {
        match self {
            PredefTimer::Us1Bit16 => 0xffff,
            PredefTimer::Us1Bit24 => 0x00ff_ffff,
            PredefTimer::Us1Bit32 | PredefTimer::Us100Bit32 => u32::MAX,
        }
    }

    /// Length of one tick in microseconds.
    pub const fn tick_us(self) -> u32 {
        match self {
            PredefTimer::Us100Bit32 => 100,
            _ => 1,
        }
    }
}

impl TryFrom<u8> for PredefTimer {
    type Error = Error;

    fn try_from(raw: u8) -> Result<Self, Error> {
        PredefTimer::ALL
            .get(usize::from(raw))
            .copied()
            .ok_or(Error::ParamPredefTimer)
    }
}

/// Hardware counter backing a predefined timer.
///
/// The counter must be clocked so that it ticks at the timer's rate (1 µs or
/// 100 µs) and must not also back a logical channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PredefTimerConfig {
    /// Counter to read; the channel number picks the LPIT channel.
    pub hw: HwChannel,
    /// Clocking applied when the counter is started.
    pub ip: IpChannelConfig,
}

/// Optional driver behaviour.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Options {
    /// Report failed checks to the DET. Checks run regardless.
    pub dev_error_detect: bool,
    /// Check channel states (busy, sleep gating, running channels at de-init).
    pub validate_state: bool,
}

impl Options {
    /// Both enabled.
    pub const DEFAULT: Options = Options {
        dev_error_detect: true,
        validate_state: true,
    };
}

impl Default for Options {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// The complete driver configuration.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    /// Logical channels; a channel's id is its index.
    pub channels: &'static [ChannelConfig],
    /// Source of each predefined timer, indexed by [`PredefTimer`].
    pub predef_timers: [Option<PredefTimerConfig>; PREDEF_TIMER_COUNT],
    pub options: Options,
}

impl Config {
    /// Default options and no predefined timers.
    pub const fn new(channels: &'static [ChannelConfig]) -> Self {
        Config {
            channels,
            predef_timers: [None; PREDEF_TIMER_COUNT],
            options: Options::DEFAULT,
        }
    }

    /// Backs `timer` with the counter described by `config`.
    pub const fn with_predef_timer(
        mut self,
        timer: PredefTimer,
        config: PredefTimerConfig,
    ) -> Self {
        self.predef_timers[timer as usize] = Some(config);
        self
    }

    /// Replaces the driver options.
    pub const fn with_options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }
}
