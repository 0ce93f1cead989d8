//! Driver-level tests against the simulated register file.

use core::sync::atomic::{AtomicUsize, Ordering};

use crate::{
    config::{
        ChannelConfig, ChannelMode, Config, HwChannel, IpChannelConfig, Options, PredefTimer,
        PredefTimerConfig,
    },
    det::ServiceId,
    ecum::WakeupSource,
    sim::{RecordingDet, RecordingEcuM, SimBus},
    ChannelStatus, ClockMode, Error, Gpt, Mode,
};

#[cfg(feature = "ftm")]
use crate::ip::ftm;
#[cfg(feature = "lpit")]
use crate::ip::lpit;
#[cfg(feature = "lptmr")]
use crate::ip::lptmr;
#[cfg(feature = "srtc")]
use crate::ip::srtc;

type TestGpt = Gpt<SimBus, RecordingDet, RecordingEcuM>;

fn driver() -> TestGpt {
    let _ = env_logger::builder().is_test(true).try_init();
    Gpt::new(SimBus::new(), RecordingDet::default(), RecordingEcuM::default())
}

#[cfg(feature = "lpit")]
const fn lpit_predef(channel: u8) -> PredefTimerConfig {
    PredefTimerConfig {
        hw: HwChannel::lpit(channel),
        ip: IpChannelConfig::new(),
    }
}

#[test]
#[cfg(feature = "ftm")]
fn oneshot_expires_on_match() {
    static FIRED: AtomicUsize = AtomicUsize::new(0);
    fn on_fire() {
        FIRED.fetch_add(1, Ordering::SeqCst);
    }
    static CHANNELS: [ChannelConfig; 1] =
        [ChannelConfig::new(HwChannel::ftm(0, 2), ChannelMode::OneShot, 1000)
            .with_notification(on_fire)];
    static CONFIG: Config = Config::new(&CHANNELS);

    let gpt = driver();
    let hw = CHANNELS[0].hw;
    gpt.init(Some(&CONFIG)).unwrap();
    gpt.enable_notification(0).unwrap();

    gpt.start_timer(0, 500).unwrap();
    assert_eq!(gpt.channel_status(0), ChannelStatus::Running);

    gpt.bus().ftm_match(hw);
    gpt.on_ftm_interrupt(0);

    assert_eq!(gpt.channel_status(0), ChannelStatus::Expired);
    assert_eq!(FIRED.load(Ordering::SeqCst), 1);
    assert_eq!(gpt.get_time_elapsed(0), Ok(500));
    assert_eq!(gpt.get_time_remaining(0), Ok(0));
    assert_eq!(gpt.bus().peek(ftm::csc(hw)) & (ftm::CSC_CHIE | ftm::CSC_CHF), 0);
    assert!(gpt.det().take().is_empty());
}

#[test]
#[cfg(feature = "lpit")]
fn continuous_reloads_every_match() {
    static FIRED: AtomicUsize = AtomicUsize::new(0);
    fn on_fire() {
        FIRED.fetch_add(1, Ordering::SeqCst);
    }
    static CHANNELS: [ChannelConfig; 1] =
        [ChannelConfig::new(HwChannel::lpit(1), ChannelMode::Continuous, u32::MAX)
            .with_notification(on_fire)];
    static CONFIG: Config = Config::new(&CHANNELS);

    let gpt = driver();
    gpt.init(Some(&CONFIG)).unwrap();
    gpt.enable_notification(0).unwrap();

    gpt.bus().poke(lpit::cval(1), u32::MAX - 250);
    gpt.start_timer(0, 200).unwrap();
    assert_eq!(gpt.bus().peek(lpit::tval(1)), u32::MAX - 50);

    for expected in [150, 350, 550] {
        gpt.bus().lpit_match(1);
        gpt.on_lpit_interrupt(1);
        assert_eq!(gpt.bus().peek(lpit::tval(1)), expected);
        assert_eq!(gpt.channel_status(0), ChannelStatus::Running);
    }
    assert_eq!(FIRED.load(Ordering::SeqCst), 3);
    assert_eq!(gpt.bus().peek(lpit::MSR), 0);
}

#[test]
#[cfg(feature = "lpit")]
fn sleep_keeps_only_wakeup_channels() {
    const SOURCE: WakeupSource = WakeupSource(1 << 4);
    static CHANNELS: [ChannelConfig; 3] = [
        ChannelConfig::new(HwChannel::lpit(0), ChannelMode::OneShot, u32::MAX).with_wakeup(SOURCE),
        ChannelConfig::new(HwChannel::lpit(1), ChannelMode::OneShot, u32::MAX),
        ChannelConfig::new(HwChannel::lpit(2), ChannelMode::OneShot, u32::MAX),
    ];
    static CONFIG: Config = Config::new(&CHANNELS);

    let gpt = driver();
    gpt.init(Some(&CONFIG)).unwrap();
    gpt.enable_wakeup(0).unwrap();
    for channel in 0..3 {
        gpt.start_timer(channel, 1000).unwrap();
    }

    gpt.bus().poke(lpit::cval(1), 400);
    // Channel 2 matched but its interrupt has not been taken yet.
    gpt.bus().lpit_match(2);

    gpt.set_mode(Mode::Sleep).unwrap();
    assert_eq!(gpt.mode(), Mode::Sleep);

    assert_eq!(gpt.channel_status(0), ChannelStatus::Running);
    assert_ne!(gpt.bus().peek(lpit::MIER) & lpit::bit(0), 0);

    assert_eq!(gpt.channel_status(1), ChannelStatus::Stopped);
    assert_eq!(gpt.get_time_elapsed(1), Ok(400));
    assert_eq!(gpt.bus().peek(lpit::MIER) & lpit::bit(1), 0);

    assert_eq!(gpt.channel_status(2), ChannelStatus::Expired);
    assert_eq!(gpt.bus().peek(lpit::MIER) & lpit::bit(2), 0);

    // Only the wakeup channel may be restarted while asleep.
    assert_eq!(gpt.start_timer(1, 10), Err(Error::InvalidCall));

    gpt.bus().lpit_match(0);
    gpt.on_lpit_interrupt(0);
    assert_eq!(gpt.channel_status(0), ChannelStatus::Expired);
    assert_eq!(*gpt.ecum().checked.borrow(), [SOURCE]);

    gpt.check_wakeup(SOURCE).unwrap();
    gpt.check_wakeup(SOURCE).unwrap();
    assert_eq!(*gpt.ecum().events.borrow(), [SOURCE]);

    assert_eq!(gpt.det().take(), [(ServiceId::StartTimer, Error::InvalidCall)]);
}

#[test]
#[cfg(feature = "lpit")]
fn deinit_refused_while_running() {
    static CHANNELS: [ChannelConfig; 2] = [
        ChannelConfig::new(HwChannel::lpit(0), ChannelMode::OneShot, u32::MAX),
        ChannelConfig::new(HwChannel::lpit(3), ChannelMode::Continuous, u32::MAX),
    ];
    static CONFIG: Config = Config::new(&CHANNELS);

    let gpt = driver();
    gpt.init(Some(&CONFIG)).unwrap();
    gpt.start_timer(1, 77).unwrap();

    assert_eq!(gpt.deinit(), Err(Error::Busy));
    assert_eq!(gpt.det().take(), [(ServiceId::DeInit, Error::Busy)]);
    assert!(gpt.is_initialized());
    assert_eq!(gpt.channel_status(0), ChannelStatus::Initialized);
    assert_eq!(gpt.channel_status(1), ChannelStatus::Running);
    assert_eq!(gpt.bus().peek(lpit::tctrl(3)), lpit::TCTRL_T_EN);
    assert_eq!(gpt.bus().peek(lpit::tval(3)), 77);
    assert_ne!(gpt.bus().peek(lpit::MIER) & lpit::bit(3), 0);

    gpt.stop_timer(1).unwrap();
    gpt.deinit().unwrap();
    assert!(!gpt.is_initialized());
    assert_eq!(gpt.bus().peek(lpit::tctrl(3)), 0);
}

#[test]
#[cfg(feature = "ftm")]
fn stop_after_unhandled_match_expires() {
    static CHANNELS: [ChannelConfig; 1] =
        [ChannelConfig::new(HwChannel::ftm(3, 0), ChannelMode::OneShot, 0xffff)];
    static CONFIG: Config = Config::new(&CHANNELS);

    let gpt = driver();
    let hw = CHANNELS[0].hw;
    gpt.init(Some(&CONFIG)).unwrap();

    gpt.start_timer(0, 500).unwrap();
    gpt.bus().poke(ftm::cnt(3), 120);
    gpt.stop_timer(0).unwrap();
    assert_eq!(gpt.channel_status(0), ChannelStatus::Stopped);
    assert_eq!(gpt.stop_time(0), 120);

    gpt.start_timer(0, 500).unwrap();
    gpt.bus().ftm_match(hw);
    gpt.stop_timer(0).unwrap();

    assert_eq!(gpt.channel_status(0), ChannelStatus::Expired);
    assert_eq!(gpt.stop_time(0), 120);
    assert_eq!(gpt.get_time_elapsed(0), Ok(500));
    assert_eq!(gpt.get_time_remaining(0), Ok(0));
}

#[test]
#[cfg(feature = "ftm")]
fn tick_value_bounds() {
    static CHANNELS: [ChannelConfig; 1] =
        [ChannelConfig::new(HwChannel::ftm(1, 1), ChannelMode::OneShot, 1000)];
    static CONFIG: Config = Config::new(&CHANNELS);

    let gpt = driver();
    gpt.init(Some(&CONFIG)).unwrap();

    assert_eq!(gpt.start_timer(0, 0), Err(Error::ParamValue));
    assert_eq!(gpt.start_timer(0, 1001), Err(Error::ParamValue));
    assert_eq!(gpt.channel_status(0), ChannelStatus::Initialized);
    assert_eq!(gpt.start_timer(1, 10), Err(Error::ParamChannel));

    gpt.start_timer(0, 1000).unwrap();
    assert_eq!(gpt.start_timer(0, 10), Err(Error::Busy));

    assert_eq!(
        gpt.det().take(),
        [
            (ServiceId::StartTimer, Error::ParamValue),
            (ServiceId::StartTimer, Error::ParamValue),
            (ServiceId::StartTimer, Error::ParamChannel),
            (ServiceId::StartTimer, Error::Busy),
        ]
    );
}

#[test]
#[cfg(feature = "ftm")]
fn elapsed_across_counter_wrap() {
    static CHANNELS: [ChannelConfig; 1] =
        [ChannelConfig::new(HwChannel::ftm(2, 5), ChannelMode::OneShot, 0xffff)];
    static CONFIG: Config = Config::new(&CHANNELS);

    let gpt = driver();
    gpt.init(Some(&CONFIG)).unwrap();

    gpt.bus().poke(ftm::cnt(2), 0xfffe);
    gpt.start_timer(0, 5).unwrap();
    gpt.bus().poke(ftm::cnt(2), 1);

    assert_eq!(gpt.get_time_elapsed(0), Ok(3));
    assert_eq!(gpt.get_time_remaining(0), Ok(2));
}

#[test]
#[cfg(feature = "lpit")]
fn stopped_channel_accounts_for_whole_target() {
    static CHANNELS: [ChannelConfig; 1] =
        [ChannelConfig::new(HwChannel::lpit(2), ChannelMode::Continuous, 5000)];
    static CONFIG: Config = Config::new(&CHANNELS);

    let gpt = driver();
    gpt.init(Some(&CONFIG)).unwrap();
    assert_eq!(gpt.get_time_elapsed(0), Ok(0));
    assert_eq!(gpt.get_time_remaining(0), Ok(0));

    gpt.start_timer(0, 4000).unwrap();
    gpt.bus().poke(lpit::cval(2), 1234);
    gpt.stop_timer(0).unwrap();
    // Stopping twice is a no-op.
    gpt.stop_timer(0).unwrap();

    let elapsed = gpt.get_time_elapsed(0).unwrap();
    let remaining = gpt.get_time_remaining(0).unwrap();
    assert_eq!(elapsed, 1234);
    assert_eq!(elapsed + remaining, 4000);
    assert!(gpt.det().take().is_empty());
}

#[test]
#[cfg(feature = "lpit")]
fn continuous_elapsed_with_pending_match() {
    static CHANNELS: [ChannelConfig; 1] =
        [ChannelConfig::new(HwChannel::lpit(0), ChannelMode::Continuous, 5000)];
    static CONFIG: Config = Config::new(&CHANNELS);

    let gpt = driver();
    gpt.init(Some(&CONFIG)).unwrap();
    gpt.start_timer(0, 200).unwrap();

    gpt.bus().poke(lpit::cval(0), 230);
    gpt.bus().poke(lpit::MSR, lpit::bit(0));

    assert_eq!(gpt.get_time_elapsed(0), Ok(30));
    assert_eq!(gpt.get_time_remaining(0), Ok(170));
}

#[test]
#[cfg(all(feature = "lpit", feature = "srtc"))]
fn next_timeout_value_checks() {
    static CHANNELS: [ChannelConfig; 3] = [
        ChannelConfig::new(HwChannel::lpit(0), ChannelMode::OneShot, 1000),
        ChannelConfig::new(HwChannel::lpit(1), ChannelMode::Continuous, 1000),
        ChannelConfig::new(HwChannel::srtc(), ChannelMode::Continuous, 3600),
    ];
    static CONFIG: Config = Config::new(&CHANNELS);

    let gpt = driver();
    gpt.init(Some(&CONFIG)).unwrap();

    gpt.start_timer(0, 100).unwrap();
    assert_eq!(gpt.change_next_timeout_value(0, 50), Err(Error::ParamChannel));
    assert_eq!(gpt.change_next_timeout_value(1, 50), Err(Error::InvalidCall));

    gpt.start_timer(1, 100).unwrap();
    assert_eq!(gpt.change_next_timeout_value(1, 0), Err(Error::ParamValue));
    gpt.change_next_timeout_value(1, 300).unwrap();

    gpt.bus().lpit_match(1);
    gpt.on_lpit_interrupt(1);
    assert_eq!(gpt.bus().peek(lpit::tval(1)), 400);
    assert_eq!(gpt.get_time_remaining(1), Ok(300));

    gpt.start_timer(2, 60).unwrap();
    assert_eq!(gpt.change_next_timeout_value(2, 30), Err(Error::InvalidCall));

    assert_eq!(
        gpt.det().take(),
        [
            (ServiceId::ChangeNextTimeoutValue, Error::ParamChannel),
            (ServiceId::ChangeNextTimeoutValue, Error::InvalidCall),
            (ServiceId::ChangeNextTimeoutValue, Error::ParamValue),
            (ServiceId::ChangeNextTimeoutValue, Error::InvalidCall),
        ]
    );
}

#[test]
#[cfg(feature = "lpit")]
fn notification_toggles() {
    static FIRED: AtomicUsize = AtomicUsize::new(0);
    fn on_fire() {
        FIRED.fetch_add(1, Ordering::SeqCst);
    }
    static CHANNELS: [ChannelConfig; 2] = [
        ChannelConfig::new(HwChannel::lpit(0), ChannelMode::Continuous, 1000)
            .with_notification(on_fire),
        ChannelConfig::new(HwChannel::lpit(1), ChannelMode::Continuous, 1000),
    ];
    static CONFIG: Config = Config::new(&CHANNELS);

    let gpt = driver();
    gpt.init(Some(&CONFIG)).unwrap();

    gpt.disable_notification(0).unwrap();
    gpt.disable_notification(0).unwrap();
    assert_eq!(gpt.enable_notification(1), Err(Error::ParamChannel));

    gpt.start_timer(0, 10).unwrap();
    gpt.bus().lpit_match(0);
    gpt.on_lpit_interrupt(0);
    assert_eq!(FIRED.load(Ordering::SeqCst), 0);

    gpt.enable_notification(0).unwrap();
    gpt.bus().lpit_match(0);
    gpt.on_lpit_interrupt(0);
    assert_eq!(FIRED.load(Ordering::SeqCst), 1);

    assert_eq!(gpt.det().take(), [(ServiceId::EnableNotification, Error::ParamChannel)]);
}

#[test]
#[cfg(feature = "lpit")]
fn masked_flag_is_not_serviced() {
    static FIRED: AtomicUsize = AtomicUsize::new(0);
    fn on_fire() {
        FIRED.fetch_add(1, Ordering::SeqCst);
    }
    static CHANNELS: [ChannelConfig; 1] =
        [ChannelConfig::new(HwChannel::lpit(3), ChannelMode::Continuous, 1000)
            .with_notification(on_fire)];
    static CONFIG: Config = Config::new(&CHANNELS);

    let gpt = driver();
    gpt.init(Some(&CONFIG)).unwrap();
    gpt.enable_notification(0).unwrap();

    gpt.bus().poke(lpit::MSR, lpit::bit(3));
    gpt.on_lpit_interrupt(3);
    assert_eq!(FIRED.load(Ordering::SeqCst), 0);
    assert_eq!(gpt.channel_status(0), ChannelStatus::Initialized);
}

#[test]
#[cfg(all(feature = "ftm", feature = "lptmr"))]
fn init_deinit_round_trip() {
    static CHANNELS: [ChannelConfig; 2] = [
        ChannelConfig::new(HwChannel::ftm(0, 0), ChannelMode::OneShot, 0xffff),
        ChannelConfig::new(HwChannel::lptmr(), ChannelMode::Continuous, 0xffff),
    ];
    static CONFIG: Config = Config::new(&CHANNELS);

    let gpt = driver();
    assert_eq!(gpt.start_timer(0, 1), Err(Error::Uninit));
    assert_eq!(gpt.get_time_elapsed(0), Err(Error::Uninit));
    assert_eq!(gpt.set_mode(Mode::Sleep), Err(Error::Uninit));
    assert_eq!(gpt.deinit(), Err(Error::Uninit));
    assert_eq!(gpt.init(None), Err(Error::InitFailed));

    gpt.init(Some(&CONFIG)).unwrap();
    assert_eq!(gpt.init(Some(&CONFIG)), Err(Error::AlreadyInitialized));
    gpt.start_timer(0, 100).unwrap();
    gpt.stop_timer(0).unwrap();
    gpt.deinit().unwrap();

    assert_eq!(gpt.channel_status(0), ChannelStatus::Uninitialized);
    assert_eq!(gpt.bus().peek(ftm::sc(0)), 0);

    gpt.init(Some(&CONFIG)).unwrap();
    assert_eq!(gpt.channel_status(0), ChannelStatus::Initialized);
    assert_eq!(gpt.channel_status(1), ChannelStatus::Initialized);
    assert_eq!(gpt.get_time_elapsed(0), Ok(0));
    assert_eq!(gpt.mode(), Mode::Normal);

    assert_eq!(
        gpt.det().take(),
        [
            (ServiceId::StartTimer, Error::Uninit),
            (ServiceId::GetTimeElapsed, Error::Uninit),
            (ServiceId::SetMode, Error::Uninit),
            (ServiceId::DeInit, Error::Uninit),
            (ServiceId::Init, Error::InitFailed),
            (ServiceId::Init, Error::AlreadyInitialized),
        ]
    );
}

#[test]
#[cfg(feature = "lpit")]
fn precompiled_configuration() {
    static CHANNELS: [ChannelConfig; 1] =
        [ChannelConfig::new(HwChannel::lpit(0), ChannelMode::OneShot, 1000)];
    static CONFIG: Config = Config::new(&CHANNELS);

    let _ = env_logger::builder().is_test(true).try_init();
    let gpt = Gpt::new_precompiled(
        &CONFIG,
        SimBus::new(),
        RecordingDet::default(),
        RecordingEcuM::default(),
    );

    assert_eq!(gpt.init(Some(&CONFIG)), Err(Error::InitFailed));
    gpt.init(None).unwrap();
    assert_eq!(gpt.channel_status(0), ChannelStatus::Initialized);
    assert_eq!(gpt.det().take(), [(ServiceId::Init, Error::InitFailed)]);
}

#[test]
#[cfg(all(feature = "ftm", feature = "lpit", feature = "lptmr", feature = "srtc"))]
fn rejected_configurations() {
    static DUPLICATE: [ChannelConfig; 2] = [
        ChannelConfig::new(HwChannel::ftm(0, 1), ChannelMode::OneShot, 100),
        ChannelConfig::new(HwChannel::ftm(0, 1), ChannelMode::Continuous, 100),
    ];
    static TOO_WIDE: [ChannelConfig; 1] =
        [ChannelConfig::new(HwChannel::lptmr(), ChannelMode::OneShot, 0x1_0000)];
    static NO_SUCH_CHANNEL: [ChannelConfig; 1] =
        [ChannelConfig::new(HwChannel::lpit(4), ChannelMode::OneShot, 100)];
    static SHARED: [ChannelConfig; 1] =
        [ChannelConfig::new(HwChannel::lpit(1), ChannelMode::OneShot, 100)];
    static PREDEF_ON_CHANNEL: Config =
        Config::new(&SHARED).with_predef_timer(PredefTimer::Us1Bit32, lpit_predef(1));
    static PREDEF_ON_SRTC: Config = Config::new(&SHARED).with_predef_timer(
        PredefTimer::Us1Bit16,
        PredefTimerConfig {
            hw: HwChannel::srtc(),
            ip: IpChannelConfig::new(),
        },
    );
    static CONFIGS: [Config; 3] = [
        Config::new(&DUPLICATE),
        Config::new(&TOO_WIDE),
        Config::new(&NO_SUCH_CHANNEL),
    ];

    let gpt = driver();
    for config in CONFIGS.iter().chain([&PREDEF_ON_CHANNEL, &PREDEF_ON_SRTC]) {
        assert_eq!(gpt.init(Some(config)), Err(Error::InitFailed));
        assert!(!gpt.is_initialized());
    }
    assert_eq!(gpt.det().take().len(), 5);
}

#[test]
#[cfg(feature = "lpit")]
fn predefined_timers() {
    static CHANNELS: [ChannelConfig; 1] =
        [ChannelConfig::new(HwChannel::lpit(0), ChannelMode::OneShot, 1000)];
    static CONFIG: Config = Config::new(&CHANNELS)
        .with_predef_timer(PredefTimer::Us1Bit16, lpit_predef(3))
        .with_predef_timer(PredefTimer::Us1Bit32, lpit_predef(3))
        .with_predef_timer(PredefTimer::Us100Bit32, lpit_predef(2));

    let gpt = driver();
    assert_eq!(gpt.get_predef_timer_value(PredefTimer::Us1Bit32), Err(Error::Uninit));
    gpt.init(Some(&CONFIG)).unwrap();
    assert_eq!(gpt.bus().peek(lpit::tctrl(3)), lpit::TCTRL_T_EN);

    gpt.bus().poke(lpit::cval(3), 0x0012_3456);
    assert_eq!(gpt.get_predef_timer_value(PredefTimer::Us1Bit16), Ok(0x3456));
    assert_eq!(gpt.get_predef_timer_value(PredefTimer::Us1Bit32), Ok(0x0012_3456));
    assert_eq!(
        gpt.get_predef_timer_value(PredefTimer::Us1Bit24),
        Err(Error::ParamPredefTimer)
    );

    gpt.bus().poke(lpit::cval(2), 150);
    assert_eq!(
        gpt.predef_elapsed(PredefTimer::Us100Bit32, 100),
        Ok(fugit::MicrosDurationU32::from_ticks(5000))
    );
    assert_eq!(
        gpt.predef_instant_us(PredefTimer::Us100Bit32).map(|now| now.ticks()),
        Ok(15_000)
    );

    gpt.set_mode(Mode::Sleep).unwrap();
    assert_eq!(gpt.bus().peek(lpit::tctrl(3)), 0);
    assert_eq!(gpt.get_predef_timer_value(PredefTimer::Us1Bit16), Err(Error::Mode));

    gpt.set_mode(Mode::Normal).unwrap();
    assert_eq!(gpt.bus().peek(lpit::tctrl(3)), lpit::TCTRL_T_EN);

    assert_eq!(
        gpt.det().take(),
        [
            (ServiceId::GetPredefTimerValue, Error::Uninit),
            (ServiceId::GetPredefTimerValue, Error::ParamPredefTimer),
            (ServiceId::GetPredefTimerValue, Error::Mode),
        ]
    );
}

#[test]
#[cfg(feature = "ftm")]
fn clock_mode_switches_prescaler() {
    static CHANNELS: [ChannelConfig; 1] = [ChannelConfig::new(
        HwChannel::ftm(1, 0),
        ChannelMode::Continuous,
        0xffff,
    )
    .with_ip(IpChannelConfig::new().prescaler(3, 5))];
    static CONFIG: Config = Config::new(&CHANNELS);

    let gpt = driver();
    gpt.init(Some(&CONFIG)).unwrap();
    assert_eq!(gpt.bus().peek(ftm::sc(1)) & ftm::SC_PS_MASK, 3);

    gpt.set_clock_mode(ClockMode::Alternate).unwrap();
    assert_eq!(gpt.clock_mode(), ClockMode::Alternate);
    assert_eq!(gpt.bus().peek(ftm::sc(1)) & ftm::SC_PS_MASK, 5);

    gpt.set_clock_mode(ClockMode::Normal).unwrap();
    assert_eq!(gpt.bus().peek(ftm::sc(1)) & ftm::SC_PS_MASK, 3);
}

#[test]
#[cfg(all(feature = "lpit", feature = "srtc"))]
fn wakeup_disabled_while_asleep() {
    const SOURCE: WakeupSource = WakeupSource(1);
    static CHANNELS: [ChannelConfig; 2] = [
        ChannelConfig::new(HwChannel::srtc(), ChannelMode::OneShot, 3600).with_wakeup(SOURCE),
        ChannelConfig::new(HwChannel::lpit(0), ChannelMode::OneShot, 1000),
    ];
    static CONFIG: Config = Config::new(&CHANNELS);

    let gpt = driver();
    gpt.init(Some(&CONFIG)).unwrap();
    assert_eq!(gpt.enable_wakeup(1), Err(Error::ParamChannel));
    gpt.enable_wakeup(0).unwrap();

    gpt.bus().poke(srtc::TSR, 10);
    gpt.start_timer(0, 60).unwrap();
    gpt.set_mode(Mode::Sleep).unwrap();
    assert_eq!(gpt.channel_status(0), ChannelStatus::Running);

    gpt.bus().poke(srtc::TSR, 25);
    gpt.disable_wakeup(0).unwrap();
    assert_eq!(gpt.channel_status(0), ChannelStatus::Stopped);
    assert_eq!(gpt.get_time_elapsed(0), Ok(15));
    assert_eq!(gpt.bus().peek(srtc::IER) & srtc::IER_TAIE, 0);

    // A latched alarm does not reach EcuM once the channel is stopped.
    gpt.bus().srtc_match();
    gpt.on_srtc_interrupt();
    assert!(gpt.ecum().checked.borrow().is_empty());
    assert_eq!(gpt.det().take(), [(ServiceId::EnableWakeup, Error::ParamChannel)]);
}

#[test]
#[cfg(feature = "lpit")]
fn errors_not_reported_without_dev_error_detect() {
    static CHANNELS: [ChannelConfig; 1] =
        [ChannelConfig::new(HwChannel::lpit(0), ChannelMode::OneShot, 1000)];
    static CONFIG: Config = Config::new(&CHANNELS).with_options(Options {
        dev_error_detect: false,
        validate_state: false,
    });

    let gpt = driver();
    gpt.init(Some(&CONFIG)).unwrap();

    assert_eq!(gpt.start_timer(0, 0), Err(Error::ParamValue));
    gpt.start_timer(0, 100).unwrap();
    // Without state validation a running channel is simply restarted.
    gpt.bus().poke(lpit::cval(0), 40);
    gpt.start_timer(0, 100).unwrap();
    assert_eq!(gpt.bus().peek(lpit::tval(0)), 140);
    gpt.deinit().unwrap();

    assert!(gpt.det().take().is_empty());
}

#[test]
fn version_info() {
    let info = driver().get_version_info();
    assert_eq!(info.vendor_id, 43);
    assert_eq!(info.module_id, 100);
    assert_eq!(info.sw_major_version, 1);
}

#[test]
#[cfg(feature = "ftm")]
fn oneshot_at_max_ticks_expires() {
    static CHANNELS: [ChannelConfig; 1] =
        [ChannelConfig::new(HwChannel::ftm(0, 4), ChannelMode::OneShot, 0xffff)];
    static CONFIG: Config = Config::new(&CHANNELS);

    let gpt = driver();
    let hw = CHANNELS[0].hw;
    gpt.init(Some(&CONFIG)).unwrap();

    gpt.start_timer(0, 0xffff).unwrap();
    assert_eq!(gpt.bus().peek(ftm::cv(hw)), 0xffff);

    gpt.bus().ftm_match(hw);
    gpt.on_ftm_interrupt(0);

    assert_eq!(gpt.channel_status(0), ChannelStatus::Expired);
    assert_eq!(gpt.get_time_elapsed(0), Ok(0xffff));
    assert_eq!(gpt.get_time_remaining(0), Ok(0));
}

#[test]
#[cfg(feature = "ftm")]
fn foreign_ftm_channel_is_left_alone() {
    static CHANNELS: [ChannelConfig; 1] =
        [ChannelConfig::new(HwChannel::ftm(0, 2), ChannelMode::OneShot, 0xffff)];
    static CONFIG: Config = Config::new(&CHANNELS);

    let gpt = driver();
    let hw = CHANNELS[0].hw;
    let foreign = HwChannel::ftm(0, 5);
    gpt.init(Some(&CONFIG)).unwrap();

    gpt.bus().poke(ftm::cv(foreign), 0x1234);
    gpt.bus().poke(ftm::csc(foreign), ftm::CSC_CHF | ftm::CSC_CHIE);

    gpt.start_timer(0, 500).unwrap();
    gpt.bus().ftm_match(hw);
    gpt.on_ftm_interrupt(0);

    assert_eq!(gpt.channel_status(0), ChannelStatus::Expired);
    assert_eq!(gpt.bus().peek(ftm::cv(foreign)), 0x1234);
    assert_eq!(gpt.bus().peek(ftm::csc(foreign)), ftm::CSC_CHF | ftm::CSC_CHIE);
}

#[test]
#[cfg(feature = "lptmr")]
fn lptmr_continuous_reload_across_wrap() {
    static FIRED: AtomicUsize = AtomicUsize::new(0);
    fn on_fire() {
        FIRED.fetch_add(1, Ordering::SeqCst);
    }
    static CHANNELS: [ChannelConfig; 1] =
        [ChannelConfig::new(HwChannel::lptmr(), ChannelMode::Continuous, 0xffff)
            .with_notification(on_fire)];
    static CONFIG: Config = Config::new(&CHANNELS);

    let gpt = driver();
    gpt.init(Some(&CONFIG)).unwrap();
    gpt.enable_notification(0).unwrap();

    gpt.bus().poke(lptmr::CNR, 0xff00);
    gpt.start_timer(0, 0x200).unwrap();
    assert_eq!(gpt.bus().peek(lptmr::CMR), 0x101);

    for expected in [0x301, 0x501, 0x701] {
        gpt.bus().lptmr_match();
        gpt.on_lptmr_interrupt();
        assert_eq!(gpt.bus().peek(lptmr::CMR), expected);
        assert_eq!(gpt.channel_status(0), ChannelStatus::Running);
    }
    assert_eq!(FIRED.load(Ordering::SeqCst), 3);
    assert_eq!(gpt.bus().peek(lptmr::CSR) & lptmr::CSR_TCF, 0);
}

#[test]
#[cfg(feature = "srtc")]
fn srtc_continuous_reload() {
    static FIRED: AtomicUsize = AtomicUsize::new(0);
    fn on_fire() {
        FIRED.fetch_add(1, Ordering::SeqCst);
    }
    static CHANNELS: [ChannelConfig; 1] =
        [ChannelConfig::new(HwChannel::srtc(), ChannelMode::Continuous, 3600)
            .with_notification(on_fire)];
    static CONFIG: Config = Config::new(&CHANNELS);

    let gpt = driver();
    gpt.init(Some(&CONFIG)).unwrap();
    gpt.enable_notification(0).unwrap();

    gpt.bus().poke(srtc::TSR, 1000);
    gpt.start_timer(0, 60).unwrap();
    assert_eq!(gpt.bus().peek(srtc::TAR), 1060);

    // Alarm reached, interrupt not taken yet: ten seconds into the next period.
    gpt.bus().srtc_match();
    gpt.bus().poke(srtc::TSR, 1070);
    assert_eq!(gpt.get_time_elapsed(0), Ok(10));
    assert_eq!(gpt.get_time_remaining(0), Ok(50));

    gpt.on_srtc_interrupt();
    assert_eq!(gpt.bus().peek(srtc::TAR), 1120);
    assert_eq!(gpt.bus().peek(srtc::SR) & srtc::SR_TAF, 0);
    assert_eq!(gpt.get_time_elapsed(0), Ok(10));
    assert_eq!(gpt.get_time_remaining(0), Ok(50));

    gpt.bus().srtc_match();
    gpt.on_srtc_interrupt();
    assert_eq!(gpt.bus().peek(srtc::TAR), 1180);
    assert_eq!(gpt.channel_status(0), ChannelStatus::Running);
    assert_eq!(FIRED.load(Ordering::SeqCst), 2);
}
