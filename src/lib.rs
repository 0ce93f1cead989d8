//! # AUTOSAR GPT driver for the S32K14x timers
//!
//! Logical timer channels on top of the FTM, LPIT, LPTMR and SRTC blocks:
//! oneshot and continuous timeouts, notifications, sleep-mode wakeups and
//! free-running predefined timers.
//!
//! The driver ([`Gpt`]) is a single object meant to be placed in a `static`.
//! Task code calls its API; each timer interrupt vector calls the matching
//! `on_*_interrupt` entry point. Register access goes through [`mmio::Mmio`],
//! so the driver can be run against a simulated register file.
//!
//! Exclusive areas use [`critical_section`]. On a single-core target enable the
//! `single-core` feature, or provide another `critical-section` implementation.

#![cfg_attr(not(test), no_std)]

pub mod config;
pub mod counter;
pub mod det;
pub mod ecum;
mod error;
mod gpt;
mod ip;
mod ipw;
mod irq;
pub mod mmio;

#[cfg(test)]
mod sim;
#[cfg(test)]
mod tests;

pub use config::{ChannelConfig, ChannelId, ChannelMode, Config, HwChannel, PredefTimer};
pub use error::Error;
pub use fugit::{self, ExtU32};
pub use gpt::{ChannelStatus, ClockMode, Gpt, Mode, VersionInfo};
