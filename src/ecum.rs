//! ECU state manager wakeup seam.

/// An ECU wakeup source, as a bit in the EcuM wakeup-source mask.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WakeupSource(pub u32);

/// Receiver of wakeup events raised while the driver sleeps.
pub trait EcuM {
    /// A wakeup-enabled channel fired in sleep mode. Called from interrupt context.
    fn check_wakeup(&self, source: WakeupSource);

    /// A latched wakeup was confirmed through `Gpt::check_wakeup`.
    fn set_wakeup_event(&self, source: WakeupSource);
}

impl<T: EcuM> EcuM for &T {
    #[inline]
    fn check_wakeup(&self, source: WakeupSource) {
        T::check_wakeup(self, source)
    }

    #[inline]
    fn set_wakeup_event(&self, source: WakeupSource) {
        T::set_wakeup_event(self, source)
    }
}

/// For systems without wakeup handling.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoEcuM;

impl EcuM for NoEcuM {
    fn check_wakeup(&self, _source: WakeupSource) {}

    fn set_wakeup_event(&self, _source: WakeupSource) {}
}
