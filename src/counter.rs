//! Wrap-around arithmetic for free-running hardware counters.

/// A free-running counter range `0..=max` and the wrap policy used to place a
/// compare value relative to it.
///
/// Every timer IP programs its match register as "counter now + requested
/// ticks" and later recovers the elapsed time from the counter and that match
/// value. Keeping the policy in one place means a 16-bit FTM and a 32-bit LPIT
/// wrap in exactly the same way.
///
/// Wrapping subtracts `max` rather than `max + 1`: a counter at `max - 1` with a
/// delta of `5` lands on `4`. IPs whose counter physically passes through both
/// `max` and `0` compensate with [`WrappingCounter::with_overflow_pad`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WrappingCounter {
    max: u32,
    overflow_pad: u32,
}

impl WrappingCounter {
    /// A 16-bit counter.
    pub const U16: Self = Self::new(0xffff);
    /// A 32-bit counter.
    pub const U32: Self = Self::new(u32::MAX);

    /// Counter running over `0..=max`.
    pub const fn new(max: u32) -> Self {
        Self {
            max,
            overflow_pad: 0,
        }
    }

    /// Adds `pad` ticks to every distance that crosses the wrap point.
    pub const fn with_overflow_pad(self, pad: u32) -> Self {
        Self {
            max: self.max,
            overflow_pad: pad,
        }
    }

    /// The largest value the counter reaches.
    #[inline(always)]
    pub const fn max(&self) -> u32 {
        self.max
    }

    /// Truncates a raw register value to the counter range.
    #[inline(always)]
    pub const fn mask(&self, raw: u32) -> u32 {
        if raw > self.max {
            raw & self.max
        } else {
            raw
        }
    }

    /// `base + delta`, wrapped at `max`.
    #[inline]
    pub const fn add(&self, base: u32, delta: u32) -> u32 {
        let headroom = self.max.saturating_sub(base);
        if delta > headroom {
            delta - headroom
        } else {
            base + delta
        }
    }

    /// `base - delta`, wrapped at `max`. Inverse of [`WrappingCounter::add`].
    #[inline]
    pub const fn sub(&self, base: u32, delta: u32) -> u32 {
        if delta > base {
            self.max - (delta - base)
        } else {
            base - delta
        }
    }

    /// Ticks needed to move from `from` to `to`.
    #[inline]
    pub const fn distance(&self, from: u32, to: u32) -> u32 {
        if to >= from {
            to - from
        } else {
            (self.max - from) + to + self.overflow_pad
        }
    }
}
