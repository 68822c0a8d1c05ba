//! Monotonic time source
//!
//! Timestamps are 32-bit millisecond counters, the same resolution a
//! microcontroller tick gives. The counter wraps after ~49.7 days, so
//! elapsed time is always computed with wrapping subtraction.

use core::time::Duration;

/// Point in time, in milliseconds since an arbitrary epoch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Instant(u32);

impl Instant {
    /// Create an instant from a raw millisecond counter
    pub const fn from_millis(ms: u32) -> Self {
        Self(ms)
    }

    /// Raw millisecond counter value
    pub const fn as_millis(&self) -> u32 {
        self.0
    }

    /// Time elapsed from `earlier` to `self`
    ///
    /// Correct across a single counter wrap.
    pub fn duration_since(&self, earlier: Instant) -> Duration {
        Duration::from_millis(self.0.wrapping_sub(earlier.0) as u64)
    }

    /// Instant `duration` later, wrapping with the counter
    pub fn wrapping_add(&self, duration: Duration) -> Instant {
        Instant(self.0.wrapping_add(duration.as_millis() as u32))
    }
}

/// Monotonic clock
pub trait Clock {
    /// Current time
    fn now(&self) -> Instant;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_since() {
        let a = Instant::from_millis(1_000);
        let b = Instant::from_millis(3_500);
        assert_eq!(b.duration_since(a), Duration::from_millis(2_500));
    }

    #[test]
    fn test_duration_since_across_wrap() {
        let before = Instant::from_millis(u32::MAX - 99);
        let after = before.wrapping_add(Duration::from_millis(250));
        assert_eq!(after.as_millis(), 150);
        assert_eq!(after.duration_since(before), Duration::from_millis(250));
    }
}
