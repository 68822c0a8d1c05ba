//! Embassy time driver clock

use parley_hal::{Clock, Instant};

/// Millisecond clock from `embassy_time::Instant`
///
/// Truncated to 32 bits; the sequencer's wrapping arithmetic absorbs the
/// rollover every ~49 days.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbassyClock;

impl Clock for EmbassyClock {
    fn now(&self) -> Instant {
        Instant::from_millis(embassy_time::Instant::now().as_millis() as u32)
    }
}
