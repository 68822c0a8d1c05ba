//! Engine configuration

use parley_hal::UartConfig;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Retries granted to each step before the run is aborted
pub const DEFAULT_RETRY_BUDGET: u8 = 3;

/// Line rate used by AT-command radio modules out of the box
pub const DEFAULT_BAUDRATE: u32 = 9600;

/// Sequencer-wide settings
///
/// Per-step timeouts belong to the steps themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EngineConfig {
    /// Retries available after each successful transition
    pub retry_budget: u8,
    /// Baud rate applied to the transport by `init`
    pub baudrate: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            retry_budget: DEFAULT_RETRY_BUDGET,
            baudrate: DEFAULT_BAUDRATE,
        }
    }
}

impl EngineConfig {
    /// Transport line settings (8N1 at the configured rate)
    pub fn uart(&self) -> UartConfig {
        UartConfig::with_baudrate(self.baudrate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.retry_budget, 3);
        assert_eq!(config.uart(), UartConfig::default());
    }
}
