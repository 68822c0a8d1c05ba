//! Radio node configuration
//!
//! Everything tunable about the LoRa-E5 dialogue. With the `toml` feature
//! the settings load from a file like:
//!
//! ```toml
//! retry_budget = 3
//! command_timeout_ms = 2000
//! tx_done_timeout_ms = 5000
//! listen_idle_timeout_ms = 5400000
//!
//! [radio]
//! frequency_khz = 868000
//! spreading_factor = 7
//! ```
//!
//! Missing keys keep their defaults; unknown keys are rejected.

use core::time::Duration;

use parley_core::{EngineConfig, MAX_TIMEOUT};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::rfcfg::RadioConfig;

/// Upper bound on the per-step retry budget
pub const MAX_RETRY_BUDGET: u8 = 10;

/// Baud rates the module can be switched to
pub const BAUDRATES: [u32; 7] = [9600, 14400, 19200, 38400, 57600, 76800, 115200];

/// Configuration errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// TOML syntax error or wrongly typed value
    Parse,
    /// Retry budget above [`MAX_RETRY_BUDGET`]
    RetryBudget(u8),
    /// Baud rate the module does not support
    Baudrate(u32),
    /// A timeout of zero
    ZeroTimeout,
    /// A timeout the millisecond clock cannot measure
    TimeoutTooLong(u32),
    /// Frequency outside 862 to 930 MHz (kHz)
    Frequency(u32),
    /// Spreading factor outside 7 to 12
    SpreadingFactor(u8),
    /// Bandwidth other than 125, 250 or 500 kHz
    Bandwidth(u16),
    /// Zero-length preamble
    Preamble,
    /// Power outside -1 to 22 dBm
    Power(i8),
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Parse => write!(f, "invalid TOML"),
            Self::RetryBudget(n) => {
                write!(f, "retry budget {} exceeds {}", n, MAX_RETRY_BUDGET)
            }
            Self::Baudrate(baud) => write!(f, "unsupported baud rate {}", baud),
            Self::ZeroTimeout => write!(f, "timeouts must be non-zero"),
            Self::TimeoutTooLong(ms) => write!(f, "timeout {} ms is too long", ms),
            Self::Frequency(khz) => write!(f, "frequency {} kHz out of range", khz),
            Self::SpreadingFactor(sf) => write!(f, "spreading factor {} out of range", sf),
            Self::Bandwidth(bw) => write!(f, "unsupported bandwidth {} kHz", bw),
            Self::Preamble => write!(f, "preamble length must be non-zero"),
            Self::Power(dbm) => write!(f, "power {} dBm out of range", dbm),
        }
    }
}

/// LoRa-E5 node settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct E5Config {
    /// Retries per step before aborting
    pub retry_budget: u8,
    /// Serial line rate
    pub baudrate: u32,
    /// Wait for an ordinary command response
    pub command_timeout_ms: u32,
    /// Wait for `+TEST: TX DONE` after a transmit is accepted
    pub tx_done_timeout_ms: u32,
    /// Inactivity that ends a continuous listen
    pub listen_idle_timeout_ms: u32,
    pub radio: RadioConfig,
}

impl E5Config {
    pub const DEFAULT: Self = Self {
        retry_budget: 3,
        baudrate: 9600,
        command_timeout_ms: 2000,
        tx_done_timeout_ms: 5000,
        listen_idle_timeout_ms: 90 * 60 * 1000,
        radio: RadioConfig::DEFAULT,
    };

    /// Parse and validate TOML text
    #[cfg(feature = "toml")]
    pub fn from_toml(input: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(input).map_err(|_| ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Range-check every setting
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.retry_budget > MAX_RETRY_BUDGET {
            return Err(ConfigError::RetryBudget(self.retry_budget));
        }
        if !BAUDRATES.contains(&self.baudrate) {
            return Err(ConfigError::Baudrate(self.baudrate));
        }
        if self.command_timeout_ms == 0
            || self.tx_done_timeout_ms == 0
            || self.listen_idle_timeout_ms == 0
        {
            return Err(ConfigError::ZeroTimeout);
        }
        for ms in [
            self.command_timeout_ms,
            self.tx_done_timeout_ms,
            self.listen_idle_timeout_ms,
        ] {
            if Duration::from_millis(ms as u64) > MAX_TIMEOUT {
                return Err(ConfigError::TimeoutTooLong(ms));
            }
        }
        self.radio.validate()
    }

    /// Settings for the sequencer itself
    pub fn engine(&self) -> EngineConfig {
        EngineConfig {
            retry_budget: self.retry_budget,
            baudrate: self.baudrate,
        }
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms as u64)
    }

    pub fn tx_done_timeout(&self) -> Duration {
        Duration::from_millis(self.tx_done_timeout_ms as u64)
    }

    pub fn listen_idle_timeout(&self) -> Duration {
        Duration::from_millis(self.listen_idle_timeout_ms as u64)
    }
}

impl Default for E5Config {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = E5Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.engine(), EngineConfig::default());
        assert_eq!(config.listen_idle_timeout(), Duration::from_secs(90 * 60));
    }

    #[test]
    fn test_validate_rejects() {
        let config = E5Config {
            retry_budget: 11,
            ..E5Config::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::RetryBudget(11)));

        let config = E5Config {
            baudrate: 1200,
            ..E5Config::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::Baudrate(1200)));

        let config = E5Config {
            tx_done_timeout_ms: 0,
            ..E5Config::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroTimeout));

        let config = E5Config {
            listen_idle_timeout_ms: u32::MAX,
            ..E5Config::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::TimeoutTooLong(u32::MAX))
        );
    }

    #[cfg(feature = "toml")]
    mod toml_loading {
        use super::*;

        #[test]
        fn test_empty_document_is_default() {
            assert_eq!(E5Config::from_toml(""), Ok(E5Config::default()));
        }

        #[test]
        fn test_partial_document() {
            let config = E5Config::from_toml(
                r#"
                # Slow link
                retry_budget = 5
                tx_done_timeout_ms = 8000

                [radio]
                frequency_khz = 915000
                spreading_factor = 9
                crc = true
                "#,
            )
            .unwrap();

            assert_eq!(config.retry_budget, 5);
            assert_eq!(config.tx_done_timeout(), Duration::from_secs(8));
            assert_eq!(config.command_timeout_ms, 2000);
            assert_eq!(config.radio.frequency_khz, 915_000);
            assert_eq!(config.radio.spreading_factor, 9);
            assert!(config.radio.crc);
            assert_eq!(config.radio.bandwidth_khz, 125);
        }

        #[test]
        fn test_unknown_key_rejected() {
            assert_eq!(
                E5Config::from_toml("retry_bugdet = 2"),
                Err(ConfigError::Parse)
            );
        }

        #[test]
        fn test_wrong_type_rejected() {
            assert_eq!(
                E5Config::from_toml("command_timeout_ms = \"fast\""),
                Err(ConfigError::Parse)
            );
        }

        #[test]
        fn test_out_of_range_rejected() {
            assert_eq!(
                E5Config::from_toml("[radio]\nspreading_factor = 13"),
                Err(ConfigError::SpreadingFactor(13))
            );
        }
    }
}
