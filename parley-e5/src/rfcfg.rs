//! Test-mode radio parameters
//!
//! Rendered into `AT+TEST=RFCFG,F,SF,BW,TXPR,RXPR,POW,CRC,IQ,NET`.

use core::fmt::Write;

use heapless::String;
use parley_core::MAX_COMMAND_LEN;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::commands::RFCFG_PREFIX;
use crate::config::ConfigError;

/// Supported LoRa bandwidths in kHz
pub const BANDWIDTHS_KHZ: [u16; 3] = [125, 250, 500];

/// LoRa modulation and framing for point-to-point test mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct RadioConfig {
    /// Carrier frequency in kHz
    pub frequency_khz: u32,
    /// Spreading factor (7 to 12)
    pub spreading_factor: u8,
    /// Bandwidth in kHz
    pub bandwidth_khz: u16,
    /// Transmit preamble length in symbols
    pub tx_preamble: u16,
    /// Receive preamble length in symbols
    pub rx_preamble: u16,
    /// Transmit power in dBm
    pub power_dbm: i8,
    pub crc: bool,
    pub iq_inverted: bool,
    /// Public LoRaWAN sync word
    pub public_network: bool,
}

impl RadioConfig {
    /// EU868 defaults: 868 MHz, SF7, 125 kHz, 14 dBm
    pub const DEFAULT: Self = Self {
        frequency_khz: 868_000,
        spreading_factor: 7,
        bandwidth_khz: 125,
        tx_preamble: 8,
        rx_preamble: 8,
        power_dbm: 14,
        crc: false,
        iq_inverted: false,
        public_network: false,
    };

    /// Range-check every field against what the module accepts
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(862_000..=930_000).contains(&self.frequency_khz) {
            return Err(ConfigError::Frequency(self.frequency_khz));
        }
        if !(7..=12).contains(&self.spreading_factor) {
            return Err(ConfigError::SpreadingFactor(self.spreading_factor));
        }
        if !BANDWIDTHS_KHZ.contains(&self.bandwidth_khz) {
            return Err(ConfigError::Bandwidth(self.bandwidth_khz));
        }
        if self.tx_preamble == 0 || self.rx_preamble == 0 {
            return Err(ConfigError::Preamble);
        }
        if !(-1..=22).contains(&self.power_dbm) {
            return Err(ConfigError::Power(self.power_dbm));
        }
        Ok(())
    }

    /// Render the full `RFCFG` command line
    pub fn command(&self) -> String<MAX_COMMAND_LEN> {
        let mut line = String::new();
        // Cannot overflow: the longest rendering is under 64 bytes
        let _ = self.write_command(&mut line);
        line
    }

    fn write_command<W: Write>(&self, out: &mut W) -> core::fmt::Result {
        out.write_str(RFCFG_PREFIX)?;
        write_frequency(out, self.frequency_khz)?;
        write!(
            out,
            ",SF{},{},{},{},{},{},{},{}\r\n",
            self.spreading_factor,
            self.bandwidth_khz,
            self.tx_preamble,
            self.rx_preamble,
            self.power_dbm,
            on_off(self.crc),
            on_off(self.iq_inverted),
            on_off(self.public_network),
        )
    }
}

impl Default for RadioConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

fn on_off(flag: bool) -> &'static str {
    if flag {
        "ON"
    } else {
        "OFF"
    }
}

/// MHz with the shortest exact decimal fraction (`868`, `868.1`, `868.125`)
fn write_frequency<W: Write>(out: &mut W, khz: u32) -> core::fmt::Result {
    let mhz = khz / 1000;
    let mut frac = khz % 1000;
    if frac == 0 {
        return write!(out, "{}", mhz);
    }
    let mut digits = 3;
    while frac % 10 == 0 {
        frac /= 10;
        digits -= 1;
    }
    write!(out, "{}.{:0width$}", mhz, frac, width = digits)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_command() {
        assert_eq!(
            RadioConfig::default().command().as_str(),
            "AT+TEST=RFCFG,868,SF7,125,8,8,14,OFF,OFF,OFF\r\n"
        );
    }

    #[test]
    fn test_fractional_frequency() {
        let mut config = RadioConfig::default();
        for (khz, text) in [(868_100, "868.1"), (868_125, "868.125"), (868_050, "868.05")] {
            config.frequency_khz = khz;
            let command = config.command();
            assert!(
                command.starts_with(&std::format!("AT+TEST=RFCFG,{},", text)),
                "{}",
                command
            );
        }
    }

    #[test]
    fn test_flags_and_power() {
        let config = RadioConfig {
            frequency_khz: 915_000,
            spreading_factor: 12,
            bandwidth_khz: 500,
            tx_preamble: 12,
            rx_preamble: 15,
            power_dbm: -1,
            crc: true,
            iq_inverted: false,
            public_network: true,
        };
        assert_eq!(
            config.command().as_str(),
            "AT+TEST=RFCFG,915,SF12,500,12,15,-1,ON,OFF,ON\r\n"
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_ranges() {
        let base = RadioConfig::default();
        assert!(base.validate().is_ok());

        let config = RadioConfig { frequency_khz: 433_000, ..base };
        assert_eq!(config.validate(), Err(ConfigError::Frequency(433_000)));
        let config = RadioConfig { spreading_factor: 6, ..base };
        assert_eq!(config.validate(), Err(ConfigError::SpreadingFactor(6)));
        let config = RadioConfig { bandwidth_khz: 62, ..base };
        assert_eq!(config.validate(), Err(ConfigError::Bandwidth(62)));
        let config = RadioConfig { rx_preamble: 0, ..base };
        assert_eq!(config.validate(), Err(ConfigError::Preamble));
        let config = RadioConfig { power_dbm: 23, ..base };
        assert_eq!(config.validate(), Err(ConfigError::Power(23)));
    }

    #[test]
    fn test_longest_rendering_fits() {
        let config = RadioConfig {
            frequency_khz: 929_999,
            spreading_factor: 12,
            bandwidth_khz: 500,
            tx_preamble: u16::MAX,
            rx_preamble: u16::MAX,
            power_dbm: -1,
            crc: false,
            iq_inverted: false,
            public_network: false,
        };
        let mut line = String::<MAX_COMMAND_LEN>::new();
        assert!(config.write_command(&mut line).is_ok());
        assert!(line.ends_with("\r\n"));
    }
}
