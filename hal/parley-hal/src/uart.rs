//! UART serial communication abstractions
//!
//! The sequencer is polled from a loop and must never wait on the line, so
//! the transport contract is strictly non-blocking: ask how many bytes are
//! buffered, pull one at a time, and hand whole commands to the driver's
//! transmit buffer.

/// Non-blocking serial transport
pub trait Transport {
    /// Error type for transport operations
    type Error;

    /// Apply a line configuration (baud rate, framing)
    fn configure(&mut self, config: &UartConfig) -> Result<(), Self::Error>;

    /// Queue bytes for transmission
    ///
    /// Must not wait for the bytes to leave the wire.
    fn write(&mut self, data: &[u8]) -> Result<(), Self::Error>;

    /// Number of received bytes that can be read without waiting
    fn bytes_available(&mut self) -> usize;

    /// Read one received byte, or `None` if nothing is buffered
    fn read_byte(&mut self) -> Option<u8>;

    /// Discard everything currently buffered on the receive side
    ///
    /// Returns the number of bytes dropped.
    fn discard_input(&mut self) -> usize {
        let mut dropped = 0;
        while self.bytes_available() > 0 {
            if self.read_byte().is_none() {
                break;
            }
            dropped += 1;
        }
        dropped
    }
}

/// UART configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UartConfig {
    /// Baud rate in bits per second
    pub baudrate: u32,
    /// Number of data bits (typically 8)
    pub data_bits: DataBits,
    /// Parity mode
    pub parity: Parity,
    /// Number of stop bits
    pub stop_bits: StopBits,
}

impl UartConfig {
    /// 8N1 at the given baud rate
    pub const fn with_baudrate(baudrate: u32) -> Self {
        Self {
            baudrate,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
        }
    }
}

impl Default for UartConfig {
    /// AT-command radio modules ship at 9600 8N1
    fn default() -> Self {
        Self::with_baudrate(9600)
    }
}

/// Number of data bits per frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DataBits {
    Seven,
    Eight,
}

/// Parity mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Parity {
    None,
    Even,
    Odd,
}

/// Number of stop bits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StopBits {
    One,
    Two,
}
