//! Buffered UART transport
//!
//! The embassy-rp buffered UART fills a ring buffer from its interrupt
//! handler; this wrapper drains it without awaiting. `embedded_io` only
//! reports whether data is ready, not how much, so bytes are staged in a
//! small local queue to answer `bytes_available`. Outgoing commands go
//! through a [`TxStage`] so a full transmit ring never stalls the caller.

use embassy_rp::uart::{self, BufferedUart};
use embedded_io::{Read, ReadReady};
use heapless::Deque;
use parley_hal::staging::{StageError, TxStage};
use parley_hal::uart::{DataBits, Parity, StopBits};
use parley_hal::{Transport, UartConfig};

/// Bytes pulled from the driver per refill
const STAGING_SIZE: usize = 32;

/// Longest command line accepted in one write
const TX_STAGE_SIZE: usize = 128;

/// Transport errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportError {
    /// UART driver error (overrun, framing, break, parity)
    Uart(uart::Error),
    /// Line settings differ from those the UART was built with; the
    /// buffered driver cannot be reconfigured in place
    Reconfigure,
    /// Previous command still queued for the transmit ring
    Busy,
    /// Command longer than the transmit stage
    CommandTooLong,
}

impl From<uart::Error> for TransportError {
    fn from(e: uart::Error) -> Self {
        TransportError::Uart(e)
    }
}

impl From<StageError<uart::Error>> for TransportError {
    fn from(e: StageError<uart::Error>) -> Self {
        match e {
            StageError::Busy => TransportError::Busy,
            StageError::TooLong => TransportError::CommandTooLong,
            StageError::Io(e) => TransportError::Uart(e),
        }
    }
}

/// Convert line settings to the embassy-rp UART configuration
pub fn uart_config(config: &UartConfig) -> uart::Config {
    let mut out = uart::Config::default();
    out.baudrate = config.baudrate;
    out.data_bits = match config.data_bits {
        DataBits::Seven => uart::DataBits::DataBits7,
        DataBits::Eight => uart::DataBits::DataBits8,
    };
    out.parity = match config.parity {
        Parity::None => uart::Parity::ParityNone,
        Parity::Even => uart::Parity::ParityEven,
        Parity::Odd => uart::Parity::ParityOdd,
    };
    out.stop_bits = match config.stop_bits {
        StopBits::One => uart::StopBits::STOP1,
        StopBits::Two => uart::StopBits::STOP2,
    };
    out
}

/// Non-blocking transport over a buffered UART
pub struct BufferedTransport {
    uart: BufferedUart,
    /// Settings the UART was created with
    config: UartConfig,
    staged: Deque<u8, STAGING_SIZE>,
    tx: TxStage<TX_STAGE_SIZE>,
}

impl BufferedTransport {
    /// Wrap a UART built with `uart_config(&config)`
    pub fn new(uart: BufferedUart, config: UartConfig) -> Self {
        Self {
            uart,
            config,
            staged: Deque::new(),
            tx: TxStage::new(),
        }
    }

    /// Move pending transmit bytes along and pull in received ones
    ///
    /// Receive errors (overrun, framing) drop the affected bytes; the
    /// response then fails to match and the step is retried.
    fn refill(&mut self) {
        // A transmit error resurfaces on the next write
        let _ = self.tx.flush(&mut self.uart);

        if !self.staged.is_empty() {
            return;
        }
        if !matches!(self.uart.read_ready(), Ok(true)) {
            return;
        }

        let mut buf = [0u8; STAGING_SIZE];
        if let Ok(n) = self.uart.read(&mut buf) {
            for &byte in &buf[..n] {
                // Cannot overflow: staging was empty and n <= STAGING_SIZE
                let _ = self.staged.push_back(byte);
            }
        }
    }
}

impl Transport for BufferedTransport {
    type Error = TransportError;

    fn configure(&mut self, config: &UartConfig) -> Result<(), TransportError> {
        if *config == self.config {
            Ok(())
        } else {
            Err(TransportError::Reconfigure)
        }
    }

    /// Stages the command and copies what fits into the driver's transmit
    /// ring; the rest follows on later polls
    fn write(&mut self, data: &[u8]) -> Result<(), TransportError> {
        self.tx.submit(&mut self.uart, data)?;
        Ok(())
    }

    fn bytes_available(&mut self) -> usize {
        self.refill();
        self.staged.len()
    }

    fn read_byte(&mut self) -> Option<u8> {
        self.refill();
        self.staged.pop_front()
    }
}
