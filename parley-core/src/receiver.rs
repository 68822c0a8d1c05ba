//! Response line receiver
//!
//! Accumulates bytes from the transport until the line terminator shows up.
//! Only the first `expected_len` bytes of a line are kept: responses are
//! judged by their prefix (`+TEST: TXLRSTR` matches the echo of any packet),
//! and the stored count tells a short line apart from a full match.

use heapless::Vec;
use parley_hal::{Direction, Sink, Transport};

/// Maximum number of response bytes retained per line
pub const RESPONSE_CAPACITY: usize = 20;

/// Byte that completes a response line
pub const LINE_TERMINATOR: u8 = b'\n';

/// Receiver misconfiguration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReceiveError {
    /// Expected length of zero (nothing could ever match)
    ZeroLength,
    /// Expected length beyond [`RESPONSE_CAPACITY`]
    TooLong,
}

impl core::fmt::Display for ReceiveError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::ZeroLength => write!(f, "expected response length is zero"),
            Self::TooLong => write!(
                f,
                "expected response longer than {} bytes",
                RESPONSE_CAPACITY
            ),
        }
    }
}

/// Bounded line accumulator
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LineReceiver {
    buffer: Vec<u8, RESPONSE_CAPACITY>,
    expected_len: usize,
    complete: bool,
}

impl LineReceiver {
    /// Create an unarmed receiver
    pub const fn new() -> Self {
        Self {
            buffer: Vec::new(),
            expected_len: 0,
            complete: false,
        }
    }

    /// Clear the buffer and prepare for a line of `expected_len` bytes
    pub fn arm(&mut self, expected_len: usize) -> Result<(), ReceiveError> {
        self.reset();
        if expected_len == 0 {
            return Err(ReceiveError::ZeroLength);
        }
        if expected_len > RESPONSE_CAPACITY {
            return Err(ReceiveError::TooLong);
        }
        self.expected_len = expected_len;
        Ok(())
    }

    /// Forget everything, including the expected length
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.expected_len = 0;
        self.complete = false;
    }

    /// Offer one byte
    ///
    /// Returns `true` once the line is complete. Bytes offered after
    /// completion are ignored.
    pub fn feed(&mut self, byte: u8) -> bool {
        if self.complete {
            return true;
        }
        if self.buffer.len() < self.expected_len {
            // Cannot overflow: expected_len <= RESPONSE_CAPACITY
            let _ = self.buffer.push(byte);
        }
        if byte == LINE_TERMINATOR {
            self.complete = true;
        }
        self.complete
    }

    /// Pull every byte the transport has buffered, stopping at end of line
    ///
    /// Consumed bytes are mirrored to `sink` when `mirror` is set. Returns
    /// whether the line is complete.
    pub fn poll<T, S>(
        &mut self,
        transport: &mut T,
        sink: &mut S,
        mirror: bool,
    ) -> Result<bool, ReceiveError>
    where
        T: Transport,
        S: Sink,
    {
        if self.expected_len == 0 {
            return Err(ReceiveError::ZeroLength);
        }

        while !self.complete && transport.bytes_available() > 0 {
            let Some(byte) = transport.read_byte() else {
                break;
            };
            self.feed(byte);
            if mirror {
                sink.mirror(Direction::Rx, byte);
            }
        }

        Ok(self.complete)
    }

    /// Whether the terminator has been seen
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Number of bytes retained
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Whether nothing has been retained
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Expected line length the receiver is armed with (0 when unarmed)
    pub fn expected_len(&self) -> usize {
        self.expected_len
    }

    /// Retained bytes
    pub fn received(&self) -> &[u8] {
        &self.buffer
    }

    /// Whether a complete line equals `expected` exactly
    pub fn matches(&self, expected: &[u8]) -> bool {
        self.complete && self.buffer.as_slice() == expected
    }
}
