//! Errors surfaced to the caller of the sequencer
//!
//! Timeouts and mismatches never show up here: they are recovered inside
//! the sequencer by retrying. What remains is either a caller mistake or a
//! definitive failure.

use crate::receiver::ReceiveError;
use crate::step::{StepId, MAX_PAYLOAD_LEN};

/// Rejected input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InputError {
    /// Payload longer than [`MAX_PAYLOAD_LEN`]
    PayloadTooLong { len: usize },
    /// A step expects an empty response
    EmptyExpected,
    /// A step expects a response longer than the receiver holds
    ExpectedTooLong,
}

impl From<ReceiveError> for InputError {
    fn from(e: ReceiveError) -> Self {
        match e {
            ReceiveError::ZeroLength => InputError::EmptyExpected,
            ReceiveError::TooLong => InputError::ExpectedTooLong,
        }
    }
}

impl core::fmt::Display for InputError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::PayloadTooLong { len } => write!(
                f,
                "payload of {} bytes exceeds {} bytes",
                len, MAX_PAYLOAD_LEN
            ),
            Self::EmptyExpected => write!(f, "expected response is empty"),
            Self::ExpectedTooLong => write!(f, "expected response too long"),
        }
    }
}

/// Sequencer error
///
/// The generic parameter carries the transport's own error type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// `tick` called with no active run
    InvalidState,
    /// Input rejected; the sequencer state is unchanged
    InvalidInput(InputError),
    /// `step` failed more times than the retry budget allows. The run has
    /// already moved to the sequence's abort step.
    RetriesExhausted { step: StepId },
    /// The transport refused a write or configuration
    Transport(E),
}

impl<E> From<InputError> for Error<E> {
    fn from(e: InputError) -> Self {
        Error::InvalidInput(e)
    }
}

impl<E: core::fmt::Debug> core::fmt::Display for Error<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::InvalidState => write!(f, "sequencer ticked while idle"),
            Self::InvalidInput(e) => write!(f, "invalid input: {}", e),
            Self::RetriesExhausted { step } => write!(f, "retries exhausted at step {}", step),
            Self::Transport(e) => write!(f, "transport error: {:?}", e),
        }
    }
}
