//! Step definitions
//!
//! A step pairs what to send with what to wait for, and names where the
//! run goes on success and on failure. Steps are plain data: the sequencer
//! interprets them, nothing here performs I/O.

use core::time::Duration;

use heapless::Vec;

use crate::receiver::RESPONSE_CAPACITY;

/// Largest caller payload accepted by `start`
pub const MAX_PAYLOAD_LEN: usize = 60;

/// Largest rendered command, payload framing included
pub const MAX_COMMAND_LEN: usize = 96;

/// Largest text appended after a payload (closing quote and CR/LF)
pub const MAX_SUFFIX_LEN: usize = 8;

/// Index of a step within its sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StepId(pub u8);

impl StepId {
    /// Position in the step table
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl core::fmt::Display for StepId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Bytes written when a step is entered
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Outbound {
    /// Nothing is sent; the step only waits
    #[default]
    None,
    /// A fixed command line
    Fixed(Vec<u8, MAX_COMMAND_LEN>),
    /// `prefix`, the caller's payload, then `suffix`
    Payload {
        prefix: Vec<u8, MAX_COMMAND_LEN>,
        suffix: Vec<u8, MAX_SUFFIX_LEN>,
    },
}

/// Outbound bytes did not fit their buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Overflow;

impl Outbound {
    /// Fixed command line
    pub fn fixed(command: &[u8]) -> Result<Self, Overflow> {
        Vec::from_slice(command)
            .map(Outbound::Fixed)
            .map_err(|_| Overflow)
    }

    /// Payload framed by `prefix` and `suffix`
    pub fn payload(prefix: &[u8], suffix: &[u8]) -> Result<Self, Overflow> {
        Ok(Outbound::Payload {
            prefix: Vec::from_slice(prefix).map_err(|_| Overflow)?,
            suffix: Vec::from_slice(suffix).map_err(|_| Overflow)?,
        })
    }

    /// Whether entering the step writes anything
    pub fn is_empty(&self) -> bool {
        match self {
            Outbound::None => true,
            Outbound::Fixed(command) => command.is_empty(),
            Outbound::Payload { .. } => false,
        }
    }

    /// Length of the framing around a payload (0 for non-payload steps)
    pub fn framing_len(&self) -> usize {
        match self {
            Outbound::Payload { prefix, suffix } => prefix.len() + suffix.len(),
            _ => 0,
        }
    }

    /// Render the bytes to write, substituting `payload` where framed
    pub fn render(&self, payload: &[u8], out: &mut Vec<u8, MAX_COMMAND_LEN>) -> Result<(), Overflow> {
        out.clear();
        match self {
            Outbound::None => Ok(()),
            Outbound::Fixed(command) => out.extend_from_slice(command).map_err(|_| Overflow),
            Outbound::Payload { prefix, suffix } => {
                out.extend_from_slice(prefix).map_err(|_| Overflow)?;
                out.extend_from_slice(payload).map_err(|_| Overflow)?;
                out.extend_from_slice(suffix).map_err(|_| Overflow)
            }
        }
    }
}

/// What a step does
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepKind {
    /// Send `outbound`, then wait up to `timeout` for a line starting with
    /// `expected`
    Exchange {
        outbound: Outbound,
        expected: Vec<u8, RESPONSE_CAPACITY>,
        timeout: Duration,
    },
    /// Forward every received byte to the sink until the line has been
    /// quiet for `idle_timeout`
    Listen { idle_timeout: Duration },
    /// No I/O; ends the run when the step is terminal, otherwise jumps to
    /// `on_success` with a fresh retry budget
    Finish,
}

/// One node of a sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    /// Short label for logs
    pub name: &'static str,
    /// Behaviour
    pub kind: StepKind,
    /// Next step after a success
    pub on_success: StepId,
    /// Step to retry from after a timeout or mismatch
    pub on_failure: StepId,
    /// For `Finish` steps: end the run instead of continuing
    pub terminal: bool,
}

impl Step {
    /// Whether this is a `Finish` step that ends the run
    pub fn ends_run(&self) -> bool {
        self.terminal && matches!(self.kind, StepKind::Finish)
    }

    /// Expected response, for `Exchange` steps
    pub fn expected(&self) -> Option<&[u8]> {
        match &self.kind {
            StepKind::Exchange { expected, .. } => Some(expected.as_slice()),
            _ => None,
        }
    }
}
