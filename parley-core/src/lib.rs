//! Board-agnostic core of the Parley radio sequencer
//!
//! This crate drives a serial-attached radio module through a scripted
//! AT command dialogue without ever blocking:
//!
//! - Line receiver (bounded accumulation of a response line)
//! - Step graph (commands, expected responses, transition targets)
//! - Sequencer (one unit of work per `tick`, retry and timeout policy)
//! - Engine configuration
//!
//! Device-specific command tables live elsewhere; the engine accepts any
//! validated [`Sequence`].

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

#[macro_use]
mod fmt;

pub mod config;
pub mod error;
pub mod receiver;
pub mod sequence;
pub mod sequencer;
pub mod step;

pub use config::EngineConfig;
pub use error::{Error, InputError};
pub use receiver::{LineReceiver, ReceiveError, LINE_TERMINATOR, RESPONSE_CAPACITY};
pub use sequence::{Sequence, SequenceBuilder, SequenceError, MAX_STEPS, MAX_TIMEOUT};
pub use sequencer::{Outcome, Phase, Sequencer, Status};
pub use step::{Outbound, Step, StepId, StepKind, MAX_COMMAND_LEN, MAX_PAYLOAD_LEN};
