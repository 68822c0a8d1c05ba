//! Transmit and receive dialogues
//!
//! Both open with the same three steps: handshake, switch to test mode,
//! apply the radio configuration. Every step retries itself on failure
//! except the transmit-done wait, which goes back and sends the packet
//! again.

use parley_core::{Sequence, SequenceBuilder, SequenceError};

use crate::commands::*;
use crate::config::E5Config;

/// The pair of dialogues a node runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct E5Sequences {
    /// One-shot: send the run's payload as a packet, then sleep
    pub transmit: Sequence,
    /// Endless: listen for packets, resetting the module after each
    /// quiet period
    pub receive: Sequence,
}

impl E5Sequences {
    pub fn new(config: &E5Config) -> Result<Self, SequenceError> {
        Ok(Self {
            transmit: transmit(config)?,
            receive: receive(config)?,
        })
    }
}

/// Handshake, test mode and radio configuration
fn setup(b: &mut SequenceBuilder, config: &E5Config) {
    let timeout = config.command_timeout();
    b.command("at", AT, AT_OK, timeout);
    b.command("mode", MODE_TEST, MODE_TEST_OK, timeout);
    b.command("rfcfg", config.radio.command().as_bytes(), RFCFG_OK, timeout);
}

/// Build the transmit sequence
///
/// The payload given to `start` is framed as `AT+TEST=TXLRSTR,"<payload>"`.
/// The sequence ends (terminal) after the module confirms it is asleep, or
/// after a step runs out of retries.
pub fn transmit(config: &E5Config) -> Result<Sequence, SequenceError> {
    let mut b = SequenceBuilder::new();
    setup(&mut b, config);

    let send = b.payload(
        "transmit",
        TXLRSTR_PREFIX,
        TXLRSTR_SUFFIX,
        TXLRSTR_OK,
        config.command_timeout(),
    );
    let done = b.await_line("tx_done", TX_DONE, config.tx_done_timeout());
    b.on_failure(done, send);
    b.command("low_power", LOW_POWER, LOW_POWER_OK, config.command_timeout());
    let cleanup = b.finish("cleanup", true);

    b.build(parley_core::StepId(0), cleanup)
}

/// Build the receive sequence
///
/// Never ends on its own: the final step loops back to the handshake, and
/// so does a step that runs out of retries.
pub fn receive(config: &E5Config) -> Result<Sequence, SequenceError> {
    let mut b = SequenceBuilder::new();
    setup(&mut b, config);

    b.command("rx", RXLRPKT, RXLRPKT_OK, config.command_timeout());
    b.listen("listen", config.listen_idle_timeout());
    b.command("stop", STOP, STOP_OK, config.command_timeout());
    b.command("reset", RESET, RESET_OK, config.command_timeout());
    let cleanup = b.finish("cleanup", false);
    let start = parley_core::StepId(0);
    b.on_success(cleanup, start);

    b.build(start, cleanup)
}
