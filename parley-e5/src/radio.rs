//! Node-level radio facade
//!
//! Wraps a [`Sequencer`] with the two LoRa-E5 dialogues so application code
//! deals in packets rather than steps. `poll` is meant to be called from
//! the main loop on every iteration.

use parley_core::{Error, Sequencer, Status};
use parley_hal::{Clock, Sink, Transport};

use crate::config::E5Config;
use crate::packet::{validate_packet, PacketError};
use crate::sequences::E5Sequences;

/// Facade error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RadioError<E> {
    /// Packet cannot be framed; nothing was started
    Packet(PacketError),
    /// Engine failure
    Engine(Error<E>),
}

impl<E> From<PacketError> for RadioError<E> {
    fn from(e: PacketError) -> Self {
        RadioError::Packet(e)
    }
}

impl<E> From<Error<E>> for RadioError<E> {
    fn from(e: Error<E>) -> Self {
        RadioError::Engine(e)
    }
}

impl<E: core::fmt::Debug> core::fmt::Display for RadioError<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Packet(e) => write!(f, "rejected packet: {}", e),
            Self::Engine(e) => write!(f, "{}", e),
        }
    }
}

/// Which dialogue is running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Activity {
    Idle,
    Transmitting,
    Receiving,
}

/// LoRa-E5 node driver
pub struct Radio<'s, T, C, S> {
    sequencer: Sequencer<'s, T, C, S>,
    sequences: &'s E5Sequences,
    activity: Activity,
}

impl<'s, T, C, S> Radio<'s, T, C, S>
where
    T: Transport,
    C: Clock,
    S: Sink,
{
    pub fn new(
        transport: T,
        clock: C,
        sink: S,
        sequences: &'s E5Sequences,
        config: &E5Config,
    ) -> Self {
        Self {
            sequencer: Sequencer::new(transport, clock, sink, config.engine()),
            sequences,
            activity: Activity::Idle,
        }
    }

    /// Configure the serial line; abandons any dialogue in progress
    pub fn init(&mut self) -> Result<(), Error<T::Error>> {
        self.activity = Activity::Idle;
        self.sequencer.init()
    }

    /// Queue `packet` for transmission
    ///
    /// Replaces whatever dialogue is running. The module is put to sleep
    /// once the packet is out.
    pub fn send_packet(&mut self, packet: &[u8]) -> Result<(), RadioError<T::Error>> {
        if let Err(e) = validate_packet(packet) {
            #[cfg(feature = "defmt")]
            defmt::warn!("send_packet: {:?}", e);
            #[cfg(all(feature = "log", not(feature = "defmt")))]
            log::warn!("send_packet: {}", e);
            return Err(e.into());
        }
        let sequences = self.sequences;
        self.sequencer.start(&sequences.transmit, Some(packet))?;
        self.activity = Activity::Transmitting;
        Ok(())
    }

    /// Start listening for packets until told otherwise
    ///
    /// Received lines are delivered byte by byte to the sink.
    pub fn listen(&mut self) -> Result<(), RadioError<T::Error>> {
        let sequences = self.sequences;
        self.sequencer.start(&sequences.receive, None)?;
        self.activity = Activity::Receiving;
        Ok(())
    }

    /// Give the running dialogue a slice of time
    ///
    /// Returns [`Status::Idle`] when there is nothing to do, so it can be
    /// called unconditionally from a polling loop.
    pub fn poll(&mut self) -> Result<Status, Error<T::Error>> {
        if self.sequencer.is_idle() {
            self.activity = Activity::Idle;
            return Ok(Status::Idle);
        }
        let status = self.sequencer.tick()?;
        if status == Status::Idle {
            self.activity = Activity::Idle;
        }
        Ok(status)
    }

    /// Whether a dialogue is in progress
    pub fn is_busy(&self) -> bool {
        !self.sequencer.is_idle()
    }

    pub fn activity(&self) -> Activity {
        self.activity
    }

    /// Mirror AT traffic to the sink
    pub fn set_mirroring(&mut self, on: bool) {
        self.sequencer.set_mirroring(on);
    }

    /// Underlying engine, for inspection
    pub fn sequencer(&self) -> &Sequencer<'s, T, C, S> {
        &self.sequencer
    }

    /// Give back the collaborators
    pub fn release(self) -> (T, C, S) {
        self.sequencer.release()
    }
}
