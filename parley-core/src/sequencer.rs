//! Step sequencer
//!
//! Drives one [`Sequence`] at a time, one unit of work per [`Sequencer::tick`]:
//!
//! ```text
//!            start()
//!   Idle ───────────────► Enter ──── send, arm receiver ────► Awaiting
//!    ▲                      ▲                                    │
//!    │                      │ success / retry                    │ Wait
//!    │ terminal Finish      └──────────── evaluate ◄─────────────┘
//!    │                                       │
//!    └──── abort step ◄── retries exhausted ─┘
//! ```
//!
//! Nothing here sleeps or loops on the transport beyond draining the bytes
//! already buffered; every wait is carried across ticks as state.

use core::time::Duration;

use heapless::Vec;
use parley_hal::{Clock, Direction, Instant, Sink, Transport};

use crate::config::EngineConfig;
use crate::error::{Error, InputError};
use crate::receiver::LineReceiver;
use crate::sequence::Sequence;
use crate::step::{Step, StepId, StepKind, MAX_COMMAND_LEN, MAX_PAYLOAD_LEN};

/// Where the current step is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Phase {
    /// Step entered; outbound not yet sent
    Enter,
    /// Command sent; waiting for the response line
    Awaiting,
    /// Continuous listen; waiting for the line to go quiet
    Listening,
}

/// Verdict on the current wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Outcome {
    /// Still in progress
    Wait,
    /// No complete line before the deadline
    Timeout,
    /// A complete line that is not the expected one
    Mismatch,
    /// Expected line received (or listen went quiet)
    Success,
}

/// Result of a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Status {
    /// A run is in progress; keep ticking
    Active,
    /// The run reached its terminal step; the sequencer is idle
    Idle,
}

/// Judge a response wait
///
/// Rules apply in order: an incomplete line waits until the deadline and
/// then times out; a complete line must have exactly the expected length
/// and content.
pub fn evaluate(
    receiver: &LineReceiver,
    expected: &[u8],
    elapsed: Duration,
    timeout: Duration,
) -> Outcome {
    if !receiver.is_complete() {
        if elapsed < timeout {
            Outcome::Wait
        } else {
            Outcome::Timeout
        }
    } else if receiver.len() != expected.len() {
        Outcome::Mismatch
    } else if receiver.received() == expected {
        Outcome::Success
    } else {
        Outcome::Mismatch
    }
}

/// Collaborators the sequencer talks to
#[derive(Debug)]
struct Io<T, C, S> {
    transport: T,
    clock: C,
    sink: S,
    mirroring: bool,
}

impl<T: Transport, C: Clock, S: Sink> Io<T, C, S> {
    fn mirror_all(&mut self, direction: Direction, bytes: &[u8]) {
        if self.mirroring {
            for &byte in bytes {
                self.sink.mirror(direction, byte);
            }
        }
    }
}

/// Mutable state of the active run
#[derive(Debug, Clone, PartialEq, Eq)]
struct Run<'s> {
    sequence: &'s Sequence,
    step: StepId,
    phase: Phase,
    retries_remaining: u8,
    /// Start of the current wait (last activity, for listen steps)
    armed_at: Instant,
    /// Length of the current wait
    wait: Duration,
    receiver: LineReceiver,
    payload: Vec<u8, MAX_PAYLOAD_LEN>,
}

impl<'s> Run<'s> {
    fn current(&self) -> Option<&'s Step> {
        self.sequence.step(self.step)
    }

    fn goto(&mut self, step: StepId) {
        self.step = step;
        self.phase = Phase::Enter;
    }

    /// Send the step's command and start waiting
    fn enter<T: Transport, C: Clock, S: Sink>(
        &mut self,
        step: &Step,
        io: &mut Io<T, C, S>,
    ) -> Result<(), Error<T::Error>> {
        match &step.kind {
            StepKind::Exchange {
                outbound,
                expected,
                timeout,
            } => {
                self.receiver.arm(expected.len()).map_err(InputError::from)?;

                if !outbound.is_empty() {
                    let stale = io.transport.discard_input();
                    if stale > 0 {
                        trace!("{}: discarded {} stale bytes", step.name, stale);
                    }

                    let mut command = Vec::<u8, MAX_COMMAND_LEN>::new();
                    outbound
                        .render(&self.payload, &mut command)
                        .map_err(|_| InputError::PayloadTooLong {
                            len: self.payload.len(),
                        })?;
                    io.transport.write(&command).map_err(Error::Transport)?;
                    io.mirror_all(Direction::Tx, &command);
                    debug!("{}: sent {} bytes", step.name, command.len());
                }

                self.armed_at = io.clock.now();
                self.wait = *timeout;
                self.phase = Phase::Awaiting;
            }
            StepKind::Listen { idle_timeout } => {
                self.receiver.reset();
                self.armed_at = io.clock.now();
                self.wait = *idle_timeout;
                self.phase = Phase::Listening;
                debug!("{}: listening", step.name);
            }
            // Handled by the sequencer before reaching here
            StepKind::Finish => {}
        }
        Ok(())
    }

    /// Pull in response bytes and judge the wait
    fn await_response<T: Transport, C: Clock, S: Sink>(
        &mut self,
        expected: &[u8],
        io: &mut Io<T, C, S>,
    ) -> Outcome {
        if self
            .receiver
            .poll(&mut io.transport, &mut io.sink, io.mirroring)
            .is_err()
        {
            return Outcome::Mismatch;
        }
        let elapsed = io.clock.now().duration_since(self.armed_at);
        evaluate(&self.receiver, expected, elapsed, self.wait)
    }

    /// Forward listen data and watch for inactivity
    fn listen<T: Transport, C: Clock, S: Sink>(&mut self, io: &mut Io<T, C, S>) -> Outcome {
        let mut heard = 0usize;
        while io.transport.bytes_available() > 0 {
            let Some(byte) = io.transport.read_byte() else {
                break;
            };
            io.sink.deliver(byte);
            if io.mirroring {
                io.sink.mirror(Direction::Rx, byte);
            }
            heard += 1;
        }

        let now = io.clock.now();
        if heard > 0 {
            trace!("listen: {} bytes", heard);
            self.armed_at = now;
            Outcome::Wait
        } else if now.duration_since(self.armed_at) >= self.wait {
            Outcome::Success
        } else {
            Outcome::Wait
        }
    }

    /// Apply the transition policy for an outcome
    fn apply<E>(&mut self, step: &Step, outcome: Outcome, budget: u8) -> Result<(), Error<E>> {
        match outcome {
            Outcome::Wait => Ok(()),
            Outcome::Success => {
                debug!("{}: ok -> {}", step.name, step.on_success.0);
                self.goto(step.on_success);
                self.retries_remaining = budget;
                Ok(())
            }
            Outcome::Timeout | Outcome::Mismatch if self.retries_remaining > 0 => {
                self.retries_remaining -= 1;
                warn!(
                    "{}: {:?}, retrying from {} ({} left)",
                    step.name,
                    outcome,
                    step.on_failure.0,
                    self.retries_remaining
                );
                self.goto(step.on_failure);
                Ok(())
            }
            Outcome::Timeout | Outcome::Mismatch => {
                let failed = self.step;
                error!("{}: {:?} with no retries left, aborting", step.name, outcome);
                self.goto(self.sequence.abort());
                Err(Error::RetriesExhausted { step: failed })
            }
        }
    }
}

/// Non-blocking command/response sequencer
///
/// Owns the transport, the clock and the traffic sink. At most one run is
/// active; [`start`](Self::start) replaces any run in progress without
/// touching the transport.
#[derive(Debug)]
pub struct Sequencer<'s, T, C, S> {
    io: Io<T, C, S>,
    config: EngineConfig,
    run: Option<Run<'s>>,
}

impl<'s, T, C, S> Sequencer<'s, T, C, S>
where
    T: Transport,
    C: Clock,
    S: Sink,
{
    /// Create an idle sequencer
    pub fn new(transport: T, clock: C, sink: S, config: EngineConfig) -> Self {
        Self {
            io: Io {
                transport,
                clock,
                sink,
                mirroring: false,
            },
            config,
            run: None,
        }
    }

    /// Drop any run and configure the transport line
    pub fn init(&mut self) -> Result<(), Error<T::Error>> {
        self.run = None;
        let uart = self.config.uart();
        self.io
            .transport
            .configure(&uart)
            .map_err(Error::Transport)?;
        info!("sequencer initialised at {} baud", uart.baudrate);
        Ok(())
    }

    /// Begin running `sequence` from its start step
    ///
    /// `payload` is substituted into payload steps; it is copied in and kept
    /// for the whole run, retries included. An oversize payload is rejected
    /// and the current state, active run included, is left untouched.
    pub fn start(
        &mut self,
        sequence: &'s Sequence,
        payload: Option<&[u8]>,
    ) -> Result<(), Error<T::Error>> {
        let payload = payload.unwrap_or(&[]);
        let payload = Vec::from_slice(payload).map_err(|_| InputError::PayloadTooLong {
            len: payload.len(),
        })?;

        if let Some(run) = &self.run {
            warn!("preempting active run at step {}", run.step.0);
        }

        let start = sequence.start();
        info!(
            "starting sequence at step {} ({} byte payload)",
            start.0,
            payload.len()
        );
        self.run = Some(Run {
            sequence,
            step: start,
            phase: Phase::Enter,
            retries_remaining: self.config.retry_budget,
            armed_at: self.io.clock.now(),
            wait: Duration::ZERO,
            receiver: LineReceiver::new(),
            payload,
        });
        Ok(())
    }

    /// Advance the active run by one unit of work
    ///
    /// Returns [`Status::Idle`] on the tick that completes a one-shot
    /// sequence. [`Error::RetriesExhausted`] is reported once, on the tick
    /// that gives up; the run is then positioned on the abort step and
    /// further ticks carry out the cleanup. Ticking with no run is
    /// [`Error::InvalidState`].
    pub fn tick(&mut self) -> Result<Status, Error<T::Error>> {
        let budget = self.config.retry_budget;
        let Some(run) = self.run.as_mut() else {
            error!("tick with no active run");
            return Err(Error::InvalidState);
        };
        let Some(step) = run.current() else {
            // Unreachable for validated sequences
            error!("run positioned on missing step {}", run.step.0);
            self.run = None;
            return Err(Error::InvalidState);
        };

        match (&step.kind, run.phase) {
            (StepKind::Finish, _) => {
                if step.terminal {
                    info!("{}: sequence complete", step.name);
                    self.run = None;
                    return Ok(Status::Idle);
                }
                debug!("{}: restarting at {}", step.name, step.on_success.0);
                run.goto(step.on_success);
                run.retries_remaining = budget;
            }
            (_, Phase::Enter) => run.enter(step, &mut self.io)?,
            (StepKind::Exchange { expected, .. }, Phase::Awaiting) => {
                let outcome = run.await_response(expected, &mut self.io);
                run.apply(step, outcome, budget)?;
            }
            (StepKind::Listen { .. }, Phase::Listening) => {
                let outcome = run.listen(&mut self.io);
                run.apply(step, outcome, budget)?;
            }
            // Phase always matches the step kind once entered
            (_, phase) => {
                error!("{}: inconsistent phase {:?}", step.name, phase);
                run.goto(run.step);
            }
        }

        Ok(Status::Active)
    }

    /// Whether no run is active
    pub fn is_idle(&self) -> bool {
        self.run.is_none()
    }

    /// Step the active run is on
    pub fn current_step(&self) -> Option<StepId> {
        self.run.as_ref().map(|run| run.step)
    }

    /// Name of the step the active run is on
    pub fn current_step_name(&self) -> Option<&'static str> {
        self.run.as_ref().and_then(|run| run.current()).map(|step| step.name)
    }

    /// Phase of the active run
    pub fn phase(&self) -> Option<Phase> {
        self.run.as_ref().map(|run| run.phase)
    }

    /// Retries left for the current step
    pub fn retries_remaining(&self) -> Option<u8> {
        self.run.as_ref().map(|run| run.retries_remaining)
    }

    /// Bytes retained from the current response line
    ///
    /// Valid until the next step is entered; lets callers pick values out
    /// of an accepted response.
    pub fn received(&self) -> &[u8] {
        self.run
            .as_ref()
            .map(|run| run.receiver.received())
            .unwrap_or(&[])
    }

    /// Mirror all traffic to the sink
    pub fn set_mirroring(&mut self, on: bool) {
        self.io.mirroring = on;
    }

    /// Whether traffic is mirrored
    pub fn is_mirroring(&self) -> bool {
        self.io.mirroring
    }

    /// Engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Give back the collaborators
    pub fn release(self) -> (T, C, S) {
        (self.io.transport, self.io.clock, self.io.sink)
    }
}
