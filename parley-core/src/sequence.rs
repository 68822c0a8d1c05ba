//! Step graphs
//!
//! A [`Sequence`] is a validated table of steps with a designated start and
//! a designated abort (cleanup) step. Validation happens once, at
//! construction, so the sequencer can index freely at run time.

use core::time::Duration;

use heapless::Vec;

use crate::receiver::RESPONSE_CAPACITY;
use crate::step::{Outbound, Step, StepId, StepKind, MAX_COMMAND_LEN, MAX_PAYLOAD_LEN};

/// Maximum steps per sequence
pub const MAX_STEPS: usize = 16;

/// Longest wait a step may declare
///
/// Elapsed time is measured on a wrapping 32-bit millisecond counter, so a
/// deadline must fall within half its range to be reachable.
pub const MAX_TIMEOUT: Duration = Duration::from_millis((u32::MAX / 2) as u64 - 1);

/// Reasons a step graph is rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SequenceError {
    /// No steps at all
    Empty,
    /// More than [`MAX_STEPS`] steps
    TooManySteps,
    /// Start or abort step is out of range
    UnknownStep(StepId),
    /// A transition target is out of range
    DanglingTarget { step: StepId, target: StepId },
    /// Expected response is empty
    EmptyExpected(StepId),
    /// Expected response exceeds the receiver capacity
    ExpectedTooLong(StepId),
    /// Outbound command (or payload framing) cannot fit the command buffer
    CommandTooLong(StepId),
    /// A timeout of zero would fail before the module can answer
    ZeroTimeout(StepId),
    /// A timeout beyond [`MAX_TIMEOUT`] would never expire
    TimeoutTooLong(StepId),
    /// The abort step must be a `Finish` step
    AbortNotFinish(StepId),
}

impl core::fmt::Display for SequenceError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Empty => write!(f, "sequence has no steps"),
            Self::TooManySteps => write!(f, "sequence exceeds {} steps", MAX_STEPS),
            Self::UnknownStep(id) => write!(f, "step {} does not exist", id),
            Self::DanglingTarget { step, target } => {
                write!(f, "step {} points at missing step {}", step, target)
            }
            Self::EmptyExpected(id) => write!(f, "step {} expects an empty response", id),
            Self::ExpectedTooLong(id) => write!(
                f,
                "step {} expects more than {} response bytes",
                id, RESPONSE_CAPACITY
            ),
            Self::CommandTooLong(id) => write!(
                f,
                "step {} command exceeds {} bytes",
                id, MAX_COMMAND_LEN
            ),
            Self::ZeroTimeout(id) => write!(f, "step {} has a zero timeout", id),
            Self::TimeoutTooLong(id) => write!(
                f,
                "step {} timeout exceeds {} ms",
                id,
                MAX_TIMEOUT.as_millis()
            ),
            Self::AbortNotFinish(id) => write!(f, "abort step {} is not a finish step", id),
        }
    }
}

fn check_timeout(id: StepId, timeout: Duration) -> Result<(), SequenceError> {
    if timeout.is_zero() {
        Err(SequenceError::ZeroTimeout(id))
    } else if timeout > MAX_TIMEOUT {
        Err(SequenceError::TimeoutTooLong(id))
    } else {
        Ok(())
    }
}

/// Validated step graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sequence {
    steps: Vec<Step, MAX_STEPS>,
    start: StepId,
    abort: StepId,
}

impl Sequence {
    /// Build a sequence from a step table
    pub fn new(steps: &[Step], start: StepId, abort: StepId) -> Result<Self, SequenceError> {
        let steps = Vec::from_slice(steps).map_err(|_| SequenceError::TooManySteps)?;
        let sequence = Self {
            steps,
            start,
            abort,
        };
        sequence.validate()?;
        Ok(sequence)
    }

    fn validate(&self) -> Result<(), SequenceError> {
        if self.steps.is_empty() {
            return Err(SequenceError::Empty);
        }
        for id in [self.start, self.abort] {
            if self.step(id).is_none() {
                return Err(SequenceError::UnknownStep(id));
            }
        }
        if !matches!(self.steps[self.abort.index()].kind, StepKind::Finish) {
            return Err(SequenceError::AbortNotFinish(self.abort));
        }

        for (index, step) in self.steps.iter().enumerate() {
            let id = StepId(index as u8);
            for target in [step.on_success, step.on_failure] {
                if self.step(target).is_none() {
                    return Err(SequenceError::DanglingTarget { step: id, target });
                }
            }

            match &step.kind {
                StepKind::Exchange {
                    outbound,
                    expected,
                    timeout,
                } => {
                    if expected.is_empty() {
                        return Err(SequenceError::EmptyExpected(id));
                    }
                    if expected.len() > RESPONSE_CAPACITY {
                        return Err(SequenceError::ExpectedTooLong(id));
                    }
                    check_timeout(id, *timeout)?;
                    if matches!(outbound, Outbound::Payload { .. })
                        && outbound.framing_len() + MAX_PAYLOAD_LEN > MAX_COMMAND_LEN
                    {
                        return Err(SequenceError::CommandTooLong(id));
                    }
                }
                StepKind::Listen { idle_timeout } => check_timeout(id, *idle_timeout)?,
                StepKind::Finish => {}
            }
        }

        Ok(())
    }

    /// Look up a step
    pub fn step(&self, id: StepId) -> Option<&Step> {
        self.steps.get(id.index())
    }

    /// Step a run begins with
    pub fn start(&self) -> StepId {
        self.start
    }

    /// Cleanup step entered when retries run out
    pub fn abort(&self) -> StepId {
        self.abort
    }

    /// Number of steps
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether the sequence has no steps (never true once validated)
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// All steps, in table order
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Find a step by name
    pub fn find(&self, name: &str) -> Option<StepId> {
        self.steps
            .iter()
            .position(|step| step.name == name)
            .map(|index| StepId(index as u8))
    }
}

/// Incremental sequence construction
///
/// Steps are appended in order. By default a step succeeds into the next
/// one appended and retries itself on failure; `Finish` steps point at
/// themselves. Errors are collected and reported by [`build`](Self::build),
/// so step definitions can be written without `?` on every line.
#[derive(Debug, Default)]
pub struct SequenceBuilder {
    steps: Vec<Step, MAX_STEPS>,
    error: Option<SequenceError>,
}

impl SequenceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&self) -> StepId {
        StepId(self.steps.len() as u8)
    }

    fn fail(&mut self, error: SequenceError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    fn push(&mut self, name: &'static str, kind: StepKind) -> StepId {
        let id = self.next_id();
        let on_success = match kind {
            StepKind::Finish => id,
            _ => StepId(id.0.saturating_add(1)),
        };
        let step = Step {
            name,
            kind,
            on_success,
            on_failure: id,
            terminal: false,
        };
        if self.steps.push(step).is_err() {
            self.fail(SequenceError::TooManySteps);
        }
        id
    }

    /// Append a step that sends `outbound` and waits for `expected`
    pub fn exchange(
        &mut self,
        name: &'static str,
        outbound: Outbound,
        expected: &[u8],
        timeout: Duration,
    ) -> StepId {
        let id = self.next_id();
        let expected = match Vec::from_slice(expected) {
            Ok(expected) => expected,
            Err(()) => {
                self.fail(SequenceError::ExpectedTooLong(id));
                Vec::new()
            }
        };
        self.push(
            name,
            StepKind::Exchange {
                outbound,
                expected,
                timeout,
            },
        )
    }

    /// Append a step that sends a fixed command line
    pub fn command(
        &mut self,
        name: &'static str,
        command: &[u8],
        expected: &[u8],
        timeout: Duration,
    ) -> StepId {
        let outbound = match Outbound::fixed(command) {
            Ok(outbound) => outbound,
            Err(_) => {
                self.fail(SequenceError::CommandTooLong(self.next_id()));
                Outbound::None
            }
        };
        self.exchange(name, outbound, expected, timeout)
    }

    /// Append a step that sends the run's payload between `prefix` and `suffix`
    pub fn payload(
        &mut self,
        name: &'static str,
        prefix: &[u8],
        suffix: &[u8],
        expected: &[u8],
        timeout: Duration,
    ) -> StepId {
        let outbound = match Outbound::payload(prefix, suffix) {
            Ok(outbound) => outbound,
            Err(_) => {
                self.fail(SequenceError::CommandTooLong(self.next_id()));
                Outbound::None
            }
        };
        self.exchange(name, outbound, expected, timeout)
    }

    /// Append a step that sends nothing and waits for `expected`
    pub fn await_line(&mut self, name: &'static str, expected: &[u8], timeout: Duration) -> StepId {
        self.exchange(name, Outbound::None, expected, timeout)
    }

    /// Append a continuous-listen step
    pub fn listen(&mut self, name: &'static str, idle_timeout: Duration) -> StepId {
        self.push(name, StepKind::Listen { idle_timeout })
    }

    /// Append a `Finish` step
    pub fn finish(&mut self, name: &'static str, terminal: bool) -> StepId {
        let id = self.push(name, StepKind::Finish);
        if let Some(step) = self.steps.get_mut(id.index()) {
            step.terminal = terminal;
        }
        id
    }

    /// Redirect the success transition of `step`
    pub fn on_success(&mut self, step: StepId, target: StepId) -> &mut Self {
        match self.steps.get_mut(step.index()) {
            Some(s) => s.on_success = target,
            None => self.fail(SequenceError::UnknownStep(step)),
        }
        self
    }

    /// Redirect the failure transition of `step`
    pub fn on_failure(&mut self, step: StepId, target: StepId) -> &mut Self {
        match self.steps.get_mut(step.index()) {
            Some(s) => s.on_failure = target,
            None => self.fail(SequenceError::UnknownStep(step)),
        }
        self
    }

    /// Validate and produce the sequence
    pub fn build(self, start: StepId, abort: StepId) -> Result<Sequence, SequenceError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        let sequence = Sequence {
            steps: self.steps,
            start,
            abort,
        };
        sequence.validate()?;
        Ok(sequence)
    }
}
