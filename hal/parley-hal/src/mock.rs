//! Host-side collaborators for tests and simulation
//!
//! Each mock is a cheap handle around shared state: clone it, give one
//! copy to the sequencer and keep the other to feed bytes, move time and
//! inspect what was written.

use core::cell::{Cell, RefCell};
use core::time::Duration;
use std::collections::VecDeque;
use std::rc::Rc;
use std::vec::Vec;

use crate::clock::{Clock, Instant};
use crate::sink::{Direction, Sink};
use crate::uart::{Transport, UartConfig};

/// Error injected by [`MockTransport`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockError {
    /// Writes were configured to fail
    WriteFailed,
}

#[derive(Debug, Default)]
struct TransportState {
    rx: VecDeque<u8>,
    commands: Vec<Vec<u8>>,
    replies: Vec<(Vec<u8>, Vec<u8>)>,
    config: Option<UartConfig>,
    fail_writes: bool,
}

/// Scripted serial transport
///
/// Received bytes are queued with [`push_rx`](Self::push_rx) or produced
/// automatically by reply rules registered with
/// [`reply_to`](Self::reply_to).
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    state: Rc<RefCell<TransportState>>,
}

impl MockTransport {
    /// Create an idle transport with nothing buffered
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue bytes as if they had arrived from the module
    pub fn push_rx(&self, bytes: &[u8]) {
        self.state.borrow_mut().rx.extend(bytes.iter().copied());
    }

    /// Bytes queued but not yet read
    pub fn pending_rx(&self) -> usize {
        self.state.borrow().rx.len()
    }

    /// Whenever a write starts with `command`, queue `reply`
    ///
    /// Rules are checked in registration order; the first match wins.
    pub fn reply_to(&self, command: &[u8], reply: &[u8]) {
        self.state
            .borrow_mut()
            .replies
            .push((command.to_vec(), reply.to_vec()));
    }

    /// Drop every reply rule
    pub fn clear_replies(&self) {
        self.state.borrow_mut().replies.clear();
    }

    /// Every write call so far, in order
    pub fn commands(&self) -> Vec<Vec<u8>> {
        self.state.borrow().commands.clone()
    }

    /// Take and clear the recorded writes
    pub fn take_commands(&self) -> Vec<Vec<u8>> {
        core::mem::take(&mut self.state.borrow_mut().commands)
    }

    /// Last configuration applied through [`Transport::configure`]
    pub fn config(&self) -> Option<UartConfig> {
        self.state.borrow().config
    }

    /// Make subsequent writes fail
    pub fn set_write_error(&self, fail: bool) {
        self.state.borrow_mut().fail_writes = fail;
    }
}

impl Transport for MockTransport {
    type Error = MockError;

    fn configure(&mut self, config: &UartConfig) -> Result<(), MockError> {
        self.state.borrow_mut().config = Some(*config);
        Ok(())
    }

    fn write(&mut self, data: &[u8]) -> Result<(), MockError> {
        let mut state = self.state.borrow_mut();
        if state.fail_writes {
            return Err(MockError::WriteFailed);
        }
        state.commands.push(data.to_vec());

        let reply = state
            .replies
            .iter()
            .find(|(command, _)| data.starts_with(command))
            .map(|(_, reply)| reply.clone());
        if let Some(reply) = reply {
            state.rx.extend(reply);
        }
        Ok(())
    }

    fn bytes_available(&mut self) -> usize {
        self.state.borrow().rx.len()
    }

    fn read_byte(&mut self) -> Option<u8> {
        self.state.borrow_mut().rx.pop_front()
    }
}

/// Manually advanced clock
#[derive(Debug, Clone, Default)]
pub struct MockClock {
    now_ms: Rc<Cell<u32>>,
}

impl MockClock {
    /// Clock starting at `ms`
    pub fn starting_at(ms: u32) -> Self {
        Self {
            now_ms: Rc::new(Cell::new(ms)),
        }
    }

    /// Move time forward
    pub fn advance(&self, by: Duration) {
        let now = Instant::from_millis(self.now_ms.get()).wrapping_add(by);
        self.now_ms.set(now.as_millis());
    }

    /// Jump to an absolute counter value
    pub fn set(&self, ms: u32) {
        self.now_ms.set(ms);
    }
}

impl Clock for MockClock {
    fn now(&self) -> Instant {
        Instant::from_millis(self.now_ms.get())
    }
}

#[derive(Debug, Default)]
struct SinkState {
    mirrored: Vec<(Direction, u8)>,
    delivered: Vec<u8>,
}

/// Sink that records everything it is given
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    state: Rc<RefCell<SinkState>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mirrored bytes travelling in `direction`
    pub fn mirrored(&self, direction: Direction) -> Vec<u8> {
        self.state
            .borrow()
            .mirrored
            .iter()
            .filter(|(d, _)| *d == direction)
            .map(|(_, b)| *b)
            .collect()
    }

    /// Bytes delivered by continuous-listen steps
    pub fn delivered(&self) -> Vec<u8> {
        self.state.borrow().delivered.clone()
    }
}

impl Sink for RecordingSink {
    fn mirror(&mut self, direction: Direction, byte: u8) {
        self.state.borrow_mut().mirrored.push((direction, byte));
    }

    fn deliver(&mut self, byte: u8) {
        self.state.borrow_mut().delivered.push(byte);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_rule_queues_response() {
        let mut port = MockTransport::new();
        port.reply_to(b"AT\r\n", b"+AT: OK\r\n");

        port.write(b"AT\r\n").unwrap();
        assert_eq!(port.bytes_available(), 9);
        assert_eq!(port.read_byte(), Some(b'+'));

        port.write(b"AT+MODE=TEST\r\n").unwrap();
        assert_eq!(port.bytes_available(), 8);
        assert_eq!(port.commands().len(), 2);
    }

    #[test]
    fn test_write_error_injection() {
        let mut port = MockTransport::new();
        port.set_write_error(true);
        assert_eq!(port.write(b"AT\r\n"), Err(MockError::WriteFailed));
        assert!(port.commands().is_empty());
    }

    #[test]
    fn test_clock_handles_share_time() {
        let clock = MockClock::starting_at(10);
        let handle = clock.clone();
        handle.advance(Duration::from_millis(90));
        assert_eq!(clock.now(), Instant::from_millis(100));
    }
}
