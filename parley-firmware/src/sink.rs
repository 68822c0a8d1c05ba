//! RTT traffic sink
//!
//! Collects mirrored AT traffic and received packet lines and logs each
//! completed line over defmt.

use defmt::*;
use heapless::Vec;
use parley_hal::{Direction, Sink};

/// Longest line logged in one piece; longer lines are split
const LINE_LEN: usize = 96;

#[derive(Default)]
struct Line(Vec<u8, LINE_LEN>);

impl Line {
    /// Append a byte; returns the finished line when it ends or fills up
    fn push(&mut self, byte: u8) -> Option<&[u8]> {
        // Never full here: callers clear after every finished line
        let _ = self.0.push(byte);
        if byte == b'\n' || self.0.is_full() {
            Some(trim_line(&self.0))
        } else {
            None
        }
    }

    fn clear(&mut self) {
        self.0.clear();
    }
}

fn trim_line(line: &[u8]) -> &[u8] {
    let mut end = line.len();
    while end > 0 && matches!(line[end - 1], b'\r' | b'\n') {
        end -= 1;
    }
    &line[..end]
}

/// Logs module traffic line by line
#[derive(Default)]
pub struct DefmtSink {
    tx: Line,
    rx: Line,
    data: Line,
}

impl DefmtSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Sink for DefmtSink {
    fn mirror(&mut self, direction: Direction, byte: u8) {
        let line = match direction {
            Direction::Tx => &mut self.tx,
            Direction::Rx => &mut self.rx,
        };
        if let Some(text) = line.push(byte) {
            match direction {
                Direction::Tx => debug!("E5 < {=[u8]:a}", text),
                Direction::Rx => debug!("E5 > {=[u8]:a}", text),
            }
            line.clear();
        }
    }

    fn deliver(&mut self, byte: u8) {
        if let Some(text) = self.data.push(byte) {
            if !text.is_empty() {
                info!("RX {=[u8]:a}", text);
            }
            self.data.clear();
        }
    }
}
