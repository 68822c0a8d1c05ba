//! Traffic sinks
//!
//! Two consumers sit beside the transport: a diagnostic mirror that sees
//! every byte exchanged with the module (when mirroring is enabled), and a
//! data sink that receives the raw bytes captured while the module is in
//! continuous receive. Both are best-effort and must not block.

/// Direction of a mirrored byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Sent to the module
    Tx,
    /// Received from the module
    Rx,
}

/// Consumer of mirrored traffic and listen data
pub trait Sink {
    /// Mirror one byte of traffic for diagnostics
    fn mirror(&mut self, direction: Direction, byte: u8);

    /// Deliver one byte received during a continuous-listen step
    fn deliver(&mut self, byte: u8);
}

/// Sink that drops everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl Sink for NullSink {
    fn mirror(&mut self, _direction: Direction, _byte: u8) {}

    fn deliver(&mut self, _byte: u8) {}
}

impl<S: Sink + ?Sized> Sink for &mut S {
    fn mirror(&mut self, direction: Direction, byte: u8) {
        (**self).mirror(direction, byte)
    }

    fn deliver(&mut self, byte: u8) {
        (**self).deliver(byte)
    }
}
