//! Transmit staging
//!
//! Driver transmit rings block the caller once they fill up. A [`TxStage`]
//! holds one outgoing command and hands it to the driver only as fast as the
//! driver reports room, so a `Transport::write` built on it never waits.

use embedded_io::{Write, WriteReady};
use heapless::Deque;

/// Staging failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StageError<E> {
    /// The previous command has not fully left the stage
    Busy,
    /// Command longer than the stage
    TooLong,
    /// Driver error
    Io(E),
}

/// Outgoing bytes not yet accepted by the driver
#[derive(Debug, Default)]
pub struct TxStage<const N: usize> {
    pending: Deque<u8, N>,
}

impl<const N: usize> TxStage<N> {
    pub const fn new() -> Self {
        Self {
            pending: Deque::new(),
        }
    }

    /// Bytes still waiting for the driver
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Stage `data` and push as much of it as the driver will take
    ///
    /// A command is staged whole or not at all, so a [`StageError::Busy`]
    /// caller can simply resubmit later.
    pub fn submit<W: Write + WriteReady>(
        &mut self,
        writer: &mut W,
        data: &[u8],
    ) -> Result<(), StageError<W::Error>> {
        self.flush(writer)?;
        if !self.pending.is_empty() {
            return Err(StageError::Busy);
        }
        if data.len() > N {
            return Err(StageError::TooLong);
        }
        for &byte in data {
            // Cannot overflow: stage is empty and data fits
            let _ = self.pending.push_back(byte);
        }
        self.flush(writer)
    }

    /// Hand staged bytes over while the driver has room
    pub fn flush<W: Write + WriteReady>(
        &mut self,
        writer: &mut W,
    ) -> Result<(), StageError<W::Error>> {
        while !self.pending.is_empty() && writer.write_ready().map_err(StageError::Io)? {
            let (front, _) = self.pending.as_slices();
            let written = writer.write(front).map_err(StageError::Io)?;
            if written == 0 {
                break;
            }
            for _ in 0..written {
                self.pending.pop_front();
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;
    use embedded_io::ErrorType;
    use heapless::Vec;

    /// Transmit ring with a fixed amount of free space
    struct Ring {
        room: usize,
        sent: Vec<u8, 64>,
    }

    impl Ring {
        fn with_room(room: usize) -> Self {
            Self {
                room,
                sent: Vec::new(),
            }
        }

        /// Wire drains `n` bytes
        fn drain(&mut self, n: usize) {
            self.room += n;
        }
    }

    impl ErrorType for Ring {
        type Error = Infallible;
    }

    impl Write for Ring {
        fn write(&mut self, buf: &[u8]) -> Result<usize, Infallible> {
            let n = buf.len().min(self.room);
            self.sent.extend_from_slice(&buf[..n]).unwrap();
            self.room -= n;
            Ok(n)
        }

        fn flush(&mut self) -> Result<(), Infallible> {
            Ok(())
        }
    }

    impl WriteReady for Ring {
        fn write_ready(&mut self) -> Result<bool, Infallible> {
            Ok(self.room > 0)
        }
    }

    #[test]
    fn test_fits_goes_straight_out() {
        let mut ring = Ring::with_room(32);
        let mut stage = TxStage::<32>::new();
        stage.submit(&mut ring, b"AT\r\n").unwrap();
        assert!(stage.is_empty());
        assert_eq!(ring.sent.as_slice(), b"AT\r\n");
    }

    #[test]
    fn test_full_ring_does_not_wait() {
        let mut ring = Ring::with_room(5);
        let mut stage = TxStage::<32>::new();
        stage.submit(&mut ring, b"AT+MODE=TEST\r\n").unwrap();
        assert_eq!(ring.sent.as_slice(), b"AT+MO");
        assert_eq!(stage.len(), 9);

        // Another command is refused whole while the first is pending
        assert_eq!(stage.submit(&mut ring, b"AT\r\n"), Err(StageError::Busy));
        assert_eq!(stage.len(), 9);

        ring.drain(16);
        stage.flush(&mut ring).unwrap();
        assert!(stage.is_empty());
        assert_eq!(ring.sent.as_slice(), b"AT+MODE=TEST\r\n");

        stage.submit(&mut ring, b"AT\r\n").unwrap();
        assert_eq!(ring.sent.as_slice(), b"AT+MODE=TEST\r\nAT\r\n");
    }

    #[test]
    fn test_oversize_command_rejected() {
        let mut ring = Ring::with_room(32);
        let mut stage = TxStage::<4>::new();
        assert_eq!(stage.submit(&mut ring, b"AT+RESET\r\n"), Err(StageError::TooLong));
        assert!(ring.sent.is_empty());
    }
}
