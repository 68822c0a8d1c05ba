//! Packet payload checks
//!
//! `TXLRSTR` sends its argument as a quoted string, so a payload must be
//! printable ASCII without a double quote or the module would cut the
//! packet short (or reject the line).

use parley_core::MAX_PAYLOAD_LEN;

/// Longest packet the transmit sequence accepts
pub const MAX_PACKET_LEN: usize = MAX_PAYLOAD_LEN;

/// Rejected packet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PacketError {
    Empty,
    TooLong { len: usize },
    /// Byte at `index` cannot appear inside a quoted string
    InvalidByte { index: usize, byte: u8 },
}

impl core::fmt::Display for PacketError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Empty => write!(f, "empty packet"),
            Self::TooLong { len } => {
                write!(f, "packet of {} bytes exceeds {}", len, MAX_PACKET_LEN)
            }
            Self::InvalidByte { index, byte } => {
                write!(f, "byte 0x{:02x} at {} not allowed in a packet", byte, index)
            }
        }
    }
}

/// Check that `packet` can be sent with `TXLRSTR`
pub fn validate_packet(packet: &[u8]) -> Result<(), PacketError> {
    if packet.is_empty() {
        return Err(PacketError::Empty);
    }
    if packet.len() > MAX_PACKET_LEN {
        return Err(PacketError::TooLong { len: packet.len() });
    }
    match packet
        .iter()
        .position(|&b| !(b' '..=b'~').contains(&b) || b == b'"')
    {
        Some(index) => Err(PacketError::InvalidByte {
            index,
            byte: packet[index],
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_accepts_plain_text() {
        assert!(validate_packet(b"Testing, Testing ....").is_ok());
        assert!(validate_packet(&[b'~'; MAX_PACKET_LEN]).is_ok());
    }

    #[test]
    fn test_rejects() {
        assert_eq!(validate_packet(b""), Err(PacketError::Empty));
        assert_eq!(
            validate_packet(&[b'a'; 61]),
            Err(PacketError::TooLong { len: 61 })
        );
        assert_eq!(
            validate_packet(b"say \"hi\""),
            Err(PacketError::InvalidByte { index: 4, byte: b'"' })
        );
        assert_eq!(
            validate_packet(b"line\r\n"),
            Err(PacketError::InvalidByte { index: 4, byte: b'\r' })
        );
    }

    proptest! {
        #[test]
        fn prop_accepted_packets_frame_cleanly(packet in "[ !#-~]{1,60}") {
            prop_assert!(validate_packet(packet.as_bytes()).is_ok());
        }

        #[test]
        fn prop_control_bytes_rejected(
            prefix in "[a-z]{0,20}",
            byte in 0u8..0x20,
        ) {
            let mut packet = prefix.clone().into_bytes();
            packet.push(byte);
            prop_assert_eq!(
                validate_packet(&packet),
                Err(PacketError::InvalidByte { index: prefix.len(), byte })
            );
        }
    }
}
