//! LoRa-E5 AT command set
//!
//! Commands are complete lines, CR/LF included. Responses are the prefix the
//! module prints before any variable part; the engine compares exactly that
//! many bytes of the reply line.

/// Handshake
pub const AT: &[u8] = b"AT\r\n";
pub const AT_OK: &[u8] = b"+AT: OK";

/// Enter point-to-point test mode (raw LoRa, no LoRaWAN stack)
pub const MODE_TEST: &[u8] = b"AT+MODE=TEST\r\n";
pub const MODE_TEST_OK: &[u8] = b"+MODE: TEST";

/// Radio configuration; the command itself is rendered by
/// [`RadioConfig::command`](crate::rfcfg::RadioConfig::command)
pub const RFCFG_PREFIX: &str = "AT+TEST=RFCFG,";
pub const RFCFG_OK: &[u8] = b"+TEST: RFCFG";

/// Transmit a string packet: `AT+TEST=TXLRSTR,"<payload>"`
pub const TXLRSTR_PREFIX: &[u8] = b"AT+TEST=TXLRSTR,\"";
pub const TXLRSTR_SUFFIX: &[u8] = b"\"\r\n";
/// Echo of the packet being sent (followed by the hex payload)
pub const TXLRSTR_OK: &[u8] = b"+TEST: TXLRSTR";
/// Printed once the packet has left the antenna
pub const TX_DONE: &[u8] = b"+TEST: TX DONE";

/// Sleep until the next byte on the line
pub const LOW_POWER: &[u8] = b"AT+LOWPOWER\r\n";
pub const LOW_POWER_OK: &[u8] = b"+LOWPOWER: SLEEP";

/// Continuous packet reception
pub const RXLRPKT: &[u8] = b"AT+TEST=RXLRPKT\r\n";
pub const RXLRPKT_OK: &[u8] = b"+TEST: RXLRPKT";

/// Leave continuous reception
pub const STOP: &[u8] = b"AT+TEST=STOP\r\n";
pub const STOP_OK: &[u8] = b"+TEST: STOP";

/// Soft reset
pub const RESET: &[u8] = b"AT+RESET\r\n";
pub const RESET_OK: &[u8] = b"+RESET: OK";

#[cfg(test)]
mod tests {
    use super::*;
    use parley_core::RESPONSE_CAPACITY;

    #[test]
    fn test_responses_fit_receiver() {
        for response in [
            AT_OK,
            MODE_TEST_OK,
            RFCFG_OK,
            TXLRSTR_OK,
            TX_DONE,
            LOW_POWER_OK,
            RXLRPKT_OK,
            STOP_OK,
            RESET_OK,
        ] {
            assert!(!response.is_empty());
            assert!(response.len() <= RESPONSE_CAPACITY, "{:?}", response);
        }
    }

    #[test]
    fn test_commands_are_lines() {
        for command in [AT, MODE_TEST, LOW_POWER, RXLRPKT, STOP, RESET] {
            assert!(command.starts_with(b"AT"));
            assert!(command.ends_with(b"\r\n"));
        }
        assert!(TXLRSTR_SUFFIX.ends_with(b"\r\n"));
    }
}
