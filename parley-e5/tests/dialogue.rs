//! Full LoRa-E5 dialogues against a scripted module

use core::time::Duration;

use parley_core::{Error, Status, StepId};
use parley_e5::{Activity, E5Config, E5Sequences, Radio};
use parley_hal::mock::{MockClock, MockError, MockTransport, RecordingSink};
use parley_hal::Direction;

/// Poll interval of the simulated main loop
const LOOP_PERIOD: Duration = Duration::from_millis(10);

type TestRadio<'s> = Radio<'s, MockTransport, MockClock, RecordingSink>;

struct Node {
    port: MockTransport,
    clock: MockClock,
    sink: RecordingSink,
}

impl Node {
    fn new() -> Self {
        Self {
            port: MockTransport::new(),
            clock: MockClock::starting_at(1_000),
            sink: RecordingSink::new(),
        }
    }

    /// A module that answers every command the happy way
    fn cooperative() -> Self {
        let node = Self::new();
        node.port.reply_to(b"AT\r\n", b"+AT: OK\r\n");
        node.port.reply_to(b"AT+MODE=TEST", b"+MODE: TEST\r\n");
        node.port.reply_to(
            b"AT+TEST=RFCFG",
            b"+TEST: RFCFG F:868000000, SF7, BW125K, TXPR:8, RXPR:8, POW:14dBm, CRC:OFF, IQ:OFF, NET:OFF\r\n",
        );
        node.port.reply_to(
            b"AT+TEST=TXLRSTR",
            b"+TEST: TXLRSTR \"68656C6C6F\"\r\n+TEST: TX DONE\r\n",
        );
        node.port.reply_to(b"AT+LOWPOWER", b"+LOWPOWER: SLEEP\r\n");
        node.port.reply_to(b"AT+TEST=RXLRPKT", b"+TEST: RXLRPKT\r\n");
        node.port.reply_to(b"AT+TEST=STOP", b"+TEST: STOP\r\n");
        node.port.reply_to(b"AT+RESET", b"+RESET: OK\r\n");
        node
    }

    fn radio<'s>(&self, sequences: &'s E5Sequences, config: &E5Config) -> TestRadio<'s> {
        Radio::new(
            self.port.clone(),
            self.clock.clone(),
            self.sink.clone(),
            sequences,
            config,
        )
    }

    /// Run the main loop until the radio goes idle or `limit` polls pass
    fn run_until_idle(&self, radio: &mut TestRadio<'_>, limit: usize) -> usize {
        for polls in 1..=limit {
            match radio.poll() {
                Ok(Status::Idle) => return polls,
                Ok(Status::Active) => {}
                Err(e) => panic!("unexpected error {:?}", e),
            }
            self.clock.advance(LOOP_PERIOD);
        }
        panic!("radio still busy after {} polls", limit);
    }

    fn commands_as_text(&self) -> Vec<String> {
        self.port
            .commands()
            .into_iter()
            .map(|c| String::from_utf8(c).unwrap())
            .collect()
    }
}

#[test]
fn transmit_dialogue_completes() {
    let config = E5Config::default();
    let sequences = E5Sequences::new(&config).unwrap();
    let node = Node::cooperative();
    let mut radio = node.radio(&sequences, &config);
    radio.init().unwrap();

    radio.send_packet(b"hello").unwrap();
    node.run_until_idle(&mut radio, 100);

    assert_eq!(
        node.commands_as_text(),
        [
            "AT\r\n",
            "AT+MODE=TEST\r\n",
            "AT+TEST=RFCFG,868,SF7,125,8,8,14,OFF,OFF,OFF\r\n",
            "AT+TEST=TXLRSTR,\"hello\"\r\n",
            "AT+LOWPOWER\r\n",
        ]
    );
    assert!(!radio.is_busy());
    assert_eq!(node.port.config().map(|c| c.baudrate), Some(9600));
}

#[test]
fn missing_tx_done_resends_packet() {
    let config = E5Config::default();
    let sequences = E5Sequences::new(&config).unwrap();
    let node = Node::cooperative();
    // First transmit is echoed but never completes
    node.port.clear_replies();
    node.port.reply_to(b"AT\r\n", b"+AT: OK\r\n");
    node.port.reply_to(b"AT+MODE=TEST", b"+MODE: TEST\r\n");
    node.port.reply_to(b"AT+TEST=RFCFG", b"+TEST: RFCFG\r\n");
    node.port
        .reply_to(b"AT+TEST=TXLRSTR", b"+TEST: TXLRSTR \"7069\"\r\n");
    node.port.reply_to(b"AT+LOWPOWER", b"+LOWPOWER: SLEEP\r\n");

    let mut radio = node.radio(&sequences, &config);
    radio.send_packet(b"pi").unwrap();

    // Up to the TX DONE wait
    while radio.sequencer().current_step_name() != Some("tx_done") {
        radio.poll().unwrap();
        node.clock.advance(LOOP_PERIOD);
    }
    radio.poll().unwrap();
    node.clock.advance(config.tx_done_timeout());
    radio.poll().unwrap();
    assert_eq!(radio.sequencer().current_step_name(), Some("transmit"));
    assert_eq!(radio.sequencer().retries_remaining(), Some(2));

    // The module recovers on the second attempt
    node.port.clear_replies();
    node.port.reply_to(
        b"AT+TEST=TXLRSTR",
        b"+TEST: TXLRSTR \"7069\"\r\n+TEST: TX DONE\r\n",
    );
    node.port.reply_to(b"AT+LOWPOWER", b"+LOWPOWER: SLEEP\r\n");
    node.run_until_idle(&mut radio, 100);

    let transmits = node
        .commands_as_text()
        .into_iter()
        .filter(|c| c.starts_with("AT+TEST=TXLRSTR"))
        .count();
    assert_eq!(transmits, 2);
}

#[test]
fn silent_module_exhausts_retries() {
    let config = E5Config::default();
    let sequences = E5Sequences::new(&config).unwrap();
    let node = Node::new();
    let mut radio = node.radio(&sequences, &config);
    radio.send_packet(b"anyone?").unwrap();

    let mut aborted = 0;
    for _ in 0..20 {
        match radio.poll() {
            Ok(Status::Idle) => break,
            Ok(Status::Active) => {}
            Err(Error::RetriesExhausted { step }) => {
                assert_eq!(step, StepId(0));
                aborted += 1;
            }
            Err(e) => panic!("unexpected error {:?}", e),
        }
        node.clock.advance(config.command_timeout());
    }

    assert_eq!(aborted, 1);
    assert!(!radio.is_busy());
    // One attempt plus three retries
    assert_eq!(node.port.commands().len(), 4);
}

#[test]
fn receive_cycle_delivers_and_restarts() {
    let config = E5Config::default();
    let sequences = E5Sequences::new(&config).unwrap();
    let node = Node::cooperative();
    let mut radio = node.radio(&sequences, &config);
    radio.listen().unwrap();

    while radio.sequencer().current_step_name() != Some("listen") {
        radio.poll().unwrap();
        node.clock.advance(LOOP_PERIOD);
    }
    radio.poll().unwrap();

    let packet = b"+TEST: LEN:5, RSSI:-41, SNR:11\r\n+TEST: RX \"68656C6C6F\"\r\n";
    node.port.push_rx(packet);
    node.clock.advance(Duration::from_secs(30));
    radio.poll().unwrap();
    assert_eq!(node.sink.delivered(), packet.to_vec());

    // Quiet for the whole idle timeout: stop, reset, back to the handshake
    node.clock.advance(config.listen_idle_timeout());
    for _ in 0..6 {
        assert_eq!(radio.poll(), Ok(Status::Active));
        node.clock.advance(LOOP_PERIOD);
    }
    assert_eq!(radio.sequencer().current_step_name(), Some("at"));
    assert!(radio.is_busy());

    let commands = node.commands_as_text();
    assert_eq!(
        &commands[3..],
        ["AT+TEST=RXLRPKT\r\n", "AT+TEST=STOP\r\n", "AT+RESET\r\n"]
    );
}

#[test]
fn receive_cycle_survives_silent_module() {
    let config = E5Config::default();
    let sequences = E5Sequences::new(&config).unwrap();
    let node = Node::new();
    let mut radio = node.radio(&sequences, &config);
    radio.listen().unwrap();

    let mut aborted = 0;
    for _ in 0..40 {
        match radio.poll() {
            Ok(Status::Active) => {}
            Ok(Status::Idle) => panic!("receive cycle went idle"),
            Err(Error::RetriesExhausted { step }) => {
                assert_eq!(step, StepId(0));
                aborted += 1;
            }
            Err(e) => panic!("unexpected error {:?}", e),
        }
        node.clock.advance(config.command_timeout());
    }

    // Each round: four handshakes, abort, cleanup back to the start
    assert_eq!(aborted, 4);
    assert!(radio.is_busy());
    assert_eq!(radio.activity(), Activity::Receiving);
    assert_eq!(radio.sequencer().current_step_name(), Some("at"));
    assert_eq!(radio.sequencer().retries_remaining(), Some(1));
    let commands = node.commands_as_text();
    assert_eq!(commands.len(), 18);
    assert!(commands.iter().all(|c| c == "AT\r\n"));
}

#[test]
fn mirroring_shows_both_directions() {
    let config = E5Config::default();
    let sequences = E5Sequences::new(&config).unwrap();
    let node = Node::cooperative();
    let mut radio = node.radio(&sequences, &config);
    radio.set_mirroring(true);
    radio.send_packet(b"hello").unwrap();
    node.run_until_idle(&mut radio, 100);

    let tx = node.sink.mirrored(Direction::Tx);
    let rx = node.sink.mirrored(Direction::Rx);
    assert!(tx.starts_with(b"AT\r\nAT+MODE=TEST\r\n"));
    assert!(rx.starts_with(b"+AT: OK\r\n+MODE: TEST\r\n"));
    assert!(rx.ends_with(b"+LOWPOWER: SLEEP\r\n"));
}

#[test]
fn write_failure_is_reported() {
    let config = E5Config::default();
    let sequences = E5Sequences::new(&config).unwrap();
    let node = Node::cooperative();
    let mut radio = node.radio(&sequences, &config);
    radio.send_packet(b"hello").unwrap();

    node.port.set_write_error(true);
    assert_eq!(radio.poll(), Err(Error::Transport(MockError::WriteFailed)));
    assert!(radio.is_busy());

    node.port.set_write_error(false);
    node.run_until_idle(&mut radio, 100);
}

#[cfg(feature = "toml")]
#[test]
fn configured_node_uses_file_settings() {
    let config = E5Config::from_toml(
        r#"
        retry_budget = 1
        command_timeout_ms = 500

        [radio]
        frequency_khz = 915000
        spreading_factor = 12
        power_dbm = 20
        "#,
    )
    .unwrap();
    let sequences = E5Sequences::new(&config).unwrap();
    let node = Node::new();
    node.port.reply_to(b"AT\r\n", b"+AT: OK\r\n");
    node.port.reply_to(b"AT+MODE=TEST", b"+MODE: TEST\r\n");
    let mut radio = node.radio(&sequences, &config);
    radio.send_packet(b"x").unwrap();

    for _ in 0..4 {
        radio.poll().unwrap();
    }
    assert_eq!(radio.sequencer().current_step_name(), Some("rfcfg"));
    radio.poll().unwrap();
    assert_eq!(
        node.commands_as_text().last().map(String::as_str),
        Some("AT+TEST=RFCFG,915,SF12,125,8,8,20,OFF,OFF,OFF\r\n")
    );

    // Budget of one: second silent timeout aborts
    node.clock.advance(Duration::from_millis(500));
    radio.poll().unwrap();
    radio.poll().unwrap();
    node.clock.advance(Duration::from_millis(500));
    assert_eq!(
        radio.poll(),
        Err(Error::RetriesExhausted { step: StepId(2) })
    );
}
