//! Radio polling task
//!
//! The only owner of the LoRa-E5 link. Polls the sequencer on a fixed
//! ticker and starts a transmit whenever a beacon is due.

use core::fmt::Write;

use defmt::*;
use embassy_time::{Duration, Ticker};
use heapless::String;

use parley_core::Error;
use parley_e5::{Radio, MAX_PACKET_LEN};
use parley_hal_rp2040::{BufferedTransport, EmbassyClock, TransportError};

use super::BEACON_SIGNAL;
use crate::config::BEACON_PREFIX;
use crate::sink::DefmtSink;

/// Main loop period
pub const POLL_INTERVAL_MS: u64 = 10;

/// The node's radio with its concrete collaborators
pub type NodeRadio = Radio<'static, BufferedTransport, EmbassyClock, DefmtSink>;

#[embassy_executor::task]
pub async fn radio_task(mut radio: NodeRadio) {
    info!("Radio task started");

    if cfg!(feature = "receiver") {
        match radio.listen() {
            Ok(()) => info!("Listening for packets"),
            Err(e) => error!("Failed to start listening: {:?}", e),
        }
    }

    let mut ticker = Ticker::every(Duration::from_millis(POLL_INTERVAL_MS));
    let mut beacons: u32 = 0;

    loop {
        ticker.next().await;

        if BEACON_SIGNAL.try_take().is_some() {
            if radio.is_busy() {
                warn!("Radio busy, skipping beacon");
            } else {
                let mut packet: String<MAX_PACKET_LEN> = String::new();
                // Cannot overflow: prefix plus a u32 is well under the limit
                let _ = write!(packet, "{}{}", BEACON_PREFIX, beacons);
                match radio.send_packet(packet.as_bytes()) {
                    Ok(()) => {
                        debug!("Beacon {} queued", beacons);
                        beacons = beacons.wrapping_add(1);
                    }
                    Err(e) => error!("Beacon rejected: {:?}", e),
                }
            }
        }

        match radio.poll() {
            Ok(_) => {}
            Err(Error::RetriesExhausted { step }) => {
                warn!("Module not responding at step {}, cleaning up", step.0);
            }
            // Transmit ring still draining; the step resends next poll
            Err(Error::Transport(TransportError::Busy)) => trace!("UART busy"),
            Err(e) => error!("Radio error: {:?}", e),
        }
    }
}
