//! Beacon timer
//!
//! Asks the radio task to send a packet at a fixed interval. The radio task
//! skips a beacon if the previous one is still going out.

use defmt::*;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Ticker};

use crate::config::BEACON_INTERVAL_S;

/// Raised when a beacon is due
pub static BEACON_SIGNAL: Signal<CriticalSectionRawMutex, ()> = Signal::new();

#[embassy_executor::task]
pub async fn beacon_task() {
    info!("Beacon task started, every {} s", BEACON_INTERVAL_S);

    let mut ticker = Ticker::every(Duration::from_secs(BEACON_INTERVAL_S));
    loop {
        ticker.next().await;
        BEACON_SIGNAL.signal(());
    }
}
