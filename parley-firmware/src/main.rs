//! Parley - LoRa-E5 Sensor Node Firmware
//!
//! Drives a Seeed LoRa-E5 module on UART0 of an RP2040 board. By default
//! the node sends a numbered beacon packet at a fixed interval; built with
//! the `receiver` feature it listens continuously and logs every packet.
//!
//! All module traffic goes through the non-blocking sequencer, polled from
//! a single task.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::peripherals::UART0;
use embassy_rp::uart::{BufferedInterruptHandler, Uart};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use parley_e5::{E5Sequences, Radio};
use parley_hal_rp2040::{uart_config, BufferedTransport, EmbassyClock};

use crate::config::RADIO_CONFIG;
use crate::sink::DefmtSink;

mod config;
mod sink;
mod tasks;

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
});

// Static cells for UART buffers (must live forever)
static TX_BUF: StaticCell<[u8; 256]> = StaticCell::new();
static RX_BUF: StaticCell<[u8; 256]> = StaticCell::new();

// Sequences are borrowed by the sequencer for the life of the radio task
static SEQUENCES: StaticCell<E5Sequences> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Parley firmware starting...");

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    let config = RADIO_CONFIG;
    info!(
        "Radio config: {} kHz SF{} BW{} {} dBm, budget {}",
        config.radio.frequency_khz,
        config.radio.spreading_factor,
        config.radio.bandwidth_khz,
        config.radio.power_dbm,
        config.retry_budget
    );

    let sequences = match E5Sequences::new(&config) {
        Ok(sequences) => SEQUENCES.init(sequences),
        Err(e) => {
            // radio.toml is range-checked at build time, so this is a bug
            error!("Invalid sequence definition: {:?}", e);
            loop {
                embassy_time::Timer::after_secs(60).await;
            }
        }
    };

    // UART0 to the LoRa-E5 (SKR Pico / Pico: TX=GPIO0, RX=GPIO1)
    let line = config.engine().uart();
    let tx_buf = TX_BUF.init([0u8; 256]);
    let rx_buf = RX_BUF.init([0u8; 256]);

    let uart = Uart::new_blocking(p.UART0, p.PIN_0, p.PIN_1, uart_config(&line));
    let uart = uart.into_buffered(Irqs, tx_buf, rx_buf);
    let transport = BufferedTransport::new(uart, line);

    info!("UART initialized at {} baud", line.baudrate);

    let mut radio = Radio::new(
        transport,
        EmbassyClock,
        DefmtSink::new(),
        sequences,
        &config,
    );
    if let Err(e) = radio.init() {
        error!("Radio init failed: {:?}", e);
    }
    radio.set_mirroring(true);

    // Spawn tasks
    spawner.spawn(tasks::radio_task(radio)).unwrap();
    if !cfg!(feature = "receiver") {
        spawner.spawn(tasks::beacon_task()).unwrap();
    }

    info!("All tasks spawned, firmware running");

    // Main task has nothing else to do - all work happens in spawned tasks
    loop {
        embassy_time::Timer::after_secs(60).await;
        trace!("Main loop heartbeat");
    }
}
