//! RP2040 implementations of the Parley collaborator traits
//!
//! - [`uart::BufferedTransport`] - `Transport` over an interrupt-driven
//!   embassy-rp buffered UART
//! - [`clock::EmbassyClock`] - `Clock` backed by the embassy time driver

#![no_std]

pub mod clock;
pub mod uart;

pub use clock::EmbassyClock;
pub use uart::{uart_config, BufferedTransport, TransportError};
