//! Seeed LoRa-E5 support for the Parley engine
//!
//! The LoRa-E5 speaks a line-oriented AT command language at 9600 baud.
//! This crate holds everything device-specific:
//!
//! - Command strings and expected response prefixes ([`commands`])
//! - Radio parameters for `AT+TEST=RFCFG` ([`rfcfg`])
//! - Timeouts, retry budget and radio settings, loadable from TOML ([`config`])
//! - Payload checks for quoted-string transmission ([`packet`])
//! - The transmit and receive dialogues ([`sequences`])
//! - A small facade tying them to a [`Sequencer`](parley_core::Sequencer) ([`radio`])
//!
//! ```text
//! transmit: AT ─► MODE=TEST ─► RFCFG ─► TXLRSTR ─► TX DONE ─► LOWPOWER ─► done
//!                                           ▲          │ timeout
//!                                           └──────────┘
//!
//! receive:  AT ─► MODE=TEST ─► RFCFG ─► RXLRPKT ─► listen ─► STOP ─► RESET ─┐
//!           ▲                                                               │
//!           └───────────────────────────────────────────────────────────────┘
//! ```

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod commands;
pub mod config;
pub mod packet;
pub mod radio;
pub mod rfcfg;
pub mod sequences;

pub use config::{ConfigError, E5Config};
pub use packet::{validate_packet, PacketError, MAX_PACKET_LEN};
pub use radio::{Activity, Radio, RadioError};
pub use rfcfg::RadioConfig;
pub use sequences::E5Sequences;
