//! Parley Hardware Abstraction Layer
//!
//! This crate defines the collaborator traits the sequencer is written
//! against. Chip-specific crates (RP2040, host mocks) implement them so the
//! same engine runs unchanged on the device and inside unit tests.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Application (parley-firmware, etc.)    │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  parley-core (sequencer)                │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  parley-hal (this crate - traits)       │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │ parley-hal-   │       │  parley-hal   │
//! │    rp2040     │       │  ::mock       │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`uart::Transport`] - Non-blocking byte-oriented serial channel
//! - [`clock::Clock`] - Monotonic millisecond clock
//! - [`sink::Sink`] - Traffic mirror and listen-data sink
//!
//! [`staging::TxStage`] helps driver crates keep `Transport::write`
//! non-blocking over a fixed-size transmit ring.

#![no_std]
#![deny(unsafe_code)]

#[cfg(feature = "mock")]
extern crate std;

pub mod clock;
pub mod sink;
pub mod staging;
pub mod uart;

#[cfg(feature = "mock")]
pub mod mock;

// Re-export key traits at crate root for convenience
pub use clock::{Clock, Instant};
pub use sink::{Direction, NullSink, Sink};
pub use uart::{Transport, UartConfig};
