//! Node configuration
//!
//! `radio.toml` is checked by build.rs and compiled in as a constant; edit
//! it and rebuild to retune the node.

use parley_e5::{E5Config, RadioConfig};

include!(concat!(env!("OUT_DIR"), "/radio_config.rs"));

/// Text sent in each beacon packet, followed by a counter
pub const BEACON_PREFIX: &str = "parley ";

/// Seconds between beacons when not running as a receiver
pub const BEACON_INTERVAL_S: u64 = 30;
