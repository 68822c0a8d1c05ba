//! Async tasks for the firmware

mod beacon;
mod radio;

pub use beacon::{beacon_task, BEACON_SIGNAL};
pub use radio::radio_task;
