//! PWM fan control daemon for sysfs thermal cooling devices.
//!
//! Periodically samples thermal zones (and, best effort, NVMe drives via an
//! external smart-log invocation), maps the hottest reading onto a discrete
//! (state, threshold) ladder, and writes the resulting fan state to the
//! cooling device's `cur_state` file, suppressing redundant writes.

pub mod args;
pub mod client;
pub mod config;
pub mod daemon;
pub mod device;
pub mod errors;
pub mod logging;
pub mod policy;
pub mod sensors;
pub mod slots;

// Re-export commonly used types
pub use config::Config;
pub use errors::{FanControlError, Result};
pub use slots::{Slot, SlotTable};
