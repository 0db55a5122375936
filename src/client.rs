//! Manual control utility for querying and setting the cooling device state.

use log::info;

use crate::config::Config;
use crate::device::{CoolingDevice, SysfsCoolingDevice};
use crate::errors::{FanControlError, Result};

/// Query the actuator (no argument) or command a new state. A desired state
/// above the maximum bound is rejected without touching the device.
pub fn run(config: &Config, desired_state: Option<u32>) -> Result<()> {
    let mut device = SysfsCoolingDevice::discover(config)?;
    info!("Fan device: {}", device.path().display());

    let max_state = device.max_state();
    match desired_state {
        Some(desired) => {
            if desired > max_state {
                return Err(FanControlError::StateExceedsMax {
                    desired,
                    max: max_state,
                });
            }
            device.set_state(desired)?;
            info!("Desired state set to: {}", desired);
        }
        None => {
            info!("Maximum state allowed: {}", max_state);
            info!("Current state is set to: {}", device.current_state());
        }
    }
    Ok(())
}
