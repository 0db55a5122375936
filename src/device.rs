//! Cooling device discovery and sysfs actuation.

use std::fs;
use std::path::{Path, PathBuf};

use log::{error, warn};

use crate::config::Config;
use crate::errors::{FanControlError, Result};

/// Bounded-range fan actuator. A successful `set_state` is the only
/// externally observable effect of the whole control cycle.
pub trait CoolingDevice {
    /// Upper bound of the state range, read once at discovery.
    fn max_state(&self) -> u32;

    /// State the actuator currently reports. Read failures log and return 0
    /// so that a single bad read never halts the control loop.
    fn current_state(&self) -> u32;

    /// Command a new state. Write failures are reported, not fatal; the loop
    /// retries on the next cycle if the target still differs.
    fn set_state(&mut self, state: u32) -> Result<()>;
}

/// Cooling device backed by a sysfs thermal directory.
pub struct SysfsCoolingDevice {
    dir: PathBuf,
    cur_state_path: PathBuf,
    max_state: u32,
}

impl SysfsCoolingDevice {
    /// Locate the fan actuator and read its state bound. Either an explicit
    /// override pins the directory, or the thermal root is scanned for the
    /// first cooling device whose `type` matches. Failure here is fatal to
    /// the caller; device topology is not expected to appear after boot.
    pub fn discover(config: &Config) -> Result<Self> {
        let dir = find_device_dir(config)?;
        let max_state = read_max_state(&dir)?;
        Ok(Self {
            cur_state_path: dir.join(&config.file_name_cur_state),
            dir,
            max_state,
        })
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }
}

impl CoolingDevice for SysfsCoolingDevice {
    fn max_state(&self) -> u32 {
        self.max_state
    }

    fn current_state(&self) -> u32 {
        match fs::read_to_string(&self.cur_state_path) {
            Ok(raw) => match raw.trim().parse() {
                Ok(state) => state,
                Err(_) => {
                    error!(
                        "unparsable fan state '{}' in {}",
                        raw.trim(),
                        self.cur_state_path.display()
                    );
                    0
                }
            },
            Err(e) => {
                error!(
                    "error reading fan state from {}: {}",
                    self.cur_state_path.display(),
                    e
                );
                0
            }
        }
    }

    fn set_state(&mut self, state: u32) -> Result<()> {
        warn!("setting fan speed to {}", state);
        fs::write(&self.cur_state_path, state.to_string()).map_err(|source| {
            FanControlError::DeviceWrite {
                path: self.cur_state_path.clone(),
                state,
                source,
            }
        })
    }
}

fn find_device_dir(config: &Config) -> Result<PathBuf> {
    if let Some(name) = &config.cooling_device_override {
        let dir = config.thermal_dir.join(name);
        if dir.exists() {
            return Ok(dir);
        }
        error!(
            "COOLING_DEVICE_OVERRIDE set to '{}', but device not found at {}",
            name,
            dir.display()
        );
        return Err(FanControlError::DeviceNotFound(dir.display().to_string()));
    }

    let entries = fs::read_dir(&config.thermal_dir)?;
    for entry in entries.flatten() {
        let file_name = entry.file_name();
        let Some(name) = file_name.to_str() else {
            continue;
        };
        if !name.starts_with(&config.device_name_cooling) {
            continue;
        }
        let dir = entry.path();
        match fs::read_to_string(dir.join("type")) {
            Ok(device_type) if device_type.trim().contains(&config.device_type_pwm_fan) => {
                return Ok(dir);
            }
            Ok(_) => {}
            Err(e) => error!("error while probing fan device {}: {}", dir.display(), e),
        }
    }
    Err(FanControlError::DeviceNotFound(
        config.thermal_dir.display().to_string(),
    ))
}

fn read_max_state(dir: &Path) -> Result<u32> {
    let path = dir.join("max_state");
    let raw = fs::read_to_string(&path).map_err(|source| FanControlError::DeviceRead {
        path: path.clone(),
        source,
    })?;
    let max_state: i64 = raw.trim().parse().map_err(|_| {
        FanControlError::Config(format!(
            "unparsable max_state '{}' in {}",
            raw.trim(),
            path.display()
        ))
    })?;
    if max_state <= 0 {
        return Err(FanControlError::Config(format!(
            "max_state could not be determined for {} (reported {})",
            dir.display(),
            max_state
        )));
    }
    Ok(max_state as u32)
}
