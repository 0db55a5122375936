//! Environment-driven configuration, read once at startup.

use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::errors::{FanControlError, Result};

/// `DEBUG` toggle shared by logging and the poll-interval default.
/// Accepts `1`, `true` or `on` (case-insensitive); defaults to on.
pub fn debug_enabled() -> bool {
    match env::var("DEBUG") {
        Ok(value) => matches!(value.to_lowercase().as_str(), "1" | "true" | "on"),
        Err(_) => true,
    }
}

/// Immutable configuration for the whole process.
///
/// Every field is overridable through the environment variable of the same
/// name; defaults match the stock sysfs thermal layout.
#[derive(Debug, Clone)]
pub struct Config {
    /// Poll interval while the system is cooling (or the trend is unknown).
    pub sleep_time: Duration,
    /// Shorter poll interval used while the system is heating.
    pub sleep_time_heating: Duration,
    /// Lowest fan state the policy will select. Setting it to 0 lets the fan
    /// switch off below the lower threshold.
    pub min_state: u32,
    /// Optional cap on the actuator-reported maximum state.
    pub max_state: Option<u32>,
    pub lower_temp_threshold: f64,
    pub upper_temp_threshold: f64,
    /// Deadband for the heating/cooling trend detection.
    pub min_delta: f64,
    pub thermal_dir: PathBuf,
    /// Substring matched against a cooling device's `type` file.
    pub device_type_pwm_fan: String,
    /// Name prefix of thermal zone directories.
    pub thermal_zone_name: String,
    /// Name prefix of cooling device directories.
    pub device_name_cooling: String,
    pub file_name_cur_state: String,
    /// Pin a specific cooling device (e.g. "cooling_device0"), bypassing the
    /// type-based scan.
    pub cooling_device_override: Option<String>,
    /// Shell-style pattern for NVMe device nodes.
    pub nvme_devices: String,
    pub nvme_command: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let debug = debug_enabled();

        let sleep_secs: u64 = parse_var("SLEEP_TIME", if debug { 5 } else { 15 })?;
        let heating_default = (sleep_secs / 3).max(1);
        let heating_secs: u64 = parse_var("SLEEP_TIME_HEATING", heating_default)?;

        let lower_temp_threshold = parse_var("LOWER_TEMP_THRESHOLD", 45.0)?;
        let upper_temp_threshold = parse_var("UPPER_TEMP_THRESHOLD", 65.0)?;
        if upper_temp_threshold <= lower_temp_threshold {
            return Err(FanControlError::Config(format!(
                "UPPER_TEMP_THRESHOLD ({}) must be above LOWER_TEMP_THRESHOLD ({})",
                upper_temp_threshold, lower_temp_threshold
            )));
        }

        Ok(Self {
            sleep_time: Duration::from_secs(sleep_secs),
            sleep_time_heating: Duration::from_secs(heating_secs),
            min_state: parse_var("MIN_STATE", 1)?,
            max_state: optional_var("MAX_STATE")?,
            lower_temp_threshold,
            upper_temp_threshold,
            min_delta: parse_var("MIN_DELTA", 0.01)?,
            thermal_dir: PathBuf::from(string_var("THERMAL_DIR", "/sys/class/thermal")),
            device_type_pwm_fan: string_var("DEVICE_TYPE_PWM_FAN", "pwm-fan"),
            thermal_zone_name: string_var("THERMAL_ZONE_NAME", "thermal_zone"),
            device_name_cooling: string_var("DEVICE_NAME_COOLING", "cooling_device"),
            file_name_cur_state: string_var("FILE_NAME_CUR_STATE", "cur_state"),
            cooling_device_override: env::var("COOLING_DEVICE_OVERRIDE")
                .ok()
                .filter(|s| !s.is_empty()),
            nvme_devices: string_var("NVME_DEVICES", "/dev/nvme?"),
            nvme_command: string_var("NVME_COMMAND", "nvme"),
        })
    }
}

fn string_var(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn optional_var<T>(name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| {
                FanControlError::Config(format!("invalid {} '{}': {}", name, raw.trim(), e))
            }),
        Err(_) => Ok(None),
    }
}

fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|e| {
            FanControlError::Config(format!("invalid {} '{}': {}", name, raw.trim(), e))
        }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const ALL_VARS: &[&str] = &[
        "DEBUG",
        "SLEEP_TIME",
        "SLEEP_TIME_HEATING",
        "MIN_STATE",
        "MAX_STATE",
        "LOWER_TEMP_THRESHOLD",
        "UPPER_TEMP_THRESHOLD",
        "MIN_DELTA",
        "THERMAL_DIR",
        "DEVICE_TYPE_PWM_FAN",
        "THERMAL_ZONE_NAME",
        "DEVICE_NAME_COOLING",
        "FILE_NAME_CUR_STATE",
        "COOLING_DEVICE_OVERRIDE",
        "NVME_DEVICES",
        "NVME_COMMAND",
    ];

    fn clear_env() {
        for var in ALL_VARS {
            env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn defaults_with_debug_on() {
        clear_env();
        let config = Config::from_env().unwrap();
        // DEBUG defaults to on, so the short poll interval applies
        assert_eq!(config.sleep_time, Duration::from_secs(5));
        assert_eq!(config.sleep_time_heating, Duration::from_secs(1));
        assert_eq!(config.min_state, 1);
        assert_eq!(config.max_state, None);
        assert_eq!(config.lower_temp_threshold, 45.0);
        assert_eq!(config.upper_temp_threshold, 65.0);
        assert_eq!(config.min_delta, 0.01);
        assert_eq!(config.thermal_dir, PathBuf::from("/sys/class/thermal"));
        assert_eq!(config.device_type_pwm_fan, "pwm-fan");
        assert_eq!(config.thermal_zone_name, "thermal_zone");
        assert_eq!(config.device_name_cooling, "cooling_device");
        assert_eq!(config.file_name_cur_state, "cur_state");
        assert_eq!(config.cooling_device_override, None);
        assert_eq!(config.nvme_devices, "/dev/nvme?");
        assert_eq!(config.nvme_command, "nvme");
    }

    #[test]
    #[serial]
    fn defaults_with_debug_off() {
        clear_env();
        env::set_var("DEBUG", "0");
        let config = Config::from_env().unwrap();
        assert_eq!(config.sleep_time, Duration::from_secs(15));
        assert_eq!(config.sleep_time_heating, Duration::from_secs(5));
        clear_env();
    }

    #[test]
    #[serial]
    fn overrides_are_honored() {
        clear_env();
        env::set_var("SLEEP_TIME", "30");
        env::set_var("SLEEP_TIME_HEATING", "7");
        env::set_var("MIN_STATE", "0");
        env::set_var("MAX_STATE", "3");
        env::set_var("LOWER_TEMP_THRESHOLD", "40.5");
        env::set_var("UPPER_TEMP_THRESHOLD", "70");
        env::set_var("COOLING_DEVICE_OVERRIDE", "cooling_device2");
        let config = Config::from_env().unwrap();
        assert_eq!(config.sleep_time, Duration::from_secs(30));
        assert_eq!(config.sleep_time_heating, Duration::from_secs(7));
        assert_eq!(config.min_state, 0);
        assert_eq!(config.max_state, Some(3));
        assert_eq!(config.lower_temp_threshold, 40.5);
        assert_eq!(config.upper_temp_threshold, 70.0);
        assert_eq!(
            config.cooling_device_override.as_deref(),
            Some("cooling_device2")
        );
        clear_env();
    }

    #[test]
    #[serial]
    fn empty_override_means_none() {
        clear_env();
        env::set_var("COOLING_DEVICE_OVERRIDE", "");
        let config = Config::from_env().unwrap();
        assert_eq!(config.cooling_device_override, None);
        clear_env();
    }

    #[test]
    #[serial]
    fn malformed_number_is_a_config_error() {
        clear_env();
        env::set_var("SLEEP_TIME", "soon");
        let result = Config::from_env();
        assert!(matches!(result, Err(FanControlError::Config(_))));
        clear_env();
    }

    #[test]
    #[serial]
    fn inverted_thresholds_are_rejected() {
        clear_env();
        env::set_var("LOWER_TEMP_THRESHOLD", "65");
        env::set_var("UPPER_TEMP_THRESHOLD", "45");
        let result = Config::from_env();
        assert!(matches!(result, Err(FanControlError::Config(_))));
        clear_env();
    }
}
