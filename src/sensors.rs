//! Temperature sources: thermal zones and best-effort NVMe probing.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use log::{debug, error, warn};

use crate::config::Config;

/// Two decimals with the degree suffix, for log output.
pub fn format_temp(value: f64) -> String {
    format!("{:.2}°C", value)
}

/// A class of temperature sources. Unreadable sources contribute no reading;
/// a value is never fabricated for them.
pub trait TemperatureProbe {
    /// Current (label, degrees Celsius) readings.
    fn readings(&self) -> Vec<(String, f64)>;
}

/// Thermal zone directories under the thermal root, matched by name prefix.
/// Each zone exposes a `temp` file in milli-degrees Celsius.
pub struct ThermalZoneProbe {
    thermal_dir: PathBuf,
    zone_prefix: String,
}

impl ThermalZoneProbe {
    pub fn new(config: &Config) -> Self {
        Self {
            thermal_dir: config.thermal_dir.clone(),
            zone_prefix: config.thermal_zone_name.clone(),
        }
    }
}

impl TemperatureProbe for ThermalZoneProbe {
    fn readings(&self) -> Vec<(String, f64)> {
        let mut temps = Vec::new();
        let entries = match fs::read_dir(&self.thermal_dir) {
            Ok(entries) => entries,
            Err(e) => {
                error!(
                    "error while getting current temperature from {}: {}",
                    self.thermal_dir.display(),
                    e
                );
                return temps;
            }
        };
        for entry in entries.flatten() {
            let zone = entry.file_name().to_string_lossy().to_string();
            if !zone.starts_with(&self.zone_prefix) {
                continue;
            }
            let temp_path = entry.path().join("temp");
            let Ok(raw) = fs::read_to_string(&temp_path) else {
                continue;
            };
            match raw.trim().parse::<f64>() {
                Ok(millidegrees) => temps.push((zone, millidegrees / 1000.0)),
                Err(_) => error!(
                    "unparsable temperature '{}' in {}",
                    raw.trim(),
                    temp_path.display()
                ),
            }
        }
        temps
    }
}

/// NVMe drive temperatures via an external `smart-log` invocation over
/// glob-matched device nodes. Best effort: a missing binary contributes
/// zero samples after a one-time warning.
pub struct NvmeSmartProbe {
    command: String,
    device_pattern: String,
    available: bool,
}

impl NvmeSmartProbe {
    pub fn new(config: &Config) -> Self {
        let available = command_in_path(&config.nvme_command);
        if !available {
            warn!(
                "The command {} does not exist. Install using apt/apt-get.",
                config.nvme_command
            );
        }
        Self {
            command: config.nvme_command.clone(),
            device_pattern: config.nvme_devices.clone(),
            available,
        }
    }
}

impl TemperatureProbe for NvmeSmartProbe {
    fn readings(&self) -> Vec<(String, f64)> {
        let mut temps = Vec::new();
        if !self.available {
            return temps;
        }
        for device in matching_paths(&self.device_pattern) {
            debug!("Getting temperature for nvme: {}", device.display());
            let output = match Command::new(&self.command)
                .arg("smart-log")
                .arg(&device)
                .output()
            {
                Ok(output) => output,
                Err(e) => {
                    error!("Command failed with error: {}", e);
                    continue;
                }
            };
            if !output.status.success() {
                error!(
                    "Command failed with error: {}",
                    String::from_utf8_lossy(&output.stderr).trim()
                );
                continue;
            }
            let stdout = String::from_utf8_lossy(&output.stdout);
            match parse_smart_log(&stdout) {
                Some(celsius) => {
                    let name = device
                        .file_name()
                        .map(|n| n.to_string_lossy().to_string())
                        .unwrap_or_else(|| device.display().to_string());
                    temps.push((name, celsius));
                }
                None => error!(
                    "no temperature found in smart-log output for {}",
                    device.display()
                ),
            }
        }
        temps
    }
}

/// Extract the temperature from `smart-log` free-text output: the first line
/// prefixed with "temperature", split on ':', leading numeric token of the
/// value field.
pub fn parse_smart_log(output: &str) -> Option<f64> {
    for line in output.lines() {
        if !line.trim_start().to_lowercase().starts_with("temperature") {
            continue;
        }
        let Some((_, value)) = line.split_once(':') else {
            continue;
        };
        let Some(token) = value.split_whitespace().next() else {
            continue;
        };
        let numeric: String = token
            .chars()
            .take_while(|c| c.is_ascii_digit() || *c == '.')
            .collect();
        if let Ok(celsius) = numeric.parse() {
            return Some(celsius);
        }
        error!("Error converting temperature to float: {}", token);
    }
    None
}

fn command_in_path(command: &str) -> bool {
    if command.contains('/') {
        return Path::new(command).is_file();
    }
    let Some(paths) = env::var_os("PATH") else {
        return false;
    };
    env::split_paths(&paths).any(|dir| dir.join(command).is_file())
}

/// Shell-style matching with `?` and `*`, enough for device node patterns
/// like `/dev/nvme?`.
fn wildcard_match(pattern: &[u8], name: &[u8]) -> bool {
    match pattern.split_first() {
        None => name.is_empty(),
        Some((b'*', rest)) => (0..=name.len()).any(|skip| wildcard_match(rest, &name[skip..])),
        Some((b'?', rest)) => !name.is_empty() && wildcard_match(rest, &name[1..]),
        Some((c, rest)) => name.first() == Some(c) && wildcard_match(rest, &name[1..]),
    }
}

fn matching_paths(pattern: &str) -> Vec<PathBuf> {
    let pattern_path = Path::new(pattern);
    let (Some(parent), Some(file_pattern)) = (pattern_path.parent(), pattern_path.file_name())
    else {
        return Vec::new();
    };
    let file_pattern = file_pattern.to_string_lossy();
    let Ok(entries) = fs::read_dir(parent) else {
        return Vec::new();
    };
    let mut paths: Vec<PathBuf> = entries
        .flatten()
        .filter(|entry| {
            wildcard_match(
                file_pattern.as_bytes(),
                entry.file_name().to_string_lossy().as_bytes(),
            )
        })
        .map(|entry| entry.path())
        .collect();
    paths.sort();
    paths
}

/// Aggregates all probes into the single representative temperature.
pub struct SensorReader {
    probes: Vec<Box<dyn TemperatureProbe>>,
}

impl SensorReader {
    pub fn new(config: &Config) -> Self {
        Self {
            probes: vec![
                Box::new(ThermalZoneProbe::new(config)),
                Box::new(NvmeSmartProbe::new(config)),
            ],
        }
    }

    pub fn with_probes(probes: Vec<Box<dyn TemperatureProbe>>) -> Self {
        Self { probes }
    }

    /// Maximum temperature across all probes, with the names of every source
    /// reporting it (ties joined for display, the value taken once). `None`
    /// when nothing was readable.
    pub fn hottest(&self) -> Option<(String, f64)> {
        let mut temps: Vec<(String, f64)> = self
            .probes
            .iter()
            .flat_map(|probe| probe.readings())
            .collect();
        if temps.is_empty() {
            return None;
        }
        temps.sort_by(|a, b| a.0.cmp(&b.0));

        debug!("Current temperatures of all devices:");
        for (device, temp) in &temps {
            debug!("    {:<20}: {}", device, format_temp(*temp));
        }

        let max_temp = temps.iter().map(|t| t.1).fold(f64::MIN, f64::max);
        let winners: Vec<&str> = temps
            .iter()
            .filter(|t| t.1 >= max_temp)
            .map(|t| t.0.as_str())
            .collect();
        let winners = winners.join(", ");
        debug!(
            "Maximum temperature {} found for {}",
            format_temp(max_temp),
            winners
        );
        Some((winners, max_temp))
    }
}
