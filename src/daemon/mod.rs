//! The control loop: sample, decide, actuate, sleep.

use std::time::Duration;

use log::{debug, info, warn};
use tokio::time::sleep;

use crate::config::Config;
use crate::device::{CoolingDevice, SysfsCoolingDevice};
use crate::errors::Result;
use crate::policy::ControlPolicy;
use crate::sensors::{format_temp, SensorReader};
use crate::slots::SlotTable;

/// Temperature assumed when no sensor produced a sample. Maps to the lowest
/// slots; distinguishable from a genuinely cold system only through the
/// logged warning.
const FALLBACK_TEMP: f64 = 0.0;

/// Orchestrates SensorReader -> ControlPolicy -> CoolingDevice on a timer.
/// Single-threaded; the inter-cycle sleep is the only abortable point.
pub struct FanControlDaemon<D> {
    device: D,
    reader: SensorReader,
    policy: ControlPolicy,
}

impl FanControlDaemon<SysfsCoolingDevice> {
    /// Discover the actuator and precompute the slot ladder. Failure here is
    /// fatal and not retried.
    pub fn new(config: &Config) -> Result<Self> {
        let device = SysfsCoolingDevice::discover(config)?;
        info!("Fan device: {}", device.path().display());

        // The configured cap never widens the actuator's own range.
        let max_state = config
            .max_state
            .map_or(device.max_state(), |cap| cap.min(device.max_state()));
        let slots = SlotTable::build(
            config.min_state,
            max_state,
            config.lower_temp_threshold,
            config.upper_temp_threshold,
        )?;
        info!("Temperature slots:");
        info!("    * when temperature reaches the threshold of a slot, the fan state is set to the corresponding value");
        info!(
            "    * when temperature falls below {} the state is set to {}",
            format_temp(config.lower_temp_threshold),
            config.min_state
        );
        for slot in slots.slots() {
            info!("    {:>8}: {}", format_temp(slot.threshold), slot.state);
        }

        Ok(Self {
            device,
            reader: SensorReader::new(config),
            policy: ControlPolicy::from_config(config, slots, max_state),
        })
    }
}

impl<D: CoolingDevice> FanControlDaemon<D> {
    pub fn with_parts(device: D, reader: SensorReader, policy: ControlPolicy) -> Self {
        Self {
            device,
            reader,
            policy,
        }
    }

    /// Run forever, until interrupted.
    pub async fn run(mut self) -> Result<()> {
        info!("PWM fan control service");
        loop {
            let delay = self.cycle();
            debug!(
                "sleeping for {} seconds ({:?})",
                delay.as_secs(),
                self.policy.mode()
            );
            tokio::select! {
                _ = sleep(delay) => {}
                _ = tokio::signal::ctrl_c() => {
                    info!("received interrupt, shutting down");
                    return Ok(());
                }
            }
        }
    }

    /// One full cycle against live sensors; returns the next sleep duration.
    fn cycle(&mut self) -> Duration {
        let temp = match self.reader.hottest() {
            Some((_, temp)) => temp,
            None => {
                warn!(
                    "no readable temperature sensors, assuming {}",
                    format_temp(FALLBACK_TEMP)
                );
                FALLBACK_TEMP
            }
        };
        self.apply(temp)
    }

    /// One control step for a known temperature. The write is skipped when
    /// the target equals the actuator's reported state; a failed write is
    /// logged and retried next cycle.
    fn apply(&mut self, temp: f64) -> Duration {
        let reported = self.device.current_state();
        let decision = self.policy.decide(temp, reported);
        if decision.changed {
            info!(
                "fan speed needs to be changed to: {} (current temp: {})",
                decision.target,
                format_temp(temp)
            );
            if let Err(e) = self.device.set_state(decision.target) {
                warn!("{}", e);
            }
        } else {
            debug!(
                "fan state {} unchanged (current temp: {})",
                reported,
                format_temp(temp)
            );
        }
        self.policy.next_interval(temp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::FanControlError;
    use std::path::PathBuf;

    fn test_config() -> Config {
        Config {
            sleep_time: Duration::from_secs(15),
            sleep_time_heating: Duration::from_secs(5),
            min_state: 1,
            max_state: None,
            lower_temp_threshold: 45.0,
            upper_temp_threshold: 65.0,
            min_delta: 0.01,
            thermal_dir: PathBuf::from("/sys/class/thermal"),
            device_type_pwm_fan: "pwm-fan".to_string(),
            thermal_zone_name: "thermal_zone".to_string(),
            device_name_cooling: "cooling_device".to_string(),
            file_name_cur_state: "cur_state".to_string(),
            cooling_device_override: None,
            nvme_devices: "/dev/nvme?".to_string(),
            nvme_command: "nvme".to_string(),
        }
    }

    /// Actuator double recording every write.
    struct RecordingDevice {
        max_state: u32,
        state: u32,
        writes: Vec<u32>,
        fail_writes: bool,
    }

    impl RecordingDevice {
        fn new(max_state: u32, state: u32) -> Self {
            Self {
                max_state,
                state,
                writes: Vec::new(),
                fail_writes: false,
            }
        }
    }

    impl CoolingDevice for RecordingDevice {
        fn max_state(&self) -> u32 {
            self.max_state
        }

        fn current_state(&self) -> u32 {
            self.state
        }

        fn set_state(&mut self, state: u32) -> Result<()> {
            self.writes.push(state);
            if self.fail_writes {
                return Err(FanControlError::Config("write refused".to_string()));
            }
            self.state = state;
            Ok(())
        }
    }

    fn daemon(device: RecordingDevice) -> FanControlDaemon<RecordingDevice> {
        let config = test_config();
        let slots = SlotTable::build(
            config.min_state,
            device.max_state(),
            config.lower_temp_threshold,
            config.upper_temp_threshold,
        )
        .unwrap();
        let max_state = device.max_state();
        let policy = ControlPolicy::from_config(&config, slots, max_state);
        FanControlDaemon::with_parts(device, SensorReader::with_probes(vec![]), policy)
    }

    #[test]
    fn unchanged_temperature_writes_exactly_once() {
        let mut daemon = daemon(RecordingDevice::new(5, 1));
        daemon.apply(52.0);
        daemon.apply(52.0);
        assert_eq!(daemon.device.writes, vec![2]);
        assert_eq!(daemon.device.state, 2);
    }

    #[test]
    fn matching_reported_state_suppresses_the_write() {
        let mut daemon = daemon(RecordingDevice::new(5, 2));
        daemon.apply(52.0);
        assert!(daemon.device.writes.is_empty());
    }

    #[test]
    fn failed_write_is_retried_on_the_next_cycle() {
        let mut device = RecordingDevice::new(5, 1);
        device.fail_writes = true;
        let mut daemon = daemon(device);
        daemon.apply(62.0);
        daemon.apply(62.0);
        // target state 4 both times; the device never accepted it
        assert_eq!(daemon.device.writes, vec![4, 4]);
        assert_eq!(daemon.device.state, 1);
    }

    #[test]
    fn no_sensors_falls_back_to_the_minimum_state() {
        let mut daemon = daemon(RecordingDevice::new(5, 3));
        let delay = daemon.cycle();
        // fallback 0.0 maps below the lower threshold
        assert_eq!(daemon.device.writes, vec![1]);
        assert_eq!(delay, Duration::from_secs(15));
    }

    #[test]
    fn rising_temperature_shortens_the_next_sleep() {
        let mut daemon = daemon(RecordingDevice::new(5, 1));
        assert_eq!(daemon.apply(50.0), Duration::from_secs(15));
        assert_eq!(daemon.apply(53.0), Duration::from_secs(5));
        assert_eq!(daemon.apply(51.0), Duration::from_secs(15));
    }
}
