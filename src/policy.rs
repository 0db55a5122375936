//! Control decisions: slot lookup, write suppression, adaptive poll cadence.

use std::time::Duration;

use crate::config::Config;
use crate::slots::SlotTable;

/// Directional trend of the temperature between consecutive samples. Only
/// used to pick the next poll interval, never the fan state itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Heating,
    Cooling,
}

/// Outcome of one control step. Recomputed every cycle, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlDecision {
    pub target: u32,
    /// Whether the target differs from the actuator's reported state. A
    /// `false` here suppresses the write for the cycle.
    pub changed: bool,
}

/// Maps temperature samples to fan states via the slot ladder.
///
/// The mapping itself is stateless and idempotent: the same temperature
/// always yields the same state, independent of history. The only state
/// carried across cycles is the previous sample and trend, which feed the
/// adaptive cadence.
pub struct ControlPolicy {
    slots: SlotTable,
    min_state: u32,
    max_state: u32,
    min_delta: f64,
    heating_interval: Duration,
    cooling_interval: Duration,
    prev_temp: Option<f64>,
    mode: Mode,
}

impl ControlPolicy {
    pub fn from_config(config: &Config, slots: SlotTable, max_state: u32) -> Self {
        Self {
            slots,
            min_state: config.min_state,
            max_state,
            min_delta: config.min_delta,
            heating_interval: config.sleep_time_heating,
            cooling_interval: config.sleep_time,
            prev_temp: None,
            mode: Mode::Cooling,
        }
    }

    /// The fan state for `temp`, clamped into the actuator's range.
    pub fn target_state(&self, temp: f64) -> u32 {
        self.slots
            .select(temp)
            .state
            .clamp(self.min_state, self.max_state)
    }

    pub fn decide(&self, temp: f64, reported_state: u32) -> ControlDecision {
        let target = self.target_state(temp);
        ControlDecision {
            target,
            changed: target != reported_state,
        }
    }

    /// Record this cycle's sample and return the delay before the next one:
    /// shorter while heating, longer while cooling. Deltas within the
    /// `min_delta` deadband keep the previous trend.
    pub fn next_interval(&mut self, temp: f64) -> Duration {
        if let Some(prev) = self.prev_temp {
            let delta = temp - prev;
            if delta > self.min_delta {
                self.mode = Mode::Heating;
            } else if delta < -self.min_delta {
                self.mode = Mode::Cooling;
            }
        }
        self.prev_temp = Some(temp);
        match self.mode {
            Mode::Heating => self.heating_interval,
            Mode::Cooling => self.cooling_interval,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn slots(&self) -> &SlotTable {
        &self.slots
    }
}
