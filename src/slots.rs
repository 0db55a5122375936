//! The slot ladder: discretization of the temperature band into fan states.

use crate::errors::{FanControlError, Result};

/// One rung of the ladder: the minimum temperature at which `state` applies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Slot {
    pub state: u32,
    pub threshold: f64,
}

/// Ordered (state, threshold) pairs, strictly increasing in both fields,
/// evenly spaced across the configured temperature band. Built once at
/// startup from the actuator's reported state range.
#[derive(Debug, Clone)]
pub struct SlotTable {
    slots: Vec<Slot>,
}

impl SlotTable {
    /// Build the ladder for states `min_state..=max_state` across
    /// `[lower, upper]`. A single-state actuator gets one slot at `lower`.
    pub fn build(min_state: u32, max_state: u32, lower: f64, upper: f64) -> Result<Self> {
        if max_state < min_state {
            return Err(FanControlError::Config(format!(
                "max_state {} is below min_state {}",
                max_state, min_state
            )));
        }
        if upper <= lower {
            return Err(FanControlError::Config(format!(
                "upper threshold {} must be above lower threshold {}",
                upper, lower
            )));
        }
        if max_state == min_state {
            return Ok(Self {
                slots: vec![Slot {
                    state: min_state,
                    threshold: lower,
                }],
            });
        }

        let step = (upper - lower) / (max_state - min_state) as f64;
        let slots = (0..=(max_state - min_state))
            .map(|i| Slot {
                state: min_state + i,
                threshold: lower + i as f64 * step,
            })
            .collect();
        Ok(Self { slots })
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Highest slot whose threshold does not exceed `temp` (inclusive bound).
    /// Temperatures below the lowest threshold map to the lowest slot.
    pub fn select(&self, temp: f64) -> Slot {
        let mut chosen = self.slots[0];
        for slot in &self.slots {
            if temp >= slot.threshold {
                chosen = *slot;
            } else {
                break;
            }
        }
        chosen
    }
}
