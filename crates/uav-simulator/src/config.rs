//! Simulation configuration.
//!
//! Supplied once at startup and immutable afterwards; nothing is reloaded
//! while the cycles run.

use std::time::Duration;

use uav_domain::Zone;

use crate::error::{Result, SimError};

/// Process-wide simulation parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    /// Radar coverage zone
    pub zone: Zone,

    /// Upper bound on the number of live UAVs
    pub max_population: usize,

    /// UAVs spawned synchronously before the cycles start
    pub initial_population: usize,

    /// Period of the population growth cycle
    pub growth_period: Duration,

    /// Period of the motion cycle
    pub motion_period: Duration,

    /// Chance that a growth tick spawns a UAV
    pub spawn_probability: f64,

    /// Chance that a newly spawned UAV is flagged dangerous
    pub dangerous_probability: f64,

    /// Chance per motion step that the threat flag flips
    pub threat_flip_probability: f64,

    /// Chance per motion step that a UAV is retired
    pub retire_probability: f64,

    /// Per-subscriber event buffer; must hold a full snapshot
    pub subscriber_buffer: usize,

    /// RNG seed; `None` seeds from OS entropy
    pub seed: Option<u64>,
}

impl SimulationConfig {
    /// Check every invariant the engine relies on.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidConfig`] for out-of-range values and
    /// [`SimError::Domain`] for invalid zone geometry.
    pub fn validate(&self) -> Result<()> {
        self.zone.validate()?;

        if self.max_population == 0 {
            return Err(SimError::InvalidConfig(
                "max_population must be at least 1".to_string(),
            ));
        }
        if self.initial_population > self.max_population {
            return Err(SimError::InvalidConfig(format!(
                "initial_population {} exceeds max_population {}",
                self.initial_population, self.max_population
            )));
        }
        if self.growth_period.is_zero() || self.motion_period.is_zero() {
            return Err(SimError::InvalidConfig(
                "cycle periods must be non-zero".to_string(),
            ));
        }
        if self.subscriber_buffer < self.max_population {
            return Err(SimError::InvalidConfig(format!(
                "subscriber_buffer {} cannot hold a snapshot of {} UAVs",
                self.subscriber_buffer, self.max_population
            )));
        }

        let odds = [
            ("spawn_probability", self.spawn_probability),
            ("dangerous_probability", self.dangerous_probability),
            ("threat_flip_probability", self.threat_flip_probability),
            ("retire_probability", self.retire_probability),
        ];
        for (name, p) in odds {
            if !(0.0..=1.0).contains(&p) {
                return Err(SimError::InvalidConfig(format!(
                    "{name} must lie in [0, 1], got {p}"
                )));
            }
        }

        Ok(())
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            zone: Zone::default(),
            max_population: 15,
            initial_population: 5,
            growth_period: Duration::from_secs(3),
            motion_period: Duration::from_secs(2),
            spawn_probability: 0.5,
            dangerous_probability: 0.5,
            threat_flip_probability: 0.05,
            retire_probability: 0.03,
            subscriber_buffer: 256,
            seed: None,
        }
    }
}
