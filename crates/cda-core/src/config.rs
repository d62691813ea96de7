//! Environment configuration.
//!
//! Everything here is fixed for the lifetime of an environment; a new
//! episode (`reset()`) re-reads the same values.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::tick::TickSize;

/// Construction-time parameters of a [`CdaEnv`](crate::environment::CdaEnv).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvConfig {
    /// Number of traders; ids are `0..num_traders`.
    pub num_traders: u32,

    /// Starting cash per trader, real units. Rounded down to a whole tick.
    pub init_cash: f64,

    /// Minimum price increment.
    pub tick_size: f64,

    /// Number of recent trades kept on the display tape.
    pub tape_display_length: usize,

    /// Steps per episode.
    pub max_step: u32,

    /// Price levels per side in observations and aggregated snapshots.
    pub obs_depth: usize,

    /// Seed for the arrival-order permutation.
    pub seed: u64,

    /// Units each trader may sell beyond its holdings (0 = no shorting).
    pub short_allowance: u32,

    /// A trader whose NAV falls below this is done.
    pub bankruptcy_floor: f64,
}

impl Default for EnvConfig {
    fn default() -> Self {
        EnvConfig {
            num_traders: 2,
            init_cash: 1_000_000.0,
            tick_size: 0.25,
            tape_display_length: 10,
            max_step: 100,
            obs_depth: 10,
            seed: 0,
            short_allowance: 0,
            bankruptcy_floor: 0.0,
        }
    }
}

impl EnvConfig {
    /// The five parameters the environment is usually built from; the rest
    /// keep their defaults.
    pub fn new(
        num_traders: u32,
        init_cash: f64,
        tick_size: f64,
        tape_display_length: usize,
        max_step: u32,
    ) -> Self {
        EnvConfig {
            num_traders,
            init_cash,
            tick_size,
            tape_display_length,
            max_step,
            ..EnvConfig::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_short_allowance(mut self, units: u32) -> Self {
        self.short_allowance = units;
        self
    }

    pub fn with_obs_depth(mut self, depth: usize) -> Self {
        self.obs_depth = depth;
        self
    }

    pub fn with_bankruptcy_floor(mut self, floor: f64) -> Self {
        self.bankruptcy_floor = floor;
        self
    }

    /// Check every field; returns the parsed tick size.
    pub fn validate(&self) -> Result<TickSize, ConfigError> {
        if self.num_traders == 0 {
            return Err(ConfigError::NoTraders);
        }
        let tick = TickSize::new(self.tick_size).ok_or(ConfigError::TickSize(self.tick_size))?;
        if !self.init_cash.is_finite() || self.init_cash < 0.0 {
            return Err(ConfigError::InitCash(self.init_cash));
        }
        if self.max_step == 0 {
            return Err(ConfigError::MaxStep);
        }
        if self.obs_depth == 0 {
            return Err(ConfigError::ObsDepth);
        }
        if !self.bankruptcy_floor.is_finite() {
            return Err(ConfigError::BankruptcyFloor(self.bankruptcy_floor));
        }
        Ok(tick)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let tick = EnvConfig::default().validate().unwrap();
        assert_eq!(tick.value(), 0.25);
    }

    #[test]
    fn bad_fields_are_rejected() {
        let cfg = EnvConfig::new(0, 10.0, 1.0, 10, 10);
        assert_eq!(cfg.validate(), Err(ConfigError::NoTraders));

        let cfg = EnvConfig::new(2, 10.0, 0.0, 10, 10);
        assert_eq!(cfg.validate(), Err(ConfigError::TickSize(0.0)));

        let cfg = EnvConfig::new(2, -1.0, 1.0, 10, 10);
        assert_eq!(cfg.validate(), Err(ConfigError::InitCash(-1.0)));

        let cfg = EnvConfig::new(2, 10.0, 1.0, 10, 0);
        assert_eq!(cfg.validate(), Err(ConfigError::MaxStep));

        let cfg = EnvConfig::new(2, 10.0, 1.0, 10, 10).with_obs_depth(0);
        assert_eq!(cfg.validate(), Err(ConfigError::ObsDepth));
    }
}
