//! Configuration for the simulation driver.
//!
//! Layers, lowest precedence first:
//!
//! 1. built-in defaults
//! 2. an optional TOML file (`--config path`)
//! 3. environment variables:
//!    - `CDA_NUM_TRADERS`
//!    - `CDA_INIT_CASH`
//!    - `CDA_TICK_SIZE`
//!    - `CDA_TAPE_LENGTH`
//!    - `CDA_MAX_STEP`
//!    - `CDA_OBS_DEPTH`
//!    - `CDA_SEED`
//!    - `CDA_SHORT_ALLOWANCE`
//!    - `CDA_EPISODES`
//! 4. command-line flags (applied in `main`)

use std::env;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::Deserialize;

use cda_core::EnvConfig;

/// Parameters of the built-in random traders.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Probability that an agent does nothing this step.
    pub noop_prob: f64,

    /// Probability that a non-idle action is a market order.
    pub market_prob: f64,

    /// Largest order size, in units.
    pub max_size: u32,

    /// Limit prices are drawn within this many ticks of the reference.
    pub price_range_ticks: u32,

    /// Reference price used before the first trade.
    pub anchor_price: f64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        AgentConfig {
            noop_prob: 0.2,
            market_prob: 0.1,
            max_size: 10,
            price_range_ticks: 8,
            anchor_price: 100.0,
        }
    }
}

/// Full driver configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub env: EnvConfig,
    pub agents: AgentConfig,

    /// Episodes to run back to back (seed `env.seed + episode`).
    pub episodes: u32,
}

impl Default for SimConfig {
    fn default() -> Self {
        SimConfig {
            env: EnvConfig::default(),
            agents: AgentConfig::default(),
            episodes: 1,
        }
    }
}

impl SimConfig {
    /// Defaults, then `path` if given, then environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let base = match path {
            Some(path) => Self::from_toml_file(path)?,
            None => SimConfig::default(),
        };
        base.with_env_overrides()
    }

    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::from_toml_str(&text).with_context(|| format!("parsing config file {}", path.display()))
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Apply `CDA_*` environment variables on top of `self`.
    pub fn with_env_overrides(mut self) -> Result<Self> {
        let env_cfg = &mut self.env;
        env_cfg.num_traders = read_env_or_default("CDA_NUM_TRADERS", env_cfg.num_traders)?;
        env_cfg.init_cash = read_env_or_default("CDA_INIT_CASH", env_cfg.init_cash)?;
        env_cfg.tick_size = read_env_or_default("CDA_TICK_SIZE", env_cfg.tick_size)?;
        env_cfg.tape_display_length =
            read_env_or_default("CDA_TAPE_LENGTH", env_cfg.tape_display_length)?;
        env_cfg.max_step = read_env_or_default("CDA_MAX_STEP", env_cfg.max_step)?;
        env_cfg.obs_depth = read_env_or_default("CDA_OBS_DEPTH", env_cfg.obs_depth)?;
        env_cfg.seed = read_env_or_default("CDA_SEED", env_cfg.seed)?;
        env_cfg.short_allowance =
            read_env_or_default("CDA_SHORT_ALLOWANCE", env_cfg.short_allowance)?;
        self.episodes = read_env_or_default("CDA_EPISODES", self.episodes)?;
        Ok(self)
    }
}

fn read_env_or_default<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(val) => val
            .trim()
            .parse::<T>()
            .with_context(|| format!("invalid value for {}: {:?}", key, val)),
        Err(_) => Ok(default),
    }
}
