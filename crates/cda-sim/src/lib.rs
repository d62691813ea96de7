//! cda-sim
//!
//! Drives continuous double auction episodes from the command line, either
//! with seeded random traders or by replaying a CSV action script.

pub mod agents;
pub mod config;
pub mod runner;

pub use agents::{Agent, MarketView, RandomAgent};
pub use config::{AgentConfig, SimConfig};
pub use runner::{run_random, run_script, EpisodeSummary};
