//! Aggregated (per-price-level) view of the book.
//!
//! This is the "agg LOB" snapshot the orchestrator takes before and after
//! each step and the input to the observation builder. It is a plain copy,
//! so holding one never borrows the book.

use serde::{Deserialize, Serialize};

/// Total resting size at one price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelSummary {
    /// Price in ticks.
    pub price: u32,
    /// Sum of `remaining_size` over the level's orders.
    pub size: u64,
    /// Number of resting orders at this price.
    pub order_count: usize,
}

/// Up to N best levels per side, best first.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AggregatedBook {
    /// Bids, descending by price.
    pub bids: Vec<LevelSummary>,
    /// Asks, ascending by price.
    pub asks: Vec<LevelSummary>,
}

impl AggregatedBook {
    /// Returns `true` if there is *no* bid and *no* ask.
    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }
}
