//! Error types for the continuous double auction core.
//!
//! Input-caused errors (`InvalidOrder`, `InsufficientFunds`,
//! `InsufficientPosition`, `OrderNotFound`) are recoverable: the offending
//! action is skipped and reported. `CrossedBook` is an engine invariant
//! violation and aborts the step.

use thiserror::Error;

use crate::messages::{OrderId, TraderId};

/// Errors raised by the order book.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BookError {
    /// Bad size, missing/zero limit price or off-tick price.
    #[error("invalid order: {0}")]
    InvalidOrder(String),

    /// Cancel on an id that is not resting in the book.
    #[error("order not found: {0}")]
    OrderNotFound(OrderId),

    /// The book ended a submit with `best_bid >= best_ask`.
    #[error("crossed book: best bid {best_bid} >= best ask {best_ask} (ticks)")]
    CrossedBook { best_bid: u32, best_ask: u32 },
}

/// Errors raised by an account when reserving for a new order.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    #[error("insufficient funds: need {needed}, available {available}")]
    InsufficientFunds { needed: f64, available: f64 },

    #[error("insufficient position: need {needed}, available {available}")]
    InsufficientPosition { needed: u32, available: i64 },

    #[error("no reservation held for order {0}")]
    UnknownOrder(OrderId),

    #[error("reservation amount must be >= 0, got {0}")]
    InvalidReservation(i64),
}

/// Invalid environment configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("num_traders must be at least 1")]
    NoTraders,

    #[error("tick_size must be finite and > 0, got {0}")]
    TickSize(f64),

    #[error("init_cash must be finite and >= 0, got {0}")]
    InitCash(f64),

    #[error("max_step must be at least 1")]
    MaxStep,

    #[error("obs_depth must be at least 1")]
    ObsDepth,

    #[error("bankruptcy_floor must be finite, got {0}")]
    BankruptcyFloor(f64),
}

/// Errors returned by the step orchestrator.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EnvError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// `step()` or `cancel()` called before `reset()` (or after a fatal step).
    #[error("environment has not been reset")]
    NotReset,

    /// Every agent is already done.
    #[error("episode finished at step {0}; call reset()")]
    EpisodeFinished(u32),

    #[error("unknown trader: {0}")]
    UnknownTrader(TraderId),

    /// Cancel of an order the trader does not own or that is not resting.
    #[error("order not found: {0}")]
    OrderNotFound(OrderId),

    /// Engine invariant violated mid-step. The episode is discarded.
    #[error("fatal engine error: {0}")]
    Fatal(BookError),
}
