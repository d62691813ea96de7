//! cda-core
//!
//! Continuous double auction matching and settlement core:
//! - messages (actions in, trades out)
//! - order representation and tick conversion
//! - single-instrument order book with price-time priority
//! - per-trader account ledger
//! - fixed-width observation builder
//! - step orchestrator ([`CdaEnv`])

pub mod side;
pub mod order_type;
pub mod tick;
pub mod messages;
pub mod order;
pub mod depth;
pub mod order_book;
pub mod account;
pub mod observation;
pub mod config;
pub mod episode;
pub mod environment;
pub mod error;

pub use side::Side;
pub use order_type::OrderType;
pub use tick::TickSize;

pub use messages::{Action, OrderId, Trade, TraderId};

pub use order::Order;
pub use depth::{AggregatedBook, LevelSummary};
pub use order_book::{OrderBook, SubmitOutcome};
pub use account::{Account, AccountSummary};
pub use observation::{Observation, ObservationBuilder};
pub use config::EnvConfig;
pub use episode::{ActionOutcome, ActionRejection, EpisodeState, Phase, StepInfo, StepResult};
pub use environment::CdaEnv;
pub use error::{BookError, ConfigError, EnvError, LedgerError};
