//! Per-episode state and per-step outputs of the orchestrator.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::account::AccountSummary;
use crate::depth::AggregatedBook;
use crate::error::LedgerError;
use crate::messages::{Action, OrderId, Trade, TraderId};
use crate::observation::Observation;

/// Orchestrator state machine. A step is one synchronous transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    Idle,
    Stepping,
}

/// Why an action was skipped. Recoverable: the episode continues.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ActionRejection {
    /// Bad size, price or tick alignment.
    InvalidOrder(String),
    InsufficientFunds { needed: f64, available: f64 },
    InsufficientPosition { needed: u32, available: i64 },
    /// The trader is already done for this episode.
    AgentDone,
}

impl From<LedgerError> for ActionRejection {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::InsufficientFunds { needed, available } => {
                ActionRejection::InsufficientFunds { needed, available }
            }
            LedgerError::InsufficientPosition { needed, available } => {
                ActionRejection::InsufficientPosition { needed, available }
            }
            other => ActionRejection::InvalidOrder(other.to_string()),
        }
    }
}

/// What happened to one action.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ActionOutcome {
    /// Side was `None`.
    NoOp,
    Rejected(ActionRejection),
    Accepted {
        order_id: OrderId,
        filled: u32,
        resting: u32,
        /// Unfilled market size thrown away.
        discarded: u32,
        /// Own resting orders removed by self-trade prevention.
        self_trade_cancels: Vec<OrderId>,
    },
}

/// Per-trader diagnostics for one step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepInfo {
    /// One entry per action the trader submitted, in execution order.
    pub outcomes: Vec<ActionOutcome>,
    /// Every trade this trader took part in, as aggressor or resting side.
    pub trades: Vec<Trade>,
    /// Account after mark-to-market.
    pub account: AccountSummary,
}

/// Output of one `step()`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepResult {
    /// The step index that was processed (before increment).
    pub t_step: u32,
    pub observations: BTreeMap<TraderId, Observation>,
    pub rewards: BTreeMap<TraderId, f64>,
    pub dones: BTreeMap<TraderId, bool>,
    pub infos: BTreeMap<TraderId, StepInfo>,
    /// True once every trader is done.
    pub all_done: bool,
    /// Actions naming a trader id outside the environment.
    pub unknown_actions: Vec<Action>,
}

impl StepResult {
    /// The step's trades, once each, in sequence order. Every trade shows
    /// up in both counterparties' infos.
    pub fn trades(&self) -> Vec<&Trade> {
        let unique: BTreeMap<u64, &Trade> = self
            .infos
            .values()
            .flat_map(|info| info.trades.iter())
            .map(|trade| (trade.sequence_number, trade))
            .collect();
        unique.into_values().collect()
    }
}

/// Mutable state owned by the orchestrator for one episode.
#[derive(Debug, Clone)]
pub struct EpisodeState {
    pub t_step: u32,
    pub max_step: u32,
    pub phase: Phase,
    pub done_set: BTreeSet<TraderId>,
    pub next_order_id: OrderId,
    /// Aggregated book before the last step's actions.
    pub agg_lob: AggregatedBook,
    /// Aggregated book after the last step's actions.
    pub agg_lob_aft: AggregatedBook,
    pub last_result: Option<StepResult>,
}

impl EpisodeState {
    pub fn new(max_step: u32) -> Self {
        EpisodeState {
            t_step: 0,
            max_step,
            phase: Phase::Idle,
            done_set: BTreeSet::new(),
            next_order_id: 1,
            agg_lob: AggregatedBook::default(),
            agg_lob_aft: AggregatedBook::default(),
            last_result: None,
        }
    }

    pub fn is_done(&self, trader_id: TraderId) -> bool {
        self.done_set.contains(&trader_id)
    }

    /// Whether the current step is the episode's last.
    pub fn at_horizon(&self) -> bool {
        self.t_step + 1 >= self.max_step
    }

    pub fn allocate_order_id(&mut self) -> OrderId {
        let id = self.next_order_id;
        self.next_order_id += 1;
        id
    }
}
