//! Step orchestrator: the multi-agent continuous double auction environment.
//!
//! [`CdaEnv`] exclusively owns the book, every account and the episode
//! state. Each `step()`:
//!
//! 1. snapshots the aggregated book,
//! 2. applies the agents' actions in a seeded random order (agents act
//!    "simultaneously"; submission-list order must not matter),
//! 3. settles every trade against both accounts as it happens,
//! 4. snapshots the book again and marks every account to market,
//! 5. builds observations, rewards (NAV change) and done flags.
//!
//! Bad actions are skipped and reported in the trader's [`StepInfo`]; only
//! a crossed book aborts a step, and the episode must then be reset.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::{debug, error, info, info_span, warn};

use crate::account::Account;
use crate::config::EnvConfig;
use crate::episode::{ActionOutcome, ActionRejection, EpisodeState, Phase, StepInfo, StepResult};
use crate::error::{BookError, EnvError};
use crate::messages::{Action, OrderId, Trade, TraderId};
use crate::observation::{Observation, ObservationBuilder};
use crate::order::Order;
use crate::order_book::OrderBook;
use crate::order_type::OrderType;
use crate::side::Side;
use crate::tick::{size_to_units, TickSize};

/// Multi-agent continuous double auction environment.
#[derive(Debug)]
pub struct CdaEnv {
    config: EnvConfig,
    tick_size: TickSize,
    builder: ObservationBuilder,

    /// Arrival-order permutation source; reseeded on every reset.
    rng: StdRng,

    book: OrderBook,

    /// Indexed by trader id.
    accounts: Vec<Account>,

    /// `None` until the first `reset()`, and after a fatal step.
    episode: Option<EpisodeState>,
}

impl CdaEnv {
    /// Build an environment. Call [`reset`](Self::reset) before stepping.
    pub fn new(config: EnvConfig) -> Result<Self, EnvError> {
        let tick_size = config.validate()?;
        let mut env = CdaEnv {
            builder: ObservationBuilder::new(config.obs_depth),
            rng: StdRng::seed_from_u64(config.seed),
            book: OrderBook::new(tick_size, config.tape_display_length),
            accounts: Vec::new(),
            episode: None,
            tick_size,
            config,
        };
        env.accounts = env.fresh_accounts();
        Ok(env)
    }

    /// Start a new episode with the configured seed.
    pub fn reset(&mut self) -> BTreeMap<TraderId, Observation> {
        self.reset_with_seed(self.config.seed)
    }

    /// Start a new episode, reseeding the arrival-order permutation.
    ///
    /// Discards the book, all accounts and all episode state.
    pub fn reset_with_seed(&mut self, seed: u64) -> BTreeMap<TraderId, Observation> {
        self.rng = StdRng::seed_from_u64(seed);
        self.book = OrderBook::new(self.tick_size, self.config.tape_display_length);
        self.accounts = self.fresh_accounts();
        self.episode = Some(EpisodeState::new(self.config.max_step));

        info!(
            seed,
            num_traders = self.config.num_traders,
            max_step = self.config.max_step,
            "episode reset"
        );

        self.observations()
    }

    /// Apply one batch of actions (at most one transaction per call).
    pub fn step(&mut self, actions: &[Action]) -> Result<StepResult, EnvError> {
        let mut episode = self.episode.take().ok_or(EnvError::NotReset)?;
        if episode.done_set.len() == self.accounts.len() {
            let t_step = episode.t_step;
            self.episode = Some(episode);
            return Err(EnvError::EpisodeFinished(t_step));
        }

        let span = info_span!("step", t = episode.t_step);
        let _enter = span.enter();

        episode.phase = Phase::Stepping;
        episode.agg_lob = self.book.aggregate(self.config.obs_depth);

        let mut arrival: Vec<usize> = (0..actions.len()).collect();
        arrival.shuffle(&mut self.rng);

        let mut outcomes: BTreeMap<TraderId, Vec<ActionOutcome>> = BTreeMap::new();
        let mut step_trades: Vec<Trade> = Vec::new();
        let mut unknown_actions = Vec::new();

        for idx in arrival {
            let action = &actions[idx];
            if action.trader_id as usize >= self.accounts.len() {
                warn!(trader_id = action.trader_id, "action for unknown trader ignored");
                unknown_actions.push(action.clone());
                continue;
            }

            // On a fatal error `episode` is dropped here, so the next call
            // reports NotReset.
            let outcome = self.apply_action(&mut episode, action, &mut step_trades)?;
            outcomes.entry(action.trader_id).or_default().push(outcome);
        }

        episode.agg_lob_aft = self.book.aggregate(self.config.obs_depth);

        let mark = self.book.mark_price().unwrap_or(0.0);
        let was_done = episode.done_set.clone();
        let at_horizon = episode.at_horizon();

        let mut rewards = BTreeMap::new();
        let mut dones = BTreeMap::new();
        for account in &mut self.accounts {
            let id = account.trader_id();
            let delta = account.mark_to_market(mark);
            let already_done = was_done.contains(&id);

            rewards.insert(id, if already_done { 0.0 } else { delta });

            let bankrupt = account.nav() < self.config.bankruptcy_floor;
            let done = already_done || at_horizon || bankrupt;
            if done && !already_done {
                info!(trader_id = id, nav = account.nav(), bankrupt, "trader done");
                episode.done_set.insert(id);
            }
            dones.insert(id, done);
        }

        let observations = self.observations();
        let infos = self
            .accounts
            .iter()
            .map(|account| {
                let id = account.trader_id();
                let info = StepInfo {
                    outcomes: outcomes.remove(&id).unwrap_or_default(),
                    trades: step_trades.iter().filter(|t| t.involves(id)).cloned().collect(),
                    account: account.summary(),
                };
                (id, info)
            })
            .collect();

        let result = StepResult {
            t_step: episode.t_step,
            observations,
            rewards,
            dones,
            infos,
            all_done: episode.done_set.len() == self.accounts.len(),
            unknown_actions,
        };

        debug!(
            trades = step_trades.len(),
            resting = self.book.resting_order_count(),
            all_done = result.all_done,
            "step complete"
        );
        if result.all_done {
            info!(
                t_step = result.t_step,
                total_sys_nav = self.total_system_nav(),
                total_sys_profit = self.total_system_profit(),
                "episode finished"
            );
        }

        episode.t_step += 1;
        episode.phase = Phase::Idle;
        episode.last_result = Some(result.clone());
        self.episode = Some(episode);

        Ok(result)
    }

    /// Cancel one of `trader_id`'s resting orders between steps and release
    /// its reservation.
    pub fn cancel(&mut self, trader_id: TraderId, order_id: OrderId) -> Result<Order, EnvError> {
        if self.episode.is_none() {
            return Err(EnvError::NotReset);
        }
        let account = self
            .accounts
            .get_mut(trader_id as usize)
            .ok_or(EnvError::UnknownTrader(trader_id))?;

        let owned = self
            .book
            .order(order_id)
            .is_some_and(|o| o.trader_id == trader_id);
        if !owned {
            return Err(EnvError::OrderNotFound(order_id));
        }

        let order = self.book.cancel(order_id).map_err(|_| EnvError::OrderNotFound(order_id))?;
        if let Err(err) = account.release(order_id) {
            error!(trader_id, order_id, %err, "cancelled order held no reservation");
        }
        debug!(trader_id, order_id, "order cancelled");
        Ok(order)
    }

    /// Observation for one trader from the current committed state.
    pub fn observe(&self, trader_id: TraderId) -> Option<Observation> {
        self.accounts
            .get(trader_id as usize)
            .map(|account| self.builder.build(&self.book, account))
    }

    /// Human-readable dump of the book, aggregated snapshots, last step's
    /// outputs and accounts. No machine-readable contract.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let tick = self.tick_size;

        let _ = writeln!(out, "\nLOB:\n{}", self.book);

        if let Some(episode) = &self.episode {
            let _ = writeln!(out, "t_step: {} / {}", episode.t_step, episode.max_step);
            let _ = writeln!(out, "\nagg_LOB (before):");
            render_agg(&mut out, &episode.agg_lob, tick);
            let _ = writeln!(out, "\nagg_LOB (after):");
            render_agg(&mut out, &episode.agg_lob_aft, tick);

            if let Some(result) = &episode.last_result {
                let _ = writeln!(out, "\nrewards: {:?}", result.rewards);
                let _ = writeln!(out, "dones: {:?} (all: {})", result.dones, result.all_done);
                for (id, info) in &result.infos {
                    let _ = writeln!(out, "info[{}]: {:?} trades={}", id, info.outcomes, info.trades.len());
                }
            }
        } else {
            let _ = writeln!(out, "(not reset)");
        }

        let _ = writeln!(out, "\naccounts:");
        for account in &self.accounts {
            let _ = writeln!(
                out,
                "  trader {:>3}: cash {:>14.4} pos {:>8} nav {:>14.4} realized {:>12.4} unrealized {:>12.4} open {}",
                account.trader_id(),
                account.cash(),
                account.position(),
                account.nav(),
                account.realized_pnl(),
                account.unrealized_pnl(),
                account.open_orders().count()
            );
        }
        let _ = writeln!(out, "total_sys_profit: {:.4}", self.total_system_profit());
        let _ = writeln!(out, "total_sys_nav: {:.4}", self.total_system_nav());
        out
    }

    /// Sum of every trader's NAV.
    pub fn total_system_nav(&self) -> f64 {
        self.accounts.iter().map(Account::nav).sum()
    }

    /// Sum of every trader's NAV change since the episode started.
    ///
    /// Trading moves value between traders, so this is zero whenever every
    /// account is marked at one price.
    pub fn total_system_profit(&self) -> f64 {
        self.accounts.iter().map(Account::total_pnl).sum()
    }

    /// Sum of all cash in tick-cash; constant over an episode.
    pub fn total_cash_ticks(&self) -> i64 {
        self.accounts.iter().map(Account::cash_ticks).sum()
    }

    /// Sum of all positions; zero over an episode.
    pub fn total_position(&self) -> i64 {
        self.accounts.iter().map(Account::position).sum()
    }

    pub fn config(&self) -> &EnvConfig {
        &self.config
    }

    pub fn book(&self) -> &OrderBook {
        &self.book
    }

    pub fn account(&self, trader_id: TraderId) -> Option<&Account> {
        self.accounts.get(trader_id as usize)
    }

    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    pub fn episode(&self) -> Option<&EpisodeState> {
        self.episode.as_ref()
    }

    /// Length of a flattened observation.
    pub fn observation_width(&self) -> usize {
        self.builder.width()
    }

    // -------------------------------------------------------------------------
    // Internal helpers
    // -------------------------------------------------------------------------

    fn fresh_accounts(&self) -> Vec<Account> {
        let init_cash = self.tick_size.cash_to_ticks(self.config.init_cash);
        (0..self.config.num_traders)
            .map(|id| Account::new(id, init_cash, self.tick_size, self.config.short_allowance))
            .collect()
    }

    /// Release a reservation the book says must exist. A miss means the
    /// ledger and the book disagree.
    fn release_logged(&mut self, trader_id: TraderId, order_id: OrderId) {
        let released = self.accounts[trader_id as usize].release(order_id);
        debug_assert!(released.is_ok(), "no reservation for order {}", order_id);
        if let Err(err) = released {
            error!(trader_id, order_id, %err, "ledger out of step with book");
        }
    }

    fn observations(&self) -> BTreeMap<TraderId, Observation> {
        self.accounts
            .iter()
            .map(|account| (account.trader_id(), self.builder.build(&self.book, account)))
            .collect()
    }

    /// Validate, reserve, submit and settle a single action.
    ///
    /// Input problems come back as `Ok(ActionOutcome::Rejected)`; only an
    /// engine invariant violation is an `Err`.
    fn apply_action(
        &mut self,
        episode: &mut EpisodeState,
        action: &Action,
        step_trades: &mut Vec<Trade>,
    ) -> Result<ActionOutcome, EnvError> {
        let trader_id = action.trader_id;
        if episode.is_done(trader_id) {
            return Ok(ActionOutcome::Rejected(ActionRejection::AgentDone));
        }
        let Some(side) = action.side else {
            return Ok(ActionOutcome::NoOp);
        };

        let order = match self.build_order(episode, action, side) {
            Ok(order) => order,
            Err(rejection) => {
                debug!(trader_id, ?rejection, "action rejected");
                return Ok(ActionOutcome::Rejected(rejection));
            }
        };
        let order_id = order.order_id;

        let cash_needed = match (side, order.order_type) {
            (Side::Bid, OrderType::Limit) => {
                match (order.price as i64).checked_mul(order.size as i64) {
                    Some(notional) => notional,
                    None => {
                        let rejection = ActionRejection::InvalidOrder(format!(
                            "notional of {} x {} ticks overflows",
                            order.size, order.price
                        ));
                        debug!(trader_id, ?rejection, "action rejected");
                        return Ok(ActionOutcome::Rejected(rejection));
                    }
                }
            }
            // Saturates at i64::MAX, which no account can afford.
            (Side::Bid, OrderType::Market) => self.book.sweep_cost(side, order.size, trader_id).0,
            (Side::Ask, _) => 0,
        };

        let account = &mut self.accounts[trader_id as usize];
        if let Err(err) = account.reserve_for_order(&order, cash_needed) {
            debug!(trader_id, %err, "reservation rejected");
            return Ok(ActionOutcome::Rejected(err.into()));
        }

        let outcome = match self.book.submit(order) {
            Ok(outcome) => outcome,
            Err(BookError::InvalidOrder(reason)) => {
                self.release_logged(trader_id, order_id);
                return Ok(ActionOutcome::Rejected(ActionRejection::InvalidOrder(reason)));
            }
            Err(fatal) => {
                error!(trader_id, order_id, %fatal, "aborting step");
                return Err(EnvError::Fatal(fatal));
            }
        };

        for trade in &outcome.trades {
            self.accounts[trade.buyer_id as usize].apply_trade(trade, true);
            self.accounts[trade.seller_id as usize].apply_trade(trade, false);
        }

        for cancelled in &outcome.self_trade_cancels {
            self.release_logged(trader_id, cancelled.order_id);
        }
        // A fully filled order was released by its last fill.
        if outcome.resting.is_none() && self.accounts[trader_id as usize].owns_order(order_id) {
            self.release_logged(trader_id, order_id);
        }

        step_trades.extend(outcome.trades.iter().cloned());

        Ok(ActionOutcome::Accepted {
            order_id,
            filled: outcome.filled_size(),
            resting: outcome.resting.as_ref().map_or(0, |o| o.remaining_size),
            discarded: outcome.discarded_size,
            self_trade_cancels: outcome
                .self_trade_cancels
                .iter()
                .map(|o| o.order_id)
                .collect(),
        })
    }

    /// Boundary validation: whole positive size, tick-aligned positive
    /// limit price. Allocates an order id only for valid actions.
    fn build_order(
        &self,
        episode: &mut EpisodeState,
        action: &Action,
        side: Side,
    ) -> Result<Order, ActionRejection> {
        let size = size_to_units(action.size).ok_or_else(|| {
            ActionRejection::InvalidOrder(format!(
                "size must be a positive whole number, got {}",
                action.size
            ))
        })?;

        match action.kind {
            OrderType::Limit => {
                let price = self
                    .tick_size
                    .to_ticks(action.price)
                    .filter(|ticks| *ticks > 0)
                    .ok_or_else(|| {
                        ActionRejection::InvalidOrder(format!(
                            "limit price {} is not a positive multiple of tick size {}",
                            action.price,
                            self.tick_size.value()
                        ))
                    })?;
                Ok(Order::limit(
                    episode.allocate_order_id(),
                    action.trader_id,
                    side,
                    price,
                    size,
                ))
            }
            OrderType::Market => Ok(Order::market(
                episode.allocate_order_id(),
                action.trader_id,
                side,
                size,
            )),
        }
    }
}

fn render_agg(out: &mut String, agg: &crate::depth::AggregatedBook, tick: TickSize) {
    if agg.is_empty() {
        let _ = writeln!(out, "  (empty)");
        return;
    }
    for level in agg.asks.iter().rev() {
        let _ = writeln!(out, "  ASK {:>10.4} x {}", tick.to_price(level.price), level.size);
    }
    for level in &agg.bids {
        let _ = writeln!(out, "  BID {:>10.4} x {}", tick.to_price(level.price), level.size);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(num_traders: u32, init_cash: f64) -> CdaEnv {
        let config = EnvConfig::new(num_traders, init_cash, 1.0, 10, 100).with_short_allowance(1_000);
        let mut env = CdaEnv::new(config).unwrap();
        env.reset();
        env
    }

    #[test]
    fn crossing_limits_trade_and_settle() {
        let mut env = env(2, 1000.0);
        let result = env
            .step(&[
                Action::limit(0, Side::Bid, 5.0, 10.0),
                Action::limit(1, Side::Ask, 5.0, 10.0),
            ])
            .unwrap();

        let a0 = env.account(0).unwrap();
        let a1 = env.account(1).unwrap();
        assert_eq!((a0.cash(), a0.position()), (950.0, 5));
        assert_eq!((a1.cash(), a1.position()), (1050.0, -5));
        assert!(env.book().is_empty());
        assert_eq!(env.book().trade_count(), 1);
        assert_eq!(result.infos[&0].trades.len(), 1);
        assert_eq!(result.infos[&1].trades[0].price, 10);
        assert_eq!(result.trades().len(), 1);
    }

    #[test]
    fn step_before_reset_is_an_error() {
        let mut env = CdaEnv::new(EnvConfig::default()).unwrap();
        assert_eq!(env.step(&[]).unwrap_err(), EnvError::NotReset);
    }

    #[test]
    fn invalid_actions_are_reported_not_fatal() {
        let mut env = env(2, 1000.0);
        let result = env
            .step(&[
                Action::limit(0, Side::Bid, 0.0, 10.0),
                Action::limit(1, Side::Ask, 1.5, 10.0),
                Action::limit(1, Side::Ask, 1.0, 0.0),
            ])
            .unwrap();

        let rejected = result.infos[&0]
            .outcomes
            .iter()
            .chain(result.infos[&1].outcomes.iter())
            .filter(|o| matches!(o, ActionOutcome::Rejected(ActionRejection::InvalidOrder(_))))
            .count();
        assert_eq!(rejected, 3);
        assert!(env.book().is_empty());
    }

    #[test]
    fn off_tick_price_is_rejected() {
        let config = EnvConfig::new(2, 1000.0, 0.25, 10, 10);
        let mut env = CdaEnv::new(config).unwrap();
        env.reset();
        let result = env.step(&[Action::limit(0, Side::Bid, 1.0, 10.1)]).unwrap();
        assert!(matches!(
            result.infos[&0].outcomes[0],
            ActionOutcome::Rejected(ActionRejection::InvalidOrder(_))
        ));
    }

    #[test]
    fn unaffordable_bid_is_rejected_without_mutation() {
        let mut env = env(2, 100.0);
        let result = env.step(&[Action::limit(0, Side::Bid, 20.0, 10.0)]).unwrap();
        assert!(matches!(
            result.infos[&0].outcomes[0],
            ActionOutcome::Rejected(ActionRejection::InsufficientFunds { .. })
        ));
        assert!(env.book().is_empty());
        assert_eq!(env.account(0).unwrap().reserved_cash(), 0.0);
    }

    #[test]
    fn overflowing_bid_notional_is_rejected_without_mutation() {
        let mut env = env(2, 1000.0);
        let result = env
            .step(&[Action::limit(0, Side::Bid, 4e9, 4e9)])
            .unwrap();
        assert!(matches!(
            result.infos[&0].outcomes[0],
            ActionOutcome::Rejected(ActionRejection::InvalidOrder(_))
        ));

        let account = env.account(0).unwrap();
        assert_eq!(account.reserved_cash(), 0.0);
        assert_eq!(account.available_cash(), 1000);
        assert!(env.book().is_empty());
    }

    #[test]
    fn market_bid_against_expensive_ladder_is_unaffordable() {
        let mut env = env(2, 1000.0);
        env.step(&[Action::limit(1, Side::Ask, 500.0, 4e9)]).unwrap();

        let result = env.step(&[Action::market(0, Side::Bid, 500.0)]).unwrap();
        assert!(matches!(
            result.infos[&0].outcomes[0],
            ActionOutcome::Rejected(ActionRejection::InsufficientFunds { .. })
        ));
        assert_eq!(env.account(0).unwrap().reserved_cash(), 0.0);
        assert_eq!(env.book().resting_order_count(), 1);
    }

    #[test]
    fn self_trade_cancel_returns_reservation() {
        let mut env = env(3, 1000.0);
        env.step(&[Action::limit(0, Side::Ask, 2.0, 10.0)]).unwrap();
        env.step(&[Action::limit(1, Side::Ask, 2.0, 10.0)]).unwrap();
        assert_eq!(env.account(0).unwrap().reserved_position(), 2);

        let result = env.step(&[Action::limit(0, Side::Bid, 3.0, 10.0)]).unwrap();
        let ActionOutcome::Accepted { self_trade_cancels, filled, resting, .. } =
            result.infos[&0].outcomes[0].clone()
        else {
            panic!("expected accepted order");
        };
        assert_eq!(self_trade_cancels.len(), 1);
        assert_eq!((filled, resting), (2, 1));

        let account = env.account(0).unwrap();
        assert_eq!(account.reserved_position(), 0);
        assert_eq!(account.open_orders().count(), env.book().orders_for(0).len());
        assert_eq!(account.reserved_cash(), 10.0);
    }

    #[test]
    fn noop_and_unknown_traders() {
        let mut env = env(2, 100.0);
        let result = env.step(&[Action::noop(0), Action::limit(7, Side::Bid, 1.0, 1.0)]).unwrap();
        assert_eq!(result.infos[&0].outcomes, vec![ActionOutcome::NoOp]);
        assert!(result.infos[&1].outcomes.is_empty());
        assert_eq!(result.unknown_actions.len(), 1);
    }

    #[test]
    fn episode_ends_at_max_step() {
        let config = EnvConfig::new(2, 100.0, 1.0, 10, 2);
        let mut env = CdaEnv::new(config).unwrap();
        env.reset();

        let first = env.step(&[]).unwrap();
        assert!(first.dones.values().all(|d| !d));
        let second = env.step(&[]).unwrap();
        assert!(second.dones.values().all(|d| *d));
        assert!(second.all_done);
        assert_eq!(env.step(&[]).unwrap_err(), EnvError::EpisodeFinished(2));
    }

    #[test]
    fn bankrupt_trader_is_done_and_then_ignored() {
        let config = EnvConfig::new(3, 100.0, 1.0, 10, 50)
            .with_short_allowance(100)
            .with_bankruptcy_floor(90.0);
        let mut env = CdaEnv::new(config).unwrap();
        env.reset();

        // Trader 1 goes short 10 at 10, then trader 2 lifts the mid to 12.
        let result = env
            .step(&[
                Action::limit(0, Side::Bid, 10.0, 10.0),
                Action::limit(1, Side::Ask, 10.0, 10.0),
            ])
            .unwrap();
        assert!(!result.dones[&1]);

        let result = env
            .step(&[
                Action::limit(2, Side::Bid, 1.0, 11.0),
                Action::limit(0, Side::Ask, 1.0, 13.0),
            ])
            .unwrap();
        assert_eq!(env.account(1).unwrap().nav(), 80.0);
        assert!(result.dones[&1]);
        assert_eq!(result.rewards[&1], -20.0);

        let result = env.step(&[Action::limit(1, Side::Bid, 1.0, 11.0)]).unwrap();
        assert_eq!(
            result.infos[&1].outcomes,
            vec![ActionOutcome::Rejected(ActionRejection::AgentDone)]
        );
        assert_eq!(result.rewards[&1], 0.0);
        assert!(result.dones[&1]);
    }

    #[test]
    fn cancel_releases_reservation() {
        let mut env = env(2, 100.0);
        let result = env.step(&[Action::limit(0, Side::Bid, 5.0, 10.0)]).unwrap();
        let ActionOutcome::Accepted { order_id, resting, .. } = result.infos[&0].outcomes[0].clone() else {
            panic!("expected accepted order");
        };
        assert_eq!(resting, 5);
        assert_eq!(env.account(0).unwrap().available_cash(), 50);

        assert_eq!(env.cancel(1, order_id).unwrap_err(), EnvError::OrderNotFound(order_id));
        env.cancel(0, order_id).unwrap();
        assert_eq!(env.account(0).unwrap().available_cash(), 100);
        assert!(env.book().is_empty());
        assert_eq!(env.cancel(0, order_id).unwrap_err(), EnvError::OrderNotFound(order_id));
    }

    #[test]
    fn render_mentions_every_section() {
        let mut env = env(2, 100.0);
        env.step(&[Action::limit(0, Side::Bid, 1.0, 5.0)]).unwrap();
        let text = env.render();
        for needle in ["LOB:", "agg_LOB (before):", "agg_LOB (after):", "rewards:", "total_sys_nav"] {
            assert!(text.contains(needle), "missing {needle}");
        }
        assert!(text.contains("agg_LOB (before):\n  (empty)"));
    }
}
