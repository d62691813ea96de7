//! Trading agents that drive the environment from the binary.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use cda_core::{Action, Observation, Side, TickSize, TraderId};

use crate::config::AgentConfig;

/// What an agent sees before choosing an action.
#[derive(Debug, Clone, Copy)]
pub struct MarketView<'a> {
    pub observation: &'a Observation,
    /// Current mark price, if the book has one.
    pub mark_price: Option<f64>,
    pub tick_size: TickSize,
}

pub trait Agent {
    fn trader_id(&self) -> TraderId;

    /// Choose this step's action.
    fn act(&mut self, view: &MarketView<'_>) -> Action;
}

/// Zero-intelligence trader: random side, size and price near the mark.
#[derive(Debug)]
pub struct RandomAgent {
    trader_id: TraderId,
    params: AgentConfig,
    rng: StdRng,
}

impl RandomAgent {
    pub fn new(trader_id: TraderId, params: AgentConfig, seed: u64) -> Self {
        RandomAgent {
            trader_id,
            params,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Limit price at most `price_range_ticks` away from the reference,
    /// rounded to the tick grid and never below one tick.
    fn limit_price(&mut self, reference: f64, tick: TickSize) -> f64 {
        let range = self.params.price_range_ticks as i64;
        let offset = self.rng.gen_range(-range..=range);
        let base = (reference / tick.value()).round() as i64;
        let ticks = (base + offset).max(1);
        ticks as f64 * tick.value()
    }
}

impl Agent for RandomAgent {
    fn trader_id(&self) -> TraderId {
        self.trader_id
    }

    fn act(&mut self, view: &MarketView<'_>) -> Action {
        if self.rng.gen_bool(self.params.noop_prob.clamp(0.0, 1.0)) {
            return Action::noop(self.trader_id);
        }

        let side = if self.rng.gen_bool(0.5) { Side::Bid } else { Side::Ask };
        let size = self.rng.gen_range(1..=self.params.max_size.max(1)) as f64;

        if self.rng.gen_bool(self.params.market_prob.clamp(0.0, 1.0)) {
            return Action::market(self.trader_id, side, size);
        }

        let reference = view.mark_price.unwrap_or(self.params.anchor_price);
        let price = self.limit_price(reference, view.tick_size);
        Action::limit(self.trader_id, side, size, price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cda_core::{OrderType, TickSize};

    fn empty_observation() -> Observation {
        Observation {
            book: vec![vec![0.0; 2]; 4],
            account: [0.0; 4],
        }
    }

    #[test]
    fn limit_prices_stay_on_grid_and_in_range() {
        let params = AgentConfig {
            noop_prob: 0.0,
            market_prob: 0.0,
            max_size: 3,
            price_range_ticks: 4,
            anchor_price: 10.0,
        };
        let tick = TickSize::new(0.25).unwrap();
        let obs = empty_observation();
        let view = MarketView {
            observation: &obs,
            mark_price: None,
            tick_size: tick,
        };

        let mut agent = RandomAgent::new(3, params, 11);
        for _ in 0..200 {
            let action = agent.act(&view);
            assert_eq!(action.trader_id, 3);
            assert_eq!(action.kind, OrderType::Limit);
            assert!(tick.to_ticks(action.price).is_some());
            assert!((9.0..=11.0).contains(&action.price));
            assert!((1.0..=3.0).contains(&action.size));
        }
    }

    #[test]
    fn same_seed_same_actions() {
        let tick = TickSize::new(1.0).unwrap();
        let obs = empty_observation();
        let view = MarketView {
            observation: &obs,
            mark_price: Some(50.0),
            tick_size: tick,
        };

        let mut a = RandomAgent::new(0, AgentConfig::default(), 5);
        let mut b = RandomAgent::new(0, AgentConfig::default(), 5);
        for _ in 0..50 {
            assert_eq!(a.act(&view), b.act(&view));
        }
    }
}
