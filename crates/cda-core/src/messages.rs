//! Message types crossing the core's boundary.
//!
//! - [`Action`]: what an agent submits each step (real-valued fields).
//! - [`Trade`]: what the book emits when two orders match (integer ticks).
//!
//! Text encoders for both live in the `cda-protocol` crate; this module is
//! purely logical.

use serde::{Deserialize, Serialize};

use crate::order_type::OrderType;
use crate::side::Side;

/// Trader (agent) identifier.
pub type TraderId = u32;

/// Order identifier, unique within an episode.
pub type OrderId = u64;

/// One agent's action for one step.
///
/// Field semantics follow the fixed action schema: trader id, order kind
/// (2 values), side (3 values, `None` = do nothing), size, price. `price`
/// is ignored for market orders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub trader_id: TraderId,
    pub kind: OrderType,
    pub side: Option<Side>,
    pub size: f64,
    #[serde(default)]
    pub price: f64,
}

impl Action {
    pub fn limit(trader_id: TraderId, side: Side, size: f64, price: f64) -> Self {
        Action {
            trader_id,
            kind: OrderType::Limit,
            side: Some(side),
            size,
            price,
        }
    }

    pub fn market(trader_id: TraderId, side: Side, size: f64) -> Self {
        Action {
            trader_id,
            kind: OrderType::Market,
            side: Some(side),
            size,
            price: 0.0,
        }
    }

    /// An explicit "do nothing" action.
    pub fn noop(trader_id: TraderId) -> Self {
        Action {
            trader_id,
            kind: OrderType::Market,
            side: None,
            size: 0.0,
            price: 0.0,
        }
    }
}

/// Trade event between a buyer and a seller.
///
/// `price` is in ticks and is always the resting order's price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    pub sequence_number: u64,

    pub buy_order_id: OrderId,
    pub buyer_id: TraderId,

    pub sell_order_id: OrderId,
    pub seller_id: TraderId,

    pub price: u32,
    pub size: u32,

    /// Side of the incoming order that crossed the spread.
    pub aggressor_side: Side,
}

impl Trade {
    /// `price * size` in tick-cash. Bounded by the buyer's reservation, so
    /// it fits for every trade the ledger admitted.
    pub fn notional(&self) -> i64 {
        self.price as i64 * self.size as i64
    }

    /// True when `trader_id` is on either side of the trade.
    pub fn involves(&self, trader_id: TraderId) -> bool {
        self.buyer_id == trader_id || self.seller_id == trader_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_deserializes_without_price() {
        let json = r#"{"trader_id":3,"kind":"Market","side":"Bid","size":2.0}"#;
        let action: Action = serde_json::from_str(json).unwrap();
        assert_eq!(action, Action::market(3, Side::Bid, 2.0));
    }

    #[test]
    fn noop_action_has_no_side() {
        let json = r#"{"trader_id":1,"kind":"Limit","side":null,"size":0.0,"price":0.0}"#;
        let action: Action = serde_json::from_str(json).unwrap();
        assert!(action.side.is_none());
    }
}
