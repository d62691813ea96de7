//! Internal order representation used inside the order book.
//!
//! Orders are built by the step orchestrator from validated actions and
//! handed to [`OrderBook::submit`](crate::order_book::OrderBook::submit),
//! which stamps the arrival `sequence_number`. Everything except
//! `remaining_size` is fixed once constructed.

use crate::messages::{OrderId, TraderId};
use crate::order_type::OrderType;
use crate::side::Side;

/// A single order in the book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    // Order identification
    pub order_id: OrderId,
    pub trader_id: TraderId,

    // Order details
    pub side: Side,
    pub order_type: OrderType,
    pub price: u32, // ticks; 0 for market orders
    pub size: u32,  // original size
    pub remaining_size: u32,

    // Time priority (assigned by the book on submit)
    pub sequence_number: u64,
}

impl Order {
    /// A limit order for `size` units at `price` ticks.
    pub fn limit(order_id: OrderId, trader_id: TraderId, side: Side, price: u32, size: u32) -> Self {
        Order {
            order_id,
            trader_id,
            side,
            order_type: OrderType::Limit,
            price,
            size,
            remaining_size: size,
            sequence_number: 0,
        }
    }

    /// A market order for `size` units.
    pub fn market(order_id: OrderId, trader_id: TraderId, side: Side, size: u32) -> Self {
        Order {
            order_id,
            trader_id,
            side,
            order_type: OrderType::Market,
            price: 0,
            size,
            remaining_size: size,
            sequence_number: 0,
        }
    }

    /// The limit price, or `None` for market orders.
    pub fn limit_price(&self) -> Option<u32> {
        match self.order_type {
            OrderType::Limit => Some(self.price),
            OrderType::Market => None,
        }
    }

    /// Returns `true` if the order is fully filled.
    pub fn is_filled(&self) -> bool {
        self.remaining_size == 0
    }

    /// Units already executed.
    pub fn filled_size(&self) -> u32 {
        self.size - self.remaining_size
    }

    /// Whether this order may trade against a resting order at `price`.
    pub fn crosses(&self, price: u32) -> bool {
        match (self.order_type, self.side) {
            (OrderType::Market, _) => true,
            (OrderType::Limit, Side::Bid) => self.price >= price,
            (OrderType::Limit, Side::Ask) => self.price <= price,
        }
    }

    /// Fill the order by up to `qty` units.
    ///
    /// Returns the quantity that was actually filled (which will be
    /// `<= qty` and `<= remaining_size`).
    pub fn fill(&mut self, qty: u32) -> u32 {
        let filled = qty.min(self.remaining_size);
        self.remaining_size -= filled;
        filled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_is_capped_at_remaining() {
        let mut order = Order::limit(1, 0, Side::Bid, 40, 5);
        assert_eq!(order.fill(3), 3);
        assert_eq!(order.fill(3), 2);
        assert!(order.is_filled());
        assert_eq!(order.filled_size(), 5);
    }

    #[test]
    fn crossing_rules() {
        let bid = Order::limit(1, 0, Side::Bid, 40, 1);
        assert!(bid.crosses(40));
        assert!(bid.crosses(39));
        assert!(!bid.crosses(41));

        let ask = Order::limit(2, 0, Side::Ask, 40, 1);
        assert!(ask.crosses(41));
        assert!(!ask.crosses(39));

        let market = Order::market(3, 0, Side::Ask, 1);
        assert!(market.crosses(1));
        assert_eq!(market.limit_price(), None);
    }
}
