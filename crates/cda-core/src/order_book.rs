//! Single-instrument limit order book with price-time priority.
//!
//! - Bids: descending by price (best = highest).
//! - Asks: ascending by price (best = lowest).
//! - FIFO (time priority) within each price level.
//! - Trades execute at the resting order's price.
//!
//! Cancellation does a linear search over both sides; there is no id index.

use std::collections::{BTreeMap, VecDeque};
use std::fmt;

use tracing::{debug, error};

use crate::depth::{AggregatedBook, LevelSummary};
use crate::error::BookError;
use crate::messages::{OrderId, Trade, TraderId};
use crate::order::Order;
use crate::order_type::OrderType;
use crate::side::Side;
use crate::tick::TickSize;

type Ladder = BTreeMap<u32, VecDeque<Order>>;

/// Everything one `submit` call did to the book.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmitOutcome {
    /// Trades in execution order.
    pub trades: Vec<Trade>,
    /// Copy of the remainder that now rests in the book (limit orders only).
    pub resting: Option<Order>,
    /// Unfilled market-order size that was thrown away.
    pub discarded_size: u32,
    /// The submitter's own resting orders removed instead of being traded against.
    pub self_trade_cancels: Vec<Order>,
}

impl SubmitOutcome {
    /// Units of the incoming order that executed.
    pub fn filled_size(&self) -> u32 {
        self.trades.iter().map(|t| t.size).sum()
    }
}

/// Single-instrument order book.
#[derive(Debug, Clone)]
pub struct OrderBook {
    tick_size: TickSize,

    /// Bids: price (ticks) -> FIFO queue of orders at that price.
    ///
    /// `BTreeMap` keys are sorted ascending; the highest key is best bid.
    bids: Ladder,

    /// Asks: price (ticks) -> FIFO queue of orders at that price.
    ///
    /// The lowest key is best ask.
    asks: Ladder,

    /// Most recent trades, oldest first, at most `tape_display_length`.
    tape: VecDeque<Trade>,
    tape_display_length: usize,

    /// Shared arrival counter for orders and trades.
    next_sequence: u64,

    trade_count: u64,
    last_trade_price: Option<u32>,
}

impl OrderBook {
    /// Create an empty book.
    pub fn new(tick_size: TickSize, tape_display_length: usize) -> Self {
        OrderBook {
            tick_size,
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
            tape: VecDeque::with_capacity(tape_display_length),
            tape_display_length,
            next_sequence: 1,
            trade_count: 0,
            last_trade_price: None,
        }
    }

    pub fn tick_size(&self) -> TickSize {
        self.tick_size
    }

    /// Match an incoming order and rest any limit remainder.
    ///
    /// Fails with [`BookError::InvalidOrder`] (and no mutation) if the size
    /// is zero or a limit order has no price. Fails with
    /// [`BookError::CrossedBook`] if the book ends up crossed, which would
    /// mean the matching loop is broken.
    pub fn submit(&mut self, mut order: Order) -> Result<SubmitOutcome, BookError> {
        Self::validate(&order)?;

        order.sequence_number = self.next_sequence;
        self.next_sequence += 1;

        let mut outcome = SubmitOutcome::default();
        self.match_order(&mut order, &mut outcome);

        for trade in &outcome.trades {
            self.record_trade(trade.clone());
        }

        if order.remaining_size > 0 {
            match order.order_type {
                OrderType::Limit => {
                    outcome.resting = Some(order.clone());
                    self.add_to_book(order);
                }
                OrderType::Market => {
                    debug!(
                        order_id = order.order_id,
                        discarded = order.remaining_size,
                        "market order remainder discarded"
                    );
                    outcome.discarded_size = order.remaining_size;
                }
            }
        }

        self.check_uncrossed()?;
        Ok(outcome)
    }

    /// Remove a resting order by id.
    pub fn cancel(&mut self, order_id: OrderId) -> Result<Order, BookError> {
        Self::remove_from_side(&mut self.bids, order_id)
            .or_else(|| Self::remove_from_side(&mut self.asks, order_id))
            .ok_or(BookError::OrderNotFound(order_id))
    }

    /// Up to `levels` best price levels per side with their total size.
    pub fn aggregate(&self, levels: usize) -> AggregatedBook {
        AggregatedBook {
            bids: self
                .bids
                .iter()
                .rev()
                .take(levels)
                .map(|(price, orders)| Self::summarize(*price, orders))
                .collect(),
            asks: self
                .asks
                .iter()
                .take(levels)
                .map(|(price, orders)| Self::summarize(*price, orders))
                .collect(),
        }
    }

    /// Exact cash (tick-cash) needed to fill `size` units of an incoming
    /// market order on `side`, walking the opposite ladder in priority
    /// order and skipping `exclude` (the submitter, whose own orders would
    /// be cancelled rather than traded).
    ///
    /// Returns `(cost, fillable_size)`; `fillable_size < size` when the
    /// ladder is too thin. The cost saturates at `i64::MAX`.
    pub fn sweep_cost(&self, side: Side, size: u32, exclude: TraderId) -> (i64, u32) {
        let levels: Box<dyn Iterator<Item = (&u32, &VecDeque<Order>)> + '_> = match side.opposite() {
            Side::Ask => Box::new(self.asks.iter()),
            Side::Bid => Box::new(self.bids.iter().rev()),
        };

        let mut cost = 0i64;
        let mut needed = size;
        for (price, orders) in levels {
            for resting in orders.iter().filter(|o| o.trader_id != exclude) {
                if needed == 0 {
                    return (cost, size);
                }
                let qty = needed.min(resting.remaining_size);
                cost = cost.saturating_add((*price as i64).saturating_mul(qty as i64));
                needed -= qty;
            }
        }
        (cost, size - needed)
    }

    /// Best bid price in ticks.
    pub fn best_bid(&self) -> Option<u32> {
        self.bids.keys().next_back().copied()
    }

    /// Best ask price in ticks.
    pub fn best_ask(&self) -> Option<u32> {
        self.asks.keys().next().copied()
    }

    /// `best_ask - best_bid` in ticks, if both sides exist.
    pub fn spread(&self) -> Option<u32> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some(ask.saturating_sub(bid)),
            _ => None,
        }
    }

    /// Midpoint of best bid and best ask in ticks (may be half a tick).
    pub fn mid_ticks(&self) -> Option<f64> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some((bid as f64 + ask as f64) / 2.0),
            _ => None,
        }
    }

    /// Valuation price: the midpoint, or the last trade price when a side
    /// is empty. `None` before the first trade on a one-sided book.
    pub fn mark_price(&self) -> Option<f64> {
        self.mid_ticks()
            .or(self.last_trade_price.map(f64::from))
            .map(|ticks| self.tick_size.scale(ticks))
    }

    pub fn last_trade_price(&self) -> Option<u32> {
        self.last_trade_price
    }

    /// Recent trades, oldest first.
    pub fn tape(&self) -> impl Iterator<Item = &Trade> {
        self.tape.iter()
    }

    /// Total number of trades since the book was created.
    pub fn trade_count(&self) -> u64 {
        self.trade_count
    }

    /// Look up a resting order.
    pub fn order(&self, order_id: OrderId) -> Option<&Order> {
        self.bids
            .values()
            .chain(self.asks.values())
            .flat_map(|orders| orders.iter())
            .find(|o| o.order_id == order_id)
    }

    /// All resting orders owned by `trader_id`, bids first.
    pub fn orders_for(&self, trader_id: TraderId) -> Vec<&Order> {
        self.bids
            .values()
            .rev()
            .chain(self.asks.values())
            .flat_map(|orders| orders.iter())
            .filter(|o| o.trader_id == trader_id)
            .collect()
    }

    /// Number of resting orders on both sides.
    pub fn resting_order_count(&self) -> usize {
        self.bids
            .values()
            .chain(self.asks.values())
            .map(VecDeque::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }

    /// `Err(CrossedBook)` if `best_bid >= best_ask`.
    pub fn check_uncrossed(&self) -> Result<(), BookError> {
        match (self.best_bid(), self.best_ask()) {
            (Some(best_bid), Some(best_ask)) if best_bid >= best_ask => {
                error!(best_bid, best_ask, "order book crossed at rest");
                Err(BookError::CrossedBook { best_bid, best_ask })
            }
            _ => Ok(()),
        }
    }

    // -------------------------------------------------------------------------
    // Internal helpers
    // -------------------------------------------------------------------------

    fn validate(order: &Order) -> Result<(), BookError> {
        if order.size == 0 {
            return Err(BookError::InvalidOrder("size must be > 0".into()));
        }
        if order.remaining_size != order.size {
            return Err(BookError::InvalidOrder(format!(
                "order {} already partially filled",
                order.order_id
            )));
        }
        if order.order_type == OrderType::Limit && order.price == 0 {
            return Err(BookError::InvalidOrder(
                "limit price must be at least one tick".into(),
            ));
        }
        Ok(())
    }

    /// Match an incoming order against the opposite side of the book.
    ///
    /// Fills are pushed onto `outcome.trades`. Any remaining size is left
    /// in `order` for the caller to rest or discard.
    fn match_order(&mut self, order: &mut Order, outcome: &mut SubmitOutcome) {
        let OrderBook {
            bids,
            asks,
            next_sequence,
            ..
        } = self;

        let levels = match order.side {
            Side::Bid => asks,
            Side::Ask => bids,
        };

        while order.remaining_size > 0 {
            let best_price = match order.side {
                Side::Bid => levels.keys().next().copied(),
                Side::Ask => levels.keys().next_back().copied(),
            };
            let Some(best_price) = best_price else {
                break;
            };
            if !order.crosses(best_price) {
                break;
            }

            let Some(queue) = levels.get_mut(&best_price) else {
                break;
            };

            // FIFO through the level.
            while order.remaining_size > 0 {
                let Some(passive) = queue.front_mut() else {
                    break;
                };

                if passive.trader_id == order.trader_id {
                    if let Some(own) = queue.pop_front() {
                        debug!(
                            trader_id = own.trader_id,
                            order_id = own.order_id,
                            "self-trade prevented; resting order cancelled"
                        );
                        outcome.self_trade_cancels.push(own);
                    }
                    continue;
                }

                let qty = order.remaining_size.min(passive.remaining_size);
                order.fill(qty);
                passive.fill(qty);

                let (buy, sell) = match order.side {
                    Side::Bid => (&*order, &*passive),
                    Side::Ask => (&*passive, &*order),
                };
                let trade = Trade {
                    sequence_number: *next_sequence,
                    buy_order_id: buy.order_id,
                    buyer_id: buy.trader_id,
                    sell_order_id: sell.order_id,
                    seller_id: sell.trader_id,
                    price: best_price,
                    size: qty,
                    aggressor_side: order.side,
                };
                *next_sequence += 1;

                debug!(
                    seq = trade.sequence_number,
                    buyer = trade.buyer_id,
                    seller = trade.seller_id,
                    price = trade.price,
                    size = trade.size,
                    "trade"
                );
                outcome.trades.push(trade);

                if passive.is_filled() {
                    queue.pop_front();
                }
            }

            if queue.is_empty() {
                levels.remove(&best_price);
            }
        }
    }

    /// Add a remaining limit order to the tail of its price level.
    fn add_to_book(&mut self, order: Order) {
        let levels = match order.side {
            Side::Bid => &mut self.bids,
            Side::Ask => &mut self.asks,
        };
        levels.entry(order.price).or_default().push_back(order);
    }

    fn record_trade(&mut self, trade: Trade) {
        self.trade_count += 1;
        self.last_trade_price = Some(trade.price);
        if self.tape_display_length == 0 {
            return;
        }
        if self.tape.len() == self.tape_display_length {
            self.tape.pop_front();
        }
        self.tape.push_back(trade);
    }

    fn remove_from_side(levels: &mut Ladder, order_id: OrderId) -> Option<Order> {
        let (price, idx) = levels.iter().find_map(|(price, orders)| {
            orders
                .iter()
                .position(|o| o.order_id == order_id)
                .map(|idx| (*price, idx))
        })?;

        let orders = levels.get_mut(&price)?;
        let removed = orders.remove(idx);
        if orders.is_empty() {
            levels.remove(&price);
        }
        removed
    }

    fn summarize(price: u32, orders: &VecDeque<Order>) -> LevelSummary {
        LevelSummary {
            price,
            size: Self::level_size(orders),
            order_count: orders.len(),
        }
    }

    /// Sum of remaining_size across all orders at one price level.
    fn level_size(orders: &VecDeque<Order>) -> u64 {
        orders.iter().map(|o| o.remaining_size as u64).sum()
    }
}

impl fmt::Display for OrderBook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tick = self.tick_size;
        writeln!(f, "  side       price       size  orders")?;
        for (price, orders) in self.asks.iter().rev() {
            writeln!(
                f,
                "  ASK  {:>10.4} {:>10} {:>7}",
                tick.to_price(*price),
                Self::level_size(orders),
                orders.len()
            )?;
        }
        writeln!(f, "  ----")?;
        for (price, orders) in self.bids.iter().rev() {
            writeln!(
                f,
                "  BID  {:>10.4} {:>10} {:>7}",
                tick.to_price(*price),
                Self::level_size(orders),
                orders.len()
            )?;
        }
        writeln!(
            f,
            "  tape (last {} of {} trades):",
            self.tape.len(),
            self.trade_count
        )?;
        for t in &self.tape {
            writeln!(
                f,
                "    #{:<6} {} buys from {} : {} @ {:.4} (aggressor {})",
                t.sequence_number,
                t.buyer_id,
                t.seller_id,
                t.size,
                tick.to_price(t.price),
                t.aggressor_side.as_char()
            )?;
        }
        Ok(())
    }
}
