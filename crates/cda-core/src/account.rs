//! Per-trader account ledger.
//!
//! Cash is kept in integer tick-cash and position in whole units, so the
//! settlement of a trade is exact: what one side pays the other receives.
//! Funds and inventory for accepted orders are *reserved* (set aside, not
//! spent) until the order fills, is cancelled, or its market remainder is
//! discarded. Only trades move `cash` and `position`.
//!
//! Realized PnL uses average-cost accounting and is reporting-only; the
//! step reward is the change in net asset value.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::LedgerError;
use crate::messages::{OrderId, Trade, TraderId};
use crate::order::Order;
use crate::side::Side;
use crate::tick::TickSize;

/// Cash or inventory held back for one open order.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Reservation {
    side: Side,
    /// Limit price in ticks; `None` for market orders.
    limit_price: Option<u32>,
    /// Tick-cash still held (bids only).
    cash: i64,
    /// Units not yet filled.
    size: u32,
}

/// Read-only summary of an account, in real units.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountSummary {
    pub trader_id: TraderId,
    pub cash: f64,
    pub reserved_cash: f64,
    pub position: i64,
    pub reserved_position: i64,
    pub nav: f64,
    pub realized_pnl: f64,
    pub unrealized_pnl: f64,
    pub open_orders: usize,
}

/// One trader's balances.
#[derive(Debug, Clone)]
pub struct Account {
    trader_id: TraderId,
    tick_size: TickSize,

    init_cash: i64,
    cash: i64,
    position: i64,

    reserved_cash: i64,
    reserved_position: i64,
    /// Units this account may sell beyond its holdings.
    short_allowance: u32,
    reservations: BTreeMap<OrderId, Reservation>,

    /// Signed cost of the open position in real units (negative when short).
    cost_basis: f64,
    realized_pnl: f64,
    unrealized_pnl: f64,
    nav: f64,
}

impl Account {
    /// A fresh account with `init_cash` tick-cash and a flat position.
    pub fn new(trader_id: TraderId, init_cash: i64, tick_size: TickSize, short_allowance: u32) -> Self {
        let nav = tick_size.cash_from_ticks(init_cash);
        Account {
            trader_id,
            tick_size,
            init_cash,
            cash: init_cash,
            position: 0,
            reserved_cash: 0,
            reserved_position: 0,
            short_allowance,
            reservations: BTreeMap::new(),
            cost_basis: 0.0,
            realized_pnl: 0.0,
            unrealized_pnl: 0.0,
            nav,
        }
    }

    /// Set aside funds (bids) or inventory (asks) for a new order.
    ///
    /// `cash_needed` is the tick-cash a bid may spend: `price * size` for
    /// limit orders, the book's sweep cost for market orders. It is ignored
    /// for asks. On error nothing changes.
    pub fn reserve_for_order(&mut self, order: &Order, cash_needed: i64) -> Result<(), LedgerError> {
        match order.side {
            Side::Bid => {
                if cash_needed < 0 {
                    return Err(LedgerError::InvalidReservation(cash_needed));
                }
                let available = self.available_cash();
                if cash_needed > available {
                    return Err(LedgerError::InsufficientFunds {
                        needed: self.tick_size.cash_from_ticks(cash_needed),
                        available: self.tick_size.cash_from_ticks(available),
                    });
                }
                self.reserved_cash += cash_needed;
                self.reservations.insert(
                    order.order_id,
                    Reservation {
                        side: Side::Bid,
                        limit_price: order.limit_price(),
                        cash: cash_needed,
                        size: order.size,
                    },
                );
            }
            Side::Ask => {
                let available = self.available_position();
                if (order.size as i64) > available {
                    return Err(LedgerError::InsufficientPosition {
                        needed: order.size,
                        available,
                    });
                }
                self.reserved_position += order.size as i64;
                self.reservations.insert(
                    order.order_id,
                    Reservation {
                        side: Side::Ask,
                        limit_price: order.limit_price(),
                        cash: 0,
                        size: order.size,
                    },
                );
            }
        }
        Ok(())
    }

    /// Settle one side of a trade.
    ///
    /// Buyer: `cash -= price * size`, `position += size`. Seller: the
    /// inverse. The matching part of the order's reservation is released.
    pub fn apply_trade(&mut self, trade: &Trade, is_buyer: bool) {
        let notional = trade.notional();
        let (order_id, signed_size) = if is_buyer {
            self.cash -= notional;
            (trade.buy_order_id, trade.size as i64)
        } else {
            self.cash += notional;
            (trade.sell_order_id, -(trade.size as i64))
        };

        self.book_position_change(signed_size, self.tick_size.to_price(trade.price));
        self.release_filled(order_id, trade);
    }

    /// Return everything still reserved for `order_id` (cancel, discarded
    /// market remainder, self-trade prevention).
    pub fn release(&mut self, order_id: OrderId) -> Result<(), LedgerError> {
        let reservation = self
            .reservations
            .remove(&order_id)
            .ok_or(LedgerError::UnknownOrder(order_id))?;
        match reservation.side {
            Side::Bid => self.reserved_cash -= reservation.cash,
            Side::Ask => self.reserved_position -= reservation.size as i64,
        }
        Ok(())
    }

    /// Revalue at `mark_price` and return the change in net asset value
    /// since the previous mark. Does not touch cash or position.
    pub fn mark_to_market(&mut self, mark_price: f64) -> f64 {
        let position = self.position as f64;
        let nav = self.cash() + position * mark_price;
        self.unrealized_pnl = position * mark_price - self.cost_basis;
        let delta = nav - self.nav;
        self.nav = nav;
        delta
    }

    pub fn trader_id(&self) -> TraderId {
        self.trader_id
    }

    /// Cash in real units (includes reserved cash).
    pub fn cash(&self) -> f64 {
        self.tick_size.cash_from_ticks(self.cash)
    }

    pub fn cash_ticks(&self) -> i64 {
        self.cash
    }

    pub fn init_cash(&self) -> f64 {
        self.tick_size.cash_from_ticks(self.init_cash)
    }

    pub fn position(&self) -> i64 {
        self.position
    }

    /// Cash not held back for open bids, in tick-cash.
    pub fn available_cash(&self) -> i64 {
        self.cash - self.reserved_cash
    }

    /// Units that may still be offered.
    pub fn available_position(&self) -> i64 {
        self.position - self.reserved_position + self.short_allowance as i64
    }

    pub fn reserved_cash(&self) -> f64 {
        self.tick_size.cash_from_ticks(self.reserved_cash)
    }

    pub fn reserved_position(&self) -> i64 {
        self.reserved_position
    }

    /// Net asset value at the last mark.
    pub fn nav(&self) -> f64 {
        self.nav
    }

    pub fn realized_pnl(&self) -> f64 {
        self.realized_pnl
    }

    pub fn unrealized_pnl(&self) -> f64 {
        self.unrealized_pnl
    }

    /// NAV relative to the starting cash.
    pub fn total_pnl(&self) -> f64 {
        self.nav - self.init_cash()
    }

    /// Ids of orders that still hold a reservation (i.e. are resting).
    pub fn open_orders(&self) -> impl Iterator<Item = OrderId> + '_ {
        self.reservations.keys().copied()
    }

    pub fn owns_order(&self, order_id: OrderId) -> bool {
        self.reservations.contains_key(&order_id)
    }

    pub fn summary(&self) -> AccountSummary {
        AccountSummary {
            trader_id: self.trader_id,
            cash: self.cash(),
            reserved_cash: self.reserved_cash(),
            position: self.position,
            reserved_position: self.reserved_position,
            nav: self.nav,
            realized_pnl: self.realized_pnl,
            unrealized_pnl: self.unrealized_pnl,
            open_orders: self.reservations.len(),
        }
    }

    // -------------------------------------------------------------------------
    // Internal helpers
    // -------------------------------------------------------------------------

    /// Average-cost bookkeeping for a signed position change at `price`.
    fn book_position_change(&mut self, signed_size: i64, price: f64) {
        let old = self.position;
        let new = old + signed_size;

        if old == 0 || old.signum() == signed_size.signum() {
            // Opening or adding.
            self.cost_basis += signed_size as f64 * price;
        } else {
            let closed = signed_size.abs().min(old.abs());
            let avg_cost = self.cost_basis / old as f64;
            self.realized_pnl += closed as f64 * (price - avg_cost) * old.signum() as f64;

            if new == 0 {
                self.cost_basis = 0.0;
            } else if new.signum() == old.signum() {
                self.cost_basis = avg_cost * new as f64;
            } else {
                // Flipped through flat: the excess opens at this price.
                self.cost_basis = new as f64 * price;
            }
        }

        self.position = new;
    }

    fn release_filled(&mut self, order_id: OrderId, trade: &Trade) {
        let Some(reservation) = self.reservations.get_mut(&order_id) else {
            return;
        };

        let filled = trade.size.min(reservation.size);
        reservation.size -= filled;

        match reservation.side {
            Side::Bid => {
                let per_unit = reservation.limit_price.unwrap_or(trade.price) as i64;
                let release = (per_unit * filled as i64).min(reservation.cash);
                reservation.cash -= release;
                self.reserved_cash -= release;
            }
            Side::Ask => {
                self.reserved_position -= filled as i64;
            }
        }

        if reservation.size == 0 {
            let leftover = reservation.cash;
            self.reserved_cash -= leftover;
            self.reservations.remove(&order_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tick() -> TickSize {
        TickSize::new(1.0).unwrap()
    }

    fn trade(buy_order_id: OrderId, sell_order_id: OrderId, price: u32, size: u32) -> Trade {
        Trade {
            sequence_number: 1,
            buy_order_id,
            buyer_id: 0,
            sell_order_id,
            seller_id: 1,
            price,
            size,
            aggressor_side: Side::Bid,
        }
    }

    #[test]
    fn trade_settles_both_sides_exactly() {
        let mut buyer = Account::new(0, 1000, tick(), 0);
        let mut seller = Account::new(1, 1000, tick(), 5);

        let t = trade(1, 2, 10, 5);
        buyer.apply_trade(&t, true);
        seller.apply_trade(&t, false);

        assert_eq!(buyer.cash_ticks(), 950);
        assert_eq!(buyer.position(), 5);
        assert_eq!(seller.cash_ticks(), 1050);
        assert_eq!(seller.position(), -5);
        assert_eq!(buyer.cash_ticks() + seller.cash_ticks(), 2000);
    }

    #[test]
    fn bid_reservation_requires_available_cash() {
        let mut acct = Account::new(0, 100, tick(), 0);
        acct.reserve_for_order(&Order::limit(1, 0, Side::Bid, 10, 6), 60).unwrap();

        let err = acct
            .reserve_for_order(&Order::limit(2, 0, Side::Bid, 10, 5), 50)
            .unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientFunds { .. }));
        assert_eq!(acct.available_cash(), 40);
        assert_eq!(acct.cash_ticks(), 100);
        assert!(!acct.owns_order(2));
    }

    #[test]
    fn negative_bid_reservation_is_refused() {
        let mut acct = Account::new(0, 100, tick(), 0);
        let err = acct
            .reserve_for_order(&Order::limit(1, 0, Side::Bid, 10, 1), -5)
            .unwrap_err();
        assert_eq!(err, LedgerError::InvalidReservation(-5));
        assert_eq!(acct.reserved_cash(), 0.0);
        assert_eq!(acct.open_orders().count(), 0);
    }

    #[test]
    fn ask_reservation_respects_position_without_shorting() {
        let mut acct = Account::new(0, 100, tick(), 0);
        let err = acct
            .reserve_for_order(&Order::limit(1, 0, Side::Ask, 10, 1), 0)
            .unwrap_err();
        assert_eq!(
            err,
            LedgerError::InsufficientPosition {
                needed: 1,
                available: 0
            }
        );

        let mut shorter = Account::new(1, 100, tick(), 3);
        shorter.reserve_for_order(&Order::limit(1, 1, Side::Ask, 10, 3), 0).unwrap();
        assert_eq!(shorter.available_position(), 0);
    }

    #[test]
    fn fill_below_limit_releases_limit_reservation() {
        let mut acct = Account::new(0, 100, tick(), 0);
        acct.reserve_for_order(&Order::limit(1, 0, Side::Bid, 10, 4), 40).unwrap();

        // Two units fill at a better price than the limit.
        acct.apply_trade(&trade(1, 9, 8, 2), true);
        assert_eq!(acct.cash_ticks(), 84);
        assert_eq!(acct.available_cash(), 84 - 20);

        acct.apply_trade(&trade(1, 9, 8, 2), true);
        assert_eq!(acct.available_cash(), 68);
        assert_eq!(acct.reserved_cash(), 0.0);
        assert_eq!(acct.open_orders().count(), 0);
    }

    #[test]
    fn release_returns_remaining_reservation() {
        let mut acct = Account::new(0, 100, tick(), 0);
        acct.reserve_for_order(&Order::market(7, 0, Side::Bid, 5), 55).unwrap();
        acct.apply_trade(&trade(7, 9, 10, 2), true);
        assert_eq!(acct.reserved_cash(), 35.0);

        acct.release(7).unwrap();
        assert_eq!(acct.reserved_cash(), 0.0);
        assert_eq!(acct.release(7), Err(LedgerError::UnknownOrder(7)));
    }

    #[test]
    fn mark_to_market_reports_nav_delta_only() {
        let mut acct = Account::new(0, 1000, tick(), 0);
        acct.apply_trade(&trade(1, 2, 10, 5), true);

        let delta = acct.mark_to_market(10.0);
        assert_eq!(delta, 0.0);
        assert_eq!(acct.nav(), 1000.0);

        let delta = acct.mark_to_market(12.0);
        assert_eq!(delta, 10.0);
        assert_eq!(acct.unrealized_pnl(), 10.0);
        assert_eq!(acct.cash(), 950.0);
        assert_eq!(acct.position(), 5);
    }

    #[test]
    fn realized_pnl_uses_average_cost() {
        let mut acct = Account::new(0, 1000, tick(), 10);
        acct.apply_trade(&trade(1, 9, 10, 2), true);
        acct.apply_trade(&trade(2, 9, 14, 2), true);
        // Average cost 12; sell 3 at 15.
        let mut sell = trade(9, 3, 15, 3);
        sell.seller_id = 0;
        acct.apply_trade(&sell, false);
        assert_eq!(acct.realized_pnl(), 9.0);
        assert_eq!(acct.position(), 1);

        // Flip short through flat: close 1 at 11, open 1 short at 11.
        let mut flip = trade(9, 4, 11, 2);
        flip.seller_id = 0;
        acct.apply_trade(&flip, false);
        assert_eq!(acct.realized_pnl(), 8.0);
        assert_eq!(acct.position(), -1);
        acct.mark_to_market(11.0);
        assert_eq!(acct.unrealized_pnl(), 0.0);
    }
}
