//! Fixed-width per-agent observations.
//!
//! Layout (`depth` columns per book row, zero padded):
//!
//! ```text
//! row 0: bid price offsets from the reference price, best first
//! row 1: bid sizes
//! row 2: ask price offsets from the reference price, best first
//! row 3: ask sizes
//! account: [cash, position, nav, realized_pnl]
//! ```
//!
//! The reference price is the book midpoint, else the last trade price,
//! else zero (offsets are then raw prices).

use serde::Serialize;

use crate::account::Account;
use crate::order_book::OrderBook;

/// Number of book rows in an observation.
pub const BOOK_ROWS: usize = 4;

/// Number of account values appended after the book rows.
pub const ACCOUNT_FIELDS: usize = 4;

/// One agent's view of the market after a step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Observation {
    /// `BOOK_ROWS` rows of `depth` values.
    pub book: Vec<Vec<f64>>,
    /// `[cash, position, nav, realized_pnl]`.
    pub account: [f64; ACCOUNT_FIELDS],
}

impl Observation {
    /// Flatten to `BOOK_ROWS * depth + ACCOUNT_FIELDS` values, row-major.
    pub fn to_vec(&self) -> Vec<f64> {
        self.book
            .iter()
            .flatten()
            .chain(self.account.iter())
            .copied()
            .collect()
    }

    /// Columns per book row.
    pub fn depth(&self) -> usize {
        self.book.first().map(Vec::len).unwrap_or(0)
    }
}

/// Projects book and account state into [`Observation`]s.
///
/// Read-only: building never mutates or reorders the book.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObservationBuilder {
    depth: usize,
}

impl ObservationBuilder {
    pub fn new(depth: usize) -> Self {
        ObservationBuilder { depth }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Length of [`Observation::to_vec`].
    pub fn width(&self) -> usize {
        BOOK_ROWS * self.depth + ACCOUNT_FIELDS
    }

    pub fn build(&self, book: &OrderBook, account: &Account) -> Observation {
        let tick = book.tick_size();
        let reference = book.mark_price().unwrap_or(0.0);
        let agg = book.aggregate(self.depth);

        let mut rows = vec![vec![0.0; self.depth]; BOOK_ROWS];
        for (i, level) in agg.bids.iter().enumerate() {
            rows[0][i] = tick.to_price(level.price) - reference;
            rows[1][i] = level.size as f64;
        }
        for (i, level) in agg.asks.iter().enumerate() {
            rows[2][i] = tick.to_price(level.price) - reference;
            rows[3][i] = level.size as f64;
        }

        Observation {
            book: rows,
            account: [
                account.cash(),
                account.position() as f64,
                account.nav(),
                account.realized_pnl(),
            ],
        }
    }
}
