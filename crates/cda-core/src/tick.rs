//! Conversion between real-valued prices/sizes at the boundary and the
//! integer ticks/units the engine works in.
//!
//! Inside the book every price is a whole number of ticks and every size a
//! whole number of units, so settlement (`price * size`) is exact integer
//! arithmetic. Cash is kept in "tick-cash": one tick of price times one unit.

use serde::{Deserialize, Serialize};

/// Relative slack allowed when deciding whether a real price sits on a tick.
const ALIGN_EPSILON: f64 = 1e-9;

/// Minimum price increment.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickSize(f64);

impl TickSize {
    /// Returns `None` unless `size` is finite and strictly positive.
    pub fn new(size: f64) -> Option<Self> {
        if size.is_finite() && size > 0.0 {
            Some(TickSize(size))
        } else {
            None
        }
    }

    pub fn value(self) -> f64 {
        self.0
    }

    /// Convert a real price to ticks.
    ///
    /// Returns `None` for negative, non-finite, out-of-range or
    /// off-tick prices.
    pub fn to_ticks(self, price: f64) -> Option<u32> {
        if !price.is_finite() || price < 0.0 {
            return None;
        }
        let ticks = price / self.0;
        let rounded = ticks.round();
        if (ticks - rounded).abs() > ALIGN_EPSILON * rounded.max(1.0) {
            return None;
        }
        if rounded > u32::MAX as f64 {
            return None;
        }
        Some(rounded as u32)
    }

    /// Ticks back to a real price.
    pub fn to_price(self, ticks: u32) -> f64 {
        ticks as f64 * self.0
    }

    /// Fractional tick values (e.g. a mid-point between two levels).
    pub fn scale(self, ticks: f64) -> f64 {
        ticks * self.0
    }

    /// Real cash amount to tick-cash, rounding down to a whole tick.
    pub fn cash_to_ticks(self, cash: f64) -> i64 {
        (cash / self.0 + ALIGN_EPSILON).floor() as i64
    }

    /// Tick-cash back to a real cash amount.
    pub fn cash_from_ticks(self, cash_ticks: i64) -> f64 {
        cash_ticks as f64 * self.0
    }
}

impl Default for TickSize {
    fn default() -> Self {
        TickSize(0.25)
    }
}

/// Convert a real-valued size into whole units.
///
/// Sizes must be finite, strictly positive and integral.
pub fn size_to_units(size: f64) -> Option<u32> {
    if !size.is_finite() || size <= 0.0 || size.fract() != 0.0 || size > u32::MAX as f64 {
        return None;
    }
    Some(size as u32)
}
