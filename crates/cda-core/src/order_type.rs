//! Order type (Market vs Limit).

use serde::{Deserialize, Serialize};

/// Market orders take whatever liquidity is on the book and never rest.
/// Limit orders carry a price and rest with any unfilled remainder.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderType {
    Market,
    Limit,
}

impl OrderType {
    pub fn as_char(self) -> char {
        match self {
            OrderType::Market => 'M',
            OrderType::Limit => 'L',
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'M' => Some(OrderType::Market),
            'L' => Some(OrderType::Limit),
            _ => None,
        }
    }
}
