//! Side (Bid / Ask) for orders, levels and trades.

use serde::{Deserialize, Serialize};

/// Order side: Bid (buy) or Ask (sell).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Bid,
    Ask,
}

impl Side {
    /// The side an order of this side matches against.
    pub fn opposite(self) -> Self {
        match self {
            Side::Bid => Side::Ask,
            Side::Ask => Side::Bid,
        }
    }

    /// Single-char form (`'B'` / `'A'`), used by the CSV codec and `render()`.
    pub fn as_char(self) -> char {
        match self {
            Side::Bid => 'B',
            Side::Ask => 'A',
        }
    }

    /// Try to parse from a char (`'B'` / `'A'`, case-sensitive).
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'B' => Some(Side::Bid),
            'A' => Some(Side::Ask),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opposite_and_char_forms() {
        assert_eq!(Side::Bid.opposite(), Side::Ask);
        assert_eq!(Side::Ask.opposite(), Side::Bid);
        assert_eq!(Side::from_char(Side::Ask.as_char()), Some(Side::Ask));
        assert_eq!(Side::from_char('S'), None);
    }
}
