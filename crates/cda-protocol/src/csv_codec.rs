//! CSV codec for action scripts and report lines.
//!
//! Input format (lines → [`ScriptLine`]):
//!
//! - Action:
//!   `A, step(int), trader(int), kind(M or L), side(B, A or -), size(real), price(real)`
//!
//!   `-` as side is a no-op action. `price` may be omitted for market orders.
//!
//! - Cancel (applied before that step's actions):
//!   `X, step(int), trader(int), orderId(int)`
//!
//! Blank lines and lines starting with `#` are skipped.
//!
//! Output format (report → line):
//!
//! - Trade:
//!   `T, seq, buyerId, buyOrderId, sellerId, sellOrderId, price, size, aggressor(B/A)`
//!
//! - Aggregated level:
//!   `L, side(B/A), price, size, orderCount`
//!
//! - Per-trader step result:
//!   `R, t, trader, reward, done(0/1), nav, cash, position`
//!
//! - Per-action outcome:
//!   `O, t, trader, ACCEPTED, orderId, filled, resting, discarded`
//!   `O, t, trader, NOOP`
//!   `O, t, trader, REJECTED, reason`

use std::num::{ParseFloatError, ParseIntError};

use thiserror::Error;

use cda_core::{
    Action, ActionOutcome, ActionRejection, AggregatedBook, LevelSummary, OrderId, OrderType,
    Side, StepResult, TickSize, Trade, TraderId,
};

/// Largest step index a script line may name. Steps are stored densely,
/// so this caps what one line can make [`parse_script`] allocate.
pub const MAX_SCRIPT_STEP: u32 = 1_000_000;

/// Errors from parsing a script.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("unknown record type: {0:?}")]
    UnknownRecord(String),

    #[error("record {record} expects {expected} fields, got {got}")]
    FieldCount {
        record: char,
        expected: &'static str,
        got: usize,
    },

    #[error("invalid {field}: {value:?}")]
    InvalidField { field: &'static str, value: String },

    #[error("line {line}: {source}")]
    Line {
        line: usize,
        #[source]
        source: Box<ProtocolError>,
    },
}

/// One parsed script line.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptLine {
    Action { step: u32, action: Action },
    Cancel { step: u32, trader_id: TraderId, order_id: OrderId },
}

/// Everything scheduled for one step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScriptStep {
    /// `(trader, order)` cancels applied before the actions.
    pub cancels: Vec<(TraderId, OrderId)>,
    /// The step's action batch, in file order.
    pub actions: Vec<Action>,
}

/// Parse a single line.
///
/// Returns `Ok(None)` for blank lines or comments (starting with `#`).
pub fn parse_script_line(line: &str) -> Result<Option<ScriptLine>, ProtocolError> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }

    let tokens = split_and_trim(trimmed, ',');
    match tokens[0] {
        "A" => parse_action(&tokens).map(Some),
        "X" => parse_cancel(&tokens).map(Some),
        other => Err(ProtocolError::UnknownRecord(other.to_string())),
    }
}

/// Parse a whole script into per-step batches.
///
/// The result is indexed by step; steps with no lines are empty batches.
pub fn parse_script(text: &str) -> Result<Vec<ScriptStep>, ProtocolError> {
    let mut steps: Vec<ScriptStep> = Vec::new();

    for (idx, raw_line) in text.lines().enumerate() {
        let parsed = parse_script_line(raw_line).map_err(|source| ProtocolError::Line {
            line: idx + 1,
            source: Box::new(source),
        })?;
        let Some(parsed) = parsed else {
            continue;
        };

        let step = match &parsed {
            ScriptLine::Action { step, .. } | ScriptLine::Cancel { step, .. } => *step as usize,
        };
        if steps.len() <= step {
            steps.resize_with(step + 1, ScriptStep::default);
        }

        match parsed {
            ScriptLine::Action { action, .. } => steps[step].actions.push(action),
            ScriptLine::Cancel {
                trader_id,
                order_id,
                ..
            } => steps[step].cancels.push((trader_id, order_id)),
        }
    }

    Ok(steps)
}

fn parse_action(tokens: &[&str]) -> Result<ScriptLine, ProtocolError> {
    // A, step, trader, kind, side, size[, price]
    if tokens.len() != 6 && tokens.len() != 7 {
        return Err(ProtocolError::FieldCount {
            record: 'A',
            expected: "6 or 7",
            got: tokens.len(),
        });
    }

    let step = parse_step(tokens[1])?;
    let trader_id = parse_u32(tokens[2]).map_err(|_| invalid("trader", tokens[2]))?;

    let kind = single_char(tokens[3])
        .and_then(OrderType::from_char)
        .ok_or_else(|| invalid("kind", tokens[3]))?;

    let side = match tokens[4] {
        "-" => None,
        other => Some(
            single_char(other)
                .and_then(Side::from_char)
                .ok_or_else(|| invalid("side", other))?,
        ),
    };

    let size = parse_f64(tokens[5]).map_err(|_| invalid("size", tokens[5]))?;
    let price = match tokens.get(6) {
        Some(tok) => parse_f64(tok).map_err(|_| invalid("price", tok))?,
        None if kind == OrderType::Market || side.is_none() => 0.0,
        None => {
            return Err(ProtocolError::FieldCount {
                record: 'A',
                expected: "7 for limit orders",
                got: tokens.len(),
            })
        }
    };

    Ok(ScriptLine::Action {
        step,
        action: Action {
            trader_id,
            kind,
            side,
            size,
            price,
        },
    })
}

fn parse_cancel(tokens: &[&str]) -> Result<ScriptLine, ProtocolError> {
    // X, step, trader, orderId
    if tokens.len() != 4 {
        return Err(ProtocolError::FieldCount {
            record: 'X',
            expected: "4",
            got: tokens.len(),
        });
    }

    Ok(ScriptLine::Cancel {
        step: parse_step(tokens[1])?,
        trader_id: parse_u32(tokens[2]).map_err(|_| invalid("trader", tokens[2]))?,
        order_id: tokens[3]
            .parse::<u64>()
            .map_err(|_| invalid("order id", tokens[3]))?,
    })
}

/// Format a trade with real-valued price.
pub fn format_trade(trade: &Trade, tick: TickSize) -> String {
    format!(
        "T, {}, {}, {}, {}, {}, {}, {}, {}",
        trade.sequence_number,
        trade.buyer_id,
        trade.buy_order_id,
        trade.seller_id,
        trade.sell_order_id,
        tick.to_price(trade.price),
        trade.size,
        trade.aggressor_side.as_char()
    )
}

/// One `L` line per level, asks from best outward then bids from best
/// outward.
pub fn format_agg_book(agg: &AggregatedBook, tick: TickSize) -> Vec<String> {
    agg.asks
        .iter()
        .map(|level| format_level(Side::Ask, level, tick))
        .chain(agg.bids.iter().map(|level| format_level(Side::Bid, level, tick)))
        .collect()
}

fn format_level(side: Side, level: &LevelSummary, tick: TickSize) -> String {
    format!(
        "L, {}, {}, {}, {}",
        side.as_char(),
        tick.to_price(level.price),
        level.size,
        level.order_count
    )
}

/// One `R` line per trader, in trader-id order.
pub fn format_step(result: &StepResult) -> Vec<String> {
    result
        .infos
        .iter()
        .map(|(id, info)| {
            let reward = result.rewards.get(id).copied().unwrap_or(0.0);
            let done = result.dones.get(id).copied().unwrap_or(false);
            format!(
                "R, {}, {}, {}, {}, {}, {}, {}",
                result.t_step,
                id,
                reward,
                u8::from(done),
                info.account.nav,
                info.account.cash,
                info.account.position
            )
        })
        .collect()
}

/// Every report line for one step: trades once each in sequence order,
/// then action outcomes by trader, then the `R` lines.
pub fn format_step_report(result: &StepResult, tick: TickSize) -> Vec<String> {
    let mut lines: Vec<String> = result
        .trades()
        .into_iter()
        .map(|trade| format_trade(trade, tick))
        .collect();
    for (id, info) in &result.infos {
        lines.extend(
            info.outcomes
                .iter()
                .map(|outcome| format_outcome(result.t_step, *id, outcome)),
        );
    }
    lines.extend(format_step(result));
    lines
}

/// Format one action outcome.
pub fn format_outcome(t_step: u32, trader_id: TraderId, outcome: &ActionOutcome) -> String {
    match outcome {
        ActionOutcome::NoOp => format!("O, {}, {}, NOOP", t_step, trader_id),
        ActionOutcome::Accepted {
            order_id,
            filled,
            resting,
            discarded,
            ..
        } => format!(
            "O, {}, {}, ACCEPTED, {}, {}, {}, {}",
            t_step, trader_id, order_id, filled, resting, discarded
        ),
        ActionOutcome::Rejected(reason) => format!(
            "O, {}, {}, REJECTED, {}",
            t_step,
            trader_id,
            rejection_label(reason)
        ),
    }
}

fn rejection_label(reason: &ActionRejection) -> &'static str {
    match reason {
        ActionRejection::InvalidOrder(_) => "INVALID_ORDER",
        ActionRejection::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
        ActionRejection::InsufficientPosition { .. } => "INSUFFICIENT_POSITION",
        ActionRejection::AgentDone => "AGENT_DONE",
    }
}

// -----------------------------------------------------------------------------
// Helpers
// -----------------------------------------------------------------------------

fn split_and_trim(s: &str, delimiter: char) -> Vec<&str> {
    s.split(delimiter).map(str::trim).collect()
}

fn single_char(s: &str) -> Option<char> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

fn invalid(field: &'static str, value: &str) -> ProtocolError {
    ProtocolError::InvalidField {
        field,
        value: value.to_string(),
    }
}

fn parse_step(s: &str) -> Result<u32, ProtocolError> {
    match parse_u32(s) {
        Ok(step) if step <= MAX_SCRIPT_STEP => Ok(step),
        _ => Err(invalid("step", s)),
    }
}

fn parse_u32(s: &str) -> Result<u32, ParseIntError> {
    s.parse::<u32>()
}

fn parse_f64(s: &str) -> Result<f64, ParseFloatError> {
    s.parse::<f64>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cda_core::{AccountSummary, StepInfo};

    #[test]
    fn parses_limit_market_and_noop_actions() {
        let line = parse_script_line("A, 0, 1, L, B, 5, 10.25").unwrap();
        assert_eq!(
            line,
            Some(ScriptLine::Action {
                step: 0,
                action: Action::limit(1, Side::Bid, 5.0, 10.25),
            })
        );

        let line = parse_script_line("A, 3, 2, M, A, 4").unwrap();
        assert_eq!(
            line,
            Some(ScriptLine::Action {
                step: 3,
                action: Action::market(2, Side::Ask, 4.0),
            })
        );

        let Some(ScriptLine::Action { action, .. }) = parse_script_line("A, 1, 0, M, -, 0").unwrap() else {
            panic!("expected action");
        };
        assert!(action.side.is_none());
    }

    #[test]
    fn skips_comments_and_blank_lines() {
        assert_eq!(parse_script_line("   ").unwrap(), None);
        assert_eq!(parse_script_line("# A, 0, 0, L, B, 1, 1").unwrap(), None);
    }

    #[test]
    fn rejects_malformed_lines() {
        assert!(matches!(
            parse_script_line("Z, 1"),
            Err(ProtocolError::UnknownRecord(_))
        ));
        assert!(matches!(
            parse_script_line("A, 0, 1, L, B, 5"),
            Err(ProtocolError::FieldCount { record: 'A', .. })
        ));
        assert!(matches!(
            parse_script_line("A, 0, 1, Q, B, 5, 1"),
            Err(ProtocolError::InvalidField { field: "kind", .. })
        ));
        assert!(matches!(
            parse_script_line("A, 0, 1, L, S, 5, 1"),
            Err(ProtocolError::InvalidField { field: "side", .. })
        ));
        assert!(matches!(
            parse_script_line("X, 0, 1"),
            Err(ProtocolError::FieldCount { record: 'X', .. })
        ));
    }

    #[test]
    fn script_groups_lines_by_step_and_reports_line_numbers() {
        let text = "# header\nA, 0, 0, L, B, 1, 10\nA, 2, 1, L, A, 1, 11\nX, 2, 0, 1\n";
        let steps = parse_script(text).unwrap();
        assert_eq!(steps.len(), 3);
        assert_eq!(steps[0].actions.len(), 1);
        assert!(steps[1].actions.is_empty());
        assert_eq!(steps[2].cancels, vec![(0, 1)]);

        let err = parse_script("A, 0, 0, L, B, 1, 10\nbogus").unwrap_err();
        assert!(matches!(err, ProtocolError::Line { line: 2, .. }));
    }

    #[test]
    fn far_future_step_is_rejected_before_allocating() {
        let err = parse_script("A, 0, 0, M, -, 0\nA, 4000000000, 0, M, -, 0\n").unwrap_err();
        let ProtocolError::Line { line, source } = err else {
            panic!("expected a line error");
        };
        assert_eq!(line, 2);
        assert_eq!(*source, invalid("step", "4000000000"));

        assert!(parse_script_line("X, 1000001, 0, 1").is_err());
        let last = format!("A, {}, 0, M, -, 0", MAX_SCRIPT_STEP);
        assert!(parse_script_line(&last).unwrap().is_some());
    }

    #[test]
    fn formats_trades_with_real_prices() {
        let trade = Trade {
            sequence_number: 7,
            buy_order_id: 3,
            buyer_id: 0,
            sell_order_id: 2,
            seller_id: 1,
            price: 41,
            size: 5,
            aggressor_side: Side::Bid,
        };
        let tick = TickSize::new(0.25).unwrap();
        assert_eq!(format_trade(&trade, tick), "T, 7, 0, 3, 1, 2, 10.25, 5, B");
    }

    #[test]
    fn formats_agg_book_asks_then_bids() {
        let agg = AggregatedBook {
            bids: vec![LevelSummary {
                price: 9,
                size: 3,
                order_count: 2,
            }],
            asks: vec![LevelSummary {
                price: 11,
                size: 4,
                order_count: 1,
            }],
        };
        let lines = format_agg_book(&agg, TickSize::new(1.0).unwrap());
        assert_eq!(lines, vec!["L, A, 11, 4, 1", "L, B, 9, 3, 2"]);
    }

    fn summary(trader_id: TraderId, cash: f64, position: i64) -> AccountSummary {
        AccountSummary {
            trader_id,
            cash,
            reserved_cash: 0.0,
            position,
            reserved_position: 0,
            nav: 1000.0,
            realized_pnl: 0.0,
            unrealized_pnl: 0.0,
            open_orders: 0,
        }
    }

    #[test]
    fn step_report_lists_shared_trade_once() {
        let trade = Trade {
            sequence_number: 3,
            buy_order_id: 2,
            buyer_id: 0,
            sell_order_id: 1,
            seller_id: 1,
            price: 10,
            size: 2,
            aggressor_side: Side::Bid,
        };
        let accepted = ActionOutcome::Accepted {
            order_id: 2,
            filled: 2,
            resting: 0,
            discarded: 0,
            self_trade_cancels: vec![],
        };
        let infos = [
            (
                0,
                StepInfo {
                    outcomes: vec![accepted],
                    trades: vec![trade.clone()],
                    account: summary(0, 980.0, 2),
                },
            ),
            (
                1,
                StepInfo {
                    outcomes: vec![],
                    trades: vec![trade],
                    account: summary(1, 1020.0, -2),
                },
            ),
        ]
        .into_iter()
        .collect();
        let result = StepResult {
            t_step: 1,
            observations: Default::default(),
            rewards: [(0, 0.0), (1, 0.0)].into_iter().collect(),
            dones: [(0, false), (1, false)].into_iter().collect(),
            infos,
            all_done: false,
            unknown_actions: vec![],
        };

        let lines = format_step_report(&result, TickSize::new(1.0).unwrap());
        assert_eq!(
            lines,
            vec![
                "T, 3, 0, 2, 1, 1, 10, 2, B",
                "O, 1, 0, ACCEPTED, 2, 2, 0, 0",
                "R, 1, 0, 0, 0, 1000, 980, 2",
                "R, 1, 1, 0, 0, 1000, 1020, -2",
            ]
        );
    }

    #[test]
    fn formats_outcomes() {
        assert_eq!(format_outcome(1, 2, &ActionOutcome::NoOp), "O, 1, 2, NOOP");
        assert_eq!(
            format_outcome(1, 2, &ActionOutcome::Rejected(ActionRejection::AgentDone)),
            "O, 1, 2, REJECTED, AGENT_DONE"
        );
        let accepted = ActionOutcome::Accepted {
            order_id: 9,
            filled: 2,
            resting: 1,
            discarded: 0,
            self_trade_cancels: vec![],
        };
        assert_eq!(format_outcome(0, 3, &accepted), "O, 0, 3, ACCEPTED, 9, 2, 1, 0");
    }
}
