//! cda-protocol
//!
//! Text encoding for the continuous double auction core.
//!
//! - [`csv_codec`] : scripted action input and CSV report lines (for the
//!   driver binary, logs and replay tests)
//!
//! The core itself stays transport-agnostic; nothing here touches an
//! environment's state.

pub mod csv_codec;

pub use csv_codec::{
    format_agg_book,
    format_outcome,
    format_step,
    format_step_report,
    format_trade,
    parse_script,
    parse_script_line,
    ProtocolError,
    ScriptLine,
    ScriptStep,
    MAX_SCRIPT_STEP,
};
