//! Errors used throughout the rules engine, codec and session layers.
//!
//! `ChessError` is the single error type returned by position application,
//! move generation entry points and the text codecs. Session code maps every
//! variant to "drop the attempt"; nothing here is ever sent to a remote peer.

use derive_more::{Display, Error};

use crate::position::chess_types::Square;

/// Convenience alias for results carrying [`ChessError`].
pub type ChessResult<T> = Result<T, ChessError>;

/// Unified error type for the crate.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum ChessError {
    /// Move text does not match the long algebraic grammar.
    #[display("malformed move {text:?}: {reason}")]
    MalformedMove { text: String, reason: String },

    /// The move parses but cannot be played in the current position.
    #[display("illegal move {text}: {reason}")]
    IllegalMove { text: String, reason: String },

    /// A square index outside `0..=63` reached the engine.
    #[display("square index {square} is off the board")]
    InvalidSquare { square: Square },

    /// An encoded position could not be decoded.
    #[display("malformed position {text:?}: {reason}")]
    MalformedState { text: String, reason: String },
}

impl ChessError {
    pub(crate) fn malformed_move(text: &str, reason: impl Into<String>) -> Self {
        ChessError::MalformedMove {
            text: text.to_owned(),
            reason: reason.into(),
        }
    }

    pub(crate) fn illegal_move(text: impl Into<String>, reason: impl Into<String>) -> Self {
        ChessError::IllegalMove {
            text: text.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn malformed_state(text: &str, reason: impl Into<String>) -> Self {
        ChessError::MalformedState {
            text: text.to_owned(),
            reason: reason.into(),
        }
    }
}
