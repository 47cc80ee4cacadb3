//! Server-to-client line protocol.
//!
//! Every message is one line. Anything that is not one of the fixed texts is
//! taken to be an encoded position.

use std::fmt;
use std::str::FromStr;

use crate::errors::{ChessError, ChessResult};
use crate::position::chess_types::Color;
use crate::position::position::Position;
use crate::position::variants::Variant;
use crate::wire::fen_generator::generate_fen;
use crate::wire::fen_parser::parse_fen;

pub const SEAT_PREFIX: &str = "You play as ";
pub const VARIANT_PREFIX: &str = "Variant ";
pub const SERVER_FULL: &str = "Server is full";
pub const OPPONENT_DISCONNECTED: &str = "Opponent disconnected";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    SeatAssignment(Color),
    Variant(Variant),
    State(Position),
    ServerFull,
    OpponentDisconnected,
}

impl ServerMessage {
    /// The line for this message, without the trailing newline.
    pub fn encode(&self) -> String {
        self.to_string()
    }

    /// Parse one received line; surrounding whitespace is ignored.
    pub fn parse(line: &str) -> ChessResult<Self> {
        let line = line.trim();

        if let Some(seat) = line.strip_prefix(SEAT_PREFIX) {
            return match seat {
                "White" => Ok(ServerMessage::SeatAssignment(Color::White)),
                "Black" => Ok(ServerMessage::SeatAssignment(Color::Black)),
                _ => Err(ChessError::malformed_state(line, "unknown seat")),
            };
        }

        if let Some(name) = line.strip_prefix(VARIANT_PREFIX) {
            return Variant::from_str(name)
                .map(ServerMessage::Variant)
                .map_err(|_| ChessError::malformed_state(line, "unknown variant"));
        }

        match line {
            SERVER_FULL => Ok(ServerMessage::ServerFull),
            OPPONENT_DISCONNECTED => Ok(ServerMessage::OpponentDisconnected),
            _ => parse_fen(line).map(ServerMessage::State),
        }
    }
}

impl fmt::Display for ServerMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerMessage::SeatAssignment(color) => write!(f, "{SEAT_PREFIX}{color}"),
            ServerMessage::Variant(variant) => write!(f, "{VARIANT_PREFIX}{variant}"),
            ServerMessage::State(position) => f.write_str(&generate_fen(position)),
            ServerMessage::ServerFull => f.write_str(SERVER_FULL),
            ServerMessage::OpponentDisconnected => f.write_str(OPPONENT_DISCONNECTED),
        }
    }
}
