//! Authoritative two-seat game session.
//!
//! `Session` is a plain state machine: every handler takes `&mut self`, mutates
//! nothing on failure, and returns the messages to deliver. The coordinator
//! task owns the only instance, which serializes all handlers.

use tracing::{debug, info, instrument, warn};

use crate::errors::{ChessError, ChessResult};
use crate::position::apply::apply;
use crate::position::chess_types::Color;
use crate::position::position::{Position, PositionKey};
use crate::position::variants::Variant;
use crate::rules::game_status::{classify_with_history, GameStatus};
use crate::rules::legal_move_generator::legal_moves;
use crate::utils::render_board::render_position;
use crate::wire::long_algebraic::decode_move;
use crate::wire::messages::ServerMessage;

/// Server-assigned identity of one TCP connection.
pub type ConnectionId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    AwaitingSeats,
    InProgress,
    Finished,
}

/// A message addressed to one connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outbound {
    pub connection: ConnectionId,
    pub message: ServerMessage,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectOutcome {
    /// Seat granted; `greeting` goes to the new connection in order.
    Seated {
        seat: Color,
        greeting: Vec<ServerMessage>,
    },
    /// Both seats taken. Nothing changed.
    Rejected,
}

#[derive(Debug)]
pub struct Session {
    variant: Variant,
    seats: [Option<ConnectionId>; 2],
    position: Position,
    status: GameStatus,
    phase: SessionPhase,
    history: Vec<PositionKey>,
}

impl Session {
    #[instrument]
    pub fn new(variant: Variant) -> Self {
        let position = Position::initial(variant);
        info!(%variant, fen = %position.to_fen(), "Creating session");
        Self {
            variant,
            seats: [None, None],
            history: vec![position.key()],
            position,
            status: GameStatus::InProgress,
            phase: SessionPhase::AwaitingSeats,
        }
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn seat_holder(&self, seat: Color) -> Option<ConnectionId> {
        self.seats[seat.index()]
    }

    pub fn seat_of(&self, connection: ConnectionId) -> Option<Color> {
        Color::ALL
            .into_iter()
            .find(|seat| self.seats[seat.index()] == Some(connection))
    }

    /// Seat a new connection, White first.
    #[instrument(skip(self))]
    pub fn on_connect(&mut self, connection: ConnectionId) -> ConnectOutcome {
        let Some(seat) = Color::ALL
            .into_iter()
            .find(|seat| self.seats[seat.index()].is_none())
        else {
            warn!(connection, "Both seats taken, rejecting connection");
            return ConnectOutcome::Rejected;
        };

        self.seats[seat.index()] = Some(connection);
        info!(connection, %seat, "Seat assigned");

        if self.phase == SessionPhase::AwaitingSeats && self.seats.iter().all(Option::is_some) {
            info!("Both seats filled, game in progress");
            self.phase = SessionPhase::InProgress;
        }

        ConnectOutcome::Seated {
            seat,
            greeting: vec![
                ServerMessage::SeatAssignment(seat),
                ServerMessage::Variant(self.variant),
                ServerMessage::State(self.position.clone()),
            ],
        }
    }

    /// Validate and play a move submitted by `seat`.
    ///
    /// On success the new position is addressed to every occupied seat. Any
    /// error leaves the session untouched and must not be reported to a peer.
    #[instrument(skip(self))]
    pub fn on_move_received(&mut self, seat: Color, text: &str) -> ChessResult<Vec<Outbound>> {
        let mv = decode_move(text, &self.position)?;

        if self.phase != SessionPhase::InProgress {
            return Err(ChessError::illegal_move(text, "game is not in progress"));
        }
        if seat != self.position.side_to_move() {
            return Err(ChessError::illegal_move(
                text,
                format!("{seat} moved on {}'s turn", self.position.side_to_move()),
            ));
        }

        let legal = legal_moves(&self.position, mv.from)?;
        let Some(played) = legal.into_iter().find(|candidate| *candidate == mv) else {
            return Err(ChessError::illegal_move(text, "not a legal move"));
        };

        let next = apply(&self.position, &played)?;
        self.position = next;
        self.history.push(self.position.key());
        self.status = classify_with_history(&self.position, &self.history);

        info!(%seat, chess_move = %played, fen = %self.position.to_fen(), status = %self.status, "Move accepted");
        debug!("\n{}", render_position(&self.position));

        if self.status.is_terminal() {
            info!(status = %self.status, "Game finished");
            self.phase = SessionPhase::Finished;
        }

        Ok(self.broadcast(ServerMessage::State(self.position.clone())))
    }

    /// Free `seat`; the other seat, if held, is told its opponent left.
    #[instrument(skip(self))]
    pub fn on_disconnect(&mut self, seat: Color) -> Vec<Outbound> {
        let Some(connection) = self.seats[seat.index()].take() else {
            return Vec::new();
        };
        info!(connection, %seat, "Seat released");

        if self.phase == SessionPhase::InProgress {
            self.phase = SessionPhase::AwaitingSeats;
        }

        self.broadcast(ServerMessage::OpponentDisconnected)
    }

    fn broadcast(&self, message: ServerMessage) -> Vec<Outbound> {
        self.seats
            .iter()
            .flatten()
            .map(|&connection| Outbound {
                connection,
                message: message.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seated_session() -> Session {
        let mut session = Session::new(Variant::Standard);
        session.on_connect(1);
        session.on_connect(2);
        session
    }

    #[test]
    fn seats_fill_white_then_black_then_reject() {
        let mut session = Session::new(Variant::Standard);
        assert_eq!(session.phase(), SessionPhase::AwaitingSeats);

        let ConnectOutcome::Seated { seat, greeting } = session.on_connect(10) else {
            panic!("first connection should be seated");
        };
        assert_eq!(seat, Color::White);
        assert_eq!(
            greeting,
            vec![
                ServerMessage::SeatAssignment(Color::White),
                ServerMessage::Variant(Variant::Standard),
                ServerMessage::State(Position::initial(Variant::Standard)),
            ]
        );
        assert_eq!(session.phase(), SessionPhase::AwaitingSeats);

        assert!(matches!(
            session.on_connect(11),
            ConnectOutcome::Seated {
                seat: Color::Black,
                ..
            }
        ));
        assert_eq!(session.phase(), SessionPhase::InProgress);

        assert_eq!(session.on_connect(12), ConnectOutcome::Rejected);
        assert_eq!(session.seat_holder(Color::White), Some(10));
        assert_eq!(session.seat_holder(Color::Black), Some(11));
        assert_eq!(session.seat_of(12), None);
    }

    #[test]
    fn accepted_move_is_broadcast_to_both_seats() {
        let mut session = seated_session();
        let outbound = session
            .on_move_received(Color::White, "e2e4")
            .expect("e2e4 is legal");

        assert_eq!(session.position().side_to_move(), Color::Black);
        assert_eq!(outbound.len(), 2);
        for (out, connection) in outbound.iter().zip([1, 2]) {
            assert_eq!(out.connection, connection);
            assert_eq!(out.message, ServerMessage::State(session.position().clone()));
        }
    }

    #[test]
    fn wrong_turn_leaves_session_unchanged() {
        let mut session = seated_session();
        let before = session.position().clone();

        let err = session
            .on_move_received(Color::Black, "e7e5")
            .expect_err("black cannot move first");
        assert!(matches!(err, ChessError::IllegalMove { .. }));
        assert_eq!(session.position(), &before);
    }

    #[test]
    fn malformed_and_illegal_moves_are_rejected() {
        let mut session = seated_session();
        let before = session.position().clone();

        assert!(matches!(
            session.on_move_received(Color::White, "e2"),
            Err(ChessError::MalformedMove { .. })
        ));
        assert!(matches!(
            session.on_move_received(Color::White, "e2e5"),
            Err(ChessError::IllegalMove { .. })
        ));
        assert_eq!(session.position(), &before);
    }

    #[test]
    fn moves_wait_for_both_seats() {
        let mut session = Session::new(Variant::Standard);
        session.on_connect(1);
        assert!(session.on_move_received(Color::White, "e2e4").is_err());
        assert_eq!(session.position(), &Position::initial(Variant::Standard));
    }

    #[test]
    fn checkmate_finishes_the_game() {
        let mut session = seated_session();
        for (seat, text) in [
            (Color::White, "f2f3"),
            (Color::Black, "e7e5"),
            (Color::White, "g2g4"),
            (Color::Black, "d8h4"),
        ] {
            session
                .on_move_received(seat, text)
                .expect("fool's mate moves are legal");
        }

        assert_eq!(
            session.status(),
            GameStatus::Checkmate {
                winner: Color::Black
            }
        );
        assert_eq!(session.phase(), SessionPhase::Finished);
        assert!(session.on_move_received(Color::White, "a2a3").is_err());
    }

    #[test]
    fn fivefold_shuffle_is_a_draw() {
        let mut session = seated_session();
        let shuffle = [
            (Color::White, "g1f3"),
            (Color::Black, "g8f6"),
            (Color::White, "f3g1"),
            (Color::Black, "f6g8"),
        ];
        for _ in 0..4 {
            for (seat, text) in shuffle {
                session
                    .on_move_received(seat, text)
                    .expect("knight shuffle is legal");
            }
        }

        assert_eq!(
            session.status(),
            GameStatus::Draw(crate::rules::game_status::DrawReason::FivefoldRepetition)
        );
        assert_eq!(session.phase(), SessionPhase::Finished);
    }

    #[test]
    fn disconnect_frees_seat_and_notifies_opponent() {
        let mut session = seated_session();
        let outbound = session.on_disconnect(Color::White);

        assert_eq!(
            outbound,
            vec![Outbound {
                connection: 2,
                message: ServerMessage::OpponentDisconnected,
            }]
        );
        assert_eq!(session.seat_holder(Color::White), None);
        assert_eq!(session.phase(), SessionPhase::AwaitingSeats);

        assert!(matches!(
            session.on_connect(3),
            ConnectOutcome::Seated {
                seat: Color::White,
                ..
            }
        ));
        assert_eq!(session.phase(), SessionPhase::InProgress);
    }
}
