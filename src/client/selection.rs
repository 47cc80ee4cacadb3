//! Local piece selection and move assembly.
//!
//! Destinations always come from [`legal_moves`], the same generator the
//! server gates on, so a highlighted square is a move the server accepts.

use tracing::debug;

use crate::errors::ChessResult;
use crate::moves::chess_move::ChessMove;
use crate::position::chess_types::*;
use crate::position::position::Position;
use crate::rules::legal_move_generator::legal_moves;
use crate::utils::render_board::BoardMarkers;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionState {
    Idle,
    PieceSelected {
        origin: Square,
        legal: Vec<ChessMove>,
    },
}

#[derive(Debug, Clone)]
pub struct ClientSelection {
    local_color: Color,
    state: SelectionState,
    promotion_choice: PieceKind,
}

impl ClientSelection {
    pub fn new(local_color: Color) -> Self {
        Self {
            local_color,
            state: SelectionState::Idle,
            promotion_choice: PieceKind::Queen,
        }
    }

    pub fn local_color(&self) -> Color {
        self.local_color
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn promotion_choice(&self) -> PieceKind {
        self.promotion_choice
    }

    /// Piece a pawn becomes when it reaches the last rank. Queen unless changed.
    ///
    /// Ignored unless `kind` is a legal promotion target.
    pub fn set_promotion_choice(&mut self, kind: PieceKind) {
        if kind.is_promotion_target() {
            self.promotion_choice = kind;
        }
    }

    pub fn selected(&self) -> Option<Square> {
        match &self.state {
            SelectionState::Idle => None,
            SelectionState::PieceSelected { origin, .. } => Some(*origin),
        }
    }

    /// Bitboard of destinations reachable from the selected origin.
    pub fn targets(&self) -> u64 {
        match &self.state {
            SelectionState::Idle => 0,
            SelectionState::PieceSelected { legal, .. } => {
                legal.iter().fold(0u64, |mask, mv| mask | (1u64 << mv.to))
            }
        }
    }

    pub fn markers(&self) -> BoardMarkers {
        BoardMarkers {
            selected: self.selected(),
            targets: self.targets(),
        }
    }

    pub fn reset(&mut self) {
        self.state = SelectionState::Idle;
    }

    /// Feed one square activation.
    ///
    /// Returns the move to send when the activation completes a legal move.
    /// Every other outcome only changes the selection. Fails only for an
    /// off-board square.
    pub fn activate(&mut self, position: &Position, square: Square) -> ChessResult<Option<ChessMove>> {
        let occupant = position.piece_at(square)?;
        let own_piece = occupant.is_some_and(|piece| piece.color == self.local_color);

        let state = std::mem::replace(&mut self.state, SelectionState::Idle);
        match state {
            // Activating the selected origin again is the deselect gesture.
            SelectionState::PieceSelected { origin, .. } if origin == square => {
                debug!(square, "Deselected");
                Ok(None)
            }
            _ if own_piece => {
                let legal = legal_moves(position, square)?;
                debug!(square, destinations = legal.len(), "Piece selected");
                self.state = SelectionState::PieceSelected {
                    origin: square,
                    legal,
                };
                Ok(None)
            }
            SelectionState::Idle => Ok(None),
            SelectionState::PieceSelected { origin, legal } => {
                let chosen = self.pick(&legal, origin, square);
                if chosen.is_none() {
                    debug!(origin, square, "Not a legal destination");
                }
                Ok(chosen)
            }
        }
    }

    fn pick(&self, legal: &[ChessMove], origin: Square, target: Square) -> Option<ChessMove> {
        let mut candidates = legal
            .iter()
            .filter(|mv| mv.from == origin && mv.to == target)
            .peekable();

        let first = **candidates.peek()?;
        if first.promotion.is_none() {
            return Some(first);
        }
        candidates
            .find(|mv| mv.promotion == Some(self.promotion_choice))
            .copied()
    }
}
