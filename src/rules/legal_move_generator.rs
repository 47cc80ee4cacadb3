//! Full legal move generation pipeline.
//!
//! Generates pseudo-legal moves per piece, applies each candidate, and drops
//! those that leave the mover's own king attacked. Everything here is a pure
//! function of the position; results are sets and carry no meaningful order.

use crate::errors::{ChessError, ChessResult};
use crate::moves::chess_move::ChessMove;
use crate::position::apply::apply;
use crate::position::chess_types::*;
use crate::position::position::Position;
use crate::rules::legal_move_checks::is_in_check;
use crate::rules::legal_moves_king::generate_king_moves;
use crate::rules::legal_moves_pawn::generate_pawn_moves;
use crate::rules::legal_moves_pieces::generate_piece_moves;

/// A legal move together with the position it produces.
#[derive(Debug, Clone)]
pub struct GeneratedMove {
    pub chess_move: ChessMove,
    pub position_after: Position,
}

/// Legal moves whose origin is `origin`.
///
/// Empty when the square is empty or holds a piece of the side not to move.
pub fn legal_moves(position: &Position, origin: Square) -> ChessResult<Vec<ChessMove>> {
    if !is_on_board(origin) {
        return Err(ChessError::InvalidSquare { square: origin });
    }

    let mut pseudo = Vec::with_capacity(32);
    generate_pseudo_legal_from(position, origin, &mut pseudo);

    Ok(filter_legal(position, pseudo)
        .into_iter()
        .map(|generated| generated.chess_move)
        .collect())
}

/// Legal moves of every piece of the side to move.
pub fn all_legal_moves(position: &Position) -> Vec<ChessMove> {
    generate_legal_moves(position)
        .into_iter()
        .map(|generated| generated.chess_move)
        .collect()
}

/// Like [`all_legal_moves`], keeping each successor position.
pub fn generate_legal_moves(position: &Position) -> Vec<GeneratedMove> {
    let mut pseudo = Vec::with_capacity(128);

    let mut own = position.occupancy(position.side_to_move());
    while own != 0 {
        let from = own.trailing_zeros() as Square;
        generate_pseudo_legal_from(position, from, &mut pseudo);
        own &= own - 1;
    }

    filter_legal(position, pseudo)
}

/// True if the side to move has at least one legal move.
pub fn has_legal_move(position: &Position) -> bool {
    let mover = position.side_to_move();
    let mut own = position.occupancy(mover);
    let mut pseudo = Vec::with_capacity(32);

    while own != 0 {
        let from = own.trailing_zeros() as Square;
        pseudo.clear();
        generate_pseudo_legal_from(position, from, &mut pseudo);
        let escapes = pseudo.iter().any(|mv| {
            apply(position, mv).is_ok_and(|next| !is_in_check(&next, mover))
        });
        if escapes {
            return true;
        }
        own &= own - 1;
    }

    false
}

/// Pseudo-legal moves of the piece on `from`, if it belongs to the side to move.
pub fn generate_pseudo_legal_from(position: &Position, from: Square, out: &mut Vec<ChessMove>) {
    let Some(piece) = position.piece_on(from) else {
        return;
    };
    if piece.color != position.side_to_move() {
        return;
    }

    match piece.kind {
        PieceKind::Pawn => generate_pawn_moves(position, from, out),
        PieceKind::King => generate_king_moves(position, from, out),
        PieceKind::Knight | PieceKind::Bishop | PieceKind::Rook | PieceKind::Queen => {
            generate_piece_moves(position, from, piece.kind, out)
        }
    }
}

fn filter_legal(position: &Position, pseudo: Vec<ChessMove>) -> Vec<GeneratedMove> {
    let mover = position.side_to_move();
    let mut legal = Vec::with_capacity(pseudo.len());

    for chess_move in pseudo {
        // Pseudo-legal moves never capture a king in a position reached by legal
        // play; if one does, `apply` refuses it and the move is simply dropped.
        let Ok(position_after) = apply(position, &chess_move) else {
            continue;
        };
        if is_in_check(&position_after, mover) {
            continue;
        }
        legal.push(GeneratedMove {
            chess_move,
            position_after,
        });
    }

    legal
}
