//! Successor position construction.
//!
//! `apply` relocates the moving piece and handles captures, en passant,
//! castling rook relocation, promotion, rights, clocks and the turn flip. It
//! only rejects moves that do not fit the board structurally; legality is the
//! rules engine's gate. Special moves are recognised from the board, not from
//! the move's descriptive flags.

use crate::errors::{ChessError, ChessResult};
use crate::moves::chess_move::ChessMove;
use crate::position::chess_types::*;
use crate::position::position::Position;

const A1: Square = 0;
const E1: Square = 4;
const H1: Square = 7;
const A8: Square = 56;
const E8: Square = 60;
const H8: Square = 63;

pub fn apply(position: &Position, mv: &ChessMove) -> ChessResult<Position> {
    for square in [mv.from, mv.to] {
        if !is_on_board(square) {
            return Err(ChessError::InvalidSquare { square });
        }
    }

    let illegal = |reason: &str| ChessError::illegal_move(mv.to_string(), reason);

    if mv.from == mv.to {
        return Err(illegal("origin and destination are the same square"));
    }

    let mover = position.side_to_move();
    let moving = position
        .piece_on(mv.from)
        .ok_or_else(|| illegal("no piece on the origin square"))?;
    if moving.color != mover {
        return Err(illegal("origin piece does not belong to the side to move"));
    }

    let target = position.piece_on(mv.to);
    if let Some(target) = target {
        if target.color == mover {
            return Err(illegal("destination holds a piece of the same color"));
        }
        if target.kind == PieceKind::King {
            return Err(illegal("kings cannot be captured"));
        }
    }

    let reaches_last_rank =
        moving.kind == PieceKind::Pawn && square_rank(mv.to) == mover.promotion_rank();
    match (reaches_last_rank, mv.promotion) {
        (true, None) => return Err(illegal("pawn reaching the last rank must promote")),
        (true, Some(kind)) if !kind.is_promotion_target() => {
            return Err(illegal("invalid promotion piece"));
        }
        (false, Some(_)) => return Err(illegal("only a pawn reaching the last rank may promote")),
        _ => {}
    }

    let is_en_passant = moving.kind == PieceKind::Pawn
        && target.is_none()
        && square_file(mv.from) != square_file(mv.to)
        && position.en_passant_square() == Some(mv.to);

    let castling_rook = if moving.kind == PieceKind::King && mv.from.abs_diff(mv.to) == 2 {
        Some(castling_rook_squares(position, mover, mv.from, mv.to).ok_or_else(|| {
            illegal("king moves two squares but castling is not available")
        })?)
    } else {
        None
    };

    let mut next = position.clone();

    next.remove_piece(mv.from, moving);

    if is_en_passant {
        let captured_square = match mover {
            Color::White => mv.to - 8,
            Color::Black => mv.to + 8,
        };
        next.remove_piece(captured_square, Piece::new(mover.opposite(), PieceKind::Pawn));
    } else if let Some(captured) = target {
        next.remove_piece(mv.to, captured);
    }

    let placed_kind = mv.promotion.unwrap_or(moving.kind);
    next.put_piece(mv.to, Piece::new(mover, placed_kind));

    if let Some((rook_from, rook_to)) = castling_rook {
        let rook = Piece::new(mover, PieceKind::Rook);
        next.remove_piece(rook_from, rook);
        next.put_piece(rook_to, rook);
    }

    next.castling_rights &= !(rights_lost_at(mv.from) | rights_lost_at(mv.to));

    next.en_passant_square =
        if moving.kind == PieceKind::Pawn && mv.from.abs_diff(mv.to) == 16 {
            Some((mv.from + mv.to) / 2)
        } else {
            None
        };

    if moving.kind == PieceKind::Pawn || target.is_some() || is_en_passant {
        next.halfmove_clock = 0;
    } else {
        next.halfmove_clock = next.halfmove_clock.saturating_add(1);
    }
    if mover == Color::Black {
        next.fullmove_number = next.fullmove_number.saturating_add(1);
    }

    next.side_to_move = mover.opposite();
    next.recalc_occupancy();

    Ok(next)
}

/// Rook (origin, destination) for a castling king move, if the right, the rook
/// and an empty path between them are present.
fn castling_rook_squares(
    position: &Position,
    color: Color,
    king_from: Square,
    king_to: Square,
) -> Option<(Square, Square)> {
    let (right, rook_from, rook_to) = match (color, king_from, king_to) {
        (Color::White, E1, 6) => (CASTLE_WHITE_KINGSIDE, H1, 5),
        (Color::White, E1, 2) => (CASTLE_WHITE_QUEENSIDE, A1, 3),
        (Color::Black, E8, 62) => (CASTLE_BLACK_KINGSIDE, H8, 61),
        (Color::Black, E8, 58) => (CASTLE_BLACK_QUEENSIDE, A8, 59),
        _ => return None,
    };

    let rook_present = position.piece_on(rook_from) == Some(Piece::new(color, PieceKind::Rook));
    let (low, high) = (king_from.min(rook_from), king_from.max(rook_from));
    let between = (low + 1..high).fold(0u64, |mask, sq| mask | (1u64 << sq));
    let path_clear = position.occupancy_all() & between == 0;
    if position.has_castling_right(right) && rook_present && path_clear {
        Some((rook_from, rook_to))
    } else {
        None
    }
}

/// Castling rights that vanish once anything moves from or onto `square`.
fn rights_lost_at(square: Square) -> CastlingRights {
    match square {
        A1 => CASTLE_WHITE_QUEENSIDE,
        E1 => CASTLE_WHITE_KINGSIDE | CASTLE_WHITE_QUEENSIDE,
        H1 => CASTLE_WHITE_KINGSIDE,
        A8 => CASTLE_BLACK_QUEENSIDE,
        E8 => CASTLE_BLACK_KINGSIDE | CASTLE_BLACK_QUEENSIDE,
        H8 => CASTLE_BLACK_KINGSIDE,
        _ => 0,
    }
}
