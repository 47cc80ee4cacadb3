//! Long algebraic move text (`e2e4`, `e7e8q`).
//!
//! Decoding checks the grammar only. The position is consulted to fill in the
//! descriptive flags when the origin square is occupied; whether the move is
//! legal is left to the rules engine.

use crate::errors::{ChessError, ChessResult};
use crate::moves::chess_move::*;
use crate::position::chess_types::*;
use crate::position::position::Position;
use crate::wire::algebraic::parse_square_name;

/// Encode `mv` as origin name, destination name and an optional promotion letter.
#[inline]
pub fn encode_move(mv: &ChessMove) -> String {
    mv.to_string()
}

/// Decode the four- or five-character form into a move.
pub fn decode_move(text: &str, position: &Position) -> ChessResult<ChessMove> {
    if !text.is_ascii() {
        return Err(ChessError::malformed_move(text, "non-ASCII characters"));
    }
    if text.len() != 4 && text.len() != 5 {
        return Err(ChessError::malformed_move(
            text,
            format!("expected 4 or 5 characters, found {}", text.len()),
        ));
    }

    let from = parse_square_name(&text[0..2]).map_err(|x| ChessError::malformed_move(text, x))?;
    let to = parse_square_name(&text[2..4]).map_err(|x| ChessError::malformed_move(text, x))?;

    let promotion = match text.as_bytes().get(4) {
        None => None,
        Some(&letter) => Some(char_to_promotion(letter as char).ok_or_else(|| {
            ChessError::malformed_move(text, format!("invalid promotion letter {:?}", letter as char))
        })?),
    };

    Ok(ChessMove::with_flags(
        from,
        to,
        promotion,
        describe_move(position, from, to),
    ))
}

/// Descriptive flags for a move from `from` to `to`, as far as the board tells.
fn describe_move(position: &Position, from: Square, to: Square) -> MoveFlags {
    let Some(moving) = position.piece_on(from) else {
        return 0;
    };

    let mut flags = 0;
    if position
        .piece_on(to)
        .is_some_and(|target| target.color != moving.color)
    {
        flags |= FLAG_CAPTURE;
    }

    match moving.kind {
        PieceKind::Pawn => {
            if from.abs_diff(to) == 16 {
                flags |= FLAG_DOUBLE_PAWN_PUSH;
            }
            if position.en_passant_square() == Some(to)
                && square_file(from) != square_file(to)
                && position.piece_on(to).is_none()
            {
                flags |= FLAG_CAPTURE | FLAG_EN_PASSANT;
            }
        }
        PieceKind::King if square_rank(from) == square_rank(to) && from.abs_diff(to) == 2 => {
            flags |= FLAG_CASTLING;
        }
        _ => {}
    }

    flags
}

fn char_to_promotion(ch: char) -> Option<PieceKind> {
    match ch {
        'n' => Some(PieceKind::Knight),
        'b' => Some(PieceKind::Bishop),
        'r' => Some(PieceKind::Rook),
        'q' => Some(PieceKind::Queen),
        _ => None,
    }
}
