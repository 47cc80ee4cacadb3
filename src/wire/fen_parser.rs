//! FEN-to-Position decoder.
//!
//! Builds a fully-populated position from the six-field text form, including
//! piece bitboards, rights, clocks and occupancies.

use crate::errors::{ChessError, ChessResult};
use crate::position::chess_types::*;
use crate::position::position::Position;
use crate::wire::algebraic::parse_square_name;

pub fn parse_fen(fen: &str) -> ChessResult<Position> {
    let fields: Vec<&str> = fen.split_whitespace().collect();
    if fields.len() != 6 {
        return Err(ChessError::malformed_state(
            fen,
            format!("expected 6 fields, found {}", fields.len()),
        ));
    }

    let fail = |reason: String| ChessError::malformed_state(fen, reason);

    let mut position = Position::empty();

    parse_board(fields[0], &mut position).map_err(fail)?;
    position.side_to_move = parse_side_to_move(fields[1]).map_err(fail)?;
    position.castling_rights = parse_castling_rights(fields[2]).map_err(fail)?;
    position.en_passant_square =
        parse_en_passant_square(fields[3], position.side_to_move).map_err(fail)?;
    position.halfmove_clock = fields[4]
        .parse::<u16>()
        .map_err(|_| fail(format!("invalid halfmove clock {:?}", fields[4])))?;
    position.fullmove_number = fields[5]
        .parse::<u16>()
        .map_err(|_| fail(format!("invalid fullmove number {:?}", fields[5])))?;

    position.recalc_occupancy();

    for color in Color::ALL {
        if position.bitboard(color, PieceKind::King).count_ones() > 1 {
            return Err(fail(format!("more than one {color} king")));
        }
    }

    Ok(position)
}

fn parse_board(board_part: &str, position: &mut Position) -> Result<(), String> {
    let ranks: Vec<&str> = board_part.split('/').collect();
    if ranks.len() != 8 {
        return Err(format!("placement has {} ranks, expected 8", ranks.len()));
    }

    for (fen_rank_idx, rank_str) in ranks.iter().enumerate() {
        let board_rank = 7 - fen_rank_idx as u8;
        let mut file = 0u8;

        for ch in rank_str.chars() {
            if let Some(empty_count) = ch.to_digit(10) {
                if !(1..=8).contains(&empty_count) {
                    return Err(format!("invalid empty-square count {ch:?}"));
                }
                file += empty_count as u8;
                if file > 8 {
                    return Err(format!("rank {} has more than 8 files", board_rank + 1));
                }
                continue;
            }

            let piece = Piece::from_fen_char(ch)
                .ok_or_else(|| format!("invalid piece character {ch:?}"))?;

            if file >= 8 {
                return Err(format!("rank {} has more than 8 files", board_rank + 1));
            }

            position.put_piece(make_square(file, board_rank), piece);
            file += 1;
        }

        if file != 8 {
            return Err(format!("rank {} does not sum to 8 files", board_rank + 1));
        }
    }

    Ok(())
}

fn parse_side_to_move(side_part: &str) -> Result<Color, String> {
    match side_part {
        "w" => Ok(Color::White),
        "b" => Ok(Color::Black),
        _ => Err(format!("invalid side to move {side_part:?}")),
    }
}

fn parse_castling_rights(castling_part: &str) -> Result<CastlingRights, String> {
    if castling_part == "-" {
        return Ok(0);
    }

    let mut rights: CastlingRights = 0;
    for ch in castling_part.chars() {
        let right = match ch {
            'K' => CASTLE_WHITE_KINGSIDE,
            'Q' => CASTLE_WHITE_QUEENSIDE,
            'k' => CASTLE_BLACK_KINGSIDE,
            'q' => CASTLE_BLACK_QUEENSIDE,
            _ => return Err(format!("invalid castling character {ch:?}")),
        };
        if rights & right != 0 {
            return Err(format!("duplicate castling character {ch:?}"));
        }
        rights |= right;
    }

    Ok(rights)
}

fn parse_en_passant_square(
    en_passant_part: &str,
    side_to_move: Color,
) -> Result<Option<Square>, String> {
    if en_passant_part == "-" {
        return Ok(None);
    }

    let square = parse_square_name(en_passant_part)?;
    // The target sits behind a pawn the side to move could capture.
    let expected_rank = match side_to_move {
        Color::White => 5,
        Color::Black => 2,
    };
    if square_rank(square) != expected_rank {
        return Err(format!(
            "en-passant target {en_passant_part} does not fit {side_to_move} to move"
        ));
    }
    Ok(Some(square))
}
