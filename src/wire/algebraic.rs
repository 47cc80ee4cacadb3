//! Square name conversions (`a1` .. `h8`).

use crate::errors::{ChessError, ChessResult};
use crate::position::chess_types::{is_on_board, make_square, square_file, square_rank, Square};

/// Parse a square name such as `e4`. The error string names the offending part.
pub fn parse_square_name(name: &str) -> Result<Square, String> {
    let bytes = name.as_bytes();
    if bytes.len() != 2 {
        return Err(format!("square name {name:?} must be two characters"));
    }

    let file = bytes[0];
    let rank = bytes[1];

    if !(b'a'..=b'h').contains(&file) {
        return Err(format!("invalid file {:?}", file as char));
    }
    if !(b'1'..=b'8').contains(&rank) {
        return Err(format!("invalid rank {:?}", rank as char));
    }

    Ok(make_square(file - b'a', rank - b'1'))
}

/// Name of an on-board square. Callers must hold a square in `0..=63`.
pub fn square_name(square: Square) -> String {
    let file = char::from(b'a' + square_file(square));
    let rank = char::from(b'1' + square_rank(square));
    format!("{file}{rank}")
}

/// Checked variant of [`square_name`].
pub fn square_to_algebraic(square: Square) -> ChessResult<String> {
    if !is_on_board(square) {
        return Err(ChessError::InvalidSquare { square });
    }
    Ok(square_name(square))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corner_squares() {
        assert_eq!(parse_square_name("a1"), Ok(0));
        assert_eq!(parse_square_name("h8"), Ok(63));
        assert_eq!(square_name(0), "a1");
        assert_eq!(square_name(63), "h8");
        assert_eq!(square_to_algebraic(28).as_deref(), Ok("e4"));
    }

    #[test]
    fn rejects_out_of_grammar_names() {
        assert!(parse_square_name("i1").is_err());
        assert!(parse_square_name("a9").is_err());
        assert!(parse_square_name("A1").is_err());
        assert!(parse_square_name("a10").is_err());
        assert!(parse_square_name("").is_err());
        assert_eq!(
            square_to_algebraic(64),
            Err(ChessError::InvalidSquare { square: 64 })
        );
    }
}
