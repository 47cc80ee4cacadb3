//! Immutable board position.
//!
//! `Position` stores piece bitboards, occupancy caches, side/castling/en-passant
//! state and the move clocks. Values are never mutated after construction;
//! `apply` in the sibling module produces the successor.

use crate::errors::{ChessError, ChessResult};
use crate::position::chess_types::*;
use crate::position::variants::Variant;
use crate::wire::fen_generator::generate_fen;
use crate::wire::fen_parser::parse_fen;

/// One game position.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Position {
    // [color][piece_kind]
    pub(crate) pieces: [[u64; 6]; 2],

    pub(crate) occupancy_by_color: [u64; 2],
    pub(crate) occupancy_all: u64,

    pub(crate) side_to_move: Color,
    pub(crate) castling_rights: CastlingRights,
    pub(crate) en_passant_square: Option<Square>,

    pub(crate) halfmove_clock: u16,
    pub(crate) fullmove_number: u16,
}

impl Default for Position {
    fn default() -> Self {
        Self {
            pieces: [[0; 6]; 2],
            occupancy_by_color: [0; 2],
            occupancy_all: 0,
            side_to_move: Color::White,
            castling_rights: 0,
            en_passant_square: None,
            halfmove_clock: 0,
            fullmove_number: 1,
        }
    }
}

/// The repetition-relevant part of a position: placement, side to move,
/// castling rights and en-passant target. Clocks are excluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PositionKey {
    pieces: [[u64; 6]; 2],
    side_to_move: Color,
    castling_rights: CastlingRights,
    en_passant_square: Option<Square>,
}

impl Position {
    /// Empty board, white to move, no rights.
    #[inline]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Starting position of `variant`.
    pub fn initial(variant: Variant) -> Self {
        parse_fen(variant.starting_fen()).expect("built-in starting FEN should always parse")
    }

    #[inline]
    pub fn from_fen(fen: &str) -> ChessResult<Self> {
        parse_fen(fen)
    }

    #[inline]
    pub fn to_fen(&self) -> String {
        generate_fen(self)
    }

    #[inline]
    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    #[inline]
    pub fn castling_rights(&self) -> CastlingRights {
        self.castling_rights
    }

    #[inline]
    pub fn has_castling_right(&self, right: CastlingRights) -> bool {
        self.castling_rights & right != 0
    }

    #[inline]
    pub fn en_passant_square(&self) -> Option<Square> {
        self.en_passant_square
    }

    #[inline]
    pub fn halfmove_clock(&self) -> u16 {
        self.halfmove_clock
    }

    #[inline]
    pub fn fullmove_number(&self) -> u16 {
        self.fullmove_number
    }

    /// Bitboard of `color`'s pieces of `kind`.
    #[inline]
    pub fn bitboard(&self, color: Color, kind: PieceKind) -> u64 {
        self.pieces[color.index()][kind.index()]
    }

    #[inline]
    pub fn occupancy(&self, color: Color) -> u64 {
        self.occupancy_by_color[color.index()]
    }

    #[inline]
    pub fn occupancy_all(&self) -> u64 {
        self.occupancy_all
    }

    /// Piece standing on `square`, if any.
    pub fn piece_at(&self, square: Square) -> ChessResult<Option<Piece>> {
        if !is_on_board(square) {
            return Err(ChessError::InvalidSquare { square });
        }
        Ok(self.piece_on(square))
    }

    /// Unchecked lookup for callers that already hold an on-board square.
    pub(crate) fn piece_on(&self, square: Square) -> Option<Piece> {
        let mask = 1u64 << square;
        if self.occupancy_all & mask == 0 {
            return None;
        }
        for color in Color::ALL {
            if self.occupancy_by_color[color.index()] & mask == 0 {
                continue;
            }
            for kind in PieceKind::ALL {
                if self.pieces[color.index()][kind.index()] & mask != 0 {
                    return Some(Piece::new(color, kind));
                }
            }
        }
        None
    }

    /// Square of `color`'s king, if one is on the board.
    #[inline]
    pub fn king_square(&self, color: Color) -> Option<Square> {
        let kings = self.bitboard(color, PieceKind::King);
        if kings == 0 {
            None
        } else {
            Some(kings.trailing_zeros() as Square)
        }
    }

    pub fn key(&self) -> PositionKey {
        PositionKey {
            pieces: self.pieces,
            side_to_move: self.side_to_move,
            castling_rights: self.castling_rights,
            en_passant_square: self.en_passant_square,
        }
    }

    pub(crate) fn put_piece(&mut self, square: Square, piece: Piece) {
        self.pieces[piece.color.index()][piece.kind.index()] |= 1u64 << square;
    }

    pub(crate) fn remove_piece(&mut self, square: Square, piece: Piece) {
        self.pieces[piece.color.index()][piece.kind.index()] &= !(1u64 << square);
    }

    pub(crate) fn recalc_occupancy(&mut self) {
        for color in Color::ALL {
            self.occupancy_by_color[color.index()] = self.pieces[color.index()]
                .iter()
                .copied()
                .fold(0u64, |acc, bb| acc | bb);
        }
        self.occupancy_all = self.occupancy_by_color[Color::White.index()]
            | self.occupancy_by_color[Color::Black.index()];
    }
}

#[cfg(test)]
mod tests {
    use super::Position;
    use crate::position::chess_types::*;
    use crate::position::variants::{Variant, STARTING_POSITION_FEN};

    #[test]
    fn standard_initial_position_matches_start_fen() {
        let game = Position::initial(Variant::Standard);
        assert_eq!(game.to_fen(), STARTING_POSITION_FEN);
        assert_eq!(game.side_to_move(), Color::White);
        assert_eq!(game.castling_rights(), CASTLE_ALL);
        assert_eq!(game.occupancy_all().count_ones(), 32);
    }

    #[test]
    fn every_variant_has_one_king_per_color() {
        for variant in [Variant::Standard, Variant::NoCastling, Variant::PawnsOnly] {
            let game = Position::initial(variant);
            for color in Color::ALL {
                assert_eq!(game.bitboard(color, PieceKind::King).count_ones(), 1);
            }
        }
        assert_eq!(Position::initial(Variant::NoCastling).castling_rights(), 0);
    }

    #[test]
    fn piece_at_rejects_off_board_squares() {
        let game = Position::initial(Variant::Standard);
        assert_eq!(
            game.piece_at(4).expect("e1 is on the board"),
            Some(Piece::new(Color::White, PieceKind::King))
        );
        assert_eq!(game.piece_at(28).expect("e4 is on the board"), None);
        assert!(game.piece_at(64).is_err());
    }
}
