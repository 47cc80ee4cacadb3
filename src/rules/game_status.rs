//! Terminal-state classification.
//!
//! `classify` looks at one position only. Fivefold repetition needs the game
//! history and is layered on top by [`classify_with_history`].

use derive_more::Display;

use crate::position::chess_types::*;
use crate::position::position::{Position, PositionKey};
use crate::rules::legal_move_checks::is_in_check;
use crate::rules::legal_move_generator::has_legal_move;

/// Halfmove clock value at which the seventy-five-move rule ends the game.
pub const SEVENTY_FIVE_MOVE_PLIES: u16 = 150;

/// Occurrences of one position that end the game by repetition.
pub const FIVEFOLD: usize = 5;

const LIGHT_SQUARES: u64 = 0x55AA_55AA_55AA_55AA;
const DARK_SQUARES: u64 = !LIGHT_SQUARES;

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DrawReason {
    #[display("insufficient material")]
    InsufficientMaterial,
    #[display("the seventy-five-move rule")]
    SeventyFiveMoveRule,
    #[display("fivefold repetition")]
    FivefoldRepetition,
}

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameStatus {
    #[display("in progress")]
    InProgress,
    #[display("checkmate, {winner} wins")]
    Checkmate { winner: Color },
    #[display("stalemate")]
    Stalemate,
    #[display("draw by {_0}")]
    Draw(DrawReason),
}

impl GameStatus {
    #[inline]
    pub fn is_terminal(self) -> bool {
        self != GameStatus::InProgress
    }
}

/// Classify `position` for the side to move.
pub fn classify(position: &Position) -> GameStatus {
    let mover = position.side_to_move();

    if !has_legal_move(position) {
        return if is_in_check(position, mover) {
            GameStatus::Checkmate {
                winner: mover.opposite(),
            }
        } else {
            GameStatus::Stalemate
        };
    }

    if is_insufficient_material(position) {
        return GameStatus::Draw(DrawReason::InsufficientMaterial);
    }

    if position.halfmove_clock() >= SEVENTY_FIVE_MOVE_PLIES {
        return GameStatus::Draw(DrawReason::SeventyFiveMoveRule);
    }

    GameStatus::InProgress
}

/// [`classify`], then fivefold repetition against `history`.
///
/// `history` holds the key of every position reached so far, the current one included.
pub fn classify_with_history(position: &Position, history: &[PositionKey]) -> GameStatus {
    match classify(position) {
        GameStatus::InProgress if repetition_count(history, &position.key()) >= FIVEFOLD => {
            GameStatus::Draw(DrawReason::FivefoldRepetition)
        }
        status => status,
    }
}

pub fn repetition_count(history: &[PositionKey], key: &PositionKey) -> usize {
    history.iter().filter(|seen| *seen == key).count()
}

/// Neither side can ever deliver mate: bare kings, a single minor piece, or
/// bishops that all stand on one square color.
pub fn is_insufficient_material(position: &Position) -> bool {
    let heavy_or_pawn = Color::ALL.into_iter().any(|color| {
        position.bitboard(color, PieceKind::Pawn)
            | position.bitboard(color, PieceKind::Rook)
            | position.bitboard(color, PieceKind::Queen)
            != 0
    });
    if heavy_or_pawn {
        return false;
    }

    let knights = position.bitboard(Color::White, PieceKind::Knight)
        | position.bitboard(Color::Black, PieceKind::Knight);
    let bishops = position.bitboard(Color::White, PieceKind::Bishop)
        | position.bitboard(Color::Black, PieceKind::Bishop);

    if (knights | bishops).count_ones() <= 1 {
        return true;
    }

    knights == 0 && (bishops & LIGHT_SQUARES == 0 || bishops & DARK_SQUARES == 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::apply::apply;
    use crate::position::variants::Variant;
    use crate::rules::legal_move_generator::all_legal_moves;
    use crate::wire::long_algebraic::decode_move;

    fn status(fen: &str) -> GameStatus {
        classify(&Position::from_fen(fen).expect("FEN should parse"))
    }

    #[test]
    fn fools_mate_is_checkmate() {
        let mut position = Position::initial(Variant::Standard);
        for text in ["f2f3", "e7e5", "g2g4", "d8h4"] {
            let mv = decode_move(text, &position).expect("move should parse");
            position = apply(&position, &mv).expect("move should apply");
        }

        assert!(is_in_check(&position, Color::White));
        assert!(all_legal_moves(&position).is_empty());
        assert_eq!(
            classify(&position),
            GameStatus::Checkmate {
                winner: Color::Black
            }
        );
        assert_eq!(classify(&position).to_string(), "checkmate, Black wins");
    }

    #[test]
    fn cornered_king_is_stalemate_not_mate() {
        assert_eq!(status("8/8/8/8/8/1q6/2k5/K7 w - - 0 1"), GameStatus::Stalemate);
    }

    #[test]
    fn material_draws() {
        let draws = [
            "8/8/8/4k3/8/8/8/4K3 w - - 0 1",
            "8/8/8/4k3/8/8/8/4KN2 w - - 0 1",
            "8/8/8/4k3/8/8/8/4KB2 b - - 0 1",
            // Both bishops on dark squares (c1 and f8 are dark).
            "5b2/8/8/4k3/8/8/8/2B1K3 w - - 0 1",
        ];
        for fen in draws {
            assert_eq!(
                status(fen),
                GameStatus::Draw(DrawReason::InsufficientMaterial),
                "{fen}"
            );
        }

        let playable = [
            "8/8/8/4k3/8/8/4P3/4K3 w - - 0 1",
            "8/8/8/4k3/8/8/8/3NKN2 w - - 0 1",
            "8/8/8/4k3/8/8/8/2B1KB2 w - - 0 1",
            "8/8/8/4k3/8/8/8/4KR2 w - - 0 1",
            "4n3/8/8/4k3/8/8/8/4KB2 w - - 0 1",
        ];
        for fen in playable {
            assert_eq!(status(fen), GameStatus::InProgress, "{fen}");
        }
    }

    #[test]
    fn seventy_five_move_rule_after_mate_check() {
        assert_eq!(
            status("8/8/8/4k3/8/8/4P3/4K3 w - - 150 120"),
            GameStatus::Draw(DrawReason::SeventyFiveMoveRule)
        );
        assert_eq!(
            status("8/8/8/4k3/8/8/4P3/4K3 w - - 149 120"),
            GameStatus::InProgress
        );
    }

    #[test]
    fn fivefold_repetition_needs_five_occurrences() {
        let position = Position::initial(Variant::Standard);
        let key = position.key();

        let history = vec![key; 4];
        assert_eq!(classify_with_history(&position, &history), GameStatus::InProgress);

        let history = vec![key; 5];
        assert_eq!(
            classify_with_history(&position, &history),
            GameStatus::Draw(DrawReason::FivefoldRepetition)
        );
    }
}
