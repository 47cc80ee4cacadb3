//! Variant selector and starting arrays.
//!
//! Variants only change the starting layout. Move legality and terminal
//! classification are shared by all of them.

use strum::{Display, EnumIter, EnumString};

/// Standard chess starting position in Forsyth-Edwards Notation (FEN).
pub const STARTING_POSITION_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

const NO_CASTLING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w - - 0 1";

const PAWNS_ONLY_FEN: &str = "4k3/pppppppp/8/8/8/8/PPPPPPPP/4K3 w - - 0 1";

/// Named rule set a session is played under.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(serialize_all = "kebab-case")]
pub enum Variant {
    /// Orthodox chess.
    #[default]
    Standard,
    /// Standard array with every castling right removed.
    NoCastling,
    /// Kings and pawns only.
    PawnsOnly,
}

impl Variant {
    /// Starting position of this variant in FEN.
    pub const fn starting_fen(self) -> &'static str {
        match self {
            Variant::Standard => STARTING_POSITION_FEN,
            Variant::NoCastling => NO_CASTLING_FEN,
            Variant::PawnsOnly => PAWNS_ONLY_FEN,
        }
    }

    pub const fn description(self) -> &'static str {
        match self {
            Variant::Standard => "standard chess",
            Variant::NoCastling => "standard chess without castling",
            Variant::PawnsOnly => "kings and pawns only",
        }
    }
}
