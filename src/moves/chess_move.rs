//! Move value type.
//!
//! A move is identified by origin, destination and optional promotion kind.
//! The flag bits are derived at generation time and are descriptive only: two
//! moves with the same squares and promotion compare equal whatever their flags.

use std::fmt;
use std::hash::{Hash, Hasher};

use crate::position::chess_types::{PieceKind, Square};
use crate::wire::algebraic::square_name;

pub type MoveFlags = u8;

pub const FLAG_CAPTURE: MoveFlags = 1 << 0;
pub const FLAG_DOUBLE_PAWN_PUSH: MoveFlags = 1 << 1;
pub const FLAG_EN_PASSANT: MoveFlags = 1 << 2;
pub const FLAG_CASTLING: MoveFlags = 1 << 3;

#[derive(Debug, Clone, Copy)]
pub struct ChessMove {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<PieceKind>,
    pub flags: MoveFlags,
}

impl ChessMove {
    /// A move with no descriptive flags, as decoded from the wire.
    #[inline]
    pub const fn new(from: Square, to: Square, promotion: Option<PieceKind>) -> Self {
        Self {
            from,
            to,
            promotion,
            flags: 0,
        }
    }

    #[inline]
    pub(crate) const fn with_flags(
        from: Square,
        to: Square,
        promotion: Option<PieceKind>,
        flags: MoveFlags,
    ) -> Self {
        Self {
            from,
            to,
            promotion,
            flags,
        }
    }

    #[inline]
    pub fn is_capture(&self) -> bool {
        self.flags & FLAG_CAPTURE != 0
    }

    #[inline]
    pub fn is_en_passant(&self) -> bool {
        self.flags & FLAG_EN_PASSANT != 0
    }

    #[inline]
    pub fn is_castling(&self) -> bool {
        self.flags & FLAG_CASTLING != 0
    }

    #[inline]
    pub fn is_double_pawn_push(&self) -> bool {
        self.flags & FLAG_DOUBLE_PAWN_PUSH != 0
    }

    #[inline]
    pub fn is_promotion(&self) -> bool {
        self.promotion.is_some()
    }
}

impl PartialEq for ChessMove {
    fn eq(&self, other: &Self) -> bool {
        self.from == other.from && self.to == other.to && self.promotion == other.promotion
    }
}

impl Eq for ChessMove {}

impl Hash for ChessMove {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.from.hash(state);
        self.to.hash(state);
        self.promotion.hash(state);
    }
}

/// Long algebraic form, e.g. `e2e4` or `e7e8q`.
impl fmt::Display for ChessMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&square_name(self.from))?;
        f.write_str(&square_name(self.to))?;
        if let Some(kind) = self.promotion {
            write!(f, "{}", kind.letter())?;
        }
        Ok(())
    }
}
