use crate::position::chess_types::*;
use crate::position::position::Position;
use crate::moves::attack_tables::{
    bishop_attacks, king_attacks, knight_attacks, pawn_attacks, rook_attacks,
};

/// True if `color`'s king is attacked by any opposing piece.
///
/// This is a raw reachability test: pins on the attacking side are ignored.
/// A side without a king is never in check.
#[inline]
pub fn is_in_check(position: &Position, color: Color) -> bool {
    let Some(king_sq) = position.king_square(color) else {
        return false;
    };
    is_square_attacked(position, king_sq, color.opposite())
}

/// True if any piece of `attacker_color` attacks `square`.
pub fn is_square_attacked(position: &Position, square: Square, attacker_color: Color) -> bool {
    let occupancy = position.occupancy_all();
    let attacker = |kind| position.bitboard(attacker_color, kind);

    // A pawn of the attacking color on X attacks `square` exactly when a pawn of
    // the defending color on `square` would attack X.
    if pawn_attacks(attacker_color.opposite(), square) & attacker(PieceKind::Pawn) != 0 {
        return true;
    }
    if knight_attacks(square) & attacker(PieceKind::Knight) != 0 {
        return true;
    }
    if king_attacks(square) & attacker(PieceKind::King) != 0 {
        return true;
    }

    let queens = attacker(PieceKind::Queen);
    if bishop_attacks(square, occupancy) & (attacker(PieceKind::Bishop) | queens) != 0 {
        return true;
    }
    rook_attacks(square, occupancy) & (attacker(PieceKind::Rook) | queens) != 0
}

/// Every (square, kind) of `attacker_color` that attacks `square`.
pub fn attackers_to_square(
    position: &Position,
    square: Square,
    attacker_color: Color,
) -> Vec<(Square, PieceKind)> {
    let occupancy = position.occupancy_all();
    let target_mask = 1u64 << square;
    let mut attackers = Vec::new();

    for kind in PieceKind::ALL {
        let mut pieces = position.bitboard(attacker_color, kind);
        while pieces != 0 {
            let from = pieces.trailing_zeros() as Square;
            let attacks = match kind {
                PieceKind::Pawn => pawn_attacks(attacker_color, from),
                PieceKind::Knight => knight_attacks(from),
                PieceKind::Bishop => bishop_attacks(from, occupancy),
                PieceKind::Rook => rook_attacks(from, occupancy),
                PieceKind::Queen => bishop_attacks(from, occupancy) | rook_attacks(from, occupancy),
                PieceKind::King => king_attacks(from),
            };
            if attacks & target_mask != 0 {
                attackers.push((from, kind));
            }
            pieces &= pieces - 1;
        }
    }

    attackers
}
