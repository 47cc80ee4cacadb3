//! Knight, bishop, rook and queen moves.
//!
//! These pieces move exactly onto the squares they attack, minus squares held
//! by their own side, so one routine covers all four.

use crate::moves::attack_tables::{bishop_attacks, knight_attacks, queen_attacks, rook_attacks};
use crate::moves::chess_move::{ChessMove, FLAG_CAPTURE};
use crate::position::chess_types::{PieceKind, Square};
use crate::position::position::Position;

pub fn generate_piece_moves(
    position: &Position,
    from: Square,
    kind: PieceKind,
    out: &mut Vec<ChessMove>,
) {
    let side = position.side_to_move();
    let occupancy = position.occupancy_all();
    let enemy_occ = position.occupancy(side.opposite());

    let attacks = match kind {
        PieceKind::Knight => knight_attacks(from),
        PieceKind::Bishop => bishop_attacks(from, occupancy),
        PieceKind::Rook => rook_attacks(from, occupancy),
        PieceKind::Queen => queen_attacks(from, occupancy),
        PieceKind::Pawn | PieceKind::King => return,
    };

    let mut targets = attacks & !position.occupancy(side);
    while targets != 0 {
        let to = targets.trailing_zeros() as Square;
        let flags = if (1u64 << to) & enemy_occ != 0 {
            FLAG_CAPTURE
        } else {
            0
        };
        out.push(ChessMove::with_flags(from, to, None, flags));
        targets &= targets - 1;
    }
}
