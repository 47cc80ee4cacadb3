use crate::moves::attack_tables::king_attacks;
use crate::moves::chess_move::*;
use crate::position::chess_types::*;
use crate::position::position::Position;
use crate::rules::legal_move_checks::is_square_attacked;

/// One castling option: the right it needs, king path and the squares that must be empty.
struct CastlingLane {
    color: Color,
    right: CastlingRights,
    king_from: Square,
    king_to: Square,
    transit: Square,
    must_be_empty: u64,
}

const CASTLING_LANES: [CastlingLane; 4] = [
    CastlingLane {
        color: Color::White,
        right: CASTLE_WHITE_KINGSIDE,
        king_from: 4,
        king_to: 6,
        transit: 5,
        must_be_empty: (1 << 5) | (1 << 6),
    },
    CastlingLane {
        color: Color::White,
        right: CASTLE_WHITE_QUEENSIDE,
        king_from: 4,
        king_to: 2,
        transit: 3,
        must_be_empty: (1 << 1) | (1 << 2) | (1 << 3),
    },
    CastlingLane {
        color: Color::Black,
        right: CASTLE_BLACK_KINGSIDE,
        king_from: 60,
        king_to: 62,
        transit: 61,
        must_be_empty: (1 << 61) | (1 << 62),
    },
    CastlingLane {
        color: Color::Black,
        right: CASTLE_BLACK_QUEENSIDE,
        king_from: 60,
        king_to: 58,
        transit: 59,
        must_be_empty: (1 << 57) | (1 << 58) | (1 << 59),
    },
];

/// Pseudo-legal king steps from `from`, plus castling for the side to move.
pub fn generate_king_moves(position: &Position, from: Square, out: &mut Vec<ChessMove>) {
    let side = position.side_to_move();
    let enemy_occ = position.occupancy(side.opposite());

    let mut targets = king_attacks(from) & !position.occupancy(side);
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

    generate_castling_moves(position, from, out);
}

fn generate_castling_moves(position: &Position, king_from: Square, out: &mut Vec<ChessMove>) {
    let side = position.side_to_move();
    let enemy = side.opposite();
    let rook = Some(Piece::new(side, PieceKind::Rook));

    for lane in CASTLING_LANES.iter().filter(|lane| lane.color == side) {
        if lane.king_from != king_from || !position.has_castling_right(lane.right) {
            continue;
        }
        let rook_square = if lane.king_to > lane.king_from {
            lane.king_from + 3
        } else {
            lane.king_from - 4
        };
        if position.piece_on(rook_square) != rook {
            continue;
        }
        if position.occupancy_all() & lane.must_be_empty != 0 {
            continue;
        }
        // Start, transit and end squares must all be safe.
        let unsafe_path = [lane.king_from, lane.transit, lane.king_to]
            .into_iter()
            .any(|sq| is_square_attacked(position, sq, enemy));
        if unsafe_path {
            continue;
        }
        out.push(ChessMove::with_flags(
            lane.king_from,
            lane.king_to,
            None,
            FLAG_CASTLING,
        ));
    }
}
