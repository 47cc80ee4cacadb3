//! Attack bitboards for every piece kind.
//!
//! Leaper (knight, king, pawn) attacks are precomputed per square at compile
//! time. Slider attacks walk each ray until the first occupied square, which is
//! included so captures fall out of the same mask.

use crate::position::chess_types::{Color, Square};

const KNIGHT_STEPS: [(i32, i32); 8] = [
    (1, 2),
    (2, 1),
    (2, -1),
    (1, -2),
    (-1, -2),
    (-2, -1),
    (-2, 1),
    (-1, 2),
];

const KING_STEPS: [(i32, i32); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

const WHITE_PAWN_STEPS: [(i32, i32); 2] = [(-1, 1), (1, 1)];
const BLACK_PAWN_STEPS: [(i32, i32); 2] = [(-1, -1), (1, -1)];

pub const DIAGONAL_DIRECTIONS: [(i32, i32); 4] = [(1, 1), (-1, 1), (1, -1), (-1, -1)];
pub const ORTHOGONAL_DIRECTIONS: [(i32, i32); 4] = [(0, 1), (0, -1), (1, 0), (-1, 0)];

pub const KNIGHT_ATTACKS: [u64; 64] = leaper_table(&KNIGHT_STEPS);
pub const KING_ATTACKS: [u64; 64] = leaper_table(&KING_STEPS);
pub const WHITE_PAWN_ATTACKS: [u64; 64] = leaper_table(&WHITE_PAWN_STEPS);
pub const BLACK_PAWN_ATTACKS: [u64; 64] = leaper_table(&BLACK_PAWN_STEPS);

#[inline]
pub const fn knight_attacks(square: Square) -> u64 {
    KNIGHT_ATTACKS[square as usize]
}

#[inline]
pub const fn king_attacks(square: Square) -> u64 {
    KING_ATTACKS[square as usize]
}

/// Squares a pawn of `color` on `square` attacks (captures onto).
#[inline]
pub const fn pawn_attacks(color: Color, square: Square) -> u64 {
    match color {
        Color::White => WHITE_PAWN_ATTACKS[square as usize],
        Color::Black => BLACK_PAWN_ATTACKS[square as usize],
    }
}

#[inline]
pub fn bishop_attacks(square: Square, occupancy: u64) -> u64 {
    sliding_attacks(square, occupancy, &DIAGONAL_DIRECTIONS)
}

#[inline]
pub fn rook_attacks(square: Square, occupancy: u64) -> u64 {
    sliding_attacks(square, occupancy, &ORTHOGONAL_DIRECTIONS)
}

#[inline]
pub fn queen_attacks(square: Square, occupancy: u64) -> u64 {
    bishop_attacks(square, occupancy) | rook_attacks(square, occupancy)
}

/// Union of rays from `square`, each stopping at (and including) the first blocker.
pub fn sliding_attacks(square: Square, occupancy: u64, directions: &[(i32, i32)]) -> u64 {
    let start_file = i32::from(square % 8);
    let start_rank = i32::from(square / 8);
    let mut attacks = 0u64;

    for &(file_step, rank_step) in directions {
        let mut file = start_file + file_step;
        let mut rank = start_rank + rank_step;

        while (0..8).contains(&file) && (0..8).contains(&rank) {
            let bit = 1u64 << (rank * 8 + file);
            attacks |= bit;
            if occupancy & bit != 0 {
                break;
            }
            file += file_step;
            rank += rank_step;
        }
    }

    attacks
}

const fn leaper_table(steps: &[(i32, i32)]) -> [u64; 64] {
    let mut table = [0u64; 64];
    let mut sq = 0usize;

    while sq < 64 {
        let file = (sq % 8) as i32;
        let rank = (sq / 8) as i32;
        let mut attacks = 0u64;
        let mut i = 0usize;

        while i < steps.len() {
            let to_file = file + steps[i].0;
            let to_rank = rank + steps[i].1;
            if to_file >= 0 && to_file < 8 && to_rank >= 0 && to_rank < 8 {
                attacks |= 1u64 << (to_rank * 8 + to_file);
            }
            i += 1;
        }

        table[sq] = attacks;
        sq += 1;
    }

    table
}
