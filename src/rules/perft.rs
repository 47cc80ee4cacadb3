//! Move-path enumeration for validating generation.
//!
//! Reference counts come from https://www.chessprogramming.org/Perft_Results

use std::thread;

use crate::position::position::Position;
use crate::rules::legal_move_checks::{attackers_to_square, is_in_check};
use crate::rules::legal_move_generator::{generate_legal_moves, has_legal_move, GeneratedMove};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PerftCounts {
    pub nodes: usize,
    pub captures: usize,
    pub en_passant: usize,
    pub castles: usize,
    pub promotions: usize,
    pub checks: usize,
    pub double_checks: usize,
    pub checkmates: usize,
}

impl PerftCounts {
    fn merge(&mut self, rhs: PerftCounts) {
        self.nodes += rhs.nodes;
        self.captures += rhs.captures;
        self.en_passant += rhs.en_passant;
        self.castles += rhs.castles;
        self.promotions += rhs.promotions;
        self.checks += rhs.checks;
        self.double_checks += rhs.double_checks;
        self.checkmates += rhs.checkmates;
    }

    fn record_leaf(&mut self, generated: &GeneratedMove) {
        let mv = &generated.chess_move;
        self.nodes += 1;
        if mv.is_capture() {
            self.captures += 1;
        }
        if mv.is_en_passant() {
            self.en_passant += 1;
        }
        if mv.is_castling() {
            self.castles += 1;
        }
        if mv.is_promotion() {
            self.promotions += 1;
        }

        let after = &generated.position_after;
        let defender = after.side_to_move();
        if !is_in_check(after, defender) {
            return;
        }
        self.checks += 1;
        if let Some(king) = after.king_square(defender) {
            if attackers_to_square(after, king, defender.opposite()).len() > 1 {
                self.double_checks += 1;
            }
        }
        if !has_legal_move(after) {
            self.checkmates += 1;
        }
    }
}

pub fn perft(position: &Position, depth: u8) -> PerftCounts {
    if depth == 0 {
        return PerftCounts {
            nodes: 1,
            ..PerftCounts::default()
        };
    }

    let mut total = PerftCounts::default();
    for generated in generate_legal_moves(position) {
        perft_recurse(&generated, depth, 1, &mut total);
    }
    total
}

/// Same counts as [`perft`], with one scoped worker thread per root move.
pub fn perft_parallel(position: &Position, depth: u8) -> PerftCounts {
    if depth <= 1 {
        return perft(position, depth);
    }

    let root_moves = generate_legal_moves(position);
    let mut total = PerftCounts::default();

    thread::scope(|scope| {
        let handles: Vec<_> = root_moves
            .iter()
            .map(|generated| {
                scope.spawn(move || {
                    let mut local = PerftCounts::default();
                    perft_recurse(generated, depth, 1, &mut local);
                    local
                })
            })
            .collect();

        for handle in handles {
            match handle.join() {
                Ok(local) => total.merge(local),
                Err(panic) => std::panic::resume_unwind(panic),
            }
        }
    });

    total
}

fn perft_recurse(
    generated: &GeneratedMove,
    search_depth: u8,
    current_depth: u8,
    counts: &mut PerftCounts,
) {
    if current_depth == search_depth {
        counts.record_leaf(generated);
        return;
    }

    for child in generate_legal_moves(&generated.position_after) {
        perft_recurse(&child, search_depth, current_depth + 1, counts);
    }
}
