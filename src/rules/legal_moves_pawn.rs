use crate::moves::attack_tables::pawn_attacks;
use crate::moves::chess_move::*;
use crate::position::chess_types::*;
use crate::position::position::Position;

/// Pseudo-legal pawn moves from `from` for the side to move: pushes, double
/// pushes, captures, en passant, and all four promotions on the last rank.
pub fn generate_pawn_moves(position: &Position, from: Square, out: &mut Vec<ChessMove>) {
    let side = position.side_to_move();
    let empty = !position.occupancy_all();
    let enemy_occ = position.occupancy(side.opposite());

    let one_step = match side {
        Color::White => from.checked_add(8).filter(|sq| is_on_board(*sq)),
        Color::Black => from.checked_sub(8),
    };

    if let Some(to) = one_step {
        if (1u64 << to) & empty != 0 {
            push_pawn_move(side, from, to, 0, out);

            if square_rank(from) == side.pawn_start_rank() {
                let two_step = match side {
                    Color::White => from + 16,
                    Color::Black => from - 16,
                };
                if (1u64 << two_step) & empty != 0 {
                    out.push(ChessMove::with_flags(from, two_step, None, FLAG_DOUBLE_PAWN_PUSH));
                }
            }
        }
    }

    let mut captures = pawn_attacks(side, from);
    while captures != 0 {
        let to = captures.trailing_zeros() as Square;
        let to_mask = 1u64 << to;

        if to_mask & enemy_occ != 0 {
            push_pawn_move(side, from, to, FLAG_CAPTURE, out);
        } else if position.en_passant_square() == Some(to) {
            out.push(ChessMove::with_flags(
                from,
                to,
                None,
                FLAG_CAPTURE | FLAG_EN_PASSANT,
            ));
        }

        captures &= captures - 1;
    }
}

fn push_pawn_move(side: Color, from: Square, to: Square, flags: MoveFlags, out: &mut Vec<ChessMove>) {
    if square_rank(to) == side.promotion_rank() {
        for promo in PieceKind::PROMOTIONS {
            out.push(ChessMove::with_flags(from, to, Some(promo), flags));
        }
    } else {
        out.push(ChessMove::with_flags(from, to, None, flags));
    }
}

#[cfg(test)]
mod tests {
    use super::generate_pawn_moves;
    use crate::position::position::Position;

    fn moves_from(fen: &str, from: u8) -> Vec<String> {
        let position = Position::from_fen(fen).expect("FEN should parse");
        let mut out = Vec::new();
        generate_pawn_moves(&position, from, &mut out);
        let mut names: Vec<String> = out.iter().map(|mv| mv.to_string()).collect();
        names.sort();
        names
    }

    #[test]
    fn start_rank_pawn_has_single_and_double_push() {
        let names = moves_from(crate::position::variants::STARTING_POSITION_FEN, 12);
        assert_eq!(names, vec!["e2e3", "e2e4"]);
    }

    #[test]
    fn blocked_pawn_cannot_jump() {
        let names = moves_from("4k3/8/8/8/8/4n3/4P3/4K3 w - - 0 1", 12);
        assert!(names.is_empty());
    }

    #[test]
    fn promotions_fan_out_for_push_and_capture() {
        let names = moves_from("1r2k3/P7/8/8/8/8/8/4K3 w - - 0 1", 48);
        assert_eq!(
            names,
            vec!["a7a8b", "a7a8n", "a7a8q", "a7a8r", "a7b8b", "a7b8n", "a7b8q", "a7b8r"]
        );
    }

    #[test]
    fn black_pawn_takes_en_passant() {
        let names = moves_from("4k3/8/8/8/3pP3/8/8/4K3 b - e3 0 1", 27);
        assert_eq!(names, vec!["d4d3", "d4e3"]);
    }
}
