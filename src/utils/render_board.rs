//! Terminal-oriented Unicode board renderer.
//!
//! Used for debug logs on the server and as the board view of the terminal
//! client. Square indexing is `0 == a1`, `63 == h8`.

use crate::position::chess_types::*;
use crate::position::position::Position;

/// Highlights drawn on top of the pieces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BoardMarkers {
    pub selected: Option<Square>,
    /// Bitboard of legal destinations for the selected piece.
    pub targets: u64,
}

/// White at the bottom, no markers.
pub fn render_position(position: &Position) -> String {
    render_board(position, Color::White, BoardMarkers::default())
}

/// Render with `perspective` at the bottom of the board.
///
/// The selected square is bracketed, empty legal targets show `*` and
/// occupied legal targets are wrapped in parentheses.
pub fn render_board(position: &Position, perspective: Color, markers: BoardMarkers) -> String {
    let ranks: Vec<u8> = match perspective {
        Color::White => (0..8).rev().collect(),
        Color::Black => (0..8).collect(),
    };
    let files: Vec<u8> = match perspective {
        Color::White => (0..8).collect(),
        Color::Black => (0..8).rev().collect(),
    };

    let file_header: String = files
        .iter()
        .map(|&file| format!(" {} ", char::from(b'a' + file)))
        .collect();

    let mut out = String::new();
    out.push_str("  ");
    out.push_str(&file_header);
    out.push('\n');

    for &rank in &ranks {
        let rank_label = char::from(b'1' + rank);
        out.push(rank_label);
        out.push(' ');

        for &file in &files {
            let square = make_square(file, rank);
            let is_target = markers.targets & (1u64 << square) != 0;
            let glyph = position.piece_on(square).map(piece_to_unicode);

            let (open, close) = if markers.selected == Some(square) {
                ('[', ']')
            } else if is_target && glyph.is_some() {
                ('(', ')')
            } else {
                (' ', ' ')
            };

            out.push(open);
            out.push(match glyph {
                Some(ch) => ch,
                None if is_target => '*',
                None => '·',
            });
            out.push(close);
        }

        out.push(' ');
        out.push(rank_label);
        out.push('\n');
    }

    out.push_str("  ");
    out.push_str(&file_header);

    out
}

fn piece_to_unicode(piece: Piece) -> char {
    match (piece.color, piece.kind) {
        (Color::White, PieceKind::Pawn) => '♙',
        (Color::White, PieceKind::Knight) => '♘',
        (Color::White, PieceKind::Bishop) => '♗',
        (Color::White, PieceKind::Rook) => '♖',
        (Color::White, PieceKind::Queen) => '♕',
        (Color::White, PieceKind::King) => '♔',
        (Color::Black, PieceKind::Pawn) => '♟',
        (Color::Black, PieceKind::Knight) => '♞',
        (Color::Black, PieceKind::Bishop) => '♝',
        (Color::Black, PieceKind::Rook) => '♜',
        (Color::Black, PieceKind::Queen) => '♛',
        (Color::Black, PieceKind::King) => '♚',
    }
}
