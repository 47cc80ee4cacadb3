//! Crate root module declarations for the two-seat networked chess server.
//!
//! The rules core (position model, legal move generation, terminal
//! classification, wire codecs) is pure and synchronous. The `server` and
//! `client` trees layer the line protocol on top of it with tokio.

pub mod errors;

pub mod position {
    pub mod apply;
    pub mod chess_types;
    pub mod position;
    pub mod variants;
}

pub mod moves {
    pub mod attack_tables;
    pub mod chess_move;
}

pub mod rules {
    pub mod game_status;
    pub mod legal_move_checks;
    pub mod legal_move_generator;
    pub mod legal_moves_king;
    pub mod legal_moves_pawn;
    pub mod legal_moves_pieces;
    pub mod perft;
}

pub mod wire {
    pub mod algebraic;
    pub mod fen_generator;
    pub mod fen_parser;
    pub mod line_reader;
    pub mod long_algebraic;
    pub mod messages;
}

pub mod server {
    pub mod coordinator;
    pub mod session;
}

pub mod client {
    pub mod connection;
    pub mod selection;
}

pub mod utils {
    pub mod render_board;
}
