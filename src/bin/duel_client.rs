//! Terminal client.
//!
//! Type a square name (`e2`) to select a piece, then a destination square to
//! send the move. `promote n` changes the promotion piece, `quit` leaves.

use anyhow::Result;
use clap::Parser;
use duel_chess::client::connection::{connect, ClientConnection, ClientFeed};
use duel_chess::client::selection::ClientSelection;
use duel_chess::position::chess_types::PieceKind;
use duel_chess::position::position::Position;
use duel_chess::rules::game_status::classify;
use duel_chess::rules::legal_move_checks::is_in_check;
use duel_chess::utils::render_board::render_board;
use duel_chess::wire::algebraic::parse_square_name;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Two-seat chess client
#[derive(Parser, Debug)]
#[command(name = "duel_client", version)]
struct Cli {
    /// Server host
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Server port
    #[arg(short, long, default_value_t = 4321)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Logs go to stderr so the board owns stdout.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let ClientConnection {
        seat,
        variant,
        mut feed,
        mut sender,
    } = connect((cli.host.as_str(), cli.port)).await?;

    println!("You play as {seat}");
    if let Some(variant) = variant {
        println!("Variant: {variant} ({})", variant.description());
    }

    let mut selection = ClientSelection::new(seat);
    let mut current = feed.borrow_and_update().clone();
    draw(&current, &selection);

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            changed = feed.changed() => {
                if changed.is_err() {
                    break;
                }
                current = feed.borrow_and_update().clone();
                selection.reset();
                draw(&current, &selection);
                if matches!(current, ClientFeed::Disconnected | ClientFeed::Corrupt(_)) {
                    break;
                }
            }
            line = stdin.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                let command = line.trim();
                debug!(command, "Input");

                match command.split_whitespace().collect::<Vec<_>>().as_slice() {
                    [] => {}
                    ["quit"] | ["exit"] => break,
                    ["board"] => draw(&current, &selection),
                    ["promote", letter] => {
                        match letter.chars().next().and_then(PieceKind::from_letter) {
                            Some(kind) if kind.is_promotion_target() => {
                                selection.set_promotion_choice(kind);
                                println!("Pawns now promote to {kind:?}");
                            }
                            _ => println!("Promotion piece must be one of q, r, b, n"),
                        }
                    }
                    [name] => {
                        let Some(position) = current.position() else {
                            println!("No position yet");
                            continue;
                        };
                        let square = match parse_square_name(name) {
                            Ok(square) => square,
                            Err(reason) => {
                                println!("{reason}");
                                continue;
                            }
                        };
                        match selection.activate(position, square)? {
                            Some(mv) => {
                                sender.send(&mv).await?;
                                info!(chess_move = %mv, "Move submitted");
                                println!("Sent {mv}");
                            }
                            None => draw(&current, &selection),
                        }
                    }
                    _ => println!("Type a square (e2), `promote q|r|b|n`, `board` or `quit`"),
                }
            }
        }
    }

    Ok(())
}

fn draw(feed: &ClientFeed, selection: &ClientSelection) {
    match feed {
        ClientFeed::Waiting => println!("Waiting for the first position..."),
        ClientFeed::Position(position) => draw_position(position, selection),
        ClientFeed::OpponentDisconnected(position) => {
            draw_position(position, selection);
            println!("Opponent disconnected, waiting for a new opponent");
        }
        ClientFeed::Disconnected => println!("Disconnected from server"),
        ClientFeed::Corrupt(err) => println!("Server sent an unreadable update: {err}"),
    }
}

fn draw_position(position: &Position, selection: &ClientSelection) {
    let seat = selection.local_color();
    println!();
    println!("{}", render_board(position, seat, selection.markers()));

    let status = classify(position);
    if status.is_terminal() {
        println!("Game over: {status}");
        return;
    }

    let mover = position.side_to_move();
    let check = if is_in_check(position, mover) { ", check" } else { "" };
    let turn = if mover == seat { "your move" } else { "opponent to move" };
    println!("{mover} to play ({turn}{check})");
}
