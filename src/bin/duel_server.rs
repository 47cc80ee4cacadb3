//! Authoritative game server.
//!
//! Usage:
//! `cargo run --bin duel_server -- --port 4321`
//! `cargo run --bin duel_server -- --choose-variant`

use std::io::{self, BufRead, Write};
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use clap::Parser;
use duel_chess::position::variants::Variant;
use duel_chess::server::coordinator::serve;
use strum::IntoEnumIterator;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Two-seat chess server
#[derive(Parser, Debug)]
#[command(name = "duel_server", version)]
struct Cli {
    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to bind to
    #[arg(short, long, default_value_t = 4321)]
    port: u16,

    /// Variant to play
    #[arg(long, default_value_t = Variant::Standard)]
    variant: Variant,

    /// Pick the variant interactively before accepting connections
    #[arg(long)]
    choose_variant: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let variant = if cli.choose_variant {
        choose_variant(cli.variant)?
    } else {
        cli.variant
    };
    info!(%variant, description = variant.description(), "Variant selected");

    let listener = TcpListener::bind((cli.host.as_str(), cli.port))
        .await
        .with_context(|| format!("failed to bind {}:{}", cli.host, cli.port))?;

    serve(listener, variant).await?;
    Ok(())
}

/// Prompt on stdout and read one answer from stdin; empty keeps `default`.
fn choose_variant(default: Variant) -> Result<Variant> {
    let variants: Vec<Variant> = Variant::iter().collect();

    let mut stdout = io::stdout();
    writeln!(stdout, "Choose a variant:")?;
    for (idx, variant) in variants.iter().enumerate() {
        writeln!(stdout, "  {}) {variant} - {}", idx + 1, variant.description())?;
    }
    write!(stdout, "Number or name [{default}]: ")?;
    stdout.flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    let answer = answer.trim();

    if answer.is_empty() {
        return Ok(default);
    }
    if let Ok(number) = answer.parse::<usize>() {
        return match number.checked_sub(1).and_then(|idx| variants.get(idx)) {
            Some(variant) => Ok(*variant),
            None => bail!("no variant numbered {number}"),
        };
    }
    Variant::from_str(answer).with_context(|| format!("unknown variant {answer:?}"))
}
