//! Client side of the line protocol.
//!
//! `connect` reads the greeting, then a background task keeps publishing the
//! latest server state on a `watch` channel. The interactive loop only ever
//! reads snapshots from that channel, so it never shares a mutable position
//! with the receive task.

use derive_more::{Display, Error};
use tokio::io::AsyncWriteExt;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use crate::errors::ChessError;
use crate::moves::chess_move::ChessMove;
use crate::position::chess_types::Color;
use crate::position::position::Position;
use crate::position::variants::Variant;
use crate::wire::line_reader::LineReader;
use crate::wire::long_algebraic::encode_move;
use crate::wire::messages::ServerMessage;

/// Latest state published by the receive loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientFeed {
    /// Seated, no position received yet.
    Waiting,
    Position(Position),
    /// The other seat dropped; the last known position is kept.
    OpponentDisconnected(Position),
    /// The server closed the connection or a read failed.
    Disconnected,
    /// The server sent something undecodable; no further updates follow.
    Corrupt(ChessError),
}

impl ClientFeed {
    pub fn position(&self) -> Option<&Position> {
        match self {
            ClientFeed::Position(position) | ClientFeed::OpponentDisconnected(position) => {
                Some(position)
            }
            ClientFeed::Waiting | ClientFeed::Disconnected | ClientFeed::Corrupt(_) => None,
        }
    }
}

#[derive(Debug, Display, Error)]
pub enum ConnectError {
    #[display("connection failed: {_0}")]
    Io(std::io::Error),
    #[display("server is full")]
    ServerFull,
    #[display("server closed the connection during the greeting")]
    ClosedDuringGreeting,
    #[display("unexpected greeting: {_0}")]
    Protocol(ChessError),
}

/// Write half of the connection.
#[derive(Debug)]
pub struct MoveSender {
    writer: OwnedWriteHalf,
}

impl MoveSender {
    #[instrument(skip(self, mv), fields(chess_move = %mv))]
    pub async fn send(&mut self, mv: &ChessMove) -> std::io::Result<()> {
        let mut line = encode_move(mv);
        line.push('\n');
        self.writer.write_all(line.as_bytes()).await?;
        debug!("Move sent");
        Ok(())
    }
}

#[derive(Debug)]
pub struct ClientConnection {
    pub seat: Color,
    pub variant: Option<Variant>,
    pub feed: watch::Receiver<ClientFeed>,
    pub sender: MoveSender,
}

type ServerLines = LineReader<OwnedReadHalf>;

#[instrument(skip(addr))]
pub async fn connect(addr: impl ToSocketAddrs) -> Result<ClientConnection, ConnectError> {
    let stream = TcpStream::connect(addr).await.map_err(ConnectError::Io)?;
    let (read_half, write_half) = stream.into_split();
    let mut lines = LineReader::new(read_half);

    let seat = match next_message(&mut lines).await? {
        ServerMessage::SeatAssignment(seat) => seat,
        ServerMessage::ServerFull => return Err(ConnectError::ServerFull),
        other => return Err(unexpected(other)),
    };

    let (variant, initial) = match next_message(&mut lines).await? {
        ServerMessage::Variant(variant) => (Some(variant), ClientFeed::Waiting),
        ServerMessage::State(position) => (None, ClientFeed::Position(position)),
        other => return Err(unexpected(other)),
    };
    info!(%seat, ?variant, "Connected");

    let (feed_tx, feed_rx) = watch::channel(initial);
    tokio::spawn(receive_loop(lines, feed_tx));

    Ok(ClientConnection {
        seat,
        variant,
        feed: feed_rx,
        sender: MoveSender { writer: write_half },
    })
}

async fn next_message(lines: &mut ServerLines) -> Result<ServerMessage, ConnectError> {
    loop {
        let line = lines
            .next_line()
            .await
            .map_err(ConnectError::Io)?
            .ok_or(ConnectError::ClosedDuringGreeting)?;
        if line.trim().is_empty() {
            continue;
        }
        return ServerMessage::parse(&line).map_err(ConnectError::Protocol);
    }
}

fn unexpected(message: ServerMessage) -> ConnectError {
    ConnectError::Protocol(ChessError::malformed_state(
        &message.encode(),
        "out of order in the greeting",
    ))
}

async fn receive_loop(mut lines: ServerLines, feed: watch::Sender<ClientFeed>) {
    let mut last_position = feed.borrow().position().cloned();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => {
                info!("Server closed the connection");
                feed.send_replace(ClientFeed::Disconnected);
                return;
            }
            Err(err) => {
                warn!(error = %err, "Read failed");
                feed.send_replace(ClientFeed::Disconnected);
                return;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        match ServerMessage::parse(&line) {
            Ok(ServerMessage::State(position)) => {
                debug!(fen = %line.trim(), "Position received");
                last_position = Some(position.clone());
                feed.send_replace(ClientFeed::Position(position));
            }
            Ok(ServerMessage::OpponentDisconnected) => {
                info!("Opponent disconnected");
                if let Some(position) = last_position.clone() {
                    feed.send_replace(ClientFeed::OpponentDisconnected(position));
                }
            }
            Ok(other) => debug!(message = %other, "Ignoring message"),
            Err(err) => {
                warn!(error = %err, "Stopping updates");
                feed.send_replace(ClientFeed::Corrupt(err));
                return;
            }
        }
    }
}
