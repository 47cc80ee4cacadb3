//! End-to-end protocol tests against a server on an ephemeral local port.

use std::net::SocketAddr;
use std::time::Duration;

use duel_chess::client::connection::{connect, ClientFeed, ConnectError};
use duel_chess::errors::ChessError;
use duel_chess::moves::chess_move::ChessMove;
use duel_chess::position::chess_types::Color;
use duel_chess::position::variants::{Variant, STARTING_POSITION_FEN};
use duel_chess::server::coordinator::serve;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;

const AFTER_E4: &str = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1";
const READ_TIMEOUT: Duration = Duration::from_secs(5);
const SILENCE: Duration = Duration::from_millis(300);

async fn start_server(variant: Variant) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("ephemeral port should bind");
    let addr = listener.local_addr().expect("bound listener has an address");
    tokio::spawn(serve(listener, variant));
    addr
}

struct RawClient {
    lines: Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
}

impl RawClient {
    async fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).await.expect("server should accept");
        let (read_half, writer) = stream.into_split();
        Self {
            lines: BufReader::new(read_half).lines(),
            writer,
        }
    }

    /// Next line, or `None` once the server closed the connection.
    async fn read_line(&mut self) -> Option<String> {
        timeout(READ_TIMEOUT, self.lines.next_line())
            .await
            .expect("server should answer in time")
            .expect("read should succeed")
    }

    async fn expect_line(&mut self, expected: &str) {
        assert_eq!(self.read_line().await.as_deref(), Some(expected));
    }

    async fn expect_greeting(&mut self, seat: &str, fen: &str) {
        self.expect_line(&format!("You play as {seat}")).await;
        self.expect_line("Variant standard").await;
        self.expect_line(fen).await;
    }

    async fn expect_silence(&mut self) {
        let next = timeout(SILENCE, self.lines.next_line()).await;
        assert!(next.is_err(), "expected no message, got {next:?}");
    }

    async fn send(&mut self, text: &str) {
        self.send_bytes(format!("{text}\n").as_bytes()).await;
    }

    async fn send_bytes(&mut self, bytes: &[u8]) {
        self.writer.write_all(bytes).await.expect("write should succeed");
    }
}

async fn seated_pair(addr: SocketAddr) -> (RawClient, RawClient) {
    let mut white = RawClient::connect(addr).await;
    white.expect_greeting("White", STARTING_POSITION_FEN).await;
    let mut black = RawClient::connect(addr).await;
    black.expect_greeting("Black", STARTING_POSITION_FEN).await;
    (white, black)
}

#[tokio::test]
async fn seats_are_assigned_white_then_black() {
    let addr = start_server(Variant::Standard).await;
    let _pair = seated_pair(addr).await;
}

#[tokio::test]
async fn third_connection_is_refused_and_closed() {
    let addr = start_server(Variant::Standard).await;
    let (mut white, mut black) = seated_pair(addr).await;

    let mut third = RawClient::connect(addr).await;
    third.expect_line("Server is full").await;
    assert_eq!(third.read_line().await, None);

    // The seated players are unaffected.
    white.send("e2e4").await;
    white.expect_line(AFTER_E4).await;
    black.expect_line(AFTER_E4).await;
}

#[tokio::test]
async fn accepted_move_is_broadcast_to_both_seats() {
    let addr = start_server(Variant::Standard).await;
    let (mut white, mut black) = seated_pair(addr).await;

    white.send("e2e4").await;
    white.expect_line(AFTER_E4).await;
    black.expect_line(AFTER_E4).await;

    black.send("e7e5").await;
    let after_e5 = "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq e6 0 2";
    white.expect_line(after_e5).await;
    black.expect_line(after_e5).await;
}

#[tokio::test]
async fn rejected_attempts_produce_no_messages() {
    let addr = start_server(Variant::Standard).await;
    let (mut white, mut black) = seated_pair(addr).await;

    // Wrong turn, malformed text, and a grammatical but illegal move.
    black.send("e7e5").await;
    white.send("hello").await;
    white.send("").await;
    white.send("e2e5").await;
    white.expect_silence().await;
    black.expect_silence().await;

    // Nothing above was applied.
    white.send("e2e4").await;
    white.expect_line(AFTER_E4).await;
    black.expect_line(AFTER_E4).await;
}

#[tokio::test]
async fn undecodable_bytes_are_a_rejected_move_not_a_disconnect() {
    let addr = start_server(Variant::Standard).await;
    let (mut white, mut black) = seated_pair(addr).await;

    white.send_bytes(b"e2\xffe4\n").await;
    white.send_bytes(&[b'x'; 4096]).await;
    white.send_bytes(b"\n").await;
    white.expect_silence().await;
    black.expect_silence().await;

    // Both seats are still held.
    let mut third = RawClient::connect(addr).await;
    third.expect_line("Server is full").await;

    white.send("e2e4").await;
    white.expect_line(AFTER_E4).await;
    black.expect_line(AFTER_E4).await;
}

#[tokio::test]
async fn disconnect_frees_the_seat() {
    let addr = start_server(Variant::Standard).await;
    let (mut white, mut black) = seated_pair(addr).await;

    white.send("e2e4").await;
    white.expect_line(AFTER_E4).await;
    black.expect_line(AFTER_E4).await;

    drop(white);
    black.expect_line("Opponent disconnected").await;

    let mut replacement = RawClient::connect(addr).await;
    replacement.expect_greeting("White", AFTER_E4).await;

    black.send("e7e5").await;
    let after_e5 = "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq e6 0 2";
    replacement.expect_line(after_e5).await;
    black.expect_line(after_e5).await;
}

#[tokio::test]
async fn library_client_follows_the_game() {
    let addr = start_server(Variant::Standard).await;

    let mut white = connect(addr).await.expect("white should connect");
    let mut black = connect(addr).await.expect("black should connect");
    assert_eq!(white.seat, Color::White);
    assert_eq!(black.seat, Color::Black);
    assert_eq!(white.variant, Some(Variant::Standard));

    match connect(addr).await {
        Err(ConnectError::ServerFull) => {}
        other => panic!("expected ServerFull, got {other:?}"),
    }

    white
        .sender
        .send(&ChessMove::new(12, 28, None))
        .await
        .expect("send should succeed");

    let seen = timeout(
        READ_TIMEOUT,
        black.feed.wait_for(|feed| {
            matches!(feed, ClientFeed::Position(position) if position.side_to_move() == Color::Black)
        }),
    )
    .await
    .expect("update should arrive in time")
    .expect("feed should stay open")
    .clone();
    assert_eq!(
        seen.position().map(|position| position.to_fen()).as_deref(),
        Some(AFTER_E4)
    );

    drop(black);
    let left = timeout(
        READ_TIMEOUT,
        white
            .feed
            .wait_for(|feed| matches!(feed, ClientFeed::OpponentDisconnected(_))),
    )
    .await
    .expect("notice should arrive in time")
    .expect("feed should stay open")
    .clone();
    assert_eq!(
        left.position().map(|position| position.to_fen()).as_deref(),
        Some(AFTER_E4)
    );
}

/// Serves `lines` to the first connection on an ephemeral port, then closes it.
async fn scripted_server(lines: &[&[u8]]) -> SocketAddr {
    let lines: Vec<Vec<u8>> = lines.iter().map(|line| line.to_vec()).collect();
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("ephemeral port should bind");
    let addr = listener.local_addr().expect("bound listener has an address");
    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.expect("client should connect");
        for line in &lines {
            stream.write_all(line).await.expect("write should succeed");
        }
        stream.shutdown().await.expect("shutdown should succeed");
    });
    addr
}

async fn final_feed(lines: &[&[u8]]) -> ClientFeed {
    let addr = scripted_server(lines).await;
    let mut client = connect(addr).await.expect("greeting should parse");
    assert_eq!(client.seat, Color::White);
    let feed = timeout(
        READ_TIMEOUT,
        client.feed.wait_for(|feed| {
            matches!(feed, ClientFeed::Disconnected | ClientFeed::Corrupt(_))
        }),
    )
    .await
    .expect("feed should settle in time")
    .expect("feed should stay open")
    .clone();
    feed
}

#[tokio::test]
async fn client_stops_on_a_malformed_position() {
    let feed = final_feed(&[
        b"You play as White\n",
        b"Variant standard\n",
        b"rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0\n",
        b"rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1\n",
    ])
    .await;
    assert!(
        matches!(feed, ClientFeed::Corrupt(ChessError::MalformedState { .. })),
        "got {feed:?}"
    );
}

#[tokio::test]
async fn client_treats_invalid_utf8_as_a_malformed_position() {
    let feed = final_feed(&[b"You play as White\n", b"Variant standard\n", b"rnbq\xff\n"]).await;
    assert!(
        matches!(feed, ClientFeed::Corrupt(ChessError::MalformedState { .. })),
        "got {feed:?}"
    );
}

#[tokio::test]
async fn client_reports_server_close() {
    let feed = final_feed(&[
        b"You play as White\n",
        b"Variant standard\n",
        b"rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1\n",
    ])
    .await;
    assert_eq!(feed, ClientFeed::Disconnected);
}
