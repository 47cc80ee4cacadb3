//! Networking around [`Session`].
//!
//! One acceptor loop, one reader task and one writer task per connection, and
//! a single coordinator task that owns the session. Readers never touch the
//! session: they queue events, and the coordinator handles each event to
//! completion, broadcasts included, before taking the next one.
//!
//! A connection whose writer fails, or whose outbox is full or closed, is
//! released at once, the same as one whose reader hit end of stream.

use std::collections::HashMap;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, instrument, warn};

use crate::position::chess_types::Color;
use crate::position::variants::Variant;
use crate::server::session::{ConnectOutcome, ConnectionId, Outbound, Session};
use crate::wire::line_reader::LineReader;
use crate::wire::messages::ServerMessage;

/// Events waiting for the coordinator; readers block when it is full.
const EVENT_QUEUE_CAPACITY: usize = 64;
/// Unsent lines per connection before the peer counts as stalled.
const OUTBOX_CAPACITY: usize = 16;

type LineSender = mpsc::Sender<String>;
type EventSender = mpsc::Sender<SessionEvent>;

#[derive(Debug)]
enum SessionEvent {
    Connected {
        connection: ConnectionId,
        outbox: LineSender,
        seated: oneshot::Sender<Option<Color>>,
    },
    Line {
        connection: ConnectionId,
        text: String,
    },
    Disconnected {
        connection: ConnectionId,
    },
}

/// Accept connections on `listener` forever, playing one session of `variant`.
#[instrument(skip(listener))]
pub async fn serve(listener: TcpListener, variant: Variant) -> std::io::Result<()> {
    let local_addr = listener.local_addr()?;
    info!(%local_addr, "Listening");

    let (events_tx, events_rx) = mpsc::channel(EVENT_QUEUE_CAPACITY);
    tokio::spawn(run_coordinator(Coordinator::new(Session::new(variant)), events_rx));

    let mut next_connection: ConnectionId = 0;
    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(err) => {
                warn!(error = %err, "Accept failed");
                continue;
            }
        };
        next_connection += 1;
        info!(connection = next_connection, %peer, "Accepted connection");
        tokio::spawn(handle_connection(stream, next_connection, events_tx.clone()));
    }
}

async fn run_coordinator(mut coordinator: Coordinator, mut events: mpsc::Receiver<SessionEvent>) {
    while let Some(event) = events.recv().await {
        coordinator.handle(event);
    }
}

/// Owns the session and the outbox of every seated connection.
#[derive(Debug)]
struct Coordinator {
    session: Session,
    outboxes: HashMap<ConnectionId, LineSender>,
}

impl Coordinator {
    fn new(session: Session) -> Self {
        Self {
            session,
            outboxes: HashMap::new(),
        }
    }

    fn handle(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Connected {
                connection,
                outbox,
                seated,
            } => match self.session.on_connect(connection) {
                ConnectOutcome::Seated { seat, greeting } => {
                    self.outboxes.insert(connection, outbox);
                    let _ = seated.send(Some(seat));
                    let greeting = greeting
                        .into_iter()
                        .map(|message| Outbound {
                            connection,
                            message,
                        })
                        .collect();
                    self.deliver(greeting);
                }
                ConnectOutcome::Rejected => {
                    // Dropping the outbox afterwards lets the writer close the socket.
                    let _ = outbox.try_send(ServerMessage::ServerFull.encode());
                    let _ = seated.send(None);
                }
            },
            SessionEvent::Line { connection, text } => {
                let Some(seat) = self.session.seat_of(connection) else {
                    return;
                };
                match self.session.on_move_received(seat, &text) {
                    Ok(outbound) => self.deliver(outbound),
                    Err(err) => warn!(connection, %seat, error = %err, "Move attempt dropped"),
                }
            }
            SessionEvent::Disconnected { connection } => {
                let outbound = self.release(connection);
                self.deliver(outbound);
            }
        }
    }

    /// Queue every message; connections that cannot take one are released,
    /// and what their release sends is delivered in turn.
    fn deliver(&mut self, outbound: Vec<Outbound>) {
        let mut pending = outbound;
        while !pending.is_empty() {
            let mut failed = Vec::new();
            for Outbound {
                connection,
                message,
            } in pending
            {
                let Some(outbox) = self.outboxes.get(&connection) else {
                    continue;
                };
                if let Err(err) = outbox.try_send(message.encode()) {
                    warn!(connection, error = %err, "Outbox unusable, releasing connection");
                    failed.push(connection);
                }
            }
            pending = failed
                .into_iter()
                .flat_map(|connection| self.release(connection))
                .collect();
        }
    }

    fn release(&mut self, connection: ConnectionId) -> Vec<Outbound> {
        self.outboxes.remove(&connection);
        match self.session.seat_of(connection) {
            Some(seat) => self.session.on_disconnect(seat),
            None => Vec::new(),
        }
    }
}

async fn handle_connection(stream: TcpStream, connection: ConnectionId, events: EventSender) {
    let (read_half, write_half) = stream.into_split();
    let (outbox, outbox_rx) = mpsc::channel(OUTBOX_CAPACITY);
    let writer = tokio::spawn(write_lines(write_half, outbox_rx, connection, events.clone()));

    let (seated_tx, seated_rx) = oneshot::channel();
    let connected = SessionEvent::Connected {
        connection,
        outbox,
        seated: seated_tx,
    };
    if events.send(connected).await.is_err() {
        return;
    }

    let Ok(Some(seat)) = seated_rx.await else {
        // Rejected: the writer flushes the refusal and closes.
        let _ = writer.await;
        return;
    };

    let mut lines = LineReader::new(read_half);
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let text = line.trim();
                if text.is_empty() {
                    continue;
                }
                debug!(connection, %seat, text, "Line received");
                let event = SessionEvent::Line {
                    connection,
                    text: text.to_owned(),
                };
                if events.send(event).await.is_err() {
                    break;
                }
            }
            Ok(None) => {
                info!(connection, %seat, "Connection closed by peer");
                break;
            }
            Err(err) => {
                warn!(connection, %seat, error = %err, "Read failed");
                break;
            }
        }
    }

    let _ = events.send(SessionEvent::Disconnected { connection }).await;
}

async fn write_lines<W: AsyncWrite + Unpin>(
    mut writer: W,
    mut lines: mpsc::Receiver<String>,
    connection: ConnectionId,
    events: EventSender,
) {
    while let Some(mut line) = lines.recv().await {
        line.push('\n');
        if let Err(err) = writer.write_all(line.as_bytes()).await {
            warn!(connection, error = %err, "Write failed");
            let _ = events.send(SessionEvent::Disconnected { connection }).await;
            return;
        }
    }
    let _ = writer.shutdown().await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::variants::STARTING_POSITION_FEN;

    const AFTER_E4: &str = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1";

    fn connect(
        coordinator: &mut Coordinator,
        connection: ConnectionId,
    ) -> (mpsc::Receiver<String>, Option<Color>) {
        let (outbox, outbox_rx) = mpsc::channel(OUTBOX_CAPACITY);
        let (seated, mut seated_rx) = oneshot::channel();
        coordinator.handle(SessionEvent::Connected {
            connection,
            outbox,
            seated,
        });
        let seat = seated_rx.try_recv().expect("seat answer is sent synchronously");
        (outbox_rx, seat)
    }

    fn drain(outbox: &mut mpsc::Receiver<String>) -> Vec<String> {
        let mut lines = Vec::new();
        while let Ok(line) = outbox.try_recv() {
            lines.push(line);
        }
        lines
    }

    #[test]
    fn closed_outbox_releases_the_seat() {
        let mut coordinator = Coordinator::new(Session::new(Variant::Standard));
        let (mut white, white_seat) = connect(&mut coordinator, 1);
        let (black, black_seat) = connect(&mut coordinator, 2);
        assert_eq!(white_seat, Some(Color::White));
        assert_eq!(black_seat, Some(Color::Black));
        assert_eq!(
            drain(&mut white),
            vec!["You play as White", "Variant standard", STARTING_POSITION_FEN]
        );

        // Black's writer is gone; the next broadcast finds out.
        drop(black);
        coordinator.handle(SessionEvent::Line {
            connection: 1,
            text: "e2e4".to_owned(),
        });

        assert_eq!(drain(&mut white), vec![AFTER_E4, "Opponent disconnected"]);
        assert_eq!(coordinator.session.seat_of(2), None);

        let (mut replacement, seat) = connect(&mut coordinator, 3);
        assert_eq!(seat, Some(Color::Black));
        assert_eq!(drain(&mut replacement)[2], AFTER_E4);
    }

    #[test]
    fn full_outbox_releases_a_stalled_peer() {
        let mut coordinator = Coordinator::new(Session::new(Variant::Standard));
        let (mut white, _) = connect(&mut coordinator, 1);
        let (_black_never_read, _) = connect(&mut coordinator, 2);

        // Knight shuffles; black's outbox already holds its three greeting lines.
        let shuffle = ["g1f3", "g8f6", "f3g1", "f6g8"];
        let mut released_after = None;
        for (ply, text) in shuffle.iter().cycle().take(OUTBOX_CAPACITY).enumerate() {
            coordinator.handle(SessionEvent::Line {
                connection: if ply % 2 == 0 { 1 } else { 2 },
                text: (*text).to_owned(),
            });
            if coordinator.session.seat_of(2).is_none() {
                released_after = Some(ply + 1);
                break;
            }
            drain(&mut white);
        }

        assert_eq!(released_after, Some(OUTBOX_CAPACITY - 3 + 1));
        assert_eq!(drain(&mut white).last().map(String::as_str), Some("Opponent disconnected"));
    }

    #[test]
    fn disconnect_of_a_rejected_connection_is_ignored() {
        let mut coordinator = Coordinator::new(Session::new(Variant::Standard));
        let (mut white, _) = connect(&mut coordinator, 1);
        let (_black, _) = connect(&mut coordinator, 2);
        let (mut third, seat) = connect(&mut coordinator, 3);
        assert_eq!(seat, None);
        assert_eq!(drain(&mut third), vec!["Server is full"]);

        drain(&mut white);
        coordinator.handle(SessionEvent::Disconnected { connection: 3 });
        assert!(drain(&mut white).is_empty());
        assert_eq!(coordinator.session.seat_of(1), Some(Color::White));
    }

    #[tokio::test]
    async fn write_failure_reports_a_disconnect() {
        let (writer, peer) = tokio::io::duplex(64);
        drop(peer);

        let (outbox, outbox_rx) = mpsc::channel(OUTBOX_CAPACITY);
        let (events, mut events_rx) = mpsc::channel(EVENT_QUEUE_CAPACITY);
        let task = tokio::spawn(write_lines(writer, outbox_rx, 7, events));

        outbox
            .send("You play as White".to_owned())
            .await
            .expect("writer is still receiving");
        task.await.expect("writer task should not panic");

        match events_rx.recv().await {
            Some(SessionEvent::Disconnected { connection }) => assert_eq!(connection, 7),
            other => panic!("expected a disconnect event, got {other:?}"),
        }
    }
}
