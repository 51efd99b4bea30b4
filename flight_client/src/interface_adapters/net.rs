// WebSocket link to the relay: one reader task, one writer task.

use flight_protocol::{ClientMessage, ServerMessage};
use futures_util::{SinkExt, StreamExt};
use std::{
    fmt,
    time::{Duration, Instant},
};
use tokio::{net::TcpStream, sync::mpsc, task::JoinHandle};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async,
    tungstenite::{self, Message},
};
use tracing::{debug, info, warn};

use crate::domain::ColliderError;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;
type SocketSink = futures_util::stream::SplitSink<Socket, Message>;
type SocketStream = futures_util::stream::SplitStream<Socket>;

const LOG_THROTTLE: Duration = Duration::from_secs(2);

#[derive(Debug)]
pub enum ClientError {
    Connect(tungstenite::Error),
    Setup(ColliderError),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::Connect(err) => write!(f, "relay connect error: {err}"),
            ClientError::Setup(err) => write!(f, "session setup error: {err}"),
        }
    }
}

impl std::error::Error for ClientError {}

impl From<ColliderError> for ClientError {
    fn from(e: ColliderError) -> Self {
        ClientError::Setup(e)
    }
}

/// Inbound traffic as seen by the session.
#[derive(Debug, Clone, PartialEq)]
pub enum LinkEvent {
    Message(ServerMessage),
    // Sent exactly once, after which the link yields nothing more.
    Closed,
}

pub struct RelayLink {
    outbound_tx: mpsc::Sender<ClientMessage>,
    inbound_rx: mpsc::Receiver<LinkEvent>,
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
    last_full_log: Instant,
    dropped: u64,
}

pub async fn connect(
    url: &str,
    outbound_capacity: usize,
    inbound_capacity: usize,
) -> Result<RelayLink, ClientError> {
    let (socket, _response) = connect_async(url).await.map_err(ClientError::Connect)?;
    info!(%url, "connected to relay");

    let (sink, stream) = socket.split();
    let (outbound_tx, outbound_rx) = mpsc::channel::<ClientMessage>(outbound_capacity);
    let (inbound_tx, inbound_rx) = mpsc::channel::<LinkEvent>(inbound_capacity);

    Ok(RelayLink {
        outbound_tx,
        inbound_rx,
        reader: tokio::spawn(read_loop(stream, inbound_tx)),
        writer: tokio::spawn(write_loop(sink, outbound_rx)),
        last_full_log: Instant::now() - LOG_THROTTLE,
        dropped: 0,
    })
}

impl RelayLink {
    /// Queues a message without waiting. Returns false when it was dropped.
    pub fn send(&mut self, msg: ClientMessage) -> bool {
        match self.outbound_tx.try_send(msg) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                self.dropped += 1;
                if should_log(&mut self.last_full_log) {
                    warn!(dropped = self.dropped, "outbound queue full; dropping update");
                }
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                debug!("writer gone; dropping update");
                false
            }
        }
    }

    /// Next inbound event; `None` only after `Closed` has been delivered.
    pub async fn recv(&mut self) -> Option<LinkEvent> {
        self.inbound_rx.recv().await
    }

    /// Stops both tasks. Queued outbound messages are flushed first.
    pub async fn close(self) {
        let RelayLink {
            outbound_tx,
            reader,
            writer,
            dropped,
            ..
        } = self;
        drop(outbound_tx);
        if let Err(e) = writer.await {
            debug!(error = %e, "writer task ended abnormally");
        }
        reader.abort();
        debug!(dropped, "relay link closed");
    }
}

fn should_log(last: &mut Instant) -> bool {
    if last.elapsed() >= LOG_THROTTLE {
        *last = Instant::now();
        true
    } else {
        false
    }
}

async fn read_loop(mut stream: SocketStream, inbound_tx: mpsc::Sender<LinkEvent>) {
    let mut last_invalid_log = Instant::now() - LOG_THROTTLE;

    while let Some(frame) = stream.next().await {
        let text = match frame {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(frame)) => {
                info!(?frame, "relay closed the connection");
                break;
            }
            Ok(Message::Binary(_)) => {
                if should_log(&mut last_invalid_log) {
                    warn!("binary frame from relay ignored");
                }
                continue;
            }
            Ok(_) => continue,
            Err(e) => {
                warn!(error = %e, "relay read error");
                break;
            }
        };

        match serde_json::from_str::<ServerMessage>(text.as_str()) {
            Ok(msg) => {
                if inbound_tx.send(LinkEvent::Message(msg)).await.is_err() {
                    // Session side hung up; nobody is listening any more.
                    return;
                }
            }
            Err(e) => {
                if should_log(&mut last_invalid_log) {
                    warn!(bytes = text.len(), error = %e, "malformed relay message dropped");
                }
            }
        }
    }

    let _ = inbound_tx.send(LinkEvent::Closed).await;
}

async fn write_loop(mut sink: SocketSink, mut outbound_rx: mpsc::Receiver<ClientMessage>) {
    while let Some(msg) = outbound_rx.recv().await {
        let txt = match serde_json::to_string(&msg) {
            Ok(txt) => txt,
            Err(e) => {
                warn!(error = %e, "failed to serialize update");
                continue;
            }
        };
        if let Err(e) = sink.send(Message::text(txt)).await {
            warn!(error = %e, "relay write error");
            return;
        }
    }

    if let Err(e) = sink.close().await {
        debug!(error = %e, "socket close error");
    }
}
