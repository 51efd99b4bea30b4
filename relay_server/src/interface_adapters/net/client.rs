use crate::domain::PeerId;
use crate::interface_adapters::protocol::identity_message;
use crate::interface_adapters::state::AppState;
use crate::interface_adapters::utils::rng::rand_id;
use crate::use_cases::{RelayEvent, SessionEvent};
use flight_protocol::{BodyState, ClientMessage, ServerMessage};

use axum::{
    Error,
    extract::{
        State,
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade, close_code},
    },
    response::IntoResponse,
};
use futures::SinkExt;
use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::mpsc;
use tracing::{Instrument, debug, info, info_span, warn};

#[derive(Debug)]
enum NetError {
    // Categorizes connection lifecycle failures so callers can decide policy.
    #[allow(dead_code)]
    Ws(axum::Error),
    #[allow(dead_code)]
    Serialization(serde_json::Error),
    SessionClosed,
}

impl From<axum::Error> for NetError {
    fn from(e: axum::Error) -> Self {
        NetError::Ws(e)
    }
}

const LOG_THROTTLE: Duration = Duration::from_secs(2);
const MAX_INVALID_JSON: u32 = 10;

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    // The connection id doubles as the peer id; reconnects always get a fresh one.
    let peer_id = rand_id();
    let span = info_span!("conn", peer_id);
    serve_connection(socket, state, peer_id)
        .instrument(span)
        .await;
}

async fn serve_connection(mut socket: WebSocket, state: Arc<AppState>, peer_id: PeerId) {
    let mut ctx = match bootstrap_connection(&mut socket, &state, peer_id).await {
        Ok(ctx) => ctx,
        Err(e) => {
            warn!(error = ?e, "failed to bootstrap connection");
            let _ = socket.close().await;
            return;
        }
    };

    info!(peer_id, "client connected");

    // Main Client Loop
    if let Err(e) = run_client_loop(&mut socket, &mut ctx).await {
        warn!(error = ?e, "client loop exited with error");
    }
}

async fn send_message(socket: &mut WebSocket, msg: &ServerMessage) -> Result<usize, NetError> {
    // Serialize message safely; log JSON errors instead of panicking
    let txt = serde_json::to_string(msg).map_err(NetError::Serialization)?;
    let bytes = txt.len();
    socket
        .send(Message::Text(txt.into()))
        .await
        .map_err(NetError::Ws)?;
    Ok(bytes)
}

struct ConnCtx {
    pub peer_id: PeerId,
    // Whether the relay task knows about this connection.
    pub registered: bool,
    pub input_tx: mpsc::Sender<SessionEvent>,
    pub outbox_rx: mpsc::Receiver<RelayEvent>,

    pub msgs_in: u64,
    pub msgs_out: u64,
    pub bytes_in: u64,
    pub bytes_out: u64,

    pub invalid_json: u32,

    pub last_input_full_log: Instant,
    pub last_invalid_input_log: Instant,

    pub close_frame: Option<CloseFrame>,
}

async fn bootstrap_connection(
    socket: &mut WebSocket,
    state: &AppState,
    peer_id: PeerId,
) -> Result<ConnCtx, NetError> {
    // Send Identity Packet
    // Tell the client "This is who you are" before any roster mentions other ids.
    let bytes_out = send_message(socket, &identity_message(peer_id)).await?;

    // Register with the relay task. The roster and every later relay event
    // arrive through the outbox in the order the relay produced them.
    let (outbox_tx, outbox_rx) = mpsc::channel::<RelayEvent>(state.outbox_capacity);
    state
        .input_tx
        .send(SessionEvent::Connect {
            peer_id,
            outbox: outbox_tx,
        })
        .await
        .map_err(|_| NetError::SessionClosed)?;

    let now = Instant::now() - LOG_THROTTLE;
    Ok(ConnCtx {
        peer_id,
        registered: true,
        input_tx: state.input_tx.clone(),
        outbox_rx,

        msgs_in: 0,
        msgs_out: 1,
        bytes_in: 0,
        bytes_out: bytes_out as u64,

        invalid_json: 0,

        last_input_full_log: now,
        last_invalid_input_log: now,

        close_frame: None,
    })
}

enum LoopControl {
    Continue,
    Disconnect,
}

fn should_log(last: &mut Instant) -> bool {
    if last.elapsed() >= LOG_THROTTLE {
        *last = Instant::now();
        true
    } else {
        false
    }
}

async fn run_client_loop(socket: &mut WebSocket, ctx: &mut ConnCtx) -> Result<(), NetError> {
    let peer_id = ctx.peer_id;

    // Split borrows so `tokio::select!` can hold them concurrently.
    let ConnCtx {
        registered,
        input_tx,
        outbox_rx,
        msgs_in,
        msgs_out,
        bytes_in,
        bytes_out,
        invalid_json,
        last_input_full_log,
        last_invalid_input_log,
        close_frame,
        ..
    } = ctx;

    let mut fatal: Option<NetError> = None;

    loop {
        // disconnect becomes true on error
        let disconnect: bool = tokio::select! {
            // Incoming Message from Client
            incoming = socket.recv() => {
                match handle_incoming_ws(
                    incoming,
                    peer_id,
                    input_tx,
                    msgs_in,
                    bytes_in,
                    invalid_json,
                    last_input_full_log,
                    last_invalid_input_log,
                    close_frame,
                ) {
                    Ok(LoopControl::Continue) => false,
                    Ok(LoopControl::Disconnect) => true,
                    Err(e) => {
                        fatal = Some(e);
                        true
                    }
                }
            }

            // Outgoing Relay Event
            event = outbox_rx.recv() => {
                match event {
                    Some(event) => match forward_relay_event(event, socket, msgs_out, bytes_out).await {
                        LoopControl::Continue => false,
                        LoopControl::Disconnect => true,
                    },
                    None => {
                        // The relay dropped our outbox: this peer was evicted
                        // for lagging, or the relay shut down. Either way the
                        // registry no longer knows us.
                        warn!(peer_id, "relay outbox closed; disconnecting");
                        *registered = false;
                        *close_frame = Some(CloseFrame {
                            code: close_code::AGAIN,
                            reason: "session state lost; reconnect".into(),
                        });
                        true
                    }
                }
            }
        };

        if disconnect {
            if let Some(frame) = close_frame.take() {
                let _ = socket.send(Message::Close(Some(frame))).await;
            }
            if let Err(err) = socket.close().await.map_err(NetError::Ws) {
                debug!(error = ?err, "socket close error");
            }
            break;
        }
    }

    if let Err(e) = disconnect_cleanup(
        peer_id,
        *registered,
        input_tx,
        *msgs_in,
        *msgs_out,
        *bytes_in,
        *bytes_out,
        *invalid_json,
    )
    .await
    {
        warn!(error = ?e, "error during disconnect cleanup");
        if fatal.is_none() {
            fatal = Some(e);
        }
    }

    if let Some(err) = fatal {
        Err(err)
    } else {
        Ok(())
    }
}

#[allow(clippy::too_many_arguments)]
fn handle_incoming_ws(
    incoming: Option<Result<Message, Error>>,
    peer_id: PeerId,
    input_tx: &mpsc::Sender<SessionEvent>,
    msgs_in: &mut u64,
    bytes_in: &mut u64,
    invalid_json: &mut u32,
    last_input_full_log: &mut Instant,
    last_invalid_input_log: &mut Instant,
    close_frame: &mut Option<CloseFrame>,
) -> Result<LoopControl, NetError> {
    match incoming {
        Some(Ok(msg)) => match msg {
            Message::Text(text) => {
                *msgs_in += 1;
                *bytes_in += text.len() as u64;

                match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(ClientMessage::Update(payload)) => {
                        let state = BodyState::from(payload);
                        if !state.is_finite() {
                            if should_log(last_invalid_input_log) {
                                warn!(peer_id, "non-finite update values; dropping");
                            }
                            return Ok(LoopControl::Continue);
                        }
                        forward_update(peer_id, input_tx, state, last_input_full_log)
                    }
                    Err(parse_err) => {
                        *invalid_json += 1;
                        if should_log(last_invalid_input_log) {
                            warn!(
                                peer_id,
                                bytes = text.len(),
                                error = %parse_err,
                                "failed to parse client message"
                            );
                        }

                        if *invalid_json > MAX_INVALID_JSON {
                            *close_frame = Some(CloseFrame {
                                code: close_code::POLICY,
                                reason: "too many invalid messages".into(),
                            });
                            return Ok(LoopControl::Disconnect);
                        }

                        Ok(LoopControl::Continue)
                    }
                }
            }
            Message::Binary(_) => {
                *close_frame = Some(CloseFrame {
                    code: close_code::UNSUPPORTED,
                    reason: "binary messages not supported".into(),
                });
                Ok(LoopControl::Disconnect)
            }
            Message::Ping(_) | Message::Pong(_) => Ok(LoopControl::Continue),
            Message::Close(_) => Ok(LoopControl::Disconnect),
        },
        Some(Err(e)) => {
            warn!(peer_id, error = %e, "websocket recv error");
            Ok(LoopControl::Disconnect)
        }
        None => {
            info!(peer_id, "websocket closed");
            Ok(LoopControl::Disconnect)
        }
    }
}

fn forward_update(
    peer_id: PeerId,
    input_tx: &mpsc::Sender<SessionEvent>,
    state: BodyState,
    last_input_full_log: &mut Instant,
) -> Result<LoopControl, NetError> {
    // Updates supersede each other, so dropping one under load is harmless.
    match input_tx.try_send(SessionEvent::Update { peer_id, state }) {
        Ok(()) => Ok(LoopControl::Continue),
        Err(mpsc::error::TrySendError::Full(_evt)) => {
            if should_log(last_input_full_log) {
                warn!(peer_id, "session channel full; dropping update");
            }
            Ok(LoopControl::Continue)
        }
        Err(mpsc::error::TrySendError::Closed(_evt)) => Err(NetError::SessionClosed),
    }
}

async fn forward_relay_event(
    event: RelayEvent,
    socket: &mut WebSocket,
    msgs_out: &mut u64,
    bytes_out: &mut u64,
) -> LoopControl {
    let msg = ServerMessage::from(event);
    match send_message(socket, &msg).await {
        Ok(bytes) => {
            *msgs_out += 1;
            *bytes_out += bytes as u64;
            LoopControl::Continue
        }
        Err(err) => {
            // Log unexpected send failures; disconnect will follow immediately.
            warn!(error = ?err, "failed to send relay event");
            LoopControl::Disconnect
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn disconnect_cleanup(
    peer_id: PeerId,
    registered: bool,
    input_tx: &mpsc::Sender<SessionEvent>,
    msgs_in: u64,
    msgs_out: u64,
    bytes_in: u64,
    bytes_out: u64,
    invalid_json: u32,
) -> Result<(), NetError> {
    if registered {
        // Use a blocking send: the leave notification must not be dropped.
        input_tx
            .send(SessionEvent::Disconnect { peer_id })
            .await
            .map_err(|_| NetError::SessionClosed)?;
    }

    debug!(
        peer_id,
        msgs_in, msgs_out, bytes_in, bytes_out, invalid_json, "connection stats"
    );
    info!(peer_id, "client disconnected");
    Ok(())
}
