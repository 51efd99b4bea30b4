// Shared relay bootstrap and WebSocket client helpers for integration tests.
#![allow(dead_code)]

use flight_protocol::{ClientMessage, ServerMessage};
use futures_util::{SinkExt, StreamExt};
use std::{
    sync::{Arc, OnceLock},
    time::Duration,
};
use tokio::net::TcpStream;
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async,
    tungstenite::{Message, protocol::CloseFrame},
};

pub type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

const RECV_TIMEOUT: Duration = Duration::from_secs(3);

// Base URL (ws://host:port) published once the relay has bound its port.
static SERVER_URL: OnceLock<String> = OnceLock::new();
static SERVER_READY: OnceLock<()> = OnceLock::new();

// Start the relay once per test binary and return its base URL.
pub fn ensure_server() -> &'static str {
    SERVER_READY.get_or_init(|| {
        let published_url = Arc::new(OnceLock::<String>::new());
        let published_url_thread = Arc::clone(&published_url);
        // The relay runs on its own OS thread and runtime so it outlives the
        // per-test runtimes created by `#[tokio::test]`.
        std::thread::spawn(move || {
            let runtime = tokio::runtime::Runtime::new().expect("test runtime");
            runtime.block_on(async move {
                let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
                    .await
                    .expect("bind ephemeral test port");
                let addr = listener.local_addr().expect("get local addr");
                let _ = published_url_thread.set(format!("ws://{}", addr));
                relay_server::run(listener).await.expect("relay failed");
            });
        });
        wait_until_accepting(published_url);
    });

    SERVER_URL
        .get()
        .expect("server url should be initialized")
        .as_str()
}

fn wait_until_accepting(published_url: Arc<OnceLock<String>>) {
    let base_url = loop {
        if let Some(url) = published_url.get() {
            break url.clone();
        }
        std::thread::sleep(Duration::from_millis(10));
    };
    let _ = SERVER_URL.set(base_url.clone());

    let addr = base_url
        .strip_prefix("ws://")
        .expect("base url should use ws://");
    for _ in 0..100 {
        if std::net::TcpStream::connect(addr).is_ok() {
            return;
        }
        std::thread::sleep(Duration::from_millis(20));
    }

    panic!("relay did not become ready in time");
}

pub async fn connect() -> Client {
    let url = format!("{}/ws", ensure_server());
    let (client, _response) = connect_async(url).await.expect("websocket handshake");
    client
}

// Connect and consume the identity message, returning the assigned id.
pub async fn join() -> (Client, String) {
    let mut client = connect().await;
    match recv_message(&mut client).await {
        ServerMessage::Identity { id } => (client, id),
        other => panic!("expected identity first, got {other:?}"),
    }
}

pub async fn send_message(client: &mut Client, msg: &ClientMessage) {
    let txt = serde_json::to_string(msg).expect("client message should serialize");
    send_text(client, txt).await;
}

pub async fn send_text(client: &mut Client, txt: impl Into<String>) {
    client
        .send(Message::text(txt.into()))
        .await
        .expect("send should succeed");
}

pub async fn recv_message(client: &mut Client) -> ServerMessage {
    tokio::time::timeout(RECV_TIMEOUT, async {
        loop {
            match client.next().await {
                Some(Ok(Message::Text(txt))) => {
                    return serde_json::from_str::<ServerMessage>(txt.as_str())
                        .expect("relay should only send protocol messages");
                }
                Some(Ok(Message::Close(frame))) => panic!("connection closed: {frame:?}"),
                Some(Ok(_)) => continue,
                Some(Err(e)) => panic!("websocket error: {e}"),
                None => panic!("websocket stream ended"),
            }
        }
    })
    .await
    .expect("timed out waiting for relay message")
}

// Skip messages until one matches; other tests in the binary may be chatty.
pub async fn recv_until<F>(client: &mut Client, mut matches: F) -> ServerMessage
where
    F: FnMut(&ServerMessage) -> bool,
{
    loop {
        let msg = recv_message(client).await;
        if matches(&msg) {
            return msg;
        }
    }
}

// Returns the first text message arriving within `window`, if any.
pub async fn recv_within(client: &mut Client, window: Duration) -> Option<ServerMessage> {
    tokio::time::timeout(window, recv_message(client)).await.ok()
}

pub async fn recv_close(client: &mut Client) -> Option<CloseFrame> {
    tokio::time::timeout(RECV_TIMEOUT, async {
        loop {
            match client.next().await {
                Some(Ok(Message::Close(frame))) => return frame,
                Some(Ok(_)) => continue,
                Some(Err(_)) | None => return None,
            }
        }
    })
    .await
    .expect("timed out waiting for close frame")
}
