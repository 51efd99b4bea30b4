use super::session::SessionRegistry;
use super::types::SessionEvent;
use std::sync::Arc;
use tokio::sync::{Notify, mpsc};
use tracing::info;

/// Owns the session registry and applies connection events in arrival order.
///
/// All mutation of the participant map happens here, one event at a time, so
/// socket tasks never share the map directly.
pub async fn relay_task(
    mut input_rx: mpsc::Receiver<SessionEvent>,
    mut registry: SessionRegistry,
    shutdown: Arc<Notify>,
) -> SessionRegistry {
    loop {
        let ev = tokio::select! {
            _ = shutdown.notified() => break,
            ev = input_rx.recv() => match ev {
                Some(ev) => ev,
                // Every sender is gone: nothing can connect any more.
                None => break,
            },
        };

        match ev {
            SessionEvent::Connect { peer_id, outbox } => {
                registry.on_connect(peer_id, outbox);
            }
            SessionEvent::Update { peer_id, state } => {
                registry.on_update(peer_id, state);
            }
            SessionEvent::Disconnect { peer_id } => {
                registry.on_disconnect(peer_id);
            }
        }
    }

    info!(peers = registry.len(), "relay task stopped");
    registry
}
