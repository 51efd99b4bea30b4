use crate::use_cases::SessionEvent;
use tokio::sync::mpsc;

#[derive(Clone)]
pub struct AppState {
    // Connection events flowing from sockets into the relay task.
    pub input_tx: mpsc::Sender<SessionEvent>,
    // Per-connection outbox size for relay events.
    pub outbox_capacity: usize,
}
