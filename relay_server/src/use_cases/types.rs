// Use-case level inputs/outputs for the relay task.

use crate::domain::{PeerId, PeerState};
use flight_protocol::BodyState;
use tokio::sync::mpsc;

/// Connection lifecycle events flowing from sockets into the relay task.
#[derive(Debug)]
pub enum SessionEvent {
    Connect {
        peer_id: PeerId,
        outbox: mpsc::Sender<RelayEvent>,
    },
    Update {
        peer_id: PeerId,
        state: BodyState,
    },
    Disconnect {
        peer_id: PeerId,
    },
}

/// Events the relay delivers to individual connections.
#[derive(Debug, Clone, PartialEq)]
pub enum RelayEvent {
    Roster(Vec<PeerState>),
    PeerJoined(PeerState),
    PeerMoved(PeerState),
    PeerLeft(PeerId),
}
