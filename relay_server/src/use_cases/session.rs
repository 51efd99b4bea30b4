// Session bookkeeping: who is connected and what they last reported.

use crate::domain::{PeerId, PeerState};
use crate::use_cases::types::RelayEvent;
use flight_protocol::BodyState;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, info, warn};

struct Participant {
    state: PeerState,
    outbox: mpsc::Sender<RelayEvent>,
}

/// Single source of truth for the participants of one relay session.
///
/// The registry is a pure relay: it never validates or simulates the states it
/// stores. It is owned by exactly one task (see [`crate::use_cases::relay_task`]),
/// so every method runs to completion before the next event is looked at.
///
/// Moves supersede each other and may be dropped for a slow connection.
/// Joins and leaves may not: a connection that cannot take one is evicted,
/// which closes its socket and makes the client start over.
pub struct SessionRegistry {
    // Kept in the order connections registered.
    peers: Vec<Participant>,
    spawn: BodyState,
}

impl SessionRegistry {
    pub fn new(spawn: BodyState) -> Self {
        Self {
            peers: Vec::new(),
            spawn,
        }
    }

    /// Registers a new connection and announces it.
    ///
    /// The new connection receives the roster of every pre-existing peer
    /// (never itself); every other connection receives `PeerJoined`.
    pub fn on_connect(&mut self, peer_id: PeerId, outbox: mpsc::Sender<RelayEvent>) -> PeerState {
        let peer = PeerState {
            id: peer_id,
            state: self.spawn,
        };

        if let Some(index) = self.index_of(peer_id) {
            warn!(peer_id, "peer id reused; previous record replaced");
            self.peers.remove(index);
        }

        let roster: Vec<PeerState> = self.peers.iter().map(|p| p.state.clone()).collect();
        let roster_delivered = deliver(peer_id, &outbox, RelayEvent::Roster(roster));

        self.peers.push(Participant {
            state: peer.clone(),
            outbox,
        });
        info!(peer_id, peers = self.peers.len(), "peer joined");
        self.broadcast_except(peer_id, RelayEvent::PeerJoined(peer.clone()));

        if !roster_delivered {
            self.evict(vec![peer_id]);
        }
        peer
    }

    /// Overwrites the sender's record and relays it to everyone else.
    ///
    /// Returns false when the id is unknown; that case is a silent no-op.
    pub fn on_update(&mut self, peer_id: PeerId, state: BodyState) -> bool {
        let Some(index) = self.index_of(peer_id) else {
            debug!(peer_id, "update for unknown peer ignored");
            return false;
        };
        let participant = &mut self.peers[index];
        participant.state.state = state;
        let moved = participant.state.clone();

        self.broadcast_except(peer_id, RelayEvent::PeerMoved(moved));
        true
    }

    /// Removes the record and tells every remaining connection.
    pub fn on_disconnect(&mut self, peer_id: PeerId) -> Option<PeerState> {
        let index = self.index_of(peer_id)?;
        let removed = self.peers.remove(index);

        info!(peer_id, peers = self.peers.len(), "peer left");
        self.broadcast_except(peer_id, RelayEvent::PeerLeft(peer_id));
        Some(removed.state)
    }

    pub fn get(&self, peer_id: PeerId) -> Option<&PeerState> {
        self.peers
            .iter()
            .find(|p| p.state.id == peer_id)
            .map(|p| &p.state)
    }

    pub fn roster(&self) -> Vec<PeerState> {
        self.peers.iter().map(|p| p.state.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    fn index_of(&self, peer_id: PeerId) -> Option<usize> {
        self.peers.iter().position(|p| p.state.id == peer_id)
    }

    fn broadcast_except(&mut self, sender: PeerId, event: RelayEvent) {
        let lagging: Vec<PeerId> = self
            .peers
            .iter()
            .filter(|p| p.state.id != sender)
            .filter(|p| !deliver(p.state.id, &p.outbox, event.clone()))
            .map(|p| p.state.id)
            .collect();
        self.evict(lagging);
    }

    // Dropping the outbox ends the connection's socket task. Everyone else
    // hears PeerLeft, which may in turn overflow and evict further peers.
    fn evict(&mut self, mut lagging: Vec<PeerId>) {
        while let Some(peer_id) = lagging.pop() {
            let Some(index) = self.index_of(peer_id) else {
                continue;
            };
            self.peers.remove(index);
            warn!(peer_id, peers = self.peers.len(), "outbox full; evicting lagging peer");

            for participant in &self.peers {
                let other = participant.state.id;
                if !deliver(other, &participant.outbox, RelayEvent::PeerLeft(peer_id)) {
                    lagging.push(other);
                }
            }
        }
    }
}

// Returns false only when a join, leave or roster could not be queued. A
// closed outbox counts as delivered: that socket task is already tearing down
// and its Disconnect event is on the way.
fn deliver(peer_id: PeerId, outbox: &mpsc::Sender<RelayEvent>, event: RelayEvent) -> bool {
    match outbox.try_send(event) {
        Ok(()) => true,
        Err(TrySendError::Full(RelayEvent::PeerMoved(_))) => {
            debug!(peer_id, "outbox full; dropping move");
            true
        }
        Err(TrySendError::Full(_)) => false,
        Err(TrySendError::Closed(_)) => {
            debug!(peer_id, "outbox closed; dropping relay event");
            true
        }
    }
}
