// Client-side mirror of the relay session: one proxy per remote peer.

use crate::domain::{BodyId, BodyPositions};
use flight_protocol::{BodyState, ClientMessage, PeerStateDto, ServerMessage};
use glam::Vec3;
use std::collections::HashMap;
use tracing::{debug, info};

/// Last known state of a peer, exactly as relayed.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteBody {
    pub id: String,
    pub state: BodyState,
}

/// What an inbound message did to the set of proxies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RosterChange {
    Added(String),
    Moved(String),
    Removed(String),
}

#[derive(Debug, Default)]
pub struct ReplicationClient {
    local_id: Option<String>,
    remotes: HashMap<String, RemoteBody>,
}

impl ReplicationClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id the relay assigned to this connection, once known.
    pub fn local_id(&self) -> Option<&str> {
        self.local_id.as_deref()
    }

    pub fn remote(&self, id: &str) -> Option<&RemoteBody> {
        self.remotes.get(id)
    }

    pub fn remotes(&self) -> impl Iterator<Item = &RemoteBody> {
        self.remotes.values()
    }

    pub fn len(&self) -> usize {
        self.remotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.remotes.is_empty()
    }

    /// Builds the update for the current local snapshot.
    pub fn outbound(&self, state: BodyState) -> ClientMessage {
        ClientMessage::Update(state.into())
    }

    /// Applies one relay message. Last write wins per peer.
    pub fn apply(&mut self, msg: ServerMessage) -> Vec<RosterChange> {
        match msg {
            ServerMessage::Identity { id } => {
                info!(local_id = %id, "identity assigned");
                // Drop a stale proxy of ourselves, should one exist.
                let stale = self.remotes.remove(&id).map(|r| RosterChange::Removed(r.id));
                self.local_id = Some(id);
                stale.into_iter().collect()
            }
            ServerMessage::Roster(peers) => peers
                .into_iter()
                .filter_map(|peer| self.upsert(peer))
                .collect(),
            ServerMessage::PeerJoined(peer) => self.upsert(peer).into_iter().collect(),
            ServerMessage::PeerMoved(peer) => match self.remotes.get_mut(&peer.id) {
                Some(remote) => {
                    remote.state = peer.body_state();
                    vec![RosterChange::Moved(peer.id)]
                }
                None => {
                    debug!(peer_id = %peer.id, "move for unknown peer ignored");
                    Vec::new()
                }
            },
            ServerMessage::PeerLeft(id) => match self.remotes.remove(&id) {
                Some(_) => vec![RosterChange::Removed(id)],
                None => Vec::new(),
            },
        }
    }

    /// Transport is gone: every peer counts as having left.
    pub fn disconnect(&mut self) -> Vec<RosterChange> {
        let mut ids: Vec<String> = self.remotes.drain().map(|(id, _)| id).collect();
        ids.sort();
        ids.into_iter().map(RosterChange::Removed).collect()
    }

    fn upsert(&mut self, peer: PeerStateDto) -> Option<RosterChange> {
        if self.local_id.as_deref() == Some(peer.id.as_str()) {
            return None;
        }
        let state = peer.body_state();
        let id = peer.id;
        let replaced = self.remotes.insert(
            id.clone(),
            RemoteBody {
                id: id.clone(),
                state,
            },
        );
        if replaced.is_some() {
            Some(RosterChange::Moved(id))
        } else {
            Some(RosterChange::Added(id))
        }
    }
}

impl BodyPositions for ReplicationClient {
    fn position_of(&self, id: &BodyId) -> Option<Vec3> {
        match id {
            BodyId::Peer(peer_id) => self.remotes.get(peer_id).map(|r| r.state.position),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peer(id: &str, position: Vec3) -> PeerStateDto {
        PeerStateDto::new(id, BodyState::at(position))
    }

    fn identified(id: &str) -> ReplicationClient {
        let mut client = ReplicationClient::new();
        client.apply(ServerMessage::Identity { id: id.to_string() });
        client
    }

    #[test]
    fn when_roster_arrives_then_every_other_peer_gets_a_proxy() {
        let mut client = identified("3");

        let changes = client.apply(ServerMessage::Roster(vec![
            peer("1", Vec3::X),
            peer("3", Vec3::Y),
            peer("2", Vec3::Z),
        ]));

        assert_eq!(
            changes,
            vec![
                RosterChange::Added("1".to_string()),
                RosterChange::Added("2".to_string())
            ]
        );
        assert_eq!(client.len(), 2);
        assert!(client.remote("3").is_none());
    }

    #[test]
    fn when_peer_moves_then_proxy_matches_payload_field_for_field() {
        let mut client = identified("1");
        client.apply(ServerMessage::PeerJoined(peer("2", Vec3::new(0.0, 0.0, 150.0))));
        let moved = BodyState {
            position: Vec3::new(-3.5, 12.25, 140.0),
            rotation: Vec3::new(0.1, -1.2, 3.0),
            velocity: Vec3::new(0.0, -0.75, 1.5),
        };

        let changes = client.apply(ServerMessage::PeerMoved(PeerStateDto::new("2", moved)));

        assert_eq!(changes, vec![RosterChange::Moved("2".to_string())]);
        assert_eq!(client.remote("2").map(|r| r.state), Some(moved));
    }

    #[test]
    fn when_unknown_peer_moves_then_nothing_is_created() {
        let mut client = identified("1");

        let changes = client.apply(ServerMessage::PeerMoved(peer("9", Vec3::ONE)));

        assert!(changes.is_empty());
        assert!(client.is_empty());
    }

    #[test]
    fn when_peer_leaves_then_proxy_is_destroyed_once() {
        let mut client = identified("1");
        client.apply(ServerMessage::PeerJoined(peer("2", Vec3::ONE)));

        let first = client.apply(ServerMessage::PeerLeft("2".to_string()));
        let second = client.apply(ServerMessage::PeerLeft("2".to_string()));

        assert_eq!(first, vec![RosterChange::Removed("2".to_string())]);
        assert!(second.is_empty());
        assert!(client.is_empty());
    }

    #[test]
    fn when_peer_joins_twice_then_proxy_is_replaced() {
        let mut client = identified("1");
        client.apply(ServerMessage::PeerJoined(peer("2", Vec3::ONE)));

        let changes = client.apply(ServerMessage::PeerJoined(peer("2", Vec3::Z)));

        assert_eq!(changes, vec![RosterChange::Moved("2".to_string())]);
        assert_eq!(client.remote("2").map(|r| r.state.position), Some(Vec3::Z));
    }

    #[test]
    fn when_connection_drops_then_every_proxy_leaves() {
        let mut client = identified("1");
        client.apply(ServerMessage::Roster(vec![peer("2", Vec3::X), peer("4", Vec3::Y)]));

        let changes = client.disconnect();

        assert_eq!(
            changes,
            vec![
                RosterChange::Removed("2".to_string()),
                RosterChange::Removed("4".to_string())
            ]
        );
        assert!(client.is_empty());
    }

    #[test]
    fn when_positions_are_looked_up_then_only_peers_resolve() {
        let mut client = identified("1");
        client.apply(ServerMessage::PeerJoined(peer("2", Vec3::new(1.0, 2.0, 3.0))));

        assert_eq!(
            client.position_of(&BodyId::Peer("2".to_string())),
            Some(Vec3::new(1.0, 2.0, 3.0))
        );
        assert_eq!(client.position_of(&BodyId::Local), None);
    }

    #[test]
    fn when_outbound_is_built_then_it_carries_the_snapshot() {
        let client = ReplicationClient::new();
        let state = BodyState::at(Vec3::new(0.0, 0.0, 120.0));

        assert_eq!(client.outbound(state), ClientMessage::Update(state.into()));
    }
}
