// Conversions between relay events and the public wire protocol.

use crate::domain::{PeerId, PeerState};
use crate::use_cases::RelayEvent;
use flight_protocol::{PeerStateDto, ServerMessage};

impl From<&PeerState> for PeerStateDto {
    fn from(peer: &PeerState) -> Self {
        PeerStateDto::new(peer.id.to_string(), peer.state)
    }
}

pub fn identity_message(peer_id: PeerId) -> ServerMessage {
    ServerMessage::Identity {
        id: peer_id.to_string(),
    }
}

impl From<RelayEvent> for ServerMessage {
    fn from(event: RelayEvent) -> Self {
        match event {
            RelayEvent::Roster(peers) => {
                ServerMessage::Roster(peers.iter().map(PeerStateDto::from).collect())
            }
            RelayEvent::PeerJoined(peer) => ServerMessage::PeerJoined((&peer).into()),
            RelayEvent::PeerMoved(peer) => ServerMessage::PeerMoved((&peer).into()),
            RelayEvent::PeerLeft(peer_id) => ServerMessage::PeerLeft(peer_id.to_string()),
        }
    }
}
