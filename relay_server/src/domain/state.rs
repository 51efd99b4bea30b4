// Domain-level participant records.

use flight_protocol::BodyState;
use glam::Vec3;

/// Relay-assigned connection identifier. Sent to clients as a decimal string.
pub type PeerId = u64;

/// Where every new participant appears: above the globe on the +Z axis.
pub const SPAWN_POSITION: Vec3 = Vec3::new(0.0, 0.0, 150.0);

/// Last state reported by one connected participant.
#[derive(Debug, Clone, PartialEq)]
pub struct PeerState {
    pub id: PeerId,
    pub state: BodyState,
}

impl PeerState {
    pub fn spawned(id: PeerId) -> Self {
        Self {
            id,
            state: spawn_state(),
        }
    }
}

pub fn spawn_state() -> BodyState {
    BodyState::at(SPAWN_POSITION)
}
