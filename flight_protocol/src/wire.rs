// Wire protocol DTOs and conversions for the relay WebSocket.
// Every frame is a JSON text message shaped as {"type": ..., "data": ...}.

use crate::state::BodyState;
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Messages a client sends to the relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum ClientMessage {
    // Latest local state, sent on the replication timer.
    Update(BodyStateDto),
}

/// Messages the relay sends to connected clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum ServerMessage {
    // Identifier assigned to the receiving connection.
    Identity { id: String },
    // Every peer that was connected before the receiver, in join order.
    Roster(Vec<PeerStateDto>),
    // A new peer entered the session with its spawn state.
    PeerJoined(PeerStateDto),
    // Most recent update relayed for a peer.
    PeerMoved(PeerStateDto),
    // A peer disconnected.
    PeerLeft(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3Dto {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl From<Vec3> for Vec3Dto {
    fn from(v: Vec3) -> Self {
        Self {
            x: v.x,
            y: v.y,
            z: v.z,
        }
    }
}

impl From<Vec3Dto> for Vec3 {
    fn from(v: Vec3Dto) -> Self {
        Vec3::new(v.x, v.y, v.z)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BodyStateDto {
    pub position: Vec3Dto,
    pub rotation: Vec3Dto,
    pub velocity: Vec3Dto,
}

impl From<BodyState> for BodyStateDto {
    fn from(state: BodyState) -> Self {
        Self {
            position: state.position.into(),
            rotation: state.rotation.into(),
            velocity: state.velocity.into(),
        }
    }
}

impl From<BodyStateDto> for BodyState {
    fn from(dto: BodyStateDto) -> Self {
        Self {
            position: dto.position.into(),
            rotation: dto.rotation.into(),
            velocity: dto.velocity.into(),
        }
    }
}

/// Flattened per-peer record: `{id, position, rotation, velocity}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerStateDto {
    pub id: String,
    #[serde(flatten)]
    pub state: BodyStateDto,
}

impl PeerStateDto {
    pub fn new(id: impl Into<String>, state: BodyState) -> Self {
        Self {
            id: id.into(),
            state: state.into(),
        }
    }

    pub fn body_state(&self) -> BodyState {
        self.state.into()
    }
}
