// Shared state and wire types for the flight client and the relay server.

pub mod state;
pub mod wire;

pub use state::BodyState;
pub use wire::{BodyStateDto, ClientMessage, PeerStateDto, ServerMessage, Vec3Dto};
