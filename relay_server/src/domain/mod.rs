// Domain layer: participant records kept by the relay.

pub mod state;

pub use state::{PeerId, PeerState, spawn_state};
