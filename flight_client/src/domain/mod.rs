pub mod body;
pub mod celestial;
pub mod collision;
pub mod effects;
pub mod flight;
pub mod input;
pub mod pilot;
pub mod ports;

pub use body::Body;
pub use collision::{
    BodyId, BodyPositions, Collider, ColliderError, CollisionEngine, CollisionEvent,
    CollisionTuning, Landmark,
};
pub use flight::{FlightModel, FlightTelemetry};
pub use input::InputState;
pub use pilot::PilotTuning;
