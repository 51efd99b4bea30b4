use std::{env, time::Duration};

// Runtime/client constants (not gameplay tuning).

pub fn relay_url() -> String {
    env::var("RELAY_URL").unwrap_or_else(|_| "ws://127.0.0.1:3000/ws".to_string())
}

// Comma-separated controls held by the headless pilot, e.g. `forward,fire`.
pub fn flight_input() -> String {
    env::var("FLIGHT_INPUT").unwrap_or_default()
}

pub const FRAME_INTERVAL: Duration = Duration::from_micros(1_000_000 / 60);
// Independent from the frame rate: 20 updates per second.
pub const REPLICATION_INTERVAL: Duration = Duration::from_millis(50);

pub const OUTBOUND_CHANNEL_CAPACITY: usize = 64;
pub const INBOUND_CHANNEL_CAPACITY: usize = 1024;
