use std::{env, net::IpAddr};

// Runtime/server constants (not gameplay tuning).

pub fn http_port() -> u16 {
    // `PORT` keeps parity with common hosting platforms.
    env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000)
}

pub fn bind_host() -> IpAddr {
    env::var("RELAY_HOST")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(IpAddr::from([127, 0, 0, 1]))
}

pub const SESSION_CHANNEL_CAPACITY: usize = 1024;
pub const OUTBOX_CAPACITY: usize = 128;
