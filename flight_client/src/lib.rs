pub mod domain;
pub mod frameworks;
pub mod interface_adapters;
pub mod use_cases;

pub use frameworks::runtime::{run, run_with_config};
pub use interface_adapters::net::{ClientError, LinkEvent, RelayLink, connect};
pub use use_cases::{FlightSession, ReplicationClient};
