pub mod replication;
pub mod session;

pub use replication::{RemoteBody, ReplicationClient, RosterChange};
pub use session::{FlightSession, SessionTuning, TickReport};
