// Use cases layer: session bookkeeping and the relay task that owns it.

pub mod relay;
pub mod session;
pub mod types;

pub use relay::relay_task;
pub use session::SessionRegistry;
pub use types::{RelayEvent, SessionEvent};
