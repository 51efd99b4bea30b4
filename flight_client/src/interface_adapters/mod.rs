pub mod input;
pub mod net;
