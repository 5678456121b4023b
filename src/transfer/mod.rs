//! Transfer module
//!
//! Data channel transport: the uniform channel contract plus the active
//! (server dials out) and passive (client dials in) connection modes.

pub mod active;
pub mod data_channel;
pub mod passive;
pub(crate) mod readiness;
pub(crate) mod stream;

// Re-export key types
pub use active::ActiveChannel;
pub use data_channel::{DataChannel, DataSocket};
pub use passive::PassiveChannel;
