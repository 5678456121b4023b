//! Error handling
//!
//! Error types shared by the active and passive data channels.

pub mod types;

pub(crate) use types::shared_io_error;
pub use types::DataChannelError;
