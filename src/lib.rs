//! RAX data channel
//!
//! Active and passive FTP data connections behind one byte-stream contract,
//! with optional TLS on either mode.

pub mod config;
pub mod error;
pub mod transfer;
pub mod utils;

pub use error::DataChannelError;
pub use transfer::{ActiveChannel, DataChannel, DataSocket, PassiveChannel};
pub use utils::logging::{DiscardLogger, Logger, StdLogger};
