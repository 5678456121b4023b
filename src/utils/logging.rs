//! Logging utilities
//!
//! Provides the session-tagged diagnostics sink consumed by the data
//! channels and the `env_logger` setup used by the probe binary.

use std::fmt;

use log::info;

/// Receives diagnostic lines tagged with the owning session's identifier.
///
/// Implementations must not block the caller and are assumed infallible.
pub trait Logger: Send + Sync {
    fn print(&self, session_id: &str, message: &dyn fmt::Display);
}

/// Forwards diagnostics to the `log` facade at `info` level.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdLogger;

impl Logger for StdLogger {
    fn print(&self, session_id: &str, message: &dyn fmt::Display) {
        info!(target: "rax_data_channel::session", "{session_id}  {message}");
    }
}

/// Drops every diagnostic line.
#[derive(Debug, Default, Clone, Copy)]
pub struct DiscardLogger;

impl Logger for DiscardLogger {
    fn print(&self, _session_id: &str, _message: &dyn fmt::Display) {}
}

/// Setup logging for the probe; `RUST_LOG` overrides the `info` default.
pub fn setup_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}
