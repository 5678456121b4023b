//! Utility functions
//!
//! Provides the diagnostics sink, logging setup, and network helpers.

pub mod logging;
pub mod network;
