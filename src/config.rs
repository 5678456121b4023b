//! Configuration management for the data channel probe
//!
//! Values come from `config.toml` (optional) with `RAX_DATA_*` environment
//! overrides, e.g. `RAX_DATA_MODE=active`.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Which side opens the data connection.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChannelMode {
    /// Server dials the remote host.
    Active,
    /// Server listens and the remote host dials in.
    Passive,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DataChannelConfig {
    /// Address the passive listener binds to. Empty binds every interface.
    pub bind_address: String,

    /// Passive listener port; 0 picks an ephemeral port.
    pub passive_port: u16,

    pub mode: ChannelMode,

    /// Target of an active connection (active mode only)
    pub remote_host: String,
    pub remote_port: u16,

    /// Session identifier prefixed to diagnostic lines
    pub session_id: String,
}

impl DataChannelConfig {
    /// Load configuration from ./config.toml with environment overrides
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from `path` (extension optional) with environment overrides.
    /// A missing file falls back to the defaults.
    pub fn load_from(path: &str) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .set_default("bind_address", "127.0.0.1")?
            .set_default("passive_port", 0)?
            .set_default("mode", "passive")?
            .set_default("remote_host", "")?
            .set_default("remote_port", 0)?
            .set_default("session_id", "probe")?
            .add_source(File::with_name(path).required(false))
            .add_source(Environment::with_prefix("RAX_DATA").try_parsing(true))
            .build()?;

        let config: DataChannelConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.mode == ChannelMode::Active {
            if self.remote_host.is_empty() {
                return Err(ConfigError::Message(
                    "remote_host is required in active mode".into(),
                ));
            }
            if self.remote_port == 0 {
                return Err(ConfigError::Message(
                    "remote_port cannot be 0 in active mode".into(),
                ));
            }
        }

        if self.session_id.is_empty() {
            return Err(ConfigError::Message("session_id cannot be empty".into()));
        }

        Ok(())
    }
}
