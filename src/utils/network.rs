//! Network utilities
//!
//! Address formatting and resolution shared by both connection modes.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use tokio::net::lookup_host;

use crate::error::DataChannelError;

/// Formats `host:port`, bracketing IPv6 literals.
pub fn join_host_port(host: &str, port: u16) -> String {
    match host.parse::<IpAddr>() {
        Ok(IpAddr::V6(_)) => format!("[{host}]:{port}"),
        _ => format!("{host}:{port}"),
    }
}

/// Resolves `host` and `port` to the first matching socket address.
///
/// An empty host means every local interface.
pub async fn resolve(host: &str, port: u16) -> Result<SocketAddr, DataChannelError> {
    if host.is_empty() {
        return Ok(SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port));
    }

    let mut addrs = lookup_host((host, port))
        .await
        .map_err(|source| DataChannelError::Resolve {
            addr: join_host_port(host, port),
            source,
        })?;

    addrs
        .next()
        .ok_or_else(|| DataChannelError::NoAddress(join_host_port(host, port)))
}
