//! Module `active`
//!
//! Active mode: the server dials out to the address the client announced
//! with PORT/EPRT. The connection is established before the constructor
//! returns; there is no retry.

use std::io;
use std::sync::Arc;

use log::debug;
use rustls::ServerConfig;
use tokio::net::TcpStream;
use tokio_rustls::TlsAcceptor;

use crate::error::DataChannelError;
use crate::transfer::data_channel::DataChannel;
use crate::transfer::stream::{Connection, DataStream};
use crate::utils::logging::Logger;
use crate::utils::network::{join_host_port, resolve};

/// A data connection the server opened towards the client.
pub struct ActiveChannel {
    host: String,
    port: u16,
    connection: Connection,
}

impl ActiveChannel {
    /// Resolves `remote:port` and dials it over plain TCP.
    pub async fn connect(
        remote: &str,
        port: u16,
        logger: Arc<dyn Logger>,
        session_id: &str,
    ) -> Result<Self, DataChannelError> {
        Self::dial(remote, port, None, logger, session_id).await
    }

    /// Dials `remote:port`, then runs the TLS handshake as the TLS server,
    /// which is how FTPS protects active-mode data connections.
    pub async fn connect_tls(
        remote: &str,
        port: u16,
        tls: Arc<ServerConfig>,
        logger: Arc<dyn Logger>,
        session_id: &str,
    ) -> Result<Self, DataChannelError> {
        Self::dial(remote, port, Some(tls), logger, session_id).await
    }

    async fn dial(
        remote: &str,
        port: u16,
        tls: Option<Arc<ServerConfig>>,
        logger: Arc<dyn Logger>,
        session_id: &str,
    ) -> Result<Self, DataChannelError> {
        let target = join_host_port(remote, port);
        logger.print(
            session_id,
            &format!("Opening active data connection to {target}"),
        );

        let addr = resolve(remote, port)
            .await
            .inspect_err(|e| logger.print(session_id, e))?;

        let tcp = TcpStream::connect(addr)
            .await
            .map_err(|source| DataChannelError::Connect {
                addr: target,
                source,
            })
            .inspect_err(|e| logger.print(session_id, e))?;

        let stream = match tls {
            None => DataStream::Plain(tcp),
            Some(config) => {
                let tls_stream = TlsAcceptor::from(config)
                    .accept(tcp)
                    .await
                    .map_err(|source| DataChannelError::Handshake { peer: addr, source })
                    .inspect_err(|e| logger.print(session_id, e))?;
                DataStream::Tls(Box::new(tls_stream))
            }
        };

        debug!("[{session_id}] active data connection established with {addr}");

        Ok(Self {
            host: remote.to_string(),
            port,
            connection: Connection::new(stream, addr, logger, session_id),
        })
    }
}

impl DataChannel for ActiveChannel {
    fn host(&self) -> &str {
        &self.host
    }

    fn port(&self) -> u16 {
        self.port
    }

    async fn read(&self, buf: &mut [u8]) -> io::Result<usize> {
        self.connection.read(buf).await
    }

    async fn write(&self, buf: &[u8]) -> io::Result<usize> {
        self.connection.write(buf).await
    }

    async fn close(&self) -> io::Result<()> {
        self.connection.close().await
    }
}
