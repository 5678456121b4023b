//! Module `passive`
//!
//! Passive mode: the server binds a listener, reports the bound port to the
//! client over the control connection, and accepts exactly one data
//! connection in the background.
//!
//! Reads and writes issued before the client connects wait on an
//! [`AcceptGate`] until the accept task records either the connection or
//! the error that ended it. A recorded error is terminal: every later
//! read and write fails with it and the channel must be discarded.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use rustls::ServerConfig;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_rustls::TlsAcceptor;

use crate::error::DataChannelError;
use crate::transfer::data_channel::DataChannel;
use crate::transfer::readiness::{AbandonGuard, AcceptGate};
use crate::transfer::stream::{Connection, DataStream};
use crate::utils::logging::Logger;
use crate::utils::network::resolve;

/// A data connection the client opens towards the server.
pub struct PassiveChannel {
    host: String,
    port: u16,
    gate: Arc<AcceptGate>,
    accept_task: JoinHandle<()>,
    logger: Arc<dyn Logger>,
    session_id: String,
}

impl PassiveChannel {
    /// Binds `host:port` (port `0` picks an ephemeral port) and starts the
    /// background accept. Returns once the listener is bound; the accept
    /// itself is still pending.
    ///
    /// With `tls` set, the accepted connection is TLS-terminated before it is
    /// handed to readers and writers.
    pub async fn bind(
        host: &str,
        port: u16,
        logger: Arc<dyn Logger>,
        session_id: &str,
        tls: Option<Arc<ServerConfig>>,
    ) -> Result<Self, DataChannelError> {
        let addr = resolve(host, port)
            .await
            .inspect_err(|e| logger.print(session_id, e))?;

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| DataChannelError::Bind { addr, source })
            .inspect_err(|e| logger.print(session_id, e))?;

        let local_addr = listener
            .local_addr()
            .map_err(DataChannelError::LocalAddr)
            .inspect_err(|e| logger.print(session_id, e))?;

        logger.print(
            session_id,
            &format!("Listening for passive data connection on {local_addr}"),
        );

        let gate = Arc::new(AcceptGate::new());
        let accept_task = tokio::spawn(accept_one(
            listener,
            tls.map(TlsAcceptor::from),
            AbandonGuard::new(Arc::clone(&gate), Arc::clone(&logger), session_id),
        ));

        Ok(Self {
            host: host.to_string(),
            port: local_addr.port(),
            gate,
            accept_task,
            logger,
            session_id: session_id.to_string(),
        })
    }

    /// Whether the background accept is still waiting for the client.
    pub fn is_pending(&self) -> bool {
        self.gate.is_pending()
    }

    /// Address of the connected client, once one has connected.
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.gate.connection().map(|connection| connection.peer())
    }
}

/// Accepts a single connection, TLS-wraps it if requested, and records the
/// outcome. The listener is dropped when this returns.
async fn accept_one(
    listener: TcpListener,
    acceptor: Option<TlsAcceptor>,
    guard: AbandonGuard,
) {
    let logger = Arc::clone(guard.logger());
    let session_id = guard.session_id().to_string();

    let outcome = match listener.accept().await {
        Ok((tcp, peer)) => {
            let stream = match acceptor {
                None => Ok(DataStream::Plain(tcp)),
                Some(acceptor) => acceptor
                    .accept(tcp)
                    .await
                    .map(|stream| DataStream::Tls(Box::new(stream)))
                    .map_err(|source| DataChannelError::Handshake { peer, source }),
            };
            stream.map(|stream| {
                Connection::new(stream, peer, Arc::clone(&logger), &session_id)
            })
        }
        Err(source) => Err(DataChannelError::Accept(source)),
    };

    if let Ok(connection) = &outcome {
        logger.print(
            &session_id,
            &format!("Passive data connection accepted from {}", connection.peer()),
        );
    }

    guard.resolve(outcome);
}

impl DataChannel for PassiveChannel {
    fn host(&self) -> &str {
        &self.host
    }

    fn port(&self) -> u16 {
        self.port
    }

    async fn read(&self, buf: &mut [u8]) -> io::Result<usize> {
        let connection = self.gate.wait().await?;
        connection.read(buf).await
    }

    async fn write(&self, buf: &[u8]) -> io::Result<usize> {
        let connection = self.gate.wait().await?;
        connection.write(buf).await
    }

    /// Closes the accepted connection. Before a client has connected this
    /// fails the gate, so waiting readers and writers are released, and stops
    /// the accept, which releases the listening port.
    async fn close(&self) -> io::Result<()> {
        if self.gate.resolve(Err(DataChannelError::Closed)) {
            self.logger.print(
                &self.session_id,
                &format!("{} (port {})", DataChannelError::Closed, self.port),
            );
        }
        self.accept_task.abort();

        match self.gate.connection() {
            Some(connection) => connection.close().await,
            None => Ok(()),
        }
    }
}

impl Drop for PassiveChannel {
    fn drop(&mut self) {
        self.accept_task.abort();
    }
}
