//! Module `stream`
//!
//! The byte stream behind an established data connection, plaintext or
//! TLS, split into independently locked halves so a reader and a writer
//! can share one channel.

use std::io;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use log::{debug, warn};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadBuf, ReadHalf, WriteHalf};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tokio_rustls::server::TlsStream;
use tokio_util::sync::CancellationToken;

use crate::utils::logging::Logger;

/// A TCP stream, optionally terminated as TLS on the server side.
pub enum DataStream {
    Plain(TcpStream),
    Tls(Box<TlsStream<TcpStream>>),
}

impl AsyncRead for DataStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.get_mut() {
            DataStream::Plain(stream) => Pin::new(stream).poll_read(cx, buf),
            DataStream::Tls(stream) => Pin::new(stream.as_mut()).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for DataStream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match self.get_mut() {
            DataStream::Plain(stream) => Pin::new(stream).poll_write(cx, buf),
            DataStream::Tls(stream) => Pin::new(stream.as_mut()).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            DataStream::Plain(stream) => Pin::new(stream).poll_flush(cx),
            DataStream::Tls(stream) => Pin::new(stream.as_mut()).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            DataStream::Plain(stream) => Pin::new(stream).poll_shutdown(cx),
            DataStream::Tls(stream) => Pin::new(stream.as_mut()).poll_shutdown(cx),
        }
    }
}

/// How long `close()` waits for a graceful shutdown (FIN or TLS close_notify)
/// before the socket is dropped regardless.
const SHUTDOWN_GRACE: Duration = Duration::from_millis(500);

/// An established data connection owned by exactly one channel.
///
/// `close()` cancels in-flight reads and writes, then drops both halves,
/// which releases the socket even while other handles to the connection
/// are still alive.
pub struct Connection {
    peer: SocketAddr,
    reader: Mutex<Option<ReadHalf<DataStream>>>,
    writer: Mutex<Option<WriteHalf<DataStream>>>,
    closed: CancellationToken,
    logger: Arc<dyn Logger>,
    session_id: String,
}

impl Connection {
    pub fn new(
        stream: DataStream,
        peer: SocketAddr,
        logger: Arc<dyn Logger>,
        session_id: &str,
    ) -> Self {
        let (reader, writer) = tokio::io::split(stream);
        Self {
            peer,
            reader: Mutex::new(Some(reader)),
            writer: Mutex::new(Some(writer)),
            closed: CancellationToken::new(),
            logger,
            session_id: session_id.to_string(),
        }
    }

    /// Address of the remote end.
    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    pub async fn read(&self, buf: &mut [u8]) -> io::Result<usize> {
        let result = tokio::select! {
            biased;
            _ = self.closed.cancelled() => Err(closed_error()),
            result = self.read_locked(buf) => result,
        };
        result.inspect_err(|e| self.report("read", e))
    }

    /// Writes and flushes, so TLS records leave immediately.
    pub async fn write(&self, buf: &[u8]) -> io::Result<usize> {
        let result = tokio::select! {
            biased;
            _ = self.closed.cancelled() => Err(closed_error()),
            result = self.write_locked(buf) => result,
        };
        result.inspect_err(|e| self.report("write", e))
    }

    /// Cancels pending I/O and releases the socket. Later calls succeed
    /// without effect.
    pub async fn close(&self) -> io::Result<()> {
        if self.closed.is_cancelled() {
            return Ok(());
        }
        self.closed.cancel();
        debug!("[{}] closing data connection with {}", self.session_id, self.peer);

        // Cancelled readers and writers drop their guards, so these locks free up.
        let writer = self.writer.lock().await.take();
        let reader = self.reader.lock().await.take();

        let result = match writer {
            Some(mut writer) => match timeout(SHUTDOWN_GRACE, writer.shutdown()).await {
                Ok(shutdown) => shutdown,
                Err(_) => {
                    warn!(
                        "[{}] graceful shutdown with {} timed out",
                        self.session_id, self.peer
                    );
                    Ok(())
                }
            },
            None => Ok(()),
        };
        drop(reader);

        result.inspect_err(|e| self.report("close", e))
    }

    async fn read_locked(&self, buf: &mut [u8]) -> io::Result<usize> {
        match self.reader.lock().await.as_mut() {
            Some(reader) => reader.read(buf).await,
            None => Err(closed_error()),
        }
    }

    async fn write_locked(&self, buf: &[u8]) -> io::Result<usize> {
        let mut guard = self.writer.lock().await;
        let Some(writer) = guard.as_mut() else {
            return Err(closed_error());
        };
        let written = writer.write(buf).await?;
        writer.flush().await?;
        Ok(written)
    }

    fn report(&self, operation: &str, error: &io::Error) {
        self.logger.print(
            &self.session_id,
            &format!("Data connection {operation} with {} failed: {error}", self.peer),
        );
    }
}

fn closed_error() -> io::Error {
    io::Error::new(io::ErrorKind::NotConnected, "data connection closed")
}
