//! Module `data_channel`
//!
//! The uniform contract every data connection satisfies, whichever side
//! opened it. The control protocol keeps a [`DataSocket`] per transfer
//! and only ever talks to it through [`DataChannel`].

use std::future::Future;
use std::io;

use crate::transfer::active::ActiveChannel;
use crate::transfer::passive::PassiveChannel;

/// A bidirectional byte stream used to move file content and listings.
///
/// All operations take `&self`, so one task may read while another writes.
pub trait DataChannel: Send + Sync {
    /// Host the channel was opened against.
    fn host(&self) -> &str;

    /// Port the channel is connected or bound to. For a passive channel this is
    /// the actual bound port, never the requested `0`.
    fn port(&self) -> u16;

    /// Reads into `buf`, returning `Ok(0)` at end of stream.
    fn read(&self, buf: &mut [u8]) -> impl Future<Output = io::Result<usize>> + Send;

    /// Writes part or all of `buf`, returning how many bytes were sent.
    fn write(&self, buf: &[u8]) -> impl Future<Output = io::Result<usize>> + Send;

    /// Releases the connection; pending and later I/O fail.
    fn close(&self) -> impl Future<Output = io::Result<()>> + Send;

    /// Writes the whole buffer, retrying short writes.
    fn write_all(&self, buf: &[u8]) -> impl Future<Output = io::Result<()>> + Send {
        async move {
            let mut remaining = buf;
            while !remaining.is_empty() {
                let written = self.write(remaining).await?;
                if written == 0 {
                    return Err(io::Error::new(
                        io::ErrorKind::WriteZero,
                        "data channel accepted no bytes",
                    ));
                }
                remaining = &remaining[written..];
            }
            Ok(())
        }
    }

    /// Reads until end of stream, appending to `out`. Returns the byte count read.
    fn read_to_end(&self, out: &mut Vec<u8>) -> impl Future<Output = io::Result<usize>> + Send {
        async move {
            let mut chunk = [0u8; 8192];
            let mut total = 0;
            loop {
                let read = self.read(&mut chunk).await?;
                if read == 0 {
                    return Ok(total);
                }
                out.extend_from_slice(&chunk[..read]);
                total += read;
            }
        }
    }
}

/// Either kind of data channel, as held by the control connection.
pub enum DataSocket {
    Active(ActiveChannel),
    Passive(PassiveChannel),
}

impl DataSocket {
    pub fn is_passive(&self) -> bool {
        matches!(self, DataSocket::Passive(_))
    }
}

impl From<ActiveChannel> for DataSocket {
    fn from(channel: ActiveChannel) -> Self {
        DataSocket::Active(channel)
    }
}

impl From<PassiveChannel> for DataSocket {
    fn from(channel: PassiveChannel) -> Self {
        DataSocket::Passive(channel)
    }
}

impl DataChannel for DataSocket {
    fn host(&self) -> &str {
        match self {
            DataSocket::Active(channel) => channel.host(),
            DataSocket::Passive(channel) => channel.host(),
        }
    }

    fn port(&self) -> u16 {
        match self {
            DataSocket::Active(channel) => channel.port(),
            DataSocket::Passive(channel) => channel.port(),
        }
    }

    async fn read(&self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            DataSocket::Active(channel) => channel.read(buf).await,
            DataSocket::Passive(channel) => channel.read(buf).await,
        }
    }

    async fn write(&self, buf: &[u8]) -> io::Result<usize> {
        match self {
            DataSocket::Active(channel) => channel.write(buf).await,
            DataSocket::Passive(channel) => channel.write(buf).await,
        }
    }

    async fn close(&self) -> io::Result<()> {
        match self {
            DataSocket::Active(channel) => channel.close().await,
            DataSocket::Passive(channel) => channel.close().await,
        }
    }
}
