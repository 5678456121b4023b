//! RAX data channel probe - Entry Point
//!
//! Opens one data channel as configured and pipes it to stdout, while
//! stdin is sent the other way.

use std::process;
use std::sync::Arc;

use log::{error, info, warn};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use rax_data_channel::config::{ChannelMode, DataChannelConfig};
use rax_data_channel::utils::logging::setup_logging;
use rax_data_channel::{ActiveChannel, DataChannel, DataSocket, Logger, PassiveChannel, StdLogger};

#[tokio::main]
async fn main() {
    setup_logging();

    let config = match DataChannelConfig::load() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            process::exit(1);
        }
    };

    let logger: Arc<dyn Logger> = Arc::new(StdLogger);
    let opened = match config.mode {
        ChannelMode::Passive => PassiveChannel::bind(
            &config.bind_address,
            config.passive_port,
            Arc::clone(&logger),
            &config.session_id,
            None,
        )
        .await
        .map(DataSocket::from),
        ChannelMode::Active => ActiveChannel::connect(
            &config.remote_host,
            config.remote_port,
            Arc::clone(&logger),
            &config.session_id,
        )
        .await
        .map(DataSocket::from),
    };

    let socket = match opened {
        Ok(socket) => Arc::new(socket),
        Err(e) => {
            error!("Failed to open data channel: {}", e);
            process::exit(1);
        }
    };

    if socket.is_passive() {
        info!("Waiting for a data connection on port {}", socket.port());
    }

    let upload = {
        let socket = Arc::clone(&socket);
        tokio::spawn(async move {
            let mut stdin = tokio::io::stdin();
            let mut buf = [0u8; 8192];
            loop {
                match stdin.read(&mut buf).await {
                    Ok(0) => break,
                    Ok(n) => {
                        if let Err(e) = socket.write_all(&buf[..n]).await {
                            warn!("Failed to send on data channel: {}", e);
                            break;
                        }
                    }
                    Err(e) => {
                        warn!("Failed to read stdin: {}", e);
                        break;
                    }
                }
            }
        })
    };

    let mut stdout = tokio::io::stdout();
    let mut buf = [0u8; 8192];
    let mut received = 0usize;
    loop {
        match socket.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => {
                received += n;
                if let Err(e) = stdout.write_all(&buf[..n]).await {
                    warn!("Failed to write stdout: {}", e);
                    break;
                }
            }
            Err(e) => {
                error!("Data channel failed: {}", e);
                break;
            }
        }
    }
    if let Err(e) = stdout.flush().await {
        warn!("Failed to flush stdout: {}", e);
    }

    upload.abort();
    if let Err(e) = socket.close().await {
        warn!("Failed to close data channel: {}", e);
    }
    info!("Data channel finished, {} bytes received", received);
}
