//
// Copyright 2025-2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Connection setup and session orchestration

use crate::bridge::{Bridge, BridgeExit};
use crate::config::BridgeConfig;
use crate::error::BridgeError;
use crate::terminal::{RawModeGuard, TerminalMode};
use std::io;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;

/// Written to the terminal once the session is over and the mode restored
pub const DISCONNECTED_NOTICE: &[u8] = b"\r\nDisconnected\r\n";

/// Open the TCP connection to the remote service.
///
/// Resolution failures, refusals and timeouts all surface as
/// [`BridgeError::Connection`].
pub async fn connect(
    host: &str,
    port: u16,
    connect_timeout: Duration,
) -> Result<TcpStream, BridgeError> {
    let connection_error = |source: io::Error| BridgeError::Connection {
        host: host.to_string(),
        port,
        source,
    };

    tracing::debug!("Connecting to {}:{}", host, port);
    match tokio::time::timeout(connect_timeout, TcpStream::connect((host, port))).await {
        Ok(Ok(stream)) => {
            if let Err(e) = stream.set_nodelay(true) {
                tracing::debug!("Unable to disable Nagle on {}:{}: {}", host, port, e);
            }
            Ok(stream)
        }
        Ok(Err(source)) => Err(connection_error(source)),
        Err(_) => Err(connection_error(io::Error::new(
            io::ErrorKind::TimedOut,
            "connection timed out",
        ))),
    }
}

/// Run one interactive session over an established connection.
///
/// The terminal is switched to raw mode for the duration of the relay and
/// restored before anything else happens afterwards, whatever the outcome.
/// The socket is then shut down and a disconnect notice written.
pub async fn run_session<S, I, O, T>(
    socket: S,
    input: I,
    output: O,
    terminal: T,
    config: &BridgeConfig,
) -> Result<BridgeExit, BridgeError>
where
    S: AsyncRead + AsyncWrite + Unpin,
    I: AsyncRead + Unpin,
    O: AsyncWrite + Unpin,
    T: TerminalMode,
{
    let guard = RawModeGuard::acquire(terminal)?;

    let mut bridge = Bridge::new(socket, input, output, config);
    let outcome = bridge.run().await;
    let restored = guard.release();

    let (mut socket, _input, mut output) = bridge.into_parts();
    if let Err(e) = socket.shutdown().await {
        tracing::debug!("Socket shutdown failed: {}", e);
    }
    drop(socket);

    output.write_all(DISCONNECTED_NOTICE).await?;
    output.flush().await?;

    let exit = outcome?;
    restored?;
    Ok(exit)
}
