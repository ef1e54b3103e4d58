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

//! Byte relay between the local terminal and the remote service
//!
//! Each iteration waits, for at most the poll interval, until the socket or
//! the terminal input has something to read. Socket data is copied to the
//! terminal output in chunks; terminal input is forwarded one byte at a
//! time so Ctrl-D can be intercepted. When both sides are ready, both are
//! serviced before waiting again.

use crate::config::BridgeConfig;
use crate::error::BridgeError;
use futures::FutureExt;
use std::io;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// End of Transmission (Ctrl-D). Ends the session locally and is never sent.
pub const EOT: u8 = 0x04;

/// Written to the terminal when the remote side closes the connection
pub const REMOTE_CLOSED_NOTICE: &[u8] = b"\r\nServer closed connection\r\n";

/// Why the relay stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeExit {
    /// The remote service closed the connection
    RemoteClosed,

    /// The user pressed Ctrl-D or closed the terminal input
    UserExit,
}

enum Ready {
    Socket(io::Result<usize>),
    Input(io::Result<usize>),
}

/// Relay between a socket and a local terminal
pub struct Bridge<S, I, O> {
    socket: S,
    input: I,
    output: O,
    buffer: Vec<u8>,
    poll_interval: Duration,
}

impl<S, I, O> Bridge<S, I, O>
where
    S: AsyncRead + AsyncWrite + Unpin,
    I: AsyncRead + Unpin,
    O: AsyncWrite + Unpin,
{
    pub fn new(socket: S, input: I, output: O, config: &BridgeConfig) -> Self {
        Self {
            socket,
            input,
            output,
            buffer: vec![0; config.buffer_size.max(1)],
            poll_interval: config.poll_interval,
        }
    }

    /// Give back the socket, input and output
    pub fn into_parts(self) -> (S, I, O) {
        (self.socket, self.input, self.output)
    }

    /// Relay until the remote closes, the user exits, or I/O fails
    pub async fn run(&mut self) -> Result<BridgeExit, BridgeError> {
        loop {
            if let Some(exit) = self.poll_once().await? {
                tracing::debug!("Bridge stopped: {:?}", exit);
                return Ok(exit);
            }
        }
    }

    /// One bounded wait plus servicing of every ready source
    async fn poll_once(&mut self) -> Result<Option<BridgeExit>, BridgeError> {
        let mut key = [0u8; 1];

        let ready = tokio::select! {
            biased;
            res = self.socket.read(&mut self.buffer) => Ready::Socket(res),
            res = self.input.read(&mut key) => Ready::Input(res),
            _ = tokio::time::sleep(self.poll_interval) => return Ok(None),
        };

        match ready {
            Ready::Socket(res) => {
                if let Some(exit) = self.on_socket(res?).await? {
                    return Ok(Some(exit));
                }
                if let Some(res) = self.input.read(&mut key).now_or_never() {
                    return self.on_input(res?, key[0]).await;
                }
            }
            Ready::Input(res) => {
                if let Some(exit) = self.on_input(res?, key[0]).await? {
                    return Ok(Some(exit));
                }
                if let Some(res) = self.socket.read(&mut self.buffer).now_or_never() {
                    return self.on_socket(res?).await;
                }
            }
        }

        Ok(None)
    }

    async fn on_socket(&mut self, n: usize) -> Result<Option<BridgeExit>, BridgeError> {
        if n == 0 {
            self.output.write_all(REMOTE_CLOSED_NOTICE).await?;
            self.output.flush().await?;
            return Ok(Some(BridgeExit::RemoteClosed));
        }

        self.output.write_all(&self.buffer[..n]).await?;
        self.output.flush().await?;
        Ok(None)
    }

    async fn on_input(&mut self, n: usize, byte: u8) -> Result<Option<BridgeExit>, BridgeError> {
        if n == 0 {
            tracing::debug!("Terminal input closed");
            return Ok(Some(BridgeExit::UserExit));
        }
        if byte == EOT {
            return Ok(Some(BridgeExit::UserExit));
        }

        self.socket.write_all(&[byte]).await?;
        self.socket.flush().await?;
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{DuplexStream, duplex};

    fn config() -> BridgeConfig {
        BridgeConfig {
            poll_interval: Duration::from_millis(10),
            ..BridgeConfig::default()
        }
    }

    /// Bridge over in-memory pipes. Returns the bridge, the remote end of
    /// the socket, and the writer feeding terminal input.
    fn pipes() -> (Bridge<DuplexStream, DuplexStream, Vec<u8>>, DuplexStream, DuplexStream) {
        let (socket, remote) = duplex(8192);
        let (keyboard, input) = duplex(1024);
        let bridge = Bridge::new(socket, input, Vec::new(), &config());
        (bridge, remote, keyboard)
    }

    #[tokio::test]
    async fn test_forwards_input_until_eot() {
        let (mut bridge, mut remote, mut keyboard) = pipes();
        keyboard.write_all(b"look\r\n\x01\xff\x04ignored").await.unwrap();

        assert_eq!(bridge.run().await.unwrap(), BridgeExit::UserExit);

        drop(bridge);
        let mut sent = Vec::new();
        remote.read_to_end(&mut sent).await.unwrap();
        assert_eq!(sent, b"look\r\n\x01\xff");
    }

    #[tokio::test]
    async fn test_remote_close_ends_session() {
        let (mut bridge, mut remote, _keyboard) = pipes();
        remote.write_all(b"Welcome!\r\n").await.unwrap();
        drop(remote);

        assert_eq!(bridge.run().await.unwrap(), BridgeExit::RemoteClosed);

        let (_, _, output) = bridge.into_parts();
        let mut expected = b"Welcome!\r\n".to_vec();
        expected.extend_from_slice(REMOTE_CLOSED_NOTICE);
        assert_eq!(output, expected);
    }

    #[tokio::test]
    async fn test_input_eof_ends_session() {
        let (mut bridge, _remote, keyboard) = pipes();
        drop(keyboard);

        assert_eq!(bridge.run().await.unwrap(), BridgeExit::UserExit);
    }

    #[tokio::test]
    async fn test_both_sources_serviced_in_one_poll() {
        let (mut bridge, mut remote, mut keyboard) = pipes();
        remote.write_all(b"prompt> ").await.unwrap();
        keyboard.write_all(b"n").await.unwrap();

        assert_eq!(bridge.poll_once().await.unwrap(), None);

        let mut forwarded = [0u8; 1];
        remote.read_exact(&mut forwarded).await.unwrap();
        assert_eq!(&forwarded, b"n");

        let (_, _, output) = bridge.into_parts();
        assert_eq!(output, b"prompt> ");
    }

    #[tokio::test]
    async fn test_idle_poll_times_out() {
        let (mut bridge, _remote, _keyboard) = pipes();
        assert_eq!(bridge.poll_once().await.unwrap(), None);
        let (_, _, output) = bridge.into_parts();
        assert!(output.is_empty());
    }

    #[tokio::test]
    async fn test_large_remote_output_is_chunked() {
        let (mut bridge, mut remote, _keyboard) = pipes();
        let payload: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();

        let writer = tokio::spawn(async move {
            remote.write_all(&payload).await.unwrap();
            payload
        });

        assert_eq!(bridge.run().await.unwrap(), BridgeExit::RemoteClosed);
        let payload = writer.await.unwrap();

        let (_, _, output) = bridge.into_parts();
        assert_eq!(&output[..payload.len()], payload.as_slice());
        assert_eq!(&output[payload.len()..], REMOTE_CLOSED_NOTICE);
    }

    #[tokio::test]
    async fn test_socket_error_propagates() {
        let socket = tokio_test::io::Builder::new()
            .read_error(io::Error::new(io::ErrorKind::ConnectionReset, "reset"))
            .build();
        let (_keyboard, input) = duplex(16);
        let mut bridge = Bridge::new(socket, input, Vec::new(), &config());

        let err = bridge.run().await.unwrap_err();
        assert!(matches!(err, BridgeError::Io(e) if e.kind() == io::ErrorKind::ConnectionReset));
    }
}
