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

//! End-to-end tests for the terminal bridge over real loopback sockets

use standby_bridge::{BridgeConfig, BridgeError, BridgeExit, TerminalMode, connect, run_session};
use std::io;
use std::process::Command;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt, duplex};
use tokio::net::TcpListener;

/// Counts raw mode transitions instead of touching the real terminal
#[derive(Clone, Default)]
struct CountingTerminal {
    entered: Arc<Mutex<u32>>,
    restored: Arc<Mutex<u32>>,
}

impl TerminalMode for CountingTerminal {
    fn enter_raw(&mut self) -> io::Result<()> {
        *self.entered.lock().unwrap() += 1;
        Ok(())
    }

    fn restore(&mut self) -> io::Result<()> {
        *self.restored.lock().unwrap() += 1;
        Ok(())
    }
}

fn test_config() -> BridgeConfig {
    BridgeConfig {
        poll_interval: Duration::from_millis(20),
        connect_timeout: Duration::from_secs(5),
        ..BridgeConfig::default()
    }
}

async fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

#[tokio::test]
async fn test_session_against_tcp_server() {
    let server = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = server.local_addr().unwrap().port();

    let remote = tokio::spawn(async move {
        let (mut stream, _) = server.accept().await.unwrap();
        stream.write_all(b"Welcome to the MUD\r\n").await.unwrap();
        let mut received = Vec::new();
        stream.read_to_end(&mut received).await.unwrap();
        received
    });

    let config = test_config();
    let socket = connect("127.0.0.1", port, config.connect_timeout)
        .await
        .unwrap();

    let (mut keyboard, input) = duplex(64);
    let terminal = CountingTerminal::default();
    let mut output = Vec::new();

    let typing = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        keyboard.write_all(b"north\r\x04ignored").await.unwrap();
        keyboard
    });

    let exit = run_session(socket, input, &mut output, terminal.clone(), &config)
        .await
        .unwrap();
    let _keyboard = typing.await.unwrap();

    assert_eq!(exit, BridgeExit::UserExit);
    assert_eq!(*terminal.entered.lock().unwrap(), 1);
    assert_eq!(*terminal.restored.lock().unwrap(), 1);

    let text = String::from_utf8_lossy(&output);
    assert!(text.starts_with("Welcome to the MUD\r\n"));
    assert!(text.ends_with("\r\nDisconnected\r\n"));

    let received = remote.await.unwrap();
    assert_eq!(received, b"north\r");
}

#[tokio::test]
async fn test_remote_close_ends_session() {
    let server = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = server.local_addr().unwrap().port();

    tokio::spawn(async move {
        let (mut stream, _) = server.accept().await.unwrap();
        stream.write_all(b"Going down for maintenance\r\n").await.unwrap();
        stream.shutdown().await.unwrap();
    });

    let config = test_config();
    let socket = connect("127.0.0.1", port, config.connect_timeout)
        .await
        .unwrap();
    let (_keyboard, input) = duplex(64);
    let terminal = CountingTerminal::default();
    let mut output = Vec::new();

    let exit = run_session(socket, input, &mut output, terminal.clone(), &config)
        .await
        .unwrap();

    assert_eq!(exit, BridgeExit::RemoteClosed);
    assert_eq!(*terminal.restored.lock().unwrap(), 1);

    let text = String::from_utf8_lossy(&output);
    assert!(text.contains("Going down for maintenance"));
    assert!(text.contains("Server closed connection"));
}

#[tokio::test]
async fn test_connect_to_closed_port_fails() {
    let port = closed_port().await;
    let err = connect("127.0.0.1", port, Duration::from_secs(5))
        .await
        .unwrap_err();

    assert!(matches!(err, BridgeError::Connection { .. }));
    assert!(err.to_string().starts_with(&format!("Error connecting to 127.0.0.1:{}", port)));
}

#[tokio::test]
async fn test_binary_exits_nonzero_on_closed_port() {
    let port = closed_port().await;
    let output = Command::new(env!("CARGO_BIN_EXE_standby-bridge"))
        .args(["127.0.0.1", &port.to_string()])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error connecting to 127.0.0.1"));
}

#[test]
fn test_binary_requires_arguments() {
    let output = Command::new(env!("CARGO_BIN_EXE_standby-bridge"))
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_binary_help_succeeds() {
    let output = Command::new(env!("CARGO_BIN_EXE_standby-bridge"))
        .arg("--help")
        .output()
        .unwrap();
    assert!(output.status.success());
}
