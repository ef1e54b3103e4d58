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

//! Standby listener accept loop
//!
//! Owns the listening socket, the session registry and the set of running
//! session tasks. Sessions are fire-and-forget from the accept loop's point
//! of view but remain supervised so shutdown can cancel and reap them.

use crate::config::ListenerConfig;
use crate::error::ListenerError;
use crate::registry::Registry;
use crate::session::{Session, SessionSettings, SessionState};
use crate::status::{BUSY_NOTICE, MaintenanceNotice, StatusComposer};
use chrono::Local;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpSocket, TcpStream};
use tokio::task::{self, JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Pause after a failed accept before polling again
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Standby telnet listener
pub struct StandbyListener {
    listener: TcpListener,
    local_addr: SocketAddr,
    registry: Arc<Registry>,
    settings: Arc<SessionSettings>,
    tasks: JoinSet<SessionState>,
    task_sessions: HashMap<task::Id, Uuid>,
    shutdown: CancellationToken,
    shutdown_timeout: Duration,
    stopped: bool,
}

impl StandbyListener {
    /// Bind the listener using the default maintenance notice
    pub fn bind(config: &ListenerConfig) -> Result<Self, ListenerError> {
        Self::bind_with(config, Arc::new(MaintenanceNotice))
    }

    /// Bind the listener with a custom status composer.
    ///
    /// Must be called from within a tokio runtime.
    pub fn bind_with(
        config: &ListenerConfig,
        composer: Arc<dyn StatusComposer>,
    ) -> Result<Self, ListenerError> {
        let addr = config.bind_addr();
        let port = addr.port();
        let bind_error = |source: std::io::Error| {
            if source.kind() == std::io::ErrorKind::AddrInUse {
                ListenerError::AddressInUse { port }
            } else {
                ListenerError::Bind { port, source }
            }
        };

        let socket = if addr.is_ipv4() {
            TcpSocket::new_v4()
        } else {
            TcpSocket::new_v6()
        }
        .map_err(bind_error)?;
        socket.set_reuseaddr(true).map_err(bind_error)?;
        socket.bind(addr).map_err(bind_error)?;

        let backlog = u32::try_from(config.max_connections.max(1)).unwrap_or(u32::MAX);
        let listener = socket.listen(backlog).map_err(bind_error)?;
        let local_addr = listener.local_addr().map_err(bind_error)?;

        let settings = SessionSettings {
            service_name: config.service_name.clone(),
            contact: config.contact.clone(),
            port: local_addr.port(),
            started_at: Local::now(),
            grace_period: config.grace_period(),
            charset: config.charset,
            composer,
        };

        let shutdown = CancellationToken::new();
        Ok(Self {
            listener,
            local_addr,
            registry: Arc::new(Registry::with_shutdown(
                config.max_connections,
                shutdown.clone(),
            )),
            settings: Arc::new(settings),
            tasks: JoinSet::new(),
            task_sessions: HashMap::new(),
            shutdown,
            shutdown_timeout: config.shutdown_timeout(),
            stopped: false,
        })
    }

    /// Address actually bound (resolves port 0)
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    pub fn settings(&self) -> Arc<SessionSettings> {
        self.settings.clone()
    }

    /// Token that stops [`StandbyListener::run`] when cancelled
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Accept connections until the shutdown token is cancelled, then shut
    /// down all sessions.
    pub async fn run(&mut self) {
        tracing::info!("Listening for connections on {}", self.local_addr);

        loop {
            tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => break,
                Some(joined) = self.tasks.join_next_with_id() => self.reap(joined).await,
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => self.dispatch(stream, peer).await,
                    Err(e) => {
                        tracing::error!("Socket error while accepting: {}", e);
                        tokio::time::sleep(ACCEPT_BACKOFF).await;
                    }
                },
            }
        }

        self.shutdown().await;
    }

    async fn dispatch(&mut self, mut stream: TcpStream, peer: SocketAddr) {
        match self.registry.try_admit(peer).await {
            Some(admission) => {
                tracing::debug!("Admitted {} as session {}", peer, admission.id);
                let session = Session::new(
                    stream,
                    peer,
                    admission,
                    self.registry.clone(),
                    self.settings.clone(),
                );
                let session_id = session.id();
                let handle = self.tasks.spawn(session.run());
                self.task_sessions.insert(handle.id(), session_id);
            }
            None => {
                tracing::info!(
                    "Server busy, turning away {} ({} sessions)",
                    peer,
                    self.registry.max_connections()
                );
                if let Err(e) = stream.write_all(BUSY_NOTICE).await {
                    tracing::debug!("Busy notice to {} failed: {}", peer, e);
                }
                let _ = stream.shutdown().await;
            }
        }
    }

    /// Forget a finished session task. A task that panicked or was aborted
    /// never ran its own close, so its registry slot is released here.
    async fn reap(&mut self, joined: Result<(task::Id, SessionState), JoinError>) {
        match joined {
            Ok((task_id, _)) => {
                self.task_sessions.remove(&task_id);
            }
            Err(e) => {
                tracing::error!("Session task failed: {}", e);
                if let Some(session_id) = self.task_sessions.remove(&e.id()) {
                    if self.registry.remove(session_id).await {
                        tracing::warn!("Released registry slot of failed session {}", session_id);
                    }
                }
            }
        }
    }

    /// Stop accepting, force close every live session and wait for the
    /// session tasks to finish. Returns how many sessions were still
    /// registered when the registry was closed.
    ///
    /// Calling this more than once is harmless; later calls return 0.
    pub async fn shutdown(&mut self) -> usize {
        if self.stopped {
            return 0;
        }
        self.stopped = true;
        self.shutdown.cancel();

        tracing::info!("Shutting down standby listener...");
        for entry in self.registry.sessions().await {
            tracing::info!(
                "Closing session {} from {} (connected {})",
                entry.id,
                entry.peer,
                entry.accepted_at.format("%Y-%m-%d %H:%M:%S")
            );
        }
        let closed = self.registry.close_all().await;

        let tasks = &mut self.tasks;
        let drained = tokio::time::timeout(self.shutdown_timeout, async {
            while tasks.join_next().await.is_some() {}
        })
        .await;

        if drained.is_err() {
            tracing::warn!(
                "{} sessions still running after {:?}, aborting",
                self.tasks.len(),
                self.shutdown_timeout
            );
            self.tasks.abort_all();
            while self.tasks.join_next().await.is_some() {}
        }
        self.task_sessions.clear();

        tracing::info!("Standby listener stopped ({} sessions closed)", closed);
        closed
    }
}
