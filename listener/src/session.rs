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

//! Standby session lifecycle
//!
//! A session runs a fixed script against one accepted connection:
//!
//! ```text
//! Accepted -> Announced -> PayloadSent -> GraceWait -> Closed
//! ```
//!
//! Any failure, and any cancellation from the listener, jumps straight to
//! `Closed`. Errors never leave the session task.

use crate::error::SessionError;
use crate::registry::{Admission, Registry};
use crate::status::{CLOSING_NOTICE, Charset, StatusComposer, StatusContext, to_crlf};
use crate::telnet::{MsspStatus, handshake_frames};
use chrono::{DateTime, Local, Utc};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Session state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Connection accepted and registered
    Accepted,

    /// Telnet handshake attempted
    Announced,

    /// Status text delivered
    PayloadSent,

    /// Holding the connection open so the text can be read
    GraceWait,

    /// Socket closed and session deregistered
    Closed,
}

impl SessionState {
    /// Whether `next` is a legal successor of this state
    pub fn can_transition(self, next: SessionState) -> bool {
        use SessionState::*;

        matches!(
            (self, next),
            (Accepted, Announced)
                | (Announced, PayloadSent)
                | (PayloadSent, GraceWait)
                | (Accepted | Announced | PayloadSent | GraceWait, Closed)
        )
    }
}

/// Settings shared by every session of one listener
pub struct SessionSettings {
    pub service_name: String,
    pub contact: String,
    pub port: u16,
    pub started_at: DateTime<Local>,
    pub grace_period: Duration,
    pub charset: Charset,
    pub composer: Arc<dyn StatusComposer>,
}

impl std::fmt::Debug for SessionSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionSettings")
            .field("service_name", &self.service_name)
            .field("contact", &self.contact)
            .field("port", &self.port)
            .field("started_at", &self.started_at)
            .field("grace_period", &self.grace_period)
            .field("charset", &self.charset)
            .finish_non_exhaustive()
    }
}

/// One accepted connection and its lifecycle
pub struct Session<S> {
    id: Uuid,
    peer: SocketAddr,
    accepted_at: DateTime<Utc>,
    state: SessionState,
    deadline: Option<Instant>,
    stream: S,
    cancel: CancellationToken,
    registry: Arc<Registry>,
    settings: Arc<SessionSettings>,
}

impl<S> Session<S>
where
    S: AsyncWrite + Unpin + Send,
{
    /// Create a session for an admitted connection
    pub fn new(
        stream: S,
        peer: SocketAddr,
        admission: Admission,
        registry: Arc<Registry>,
        settings: Arc<SessionSettings>,
    ) -> Self {
        Self {
            id: admission.id,
            peer,
            accepted_at: admission.accepted_at,
            state: SessionState::Accepted,
            deadline: None,
            stream,
            cancel: admission.cancel,
            registry,
            settings,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Move to the next lifecycle state
    pub fn transition(&mut self, next: SessionState) -> Result<(), SessionError> {
        if !self.state.can_transition(next) {
            return Err(SessionError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        tracing::trace!("Session {} {:?} -> {:?}", self.id, self.state, next);
        self.state = next;
        Ok(())
    }

    /// Run the session to completion. Always ends in [`SessionState::Closed`].
    pub async fn run(mut self) -> SessionState {
        tracing::info!(
            "Client connected from {} (session {}, accepted {})",
            self.peer,
            self.id,
            self.accepted_at.format("%Y-%m-%d %H:%M:%S")
        );

        let cancel = self.cancel.clone();
        let finished = tokio::select! {
            outcome = self.drive() => match outcome {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!("Error handling client {}: {}", self.peer, e);
                    false
                }
            },
            _ = cancel.cancelled() => {
                match self.deadline {
                    Some(deadline) => tracing::info!(
                        "Session {} cancelled with {:?} of grace period left",
                        self.id,
                        deadline.saturating_duration_since(Instant::now())
                    ),
                    None => tracing::info!("Session {} cancelled in state {:?}", self.id, self.state),
                }
                false
            }
        };

        self.close(finished).await;
        self.state
    }

    async fn drive(&mut self) -> Result<(), SessionError> {
        self.announce().await?;
        self.deliver_status().await?;
        self.grace_wait().await
    }

    /// Offer MSSP. Failures are logged and otherwise ignored.
    async fn announce(&mut self) -> Result<(), SessionError> {
        let status = MsspStatus {
            name: self.settings.service_name.clone(),
            port: self.settings.port,
            started_at: self.settings.started_at,
        };
        let frames = handshake_frames(&status);

        let stream = &mut self.stream;
        best_effort(self.id, "handshake", async move {
            for frame in &frames {
                stream.write_all(frame).await?;
            }
            stream.flush().await
        })
        .await;

        self.transition(SessionState::Announced)
    }

    async fn deliver_status(&mut self) -> Result<(), SessionError> {
        let context = StatusContext {
            service_name: self.settings.service_name.clone(),
            contact: self.settings.contact.clone(),
            port: self.settings.port,
            timestamp: Local::now(),
            started_at: self.settings.started_at,
            grace_period: self.settings.grace_period,
        };
        let text = self.settings.composer.compose(&context);
        let text = to_crlf(&text);
        let bytes = self.settings.charset.encode(&text);

        self.stream.write_all(&bytes).await?;
        self.stream.flush().await?;

        self.transition(SessionState::PayloadSent)
    }

    async fn grace_wait(&mut self) -> Result<(), SessionError> {
        self.transition(SessionState::GraceWait)?;

        let deadline = Instant::now() + self.settings.grace_period;
        self.deadline = Some(deadline);
        tokio::time::sleep_until(deadline).await;

        Ok(())
    }

    /// Close the socket and leave the registry. The closing notice is only
    /// sent when the grace period ran out normally.
    async fn close(&mut self, send_notice: bool) {
        let stream = &mut self.stream;
        if send_notice {
            best_effort(self.id, "closing notice", async {
                stream.write_all(CLOSING_NOTICE).await?;
                stream.flush().await
            })
            .await;
        }
        best_effort(self.id, "shutdown", stream.shutdown()).await;

        self.state = SessionState::Closed;
        self.registry.remove(self.id).await;

        tracing::info!("Client disconnected: {} (session {})", self.peer, self.id);
    }
}

/// Await an optional protocol write, logging and discarding any failure.
async fn best_effort<F>(id: Uuid, what: &str, operation: F)
where
    F: Future<Output = std::io::Result<()>>,
{
    if let Err(e) = operation.await {
        tracing::debug!("Session {} {} failed (ignored): {}", id, what, e);
    }
}
