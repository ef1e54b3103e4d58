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

//! Registry of live standby sessions
//!
//! The registry is the only state shared between the accept loop and the
//! session tasks. Admission (capacity check plus insert) happens under a
//! single lock so concurrent accepts can never push it past capacity.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::net::SocketAddr;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// A session as seen by the registry
#[derive(Debug, Clone)]
pub struct SessionEntry {
    /// Session ID
    pub id: Uuid,

    /// Remote address of the peer
    pub peer: SocketAddr,

    /// When the connection was accepted
    pub accepted_at: DateTime<Utc>,

    cancel: CancellationToken,
}

/// Proof of admission handed to a new session
#[derive(Debug, Clone)]
pub struct Admission {
    pub id: Uuid,
    pub accepted_at: DateTime<Utc>,

    /// Fires when the listener force-closes the session
    pub cancel: CancellationToken,
}

#[derive(Debug, Default)]
struct RegistryState {
    sessions: HashMap<Uuid, SessionEntry>,
    closed: bool,
}

/// Bounded set of live sessions
#[derive(Debug)]
pub struct Registry {
    state: Mutex<RegistryState>,
    max_connections: usize,
    shutdown: CancellationToken,
}

impl Registry {
    /// Create a new registry holding at most `max_connections` sessions
    pub fn new(max_connections: usize) -> Self {
        Self::with_shutdown(max_connections, CancellationToken::new())
    }

    /// Create a registry whose session tokens are children of `shutdown`,
    /// so cancelling it cancels every admitted session.
    pub fn with_shutdown(max_connections: usize, shutdown: CancellationToken) -> Self {
        Self {
            state: Mutex::new(RegistryState::default()),
            max_connections,
            shutdown,
        }
    }

    pub fn max_connections(&self) -> usize {
        self.max_connections
    }

    /// Register a new session if there is room.
    ///
    /// Returns `None` when the registry is full or has been closed.
    pub async fn try_admit(&self, peer: SocketAddr) -> Option<Admission> {
        let mut state = self.state.lock().await;
        if state.closed || state.sessions.len() >= self.max_connections {
            return None;
        }

        let entry = SessionEntry {
            id: Uuid::new_v4(),
            peer,
            accepted_at: Utc::now(),
            cancel: self.shutdown.child_token(),
        };
        let admission = Admission {
            id: entry.id,
            accepted_at: entry.accepted_at,
            cancel: entry.cancel.clone(),
        };
        state.sessions.insert(entry.id, entry);

        Some(admission)
    }

    /// Remove a session. Removing an unknown or already removed session is a
    /// no-op and returns `false`.
    pub async fn remove(&self, id: Uuid) -> bool {
        self.state.lock().await.sessions.remove(&id).is_some()
    }

    /// Number of live sessions
    pub async fn len(&self) -> usize {
        self.state.lock().await.sessions.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Snapshot of the live sessions
    pub async fn sessions(&self) -> Vec<SessionEntry> {
        self.state.lock().await.sessions.values().cloned().collect()
    }

    /// Cancel every live session, clear the registry and refuse further
    /// admissions. Returns how many sessions were cancelled.
    pub async fn close_all(&self) -> usize {
        let mut state = self.state.lock().await;
        state.closed = true;

        let count = state.sessions.len();
        for (_, entry) in state.sessions.drain() {
            tracing::debug!("Force closing session {} ({})", entry.id, entry.peer);
            entry.cancel.cancel();
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn peer(port: u16) -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], port))
    }

    #[tokio::test]
    async fn test_admit_up_to_capacity() {
        let registry = Registry::new(2);

        assert!(registry.try_admit(peer(1)).await.is_some());
        assert!(registry.try_admit(peer(2)).await.is_some());
        assert!(registry.try_admit(peer(3)).await.is_none());
        assert_eq!(registry.len().await, 2);
    }

    #[tokio::test]
    async fn test_remove_frees_capacity() {
        let registry = Registry::new(1);

        let admission = registry.try_admit(peer(1)).await.unwrap();
        assert!(registry.try_admit(peer(2)).await.is_none());

        assert!(registry.remove(admission.id).await);
        assert!(registry.is_empty().await);
        assert!(registry.try_admit(peer(2)).await.is_some());
    }

    #[tokio::test]
    async fn test_remove_twice_is_noop() {
        let registry = Registry::new(1);
        let admission = registry.try_admit(peer(1)).await.unwrap();

        assert!(registry.remove(admission.id).await);
        assert!(!registry.remove(admission.id).await);
        assert!(!registry.remove(Uuid::new_v4()).await);
    }

    #[tokio::test]
    async fn test_close_all_cancels_and_clears() {
        let registry = Registry::new(4);
        let first = registry.try_admit(peer(1)).await.unwrap();
        let second = registry.try_admit(peer(2)).await.unwrap();

        assert_eq!(registry.close_all().await, 2);
        assert!(first.cancel.is_cancelled());
        assert!(second.cancel.is_cancelled());
        assert!(registry.is_empty().await);

        // Closed registries admit nothing and closing again is harmless
        assert!(registry.try_admit(peer(3)).await.is_none());
        assert_eq!(registry.close_all().await, 0);

        // Late removal by a session task after shutdown is a no-op
        assert!(!registry.remove(first.id).await);
    }

    #[tokio::test]
    async fn test_shutdown_token_cancels_sessions() {
        let shutdown = CancellationToken::new();
        let registry = Registry::with_shutdown(2, shutdown.clone());
        let first = registry.try_admit(peer(1)).await.unwrap();
        let second = registry.try_admit(peer(2)).await.unwrap();

        first.cancel.cancel();
        assert!(!shutdown.is_cancelled());
        assert!(!second.cancel.is_cancelled());

        shutdown.cancel();
        assert!(second.cancel.is_cancelled());
    }

    #[tokio::test]
    async fn test_sessions_snapshot() {
        let registry = Registry::new(4);
        let admission = registry.try_admit(peer(7)).await.unwrap();

        let sessions = registry.sessions().await;
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].id, admission.id);
        assert_eq!(sessions[0].peer, peer(7));
        assert_eq!(sessions[0].accepted_at, admission.accepted_at);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_admission_never_exceeds_capacity() {
        let registry = Arc::new(Registry::new(5));

        let mut handles = Vec::new();
        for port in 0..50u16 {
            let registry = registry.clone();
            handles.push(tokio::spawn(async move {
                registry.try_admit(peer(port)).await.is_some()
            }));
        }

        let mut admitted = 0;
        for handle in handles {
            if handle.await.unwrap() {
                admitted += 1;
            }
        }

        assert_eq!(admitted, 5);
        assert_eq!(registry.len().await, 5);
    }
}
