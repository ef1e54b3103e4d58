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

//! Error types for the standby listener

use crate::session::SessionState;
use thiserror::Error;

/// Failures that stop the listener from serving
#[derive(Debug, Error)]
pub enum ListenerError {
    /// The port is already bound by another process
    #[error("Port {port} is already in use")]
    AddressInUse { port: u16 },

    /// Any other failure while binding or listening
    #[error("Cannot bind to port {port}: {source}")]
    Bind {
        port: u16,
        #[source]
        source: std::io::Error,
    },
}

impl ListenerError {
    /// Operator-facing explanation printed when the listener cannot start
    pub fn diagnostic(&self) -> String {
        match self {
            ListenerError::AddressInUse { port } => format!(
                "Error: Port {port} is already in use.\n\
                 This usually means:\n\
                 \u{2022} Another MUD server is running on this port\n\
                 \u{2022} A previous fallback server is still running\n\
                 \u{2022} The main server is actually running\n\
                 \n\
                 Please check:\n  ps aux | grep {port}\n  ss -tlnp | grep :{port}\n"
            ),
            ListenerError::Bind { .. } => format!("Error: {self}"),
        }
    }
}

/// Failures inside a single session; never leave the session task
#[derive(Debug, Error)]
pub enum SessionError {
    /// Writing to or shutting down the peer failed
    #[error("Session I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A lifecycle step was attempted out of order
    #[error("Invalid session transition from {from:?} to {to:?}")]
    InvalidTransition { from: SessionState, to: SessionState },
}

/// Failures while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be opened
    #[error("Failed to open config file {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid YAML for [`crate::config::Configuration`]
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    /// The port given on the command line is not a number
    #[error("Port must be a number")]
    InvalidPort(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_in_use_diagnostic() {
        let err = ListenerError::AddressInUse { port: 4848 };
        let text = err.diagnostic();
        assert!(text.contains("Port 4848 is already in use"));
        assert!(text.contains("ss -tlnp | grep :4848"));
        assert!(text.contains("ps aux | grep 4848"));
    }

    #[test]
    fn test_bind_diagnostic_includes_cause() {
        let err = ListenerError::Bind {
            port: 23,
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(err.diagnostic(), "Error: Cannot bind to port 23: denied");
    }
}
