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

//! Standby Listener Library
//!
//! A small telnet listener that stands in for a MUD while the main server is
//! down. Every connection is greeted with an MSSP handshake and a
//! maintenance notice, held open for a grace period and then closed.

pub mod config;
pub mod error;
pub mod listener;
pub mod registry;
pub mod session;
pub mod status;
pub mod telnet;

// Re-export commonly used types
pub use config::{Arguments, Configuration, ListenerConfig};
pub use error::{ConfigError, ListenerError, SessionError};
pub use listener::StandbyListener;
pub use registry::Registry;
pub use session::{Session, SessionSettings, SessionState};
pub use status::{Charset, MaintenanceNotice, StatusComposer, StatusContext};
