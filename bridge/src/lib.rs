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

//! Standby Bridge Library
//!
//! Connects the local terminal to a remote telnet-style service. Keystrokes
//! are forwarded byte by byte with the terminal in raw mode, and whatever the
//! remote sends is written straight back out. Ctrl-D ends the session.

pub mod bridge;
pub mod client;
pub mod config;
pub mod error;
pub mod terminal;

pub use bridge::{Bridge, BridgeExit};
pub use client::{connect, run_session};
pub use config::{Arguments, BridgeConfig};
pub use error::BridgeError;
pub use terminal::{CrosstermTerminal, RawModeGuard, TerminalMode};
