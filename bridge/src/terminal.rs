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

//! Local terminal mode control
//!
//! The bridge needs the controlling terminal in raw mode (no line buffering,
//! no local echo) for the whole session and must put it back exactly as it
//! found it on every exit path. [`RawModeGuard`] owns that responsibility.

use crate::error::BridgeError;
use std::io;

/// Something whose input mode can be switched to raw and back
pub trait TerminalMode {
    /// Capture the current mode and switch to raw, no-echo input
    fn enter_raw(&mut self) -> io::Result<()>;

    /// Restore the mode captured by [`TerminalMode::enter_raw`]
    fn restore(&mut self) -> io::Result<()>;
}

/// The process's controlling terminal, driven through crossterm
///
/// crossterm keeps the original termios settings from `enable_raw_mode` and
/// puts them back on `disable_raw_mode`.
#[derive(Debug, Default, Clone, Copy)]
pub struct CrosstermTerminal;

impl TerminalMode for CrosstermTerminal {
    fn enter_raw(&mut self) -> io::Result<()> {
        crossterm::terminal::enable_raw_mode()
    }

    fn restore(&mut self) -> io::Result<()> {
        crossterm::terminal::disable_raw_mode()
    }
}

/// Keeps a terminal in raw mode for as long as it is alive.
///
/// The saved mode is restored exactly once, either by [`RawModeGuard::release`]
/// or when the guard is dropped (including during unwinding).
pub struct RawModeGuard<T: TerminalMode> {
    terminal: T,
    active: bool,
}

impl<T: TerminalMode> RawModeGuard<T> {
    /// Switch `terminal` to raw mode
    pub fn acquire(mut terminal: T) -> Result<Self, BridgeError> {
        terminal.enter_raw().map_err(BridgeError::Terminal)?;
        tracing::debug!("Terminal switched to raw mode");
        Ok(Self {
            terminal,
            active: true,
        })
    }

    /// Restore the terminal now, reporting any failure
    pub fn release(mut self) -> Result<(), BridgeError> {
        self.restore_once().map_err(BridgeError::Terminal)
    }

    fn restore_once(&mut self) -> io::Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        tracing::debug!("Restoring terminal mode");
        self.terminal.restore()
    }
}

impl<T: TerminalMode> Drop for RawModeGuard<T> {
    fn drop(&mut self) {
        if let Err(e) = self.restore_once() {
            tracing::error!("Failed to restore terminal mode: {}", e);
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::TerminalMode;
    use std::io;
    use std::sync::{Arc, Mutex};

    /// Terminal fake that records every mode change
    #[derive(Debug, Clone, Default)]
    pub struct RecordingTerminal {
        pub events: Arc<Mutex<Vec<&'static str>>>,
        pub fail_enter: bool,
    }

    impl RecordingTerminal {
        pub fn events(&self) -> Vec<&'static str> {
            self.events.lock().unwrap().clone()
        }
    }

    impl TerminalMode for RecordingTerminal {
        fn enter_raw(&mut self) -> io::Result<()> {
            if self.fail_enter {
                return Err(io::Error::other("not a terminal"));
            }
            self.events.lock().unwrap().push("raw");
            Ok(())
        }

        fn restore(&mut self) -> io::Result<()> {
            self.events.lock().unwrap().push("restore");
            Ok(())
        }
    }
}
