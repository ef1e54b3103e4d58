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

//! Error types for the terminal bridge

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BridgeError {
    /// The TCP connection could not be established
    #[error("Error connecting to {host}:{port}: {source}")]
    Connection {
        host: String,
        port: u16,
        #[source]
        source: std::io::Error,
    },

    /// The local terminal could not be switched into or out of raw mode
    #[error("Terminal error: {0}")]
    Terminal(#[source] std::io::Error),

    /// Reading or writing either side of the relay failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
