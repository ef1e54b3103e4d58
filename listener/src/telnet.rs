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

//! Telnet handshake for standby sessions
//!
//! A standby session offers MSSP so that MUD crawlers and listing sites can
//! still see the server while it is in maintenance. The handshake is purely
//! advisory: a client that does not understand it sees a few extra leading
//! bytes before the status text.

pub mod protocol;

use self::protocol::{
    TelnetCommand, TelnetOption, build_mssp_body, build_negotiation, build_subnegotiation,
};
use chrono::{DateTime, Local};

/// Server details published through MSSP
#[derive(Debug, Clone)]
pub struct MsspStatus {
    /// Name reported as `NAME`
    pub name: String,

    /// Listening port reported as `PORT`
    pub port: u16,

    /// Process start reported as `UPTIME` (unix seconds)
    pub started_at: DateTime<Local>,
}

impl MsspStatus {
    /// Variables in the order they are sent
    pub fn variables(&self) -> Vec<(&'static str, String)> {
        vec![
            ("NAME", self.name.clone()),
            ("PORT", self.port.to_string()),
            ("UPTIME", self.started_at.timestamp().to_string()),
            ("STATUS", "maintenance".to_string()),
        ]
    }
}

/// The three handshake frames, in wire order: `IAC WILL MSSP`,
/// `IAC DO MSSP`, then the MSSP subnegotiation.
pub fn handshake_frames(status: &MsspStatus) -> [Vec<u8>; 3] {
    let variables = status.variables();
    let body = build_mssp_body(variables.iter().map(|(k, v)| (*k, v.as_str())));

    [
        build_negotiation(TelnetCommand::WILL, TelnetOption::MSSP),
        build_negotiation(TelnetCommand::DO, TelnetOption::MSSP),
        build_subnegotiation(TelnetOption::MSSP, &body),
    ]
}
