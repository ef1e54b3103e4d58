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

//! Telnet protocol constants and utilities
//!
//! Only the subset needed to announce MSSP (MUD Server Status Protocol) to a
//! connecting client is modelled here. Incoming negotiation is never parsed.

/// Telnet command codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TelnetCommand {
    /// Interpret As Command
    IAC = 255,
    /// Do option
    DO = 253,
    /// Will do option
    WILL = 251,
    /// Subnegotiation begin
    SB = 250,
    /// Subnegotiation end
    SE = 240,
}

impl TelnetCommand {
    /// Convert command to byte
    pub fn to_byte(self) -> u8 {
        self as u8
    }
}

/// Telnet option codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TelnetOption {
    /// MSSP (MUD Server Status Protocol)
    MSSP = 70,
}

impl TelnetOption {
    /// Convert option to byte
    pub fn to_byte(self) -> u8 {
        self as u8
    }
}

/// MSSP variable marker
pub const MSSP_VAR: u8 = 1;

/// MSSP value marker
pub const MSSP_VAL: u8 = 2;

/// Build a telnet negotiation sequence
pub fn build_negotiation(command: TelnetCommand, option: TelnetOption) -> Vec<u8> {
    vec![
        TelnetCommand::IAC.to_byte(),
        command.to_byte(),
        option.to_byte(),
    ]
}

/// Build a telnet subnegotiation sequence
pub fn build_subnegotiation(option: TelnetOption, data: &[u8]) -> Vec<u8> {
    let mut result = vec![
        TelnetCommand::IAC.to_byte(),
        TelnetCommand::SB.to_byte(),
        option.to_byte(),
    ];

    // Escape IAC bytes in data
    for &byte in data {
        result.push(byte);
        if byte == TelnetCommand::IAC.to_byte() {
            result.push(byte);
        }
    }

    result.push(TelnetCommand::IAC.to_byte());
    result.push(TelnetCommand::SE.to_byte());

    result
}

/// Encode MSSP variables as a subnegotiation body.
///
/// Each pair becomes `MSSP_VAR name MSSP_VAL value`. The marker bytes are
/// stripped from names and values so a stray control byte cannot split a
/// pair.
pub fn build_mssp_body<'a, I>(variables: I) -> Vec<u8>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let clean = |text: &str| -> Vec<u8> {
        text.bytes()
            .filter(|&b| b != MSSP_VAR && b != MSSP_VAL)
            .collect()
    };

    let mut body = Vec::new();
    for (name, value) in variables {
        body.push(MSSP_VAR);
        body.extend(clean(name));
        body.push(MSSP_VAL);
        body.extend(clean(value));
    }
    body
}

/// ANSI color codes
pub mod ansi {
    /// Reset all attributes
    pub const RESET: &str = "\x1b[0m";

    /// Bold/bright
    pub const BOLD: &str = "\x1b[1m";

    /// Foreground colors
    pub mod fg {
        pub const RED: &str = "\x1b[31m";
        pub const GREEN: &str = "\x1b[32m";
        pub const YELLOW: &str = "\x1b[33m";
        pub const CYAN: &str = "\x1b[36m";
        pub const BRIGHT_BLACK: &str = "\x1b[90m";
    }
}
