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

//! Status text shown to connecting clients
//!
//! The text itself comes from a [`StatusComposer`]; this module only owns
//! the default maintenance notice and the conversion of text to wire bytes.

use crate::telnet::protocol::ansi;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::time::Duration;

/// Sent to a connection turned away because the listener is at capacity
pub const BUSY_NOTICE: &[u8] = b"Server is busy. Please try again later.\r\n";

/// Sent when a session's grace period runs out
pub const CLOSING_NOTICE: &[u8] = b"\r\nConnection closed.\r\n";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Character encoding used for status text
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Charset {
    #[default]
    Utf8,
    /// ISO-8859-1; characters outside it are replaced with `?`
    Latin1,
}

impl Charset {
    /// Encode text for the wire. Never fails: Latin-1 substitutes what it
    /// cannot represent.
    pub fn encode<'a>(&self, text: &'a str) -> Cow<'a, [u8]> {
        match self {
            Charset::Utf8 => Cow::Borrowed(text.as_bytes()),
            Charset::Latin1 => Cow::Owned(
                text.chars()
                    .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
                    .collect(),
            ),
        }
    }
}

/// Everything a composer may put in the status text
#[derive(Debug, Clone)]
pub struct StatusContext {
    pub service_name: String,
    pub contact: String,
    pub port: u16,
    pub timestamp: DateTime<Local>,
    pub started_at: DateTime<Local>,
    pub grace_period: Duration,
}

/// Produces the human readable status text for a session
pub trait StatusComposer: Send + Sync {
    fn compose(&self, context: &StatusContext) -> String;
}

/// Default notice shown while the main server is down
#[derive(Debug, Default, Clone, Copy)]
pub struct MaintenanceNotice;

impl StatusComposer for MaintenanceNotice {
    fn compose(&self, context: &StatusContext) -> String {
        use ansi::fg;

        let rule = "\u{2550}".repeat(79);
        let label = |name: &str| format!("{}{}{}:{}", ansi::BOLD, fg::YELLOW, name, ansi::RESET);

        let mut text = String::new();
        text.push('\n');
        text.push_str(&format!("{}{}{}{}\n", ansi::BOLD, fg::CYAN, rule, ansi::RESET));
        text.push_str(&format!(
            "{}{}{:^79}{}\n",
            ansi::BOLD,
            fg::YELLOW,
            format!("{} - Server Status", context.service_name),
            ansi::RESET
        ));
        text.push_str(&format!("{}{}{}{}\n\n", ansi::BOLD, fg::CYAN, rule, ansi::RESET));
        text.push_str(&format!(
            "{}{}SERVER TEMPORARILY UNAVAILABLE{}\n\n",
            ansi::BOLD,
            fg::RED,
            ansi::RESET
        ));
        text.push_str(
            "The main game server is currently down for maintenance or experiencing\n\
             technical difficulties. Our administrators have been notified and are\n\
             working to restore service.\n\n",
        );
        text.push_str(&format!(
            "{}{}What you can do:{}\n",
            ansi::BOLD,
            fg::GREEN,
            ansi::RESET
        ));
        text.push_str("\u{2022} Check back in a few minutes\n");
        text.push_str("\u{2022} Visit our website for updates\n");
        if !context.contact.is_empty() {
            text.push_str(&format!(
                "\u{2022} Contact us for urgent issues: {}\n",
                context.contact
            ));
        }
        text.push('\n');
        text.push_str(&format!(
            "{} Maintenance Mode (Fallback Active)\n",
            label("Server Status")
        ));
        text.push_str(&format!("{} {}\n", label("Port"), context.port));
        text.push_str(&format!(
            "{} {}\n",
            label("Last Update"),
            format_timestamp(&context.timestamp)
        ));
        text.push_str(&format!(
            "{} Online since {}\n\n",
            label("Fallback Server"),
            format_timestamp(&context.started_at)
        ));
        text.push_str(&format!(
            "{}Connection will close in {} seconds...{}\n\n",
            fg::BRIGHT_BLACK,
            context.grace_period.as_secs(),
            ansi::RESET
        ));
        text
    }
}

/// Convert bare `\n` line endings to the telnet `\r\n` form.
pub fn to_crlf(text: &str) -> Cow<'_, str> {
    if !text.contains('\n') {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len() + text.len() / 16);
    let mut previous = '\0';
    for c in text.chars() {
        if c == '\n' && previous != '\r' {
            out.push('\r');
        }
        out.push(c);
        previous = c;
    }
    Cow::Owned(out)
}

/// Format a timestamp the way the status text does
pub fn format_timestamp(timestamp: &DateTime<Local>) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn context() -> StatusContext {
        StatusContext {
            service_name: "Test MUD".to_string(),
            contact: "staff@test.example".to_string(),
            port: 5000,
            timestamp: Local.with_ymd_and_hms(2026, 3, 4, 5, 6, 7).unwrap(),
            started_at: Local.with_ymd_and_hms(2026, 3, 4, 1, 2, 3).unwrap(),
            grace_period: Duration::from_secs(30),
        }
    }

    #[test]
    fn test_maintenance_notice_contents() {
        let text = MaintenanceNotice.compose(&context());
        assert!(text.contains("Test MUD - Server Status"));
        assert!(text.contains("SERVER TEMPORARILY UNAVAILABLE"));
        assert!(text.contains("5000"));
        assert!(text.contains("2026-03-04 05:06:07"));
        assert!(text.contains("Online since 2026-03-04 01:02:03"));
        assert!(text.contains("Connection will close in 30 seconds..."));
        assert!(text.contains("\u{2022} Contact us for urgent issues: staff@test.example\n"));
    }

    #[test]
    fn test_maintenance_notice_without_contact() {
        let context = StatusContext {
            contact: String::new(),
            ..context()
        };
        let text = MaintenanceNotice.compose(&context);
        assert!(!text.contains("Contact us"));
        assert!(text.contains("\u{2022} Visit our website for updates\n\n"));
    }

    #[test]
    fn test_utf8_encoding_is_verbatim() {
        let encoded = Charset::Utf8.encode("caf\u{e9} \u{2022}");
        assert_eq!(&*encoded, "caf\u{e9} \u{2022}".as_bytes());
    }

    #[test]
    fn test_latin1_encoding_substitutes() {
        let encoded = Charset::Latin1.encode("caf\u{e9} \u{2022} ok");
        assert_eq!(&*encoded, b"caf\xe9 ? ok");
    }

    #[test]
    fn test_charset_deserialize() {
        let charset: Charset = serde_yaml::from_str("latin1").unwrap();
        assert_eq!(charset, Charset::Latin1);
        let charset: Charset = serde_yaml::from_str("utf8").unwrap();
        assert_eq!(charset, Charset::Utf8);
    }

    #[test]
    fn test_to_crlf() {
        assert_eq!(to_crlf("a\nb\r\nc"), "a\r\nb\r\nc");
        assert_eq!(to_crlf("plain"), "plain");
        assert!(matches!(to_crlf("plain"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_format_timestamp() {
        let ts = Local.with_ymd_and_hms(2026, 10, 18, 23, 59, 1).unwrap();
        assert_eq!(format_timestamp(&ts), "2026-10-18 23:59:01");
    }
}
