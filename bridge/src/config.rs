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

use clap::Parser;
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(
    version,
    about = "Connect the local terminal to a remote telnet-style service",
    long_about = None
)]
pub struct Arguments {
    #[arg(help = "Remote host name or address")]
    pub host: String,

    #[arg(
        help = "Remote port",
        value_parser = clap::value_parser!(u16).range(1..)
    )]
    pub port: u16,
}

/// Tuning for the relay loop
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Longest a single readiness wait may block
    pub poll_interval: Duration,

    /// Largest chunk read from the socket at once
    pub buffer_size: usize,

    /// How long to wait for the TCP handshake
    pub connect_timeout: Duration,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
            buffer_size: 4096,
            connect_timeout: Duration::from_secs(10),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bridge_config_default() {
        let config = BridgeConfig::default();
        assert_eq!(config.poll_interval, Duration::from_millis(100));
        assert_eq!(config.buffer_size, 4096);
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_arguments_parse() {
        let arguments = Arguments::try_parse_from(["standby-bridge", "localhost", "4848"]).unwrap();
        assert_eq!(arguments.host, "localhost");
        assert_eq!(arguments.port, 4848);
    }

    #[test]
    fn test_arguments_reject_bad_port() {
        assert!(Arguments::try_parse_from(["standby-bridge", "localhost", "telnet"]).is_err());
        assert!(Arguments::try_parse_from(["standby-bridge", "localhost", "0"]).is_err());
        assert!(Arguments::try_parse_from(["standby-bridge", "localhost", "65536"]).is_err());
    }

    #[test]
    fn test_arguments_require_host_and_port() {
        assert!(Arguments::try_parse_from(["standby-bridge"]).is_err());
        assert!(Arguments::try_parse_from(["standby-bridge", "localhost"]).is_err());
    }
}
