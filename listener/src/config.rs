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

use crate::error::ConfigError;
use crate::status::Charset;
use clap::Parser;
use serde::{Deserialize, Serialize};
use serde_env_field::EnvField;
use std::net::{AddrParseError, IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

/// Port used when neither the command line nor the configuration names one
pub const DEFAULT_PORT: u16 = 4848;

#[derive(Debug, Default, Parser)]
#[command(
    version,
    about = "Standby telnet listener that shows a maintenance notice while the main server is down",
    long_about = None
)]
pub struct Arguments {
    #[arg(help = "Port number to listen on (default: 4848)")]
    pub port: Option<String>,

    #[arg(short = 'c', long = "config", help = "Path to configuration file")]
    pub config_file: Option<String>,

    #[arg(short = 'e', long = "env", help = "Path to environment file")]
    pub env_file: Option<String>,

    #[arg(
        short = 'm',
        long = "max-connections",
        help = "Maximum number of simultaneous sessions"
    )]
    pub max_connections: Option<usize>,
}

impl Arguments {
    /// A bare `help` positional is accepted alongside `-h` and `--help`.
    pub fn is_help_request(args: &[String]) -> bool {
        args.get(1).is_some_and(|arg| arg == "help")
    }

    /// Parse the positional port, if one was given
    pub fn port(&self) -> Result<Option<u16>, ConfigError> {
        self.port
            .as_deref()
            .map(|raw| {
                raw.parse::<u16>()
                    .map_err(|_| ConfigError::InvalidPort(raw.to_string()))
            })
            .transpose()
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Configuration {
    #[serde(default)]
    pub listener: ListenerConfig,
}

impl Configuration {
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        tracing::debug!("Loading configuration from file: {}", path);
        let file = std::fs::File::open(path).map_err(|source| ConfigError::Open {
            path: path.to_string(),
            source,
        })?;

        serde_yaml::from_reader(file).map_err(|source| ConfigError::Parse {
            path: path.to_string(),
            source,
        })
    }

    /// Build the effective listener configuration: file values (if a file
    /// was given) overridden by command line values.
    pub fn resolve(arguments: &Arguments) -> Result<ListenerConfig, ConfigError> {
        let mut config = match arguments.config_file.as_deref() {
            Some(path) => Configuration::load(path)?.listener,
            None => ListenerConfig::default(),
        };

        if let Some(port) = arguments.port()? {
            config.port = port;
        }
        if let Some(max_connections) = arguments.max_connections {
            config.max_connections = max_connections;
        }

        Ok(config)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ListenerConfig {
    /// Interface to listen on
    #[serde(default)]
    pub addr: EnvField<ListenerBinding>,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Maximum number of live sessions before new connections are turned away
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,

    /// Seconds a session stays open after the status text is sent
    #[serde(default = "default_grace_period")]
    pub grace_period: u64,

    /// Seconds shutdown waits for cancelled sessions before aborting them
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout: u64,

    /// Encoding used for the status text
    #[serde(default)]
    pub charset: Charset,

    /// Name shown in the status text and published through MSSP
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Where players can reach staff; omitted from the notice when empty
    #[serde(default = "default_contact")]
    pub contact: String,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_max_connections() -> usize {
    10
}

fn default_grace_period() -> u64 {
    30
}

fn default_shutdown_timeout() -> u64 {
    5
}

fn default_service_name() -> String {
    String::from("Star Wars Reality MUD")
}

fn default_contact() -> String {
    String::from("support@renegadeinc.net")
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            addr: Default::default(),
            port: default_port(),
            max_connections: default_max_connections(),
            grace_period: default_grace_period(),
            shutdown_timeout: default_shutdown_timeout(),
            charset: Charset::default(),
            service_name: default_service_name(),
            contact: default_contact(),
        }
    }
}

impl ListenerConfig {
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.addr.to_ip(), self.port)
    }

    pub fn grace_period(&self) -> Duration {
        Duration::from_secs(self.grace_period)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListenerBinding(IpAddr);

impl ListenerBinding {
    pub fn to_ip(&self) -> IpAddr {
        self.0
    }
}

impl FromStr for ListenerBinding {
    type Err = AddrParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(IpAddr::from_str(s)?))
    }
}

impl Default for ListenerBinding {
    fn default() -> Self {
        Self(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
    }
}

impl std::fmt::Display for ListenerBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
