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

use clap::{CommandFactory, Parser};
use std::process::ExitCode;
use standby_listener::status::format_timestamp;
use standby_listener::{Arguments, ConfigError, Configuration, StandbyListener};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    if Arguments::is_help_request(&args) {
        let _ = Arguments::command().print_help();
        return ExitCode::SUCCESS;
    }

    // Load arguments from the command line
    let arguments = match Arguments::try_parse() {
        Ok(arguments) => arguments,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    // Initialize tracing/logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_thread_ids(true)
        .with_level(true)
        .with_ansi(true)
        .init();

    // Load environment variables from .env file if specified
    if let Some(ref env_file) = arguments.env_file {
        if std::path::Path::new(env_file).exists() {
            tracing::debug!("Loading environment variables from file: {}", env_file);
            dotenv::from_filename(env_file).ok();
        }
    } else {
        tracing::debug!("Loading environment variables from default file");
        dotenv::dotenv().ok();
    }

    let config = match Configuration::resolve(&arguments) {
        Ok(config) => config,
        Err(e @ ConfigError::InvalidPort(_)) => {
            eprintln!("Error: {}", e);
            eprintln!("Usage: standby-listener [port]");
            return ExitCode::FAILURE;
        }
        Err(e) => {
            eprintln!("Configuration load error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    tracing::debug!("Configuration loaded: {:?}", config);

    let mut listener = match StandbyListener::bind(&config) {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("{}", e.diagnostic());
            return ExitCode::FAILURE;
        }
    };

    let settings = listener.settings();
    tracing::info!("{} standby listener", settings.service_name);
    tracing::info!("Port: {}", settings.port);
    tracing::info!("Max Connections: {}", config.max_connections);
    tracing::info!("Status: Main server is DOWN - Fallback active");
    tracing::info!("Started: {}", format_timestamp(&settings.started_at));

    let shutdown = listener.shutdown_token();
    tokio::spawn(async move {
        wait_for_signal().await;
        tracing::info!("Received shutdown signal...");
        shutdown.cancel();
    });

    listener.run().await;
    ExitCode::SUCCESS
}

/// Resolve on SIGINT or (on unix) SIGTERM
async fn wait_for_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = terminate.recv() => {}
                }
                return;
            }
            Err(e) => tracing::warn!("Unable to listen for SIGTERM: {}", e),
        }
    }

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Unable to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
