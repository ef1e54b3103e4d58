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
use standby_bridge::{
    Arguments, BridgeConfig, BridgeExit, CrosstermTerminal, connect, run_session,
};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
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

    // Raw mode output shares the terminal, so only errors reach stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("error")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(true)
        .with_level(true)
        .with_ansi(false)
        .init();

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Unable to start runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let code = runtime.block_on(bridge(arguments));

    // A blocking stdin read may still be parked on the blocking pool
    runtime.shutdown_background();
    code
}

async fn bridge(arguments: Arguments) -> ExitCode {
    let config = BridgeConfig::default();

    let socket = match connect(&arguments.host, arguments.port, config.connect_timeout).await {
        Ok(socket) => socket,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    println!("Connected to {}:{}", arguments.host, arguments.port);

    let outcome = run_session(
        socket,
        tokio::io::stdin(),
        tokio::io::stdout(),
        CrosstermTerminal,
        &config,
    )
    .await;

    match outcome {
        Ok(BridgeExit::RemoteClosed) => {
            tracing::info!("Remote closed the connection");
            ExitCode::SUCCESS
        }
        Ok(BridgeExit::UserExit) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Session ended with error: {}", e);
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
