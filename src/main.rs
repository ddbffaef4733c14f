// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tokio::time::Instant;
use tracing_subscriber::EnvFilter;

use alpaca_hub::config::ServerConfig;
use alpaca_hub::protocol::Server;

/// Alpaca Hub - ASCOM Alpaca device server
#[derive(Parser)]
#[command(name = "alpaca-hub", version, about)]
struct Cli {
    /// Configuration file (TOML); one simulator of each type when omitted
    #[arg(short, long, env = "ALPACA_HUB_CONFIG")]
    config: Option<PathBuf>,

    /// Port to listen on, overriding the configuration file
    #[arg(long, env = "ALPACA_HUB_PORT")]
    port: Option<u16>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "info,alpaca_hub=info",
        1 => "info,alpaca_hub=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = match &cli.config {
        Some(path) => ServerConfig::load(path)?,
        None => ServerConfig::default(),
    };
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    let registry = config.build_registry(Instant::now());
    tracing::info!(
        devices = registry.len(),
        addr = %config.socket_addr(),
        "starting alpaca hub"
    );

    let server = Server::bind(config.socket_addr(), registry, config.listener_options()).await?;
    let registry = server
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!(error = %e, "cannot listen for ctrl-c");
                std::future::pending::<()>().await;
            }
            tracing::info!("shutdown requested");
        })
        .await;

    registry.log_usage();
    Ok(())
}
