//! `axe` binary: device info, restart, config, OTA, log cleanup, mock server.

use axe_cli::commands::{self, Cli, Command};
use axe_cli::server::{self, AppState};
use axe_client::{MockSystemClient, OtaTarget};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let cfg = cli.client_config()?;
    let mut stdout = std::io::stdout();

    match cli.command {
        Command::Info { json } => {
            let api = axe_client::connect(&cfg)?;
            commands::run_info(api.as_ref(), json, &mut stdout).await?;
        }
        Command::Restart => {
            let api = axe_client::connect(&cfg)?;
            commands::run_restart(api.as_ref(), &mut stdout).await?;
        }
        Command::Set(args) => {
            let api = axe_client::connect(&cfg)?;
            commands::run_set(api.as_ref(), args, &mut stdout).await?;
        }
        Command::Ota { file, www } => {
            let api = axe_client::connect(&cfg)?;
            let target = if www { OtaTarget::Www } else { OtaTarget::Firmware };
            commands::run_ota(api.as_ref(), file, target, &mut stdout).await?;
        }
        Command::Logs { frame } => {
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            commands::clean_logs(stdin, tokio::io::stdout(), frame).await?;
        }
        Command::ServeMock { listen, latency_ms } => {
            let mock = MockSystemClient::new(cfg.api_version)
                .with_latency(Duration::from_millis(latency_ms));
            let state = Arc::new(AppState {
                api: Arc::new(mock),
                version: cfg.api_version,
            });
            let app = server::router(state);
            tracing::info!(version = %cfg.api_version, "mock device listening on {}", listen);
            axum::serve(
                tokio::net::TcpListener::bind(listen).await?,
                app.into_make_service(),
            )
            .await?;
        }
    }
    Ok(())
}
