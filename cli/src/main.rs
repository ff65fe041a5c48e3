use std::process::ExitCode;

use clap::Parser;
use inscribe_cli::{args::Cli, commands, config};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{filter::EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let config = config::get_config()?;

    let subscriber = tracing_subscriber::registry().with(
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "inscribe=info,inscribe_cli=info,inscribe_executors=info,inscribe_core=info,inscription_indexer=info"
                .into()
        }),
    );

    match config.log_format {
        config::LogFormat::Json => subscriber
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        config::LogFormat::Pretty => subscriber.with(tracing_subscriber::fmt::layer()).init(),
    }

    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl+C: {}", e);
            return;
        }
        tracing::info!("Shutdown signal received, cancelling in-flight accounts");
        shutdown.cancel();
    });

    let metrics_file = cli.metrics_file.clone();
    let success = match commands::run(cli, &config, cancel).await {
        Ok(success) => success,
        Err(e) => {
            tracing::error!("{:#}", e);
            false
        }
    };

    if let Some(path) = metrics_file {
        match inscribe_executors::metrics::export_default_metrics() {
            Ok(text) => {
                if let Err(e) = tokio::fs::write(&path, text).await {
                    tracing::warn!(path = %path.display(), "Failed to write metrics: {}", e);
                }
            }
            Err(e) => tracing::warn!("Failed to export metrics: {}", e),
        }
    }

    Ok(if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
