pub mod balance;
pub mod collect;
pub mod mint;
pub mod ticks;

use inscribe_executors::batch::{AccountStatus, BatchSummary};
use tokio_util::sync::CancellationToken;

use crate::{
    args::{Cli, Command},
    config::CliConfig,
};

/// Runs the selected command. `Ok(false)` means the command completed but
/// the run must exit non-zero.
pub async fn run(cli: Cli, config: &CliConfig, cancel: CancellationToken) -> anyhow::Result<bool> {
    match cli.command {
        Command::Mint(args) => {
            let summary = mint::run(args, config.profiles.mint.clone(), config, &cancel).await?;
            Ok(log_summary(&summary))
        }
        Command::AsyncMint(args) => {
            let summary =
                mint::run(args, config.profiles.async_mint.clone(), config, &cancel).await?;
            Ok(log_summary(&summary))
        }
        Command::Collect(args) => {
            let summary = collect::run(args, config, &cancel).await?;
            Ok(log_summary(&summary))
        }
        Command::Balance(args) => {
            balance::run(args, config).await?;
            Ok(true)
        }
        Command::Ticks(args) => {
            ticks::run(args, config).await?;
            Ok(true)
        }
    }
}

fn log_summary(summary: &BatchSummary) -> bool {
    for report in &summary.reports {
        match &report.status {
            AccountStatus::Failed { error } | AccountStatus::Aborted { error } => tracing::error!(
                account_index = report.index,
                address = %report.address,
                sent = report.sent.len(),
                status = report.status.label(),
                error = %error,
                "Account result"
            ),
            status => tracing::info!(
                account_index = report.index,
                address = %report.address,
                sent = report.sent.len(),
                status = status.label(),
                "Account result"
            ),
        }
    }

    if let Some(fatal) = &summary.fatal {
        tracing::error!(error = %fatal, "Run aborted");
    }
    tracing::info!(
        accounts = summary.reports.len(),
        total_sent = summary.total_sent(),
        "Run finished"
    );

    summary.is_success()
}
