use std::sync::Arc;

use inscribe_core::{chain::LedgerConfig, signer::MnemonicDeriver};
use inscribe_executors::batch::{
    BatchOrchestrator, BatchSummary, MintPlan, PipelineProfile, payload::PayloadBuilder,
};
use tokio_util::sync::CancellationToken;

use crate::{args::MintArgs, config::CliConfig};

pub async fn run(
    args: MintArgs,
    profile: PipelineProfile,
    config: &CliConfig,
    cancel: &CancellationToken,
) -> anyhow::Result<BatchSummary> {
    // Everything here is validated before the first request goes out.
    let payload = PayloadBuilder::build(
        args.hex_content.as_deref().unwrap_or_default(),
        args.text_content.as_deref().unwrap_or_default(),
    )?;
    let planner = MintPlan::new(payload, args.per_address_minted)?;
    let deriver = MnemonicDeriver::new(args.range.mnemonic)?;
    let ledger = LedgerConfig {
        rpc_url: &args.rpc,
        request_timeout: config.rpc.request_timeout,
    }
    .to_ledger()?;

    tracing::info!(
        profile = %profile.name,
        start_index = args.range.start_index,
        end_index = args.range.end_index,
        per_address = args.per_address_minted,
        "Minting"
    );

    let orchestrator =
        BatchOrchestrator::new(Arc::new(ledger), Arc::new(deriver), Arc::new(planner), profile);
    Ok(orchestrator
        .run(args.range.start_index, args.range.end_index, cancel)
        .await?)
}
