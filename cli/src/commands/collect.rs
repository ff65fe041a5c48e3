use std::sync::Arc;

use inscribe_core::{chain::LedgerConfig, signer::MnemonicDeriver};
use inscribe_executors::batch::{BatchOrchestrator, BatchSummary, CollectPlan};
use inscription_indexer::InscriptionIndexerBuilder;
use tokio_util::sync::CancellationToken;

use crate::{args::CollectArgs, config::CliConfig};

pub async fn run(
    args: CollectArgs,
    config: &CliConfig,
    cancel: &CancellationToken,
) -> anyhow::Result<BatchSummary> {
    let profile = config.profiles.collect.clone();
    let indexer = InscriptionIndexerBuilder::new(&config.indexer.url)?
        .with_timeout(config.indexer.request_timeout)
        .build()?;
    let planner = CollectPlan::new(indexer, &args.tick, args.collector, profile.rpc_retry)?;
    let deriver = MnemonicDeriver::new(args.range.mnemonic)?;
    let ledger = LedgerConfig {
        rpc_url: &args.rpc,
        request_timeout: config.rpc.request_timeout,
    }
    .to_ledger()?;

    tracing::info!(
        tick = %args.tick,
        collector = %args.collector,
        start_index = args.range.start_index,
        end_index = args.range.end_index,
        "Collecting"
    );

    let orchestrator =
        BatchOrchestrator::new(Arc::new(ledger), Arc::new(deriver), Arc::new(planner), profile);
    Ok(orchestrator
        .run(args.range.start_index, args.range.end_index, cancel)
        .await?)
}
