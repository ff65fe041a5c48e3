use inscribe_executors::reports::{TickSort, fetch_all_ticks, sort_ticks};
use inscription_indexer::InscriptionIndexerBuilder;

use crate::{args::TicksArgs, config::CliConfig};

pub async fn run(args: TicksArgs, config: &CliConfig) -> anyhow::Result<()> {
    let sort = TickSort::from_flags(
        args.sort_by_deployed_time,
        args.sort_by_minting_progress,
        args.sort_by_holders,
    );
    let indexer = InscriptionIndexerBuilder::new(&config.indexer.url)?
        .with_timeout(config.indexer.request_timeout)
        .build()?;

    let mut ticks = fetch_all_ticks(&indexer, config.indexer.page_size).await?;
    if ticks.is_empty() {
        tracing::info!("No ticks listed");
        return Ok(());
    }

    sort_ticks(&mut ticks, sort);
    tracing::info!(?sort, count = ticks.len(), "Ticks");
    for tick in &ticks {
        tracing::info!(
            tick = %tick.tick,
            holders = tick.holder_count,
            progress = tick.progress,
            deployed = %tick.deploy_time.to_rfc3339(),
            "Tick"
        );
    }
    Ok(())
}
