use inscribe_core::signer::MnemonicDeriver;
use inscribe_executors::reports::scan_balances;
use inscription_indexer::InscriptionIndexerBuilder;

use crate::{args::BalanceArgs, config::CliConfig};

pub async fn run(args: BalanceArgs, config: &CliConfig) -> anyhow::Result<()> {
    let range = &args.range;
    if range.start_index > range.end_index {
        anyhow::bail!(
            "start index {} is greater than end index {}",
            range.start_index,
            range.end_index
        );
    }

    let tick = args
        .tick
        .as_deref()
        .map(str::trim)
        .filter(|tick| !tick.is_empty());
    let deriver = MnemonicDeriver::new(range.mnemonic.clone())?;
    let indexer = InscriptionIndexerBuilder::new(&config.indexer.url)?
        .with_timeout(config.indexer.request_timeout)
        .build()?;

    let report = scan_balances(
        &indexer,
        &deriver,
        range.start_index,
        range.end_index,
        tick,
        config.indexer.balance_concurrency,
    )
    .await?;

    for account in &report.accounts {
        match tick {
            Some(tick) => tracing::info!(
                account_index = account.index,
                address = %account.address,
                tick,
                amount = account.amount_of(tick),
                "Balance"
            ),
            None if account.balances.is_empty() => tracing::info!(
                account_index = account.index,
                address = %account.address,
                "No balance"
            ),
            None => {
                for balance in &account.balances {
                    tracing::info!(
                        account_index = account.index,
                        address = %account.address,
                        tick = %balance.tick,
                        amount = balance.amount,
                        "Balance"
                    );
                }
            }
        }
    }

    for (tick, total) in &report.totals {
        tracing::info!(tick = %tick, total, "Total");
    }
    Ok(())
}
