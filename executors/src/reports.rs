use std::collections::BTreeMap;

use alloy::primitives::Address;
use futures::{StreamExt, TryStreamExt, stream};
use inscribe_core::{error::EngineError, signer::AccountDeriver};
use inscription_indexer::{
    InscriptionIndexer,
    types::{TickBalance, TickInfo, TicksBalance},
};
use serde::{Deserialize, Serialize};

/// Ordering for the tick listing. Always descending.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TickSort {
    #[default]
    DeployTime,
    MintingProgress,
    Holders,
}

impl TickSort {
    /// First set flag wins, in the order deploy time, progress, holders.
    pub fn from_flags(deploy_time: bool, minting_progress: bool, holders: bool) -> Self {
        if deploy_time {
            TickSort::DeployTime
        } else if minting_progress {
            TickSort::MintingProgress
        } else if holders {
            TickSort::Holders
        } else {
            TickSort::default()
        }
    }
}

pub fn sort_ticks(ticks: &mut [TickInfo], sort: TickSort) {
    match sort {
        TickSort::DeployTime => ticks.sort_by(|a, b| b.deploy_time.cmp(&a.deploy_time)),
        TickSort::MintingProgress => ticks.sort_by(|a, b| b.progress.total_cmp(&a.progress)),
        TickSort::Holders => ticks.sort_by(|a, b| b.holder_count.cmp(&a.holder_count)),
    }
}

/// Reads every page of the tick listing. Stops on the `last` flag, on the
/// page count reported by the indexer, or on a short or empty page.
pub async fn fetch_all_ticks(
    indexer: &InscriptionIndexer,
    page_size: u32,
) -> Result<Vec<TickInfo>, EngineError> {
    let mut ticks = Vec::new();
    let mut page = 0;
    loop {
        let listing = indexer
            .ticks(page, page_size)
            .await
            .map_err(|e| EngineError::IndexerError {
                message: e.to_string(),
            })?;

        let exhausted = listing.last
            || listing.content.is_empty()
            || (listing.total_pages > 0 && page + 1 >= listing.total_pages)
            || listing.content.len() < page_size as usize;
        ticks.extend(listing.content);
        if exhausted {
            return Ok(ticks);
        }
        page += 1;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountBalance {
    pub index: u32,
    pub address: Address,
    pub balances: Vec<TickBalance>,
}

impl AccountBalance {
    pub fn amount_of(&self, tick: &str) -> u64 {
        self.balances
            .iter()
            .filter(|b| b.tick.eq_ignore_ascii_case(tick))
            .map(|b| b.amount)
            .sum()
    }
}

/// Tick balances over an index range, with per-tick totals keyed by the
/// lowercase tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BalanceReport {
    pub accounts: Vec<AccountBalance>,
    pub totals: BTreeMap<String, u64>,
}

impl BalanceReport {
    /// Adds one account, keeping only `tick` when a filter is given.
    pub fn add(&mut self, index: u32, address: Address, balance: TicksBalance, tick: Option<&str>) {
        let balances: Vec<TickBalance> = balance
            .balances
            .into_iter()
            .filter(|b| tick.is_none_or(|t| b.tick.eq_ignore_ascii_case(t)))
            .collect();

        if let Some(tick) = tick {
            self.totals.entry(tick.to_lowercase()).or_default();
        }
        for entry in &balances {
            let total = self.totals.entry(entry.tick.to_lowercase()).or_default();
            *total = total.saturating_add(entry.amount);
        }

        self.accounts.push(AccountBalance {
            index,
            address,
            balances,
        });
    }
}

/// Fetches the balance of every account in `start..=end`, `concurrency`
/// requests at a time. Rows keep index order.
pub async fn scan_balances<D: AccountDeriver>(
    indexer: &InscriptionIndexer,
    deriver: &D,
    start: u32,
    end: u32,
    tick: Option<&str>,
    concurrency: usize,
) -> Result<BalanceReport, EngineError> {
    let addresses = (start..=end)
        .map(|index| deriver.derive(index).map(|a| (index, a.address())))
        .collect::<Result<Vec<_>, _>>()?;

    let fetched: Vec<(u32, Address, TicksBalance)> = stream::iter(addresses)
        .map(|(index, address)| async move {
            indexer
                .balance(address)
                .await
                .map(|balance| (index, address, balance))
                .map_err(|e| EngineError::IndexerError {
                    message: e.to_string(),
                })
        })
        .buffered(concurrency.max(1))
        .try_collect()
        .await?;

    let mut report = BalanceReport::default();
    for (index, address, balance) in fetched {
        report.add(index, address, balance, tick);
    }
    Ok(report)
}
