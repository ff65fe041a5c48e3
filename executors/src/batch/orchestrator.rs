use std::{collections::HashMap, sync::Arc};

use alloy::primitives::Address;
use inscribe_core::{
    chain::LedgerClient,
    error::EngineError,
    retry::retry,
    signer::{Account, AccountDeriver},
};
use serde::{Deserialize, Serialize};
use tokio::{sync::Semaphore, task::JoinSet};
use tokio_util::sync::CancellationToken;

use super::{
    error::BatchError,
    plan::PlanSource,
    profile::PipelineProfile,
    worker::{AccountReport, AccountStatus, AccountWorker},
};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    pub reports: Vec<AccountReport>,
    pub fatal: Option<BatchError>,
}

impl BatchSummary {
    pub fn total_sent(&self) -> usize {
        self.reports.iter().map(|r| r.sent.len()).sum()
    }

    pub fn count(&self, label: &str) -> usize {
        self.reports
            .iter()
            .filter(|r| r.status.label() == label)
            .count()
    }

    /// False when the run aborted or any account failed.
    pub fn is_success(&self) -> bool {
        self.fatal.is_none() && !self.reports.iter().any(|r| r.status.is_failure())
    }
}

/// Runs one account task per index over a shared ledger.
pub struct BatchOrchestrator<L, D, P> {
    ledger: Arc<L>,
    deriver: Arc<D>,
    planner: Arc<P>,
    profile: Arc<PipelineProfile>,
}

impl<L, D, P> BatchOrchestrator<L, D, P>
where
    L: LedgerClient + 'static,
    D: AccountDeriver,
    P: PlanSource + 'static,
{
    pub fn new(ledger: Arc<L>, deriver: Arc<D>, planner: Arc<P>, profile: PipelineProfile) -> Self {
        Self {
            ledger,
            deriver,
            planner,
            profile: Arc::new(profile),
        }
    }

    /// Processes every index in `start..=end`. Cancelling `cancel` stops all
    /// tasks at their next suspension point.
    #[tracing::instrument(skip(self, cancel), fields(profile = %self.profile.name))]
    pub async fn run(
        &self,
        start: u32,
        end: u32,
        cancel: &CancellationToken,
    ) -> Result<BatchSummary, BatchError> {
        if start > end {
            return Err(BatchError::configuration(format!(
                "start index {start} is greater than end index {end}"
            )));
        }
        if self.profile.max_concurrency == Some(0) {
            return Err(BatchError::configuration("max_concurrency must be at least 1"));
        }

        let accounts = (start..=end)
            .map(|index| self.deriver.derive(index))
            .collect::<Result<Vec<Account>, EngineError>>()
            .map_err(|e| BatchError::configuration(e.to_string()))?;

        let network_id = retry(self.profile.rpc_retry, cancel, "net_version", || {
            self.ledger.network_id()
        })
        .await
        .map_err(|error| BatchError::NetworkId { error })?;
        tracing::info!(network_id, accounts = accounts.len(), "Starting batch");

        let run_cancel = cancel.child_token();
        let semaphore = self
            .profile
            .max_concurrency
            .map(|permits| Arc::new(Semaphore::new(permits)));

        let mut tasks = JoinSet::new();
        let mut owners: HashMap<tokio::task::Id, (u32, Address)> = HashMap::new();

        for account in accounts {
            let worker = AccountWorker {
                ledger: self.ledger.clone(),
                planner: self.planner.clone(),
                profile: self.profile.clone(),
                network_id,
                cancel: run_cancel.clone(),
            };
            let semaphore = semaphore.clone();
            let owner = (account.index, account.address());

            let handle = tasks.spawn(async move {
                let _permit = match semaphore {
                    Some(semaphore) => tokio::select! {
                        biased;
                        _ = worker.cancel.cancelled() => return AccountReport::cancelled(&account),
                        permit = semaphore.acquire_owned() => permit.ok(),
                    },
                    None => None,
                };
                worker.run(account).await
            });
            owners.insert(handle.id(), owner);
        }

        let mut reports = Vec::with_capacity(owners.len());
        let mut fatal = None;

        while let Some(joined) = tasks.join_next_with_id().await {
            let report = match joined {
                Ok((_, report)) => report,
                Err(join_error) => {
                    let (index, address) = owners
                        .get(&join_error.id())
                        .copied()
                        .unwrap_or((0, Address::ZERO));
                    AccountReport {
                        index,
                        address,
                        sent: Vec::new(),
                        status: AccountStatus::Aborted {
                            error: EngineError::InternalError {
                                message: format!("account task panicked: {join_error}"),
                            },
                        },
                    }
                }
            };

            if let AccountStatus::Aborted { error } = &report.status {
                if fatal.is_none() {
                    tracing::error!(
                        account_index = report.index,
                        error = %error,
                        "Fatal error, cancelling remaining accounts"
                    );
                    fatal = Some(BatchError::Fatal {
                        index: report.index,
                        address: report.address,
                        error: error.clone(),
                    });
                    run_cancel.cancel();
                }
            }
            reports.push(report);
        }

        reports.sort_by_key(|r| r.index);
        let summary = BatchSummary { reports, fatal };
        tracing::info!(
            total_sent = summary.total_sent(),
            completed = summary.count("completed"),
            insufficient_funds = summary.count("insufficient_funds"),
            failed = summary.count("failed"),
            cancelled = summary.count("cancelled"),
            "Batch finished"
        );
        Ok(summary)
    }
}
