use std::sync::Arc;

use alloy::primitives::{Address, B256};
use inscribe_core::{
    chain::LedgerClient, error::EngineError, retry::sleep, signer::Account,
    transaction::TxRequest,
};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::metrics;

use super::{
    balance::BalanceGuard,
    fee::FeeEstimator,
    nonce::{Convergence, NonceSequencer},
    plan::PlanSource,
    profile::PipelineProfile,
    submit::{SubmissionOutcome, TransactionSubmitter},
};

/// How an account task ended.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AccountStatus {
    Completed,
    NothingToDo,
    InsufficientFunds,
    NonceNotConverged,
    SequenceConflictsExhausted,
    /// Task-level failure; siblings keep running.
    Failed { error: EngineError },
    /// Run-level failure; the batch is being shut down.
    Aborted { error: EngineError },
    Cancelled,
}

impl AccountStatus {
    /// Maps an error that ends only this task.
    fn from_task_error(error: EngineError) -> Self {
        if error.is_cancelled() {
            AccountStatus::Cancelled
        } else {
            AccountStatus::Failed { error }
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AccountStatus::Completed => "completed",
            AccountStatus::NothingToDo => "nothing_to_do",
            AccountStatus::InsufficientFunds => "insufficient_funds",
            AccountStatus::NonceNotConverged => "nonce_not_converged",
            AccountStatus::SequenceConflictsExhausted => "sequence_conflicts_exhausted",
            AccountStatus::Failed { .. } => "failed",
            AccountStatus::Aborted { .. } => "aborted",
            AccountStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            AccountStatus::Failed { .. } | AccountStatus::Aborted { .. }
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountReport {
    pub index: u32,
    pub address: Address,
    pub sent: Vec<B256>,
    #[serde(flatten)]
    pub status: AccountStatus,
}

impl AccountReport {
    pub fn cancelled(account: &Account) -> Self {
        Self {
            index: account.index,
            address: account.address(),
            sent: Vec::new(),
            status: AccountStatus::Cancelled,
        }
    }
}

/// Drives one account through plan, nonce init and the send loop.
pub struct AccountWorker<L, P> {
    pub ledger: Arc<L>,
    pub planner: Arc<P>,
    pub profile: Arc<PipelineProfile>,
    pub network_id: u64,
    pub cancel: CancellationToken,
}

impl<L, P> AccountWorker<L, P>
where
    L: LedgerClient,
    P: PlanSource,
{
    #[tracing::instrument(
        name = "account",
        skip_all,
        fields(account_index = account.index, address = %account.address())
    )]
    pub async fn run(&self, account: Account) -> AccountReport {
        let mut sent = Vec::new();
        let status = match self.drive(&account, &mut sent).await {
            Ok(status) => status,
            Err(error) => AccountStatus::Aborted { error },
        };

        match &status {
            AccountStatus::Failed { error } => {
                tracing::error!(sent = sent.len(), error = %error, "Account task failed")
            }
            AccountStatus::Aborted { error } => {
                tracing::error!(sent = sent.len(), error = %error, "Account task aborted the run")
            }
            status => tracing::info!(sent = sent.len(), status = status.label(), "Account finished"),
        }
        metrics::record_account_finished(&self.profile.name, status.label());

        AccountReport {
            index: account.index,
            address: account.address(),
            sent,
            status,
        }
    }

    /// `Err` carries a run-fatal error. Everything else becomes a status.
    async fn drive(
        &self,
        account: &Account,
        sent: &mut Vec<B256>,
    ) -> Result<AccountStatus, EngineError> {
        let cancel = &self.cancel;
        let profile = &self.profile;

        let plan = match self.planner.plan(account, cancel).await {
            Ok(Some(plan)) => plan,
            Ok(None) => return Ok(AccountStatus::NothingToDo),
            Err(e) => return Ok(AccountStatus::from_task_error(e)),
        };

        let fees = FeeEstimator::new(self.ledger.clone(), profile.fee_buffer, profile.rpc_retry);
        let guard = BalanceGuard::new(self.ledger.clone(), profile.rpc_retry);
        let submitter = TransactionSubmitter::new(self.ledger.clone(), profile.error_policy);
        let mut nonce = NonceSequencer::new(
            self.ledger.clone(),
            account.address(),
            profile.rpc_retry,
            profile.confirmation,
        );

        if let Err(e) = nonce.init(cancel).await {
            return Ok(AccountStatus::from_task_error(e));
        }

        let quota = plan.quota as usize;
        let mut conflicts = 0;
        while sent.len() < quota {
            let quote = match fees.quote(cancel).await {
                Ok(quote) => quote,
                Err(e) => return Ok(AccountStatus::from_task_error(e)),
            };

            match guard
                .ensure_affordable(account.address(), quote.unit_price, profile.gas_limit, cancel)
                .await
            {
                Ok(true) => {}
                Ok(false) => return Ok(AccountStatus::InsufficientFunds),
                Err(e) => return Ok(AccountStatus::from_task_error(e)),
            }

            let request = TxRequest {
                nonce: nonce.current()?,
                to: plan.recipient,
                gas_limit: profile.gas_limit,
                gas_price: quote.unit_price,
                payload: plan.payload.clone(),
            };

            match submitter.submit(&request, account, self.network_id, cancel).await {
                SubmissionOutcome::Sent(hash) => {
                    conflicts = 0;
                    sent.push(hash);
                    metrics::record_transaction_sent(&profile.name);
                    tracing::info!(sent = sent.len(), quota, "Progress");

                    nonce.advance()?;
                    let started = Instant::now();
                    match nonce.converge(cancel).await {
                        Ok(Convergence::Advanced { .. }) => metrics::record_nonce_convergence(
                            &profile.name,
                            started.elapsed().as_secs_f64(),
                        ),
                        Ok(Convergence::Abandoned { .. }) => {
                            return Ok(AccountStatus::NonceNotConverged);
                        }
                        Err(e) => return Ok(AccountStatus::from_task_error(e)),
                    }
                }
                SubmissionOutcome::Retryable(reason) => {
                    conflicts += 1;
                    if conflicts >= profile.max_sequence_conflicts {
                        tracing::warn!(conflicts, reason = %reason, "Too many sequence conflicts, abandoning account");
                        return Ok(AccountStatus::SequenceConflictsExhausted);
                    }
                    if sleep(profile.conflict_delay, cancel).await.is_err() {
                        return Ok(AccountStatus::Cancelled);
                    }
                }
                SubmissionOutcome::SkipAccount(_) => return Ok(AccountStatus::InsufficientFunds),
                SubmissionOutcome::Fatal(error) if error.is_cancelled() => {
                    return Ok(AccountStatus::Cancelled);
                }
                SubmissionOutcome::Fatal(error) => return Err(error),
            }
        }

        Ok(AccountStatus::Completed)
    }
}
