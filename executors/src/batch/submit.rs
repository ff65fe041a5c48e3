use std::sync::Arc;

use alloy::{
    consensus::TxEnvelope,
    eips::eip2718::Encodable2718,
    primitives::{B256, Bytes},
};
use inscribe_core::{
    chain::LedgerClient, error::EngineError, signer::Account, transaction::TxRequest,
};
use tokio_util::sync::CancellationToken;

use super::{
    error_classifier::{BroadcastErrorMapper, RecoveryStrategy},
    profile::ErrorPolicy,
};

#[derive(Debug, Clone)]
pub enum SubmissionOutcome {
    Sent(B256),
    /// Rebuild and resend with the same nonce after a pause.
    Retryable(String),
    /// Stop this account, keep the batch going.
    SkipAccount(String),
    /// Stop the whole run.
    Fatal(EngineError),
}

/// Signs a [`TxRequest`] and hands it to the node.
pub struct TransactionSubmitter<L> {
    ledger: Arc<L>,
    policy: ErrorPolicy,
}

impl<L: LedgerClient> TransactionSubmitter<L> {
    pub fn new(ledger: Arc<L>, policy: ErrorPolicy) -> Self {
        Self { ledger, policy }
    }

    pub async fn submit(
        &self,
        request: &TxRequest,
        account: &Account,
        network_id: u64,
        cancel: &CancellationToken,
    ) -> SubmissionOutcome {
        let signed = match request
            .to_legacy(network_id)
            .and_then(|tx| account.sign_legacy(tx))
        {
            Ok(signed) => signed,
            Err(e) => return SubmissionOutcome::Fatal(e),
        };

        let signed_hash = *signed.hash();
        let raw = Bytes::from(TxEnvelope::from(signed).encoded_2718());

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(EngineError::Cancelled),
            result = self.ledger.send_raw_transaction(raw) => result,
        };

        let error = match result {
            Ok(hash) => {
                tracing::info!(nonce = request.nonce, tx_hash = %hash, "Transaction sent");
                return SubmissionOutcome::Sent(hash);
            }
            Err(error) if error.is_cancelled() => return SubmissionOutcome::Fatal(error),
            Err(error) => error,
        };

        let mapped = BroadcastErrorMapper::map_send_error(&error);
        match BroadcastErrorMapper::recovery_strategy(&mapped, self.policy) {
            RecoveryStrategy::RetrySameNonce => {
                tracing::warn!(nonce = request.nonce, error = %error, "Sequence conflict");
                SubmissionOutcome::Retryable(error.to_string())
            }
            RecoveryStrategy::TreatAsSent => {
                tracing::info!(
                    nonce = request.nonce,
                    tx_hash = %signed_hash,
                    "Transaction already pooled, counting it as sent"
                );
                SubmissionOutcome::Sent(signed_hash)
            }
            RecoveryStrategy::SkipAccount => {
                tracing::warn!(nonce = request.nonce, error = %error, "Node reports insufficient funds");
                SubmissionOutcome::SkipAccount(error.to_string())
            }
            RecoveryStrategy::AbortRun => {
                tracing::error!(nonce = request.nonce, error = %error, ?mapped, "Broadcast failed");
                SubmissionOutcome::Fatal(error)
            }
        }
    }
}
