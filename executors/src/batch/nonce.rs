use std::sync::Arc;

use alloy::primitives::Address;
use inscribe_core::{
    chain::LedgerClient,
    error::EngineError,
    retry::{RetryPolicy, retry, sleep},
};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::profile::ConfirmationPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum NonceState {
    Uninitialized,
    /// Node agrees with `local`; the next transaction may be built.
    Active { local: u64 },
    /// A transaction was accepted; waiting for the node to reach `local`.
    Converging { local: u64 },
    /// The node never caught up.
    Abandoned { local: u64 },
}

impl NonceState {
    pub fn local(&self) -> Option<u64> {
        match self {
            NonceState::Uninitialized => None,
            NonceState::Active { local }
            | NonceState::Converging { local }
            | NonceState::Abandoned { local } => Some(*local),
        }
    }

    pub fn confirmed(&self) -> bool {
        matches!(self, NonceState::Active { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Convergence {
    Advanced { local: u64 },
    Abandoned { local: u64, remote: u64 },
}

/// Local nonce counter for a single account, kept in step with the node's
/// pending nonce.
pub struct NonceSequencer<L> {
    ledger: Arc<L>,
    address: Address,
    state: NonceState,
    retry: RetryPolicy,
    confirmation: ConfirmationPolicy,
}

impl<L: LedgerClient> NonceSequencer<L> {
    pub fn new(
        ledger: Arc<L>,
        address: Address,
        retry: RetryPolicy,
        confirmation: ConfirmationPolicy,
    ) -> Self {
        Self {
            ledger,
            address,
            state: NonceState::Uninitialized,
            retry,
            confirmation,
        }
    }

    pub fn state(&self) -> NonceState {
        self.state
    }

    /// The nonce the next transaction must carry.
    pub fn current(&self) -> Result<u64, EngineError> {
        match self.state {
            NonceState::Active { local } => Ok(local),
            other => Err(EngineError::InternalError {
                message: format!("nonce requested in state {other:?}"),
            }),
        }
    }

    pub async fn init(&mut self, cancel: &CancellationToken) -> Result<u64, EngineError> {
        let local = self.fetch_pending(cancel).await?;
        tracing::info!(nonce = local, "Initial nonce");
        self.state = NonceState::Active { local };
        Ok(local)
    }

    /// Records that the node accepted the transaction carrying the current nonce.
    pub fn advance(&mut self) -> Result<u64, EngineError> {
        let local = self.current()? + 1;
        self.state = NonceState::Converging { local };
        Ok(local)
    }

    /// Waits until the node's pending nonce equals `local`.
    pub async fn converge(
        &mut self,
        cancel: &CancellationToken,
    ) -> Result<Convergence, EngineError> {
        let NonceState::Converging { local } = self.state else {
            return Err(EngineError::InternalError {
                message: format!("converge called in state {:?}", self.state),
            });
        };

        let started = Instant::now();
        sleep(self.confirmation.post_send_delay, cancel).await?;

        let mut polls = 0;
        loop {
            let remote = self.fetch_pending(cancel).await?;
            if remote == local {
                tracing::debug!(
                    nonce = local,
                    elapsed_secs = started.elapsed().as_secs_f64(),
                    "Node nonce caught up"
                );
                self.state = NonceState::Active { local };
                return Ok(Convergence::Advanced { local });
            }

            polls += 1;
            tracing::info!(local, remote, polls, "Waiting for node nonce to catch up");
            if polls > self.confirmation.max_polls {
                tracing::warn!(local, remote, "Node nonce did not converge, abandoning account");
                self.state = NonceState::Abandoned { local };
                return Ok(Convergence::Abandoned { local, remote });
            }

            sleep(self.confirmation.poll_interval, cancel).await?;
        }
    }

    async fn fetch_pending(&self, cancel: &CancellationToken) -> Result<u64, EngineError> {
        let address = self.address;
        retry(self.retry, cancel, "eth_getTransactionCount", || {
            self.ledger.pending_nonce(address)
        })
        .await
    }
}
