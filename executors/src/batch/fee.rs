use std::sync::Arc;

use alloy::primitives::U256;
use inscribe_core::{
    chain::LedgerClient,
    error::EngineError,
    retry::{RetryPolicy, retry},
};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use super::profile::FeeBuffer;

/// Buffered per-gas price for the next transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeQuote {
    pub unit_price: U256,
}

pub struct FeeEstimator<L> {
    ledger: Arc<L>,
    buffer: FeeBuffer,
    retry: RetryPolicy,
}

impl<L: LedgerClient> FeeEstimator<L> {
    pub fn new(ledger: Arc<L>, buffer: FeeBuffer, retry: RetryPolicy) -> Self {
        Self {
            ledger,
            buffer,
            retry,
        }
    }

    pub async fn quote(&self, cancel: &CancellationToken) -> Result<FeeQuote, EngineError> {
        let suggested = retry(self.retry, cancel, "eth_gasPrice", || {
            self.ledger.suggested_gas_price()
        })
        .await?;

        let unit_price = self.buffer.apply(suggested);
        tracing::debug!(%suggested, %unit_price, buffer = %self.buffer, "Quoted gas price");
        Ok(FeeQuote { unit_price })
    }
}
