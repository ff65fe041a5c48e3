use std::sync::Arc;

use alloy::primitives::{Address, U256};
use inscribe_core::{
    chain::LedgerClient,
    error::EngineError,
    retry::{RetryPolicy, retry},
};
use tokio_util::sync::CancellationToken;

/// `gas_price × gas_limit`, or `None` when the product overflows.
pub fn required_fee(gas_price: U256, gas_limit: u64) -> Option<U256> {
    gas_price.checked_mul(U256::from(gas_limit))
}

/// Checks a freshly fetched balance against the maximum fee of the next send.
pub struct BalanceGuard<L> {
    ledger: Arc<L>,
    retry: RetryPolicy,
}

impl<L: LedgerClient> BalanceGuard<L> {
    pub fn new(ledger: Arc<L>, retry: RetryPolicy) -> Self {
        Self { ledger, retry }
    }

    pub async fn ensure_affordable(
        &self,
        address: Address,
        gas_price: U256,
        gas_limit: u64,
        cancel: &CancellationToken,
    ) -> Result<bool, EngineError> {
        let balance = retry(self.retry, cancel, "eth_getBalance", || {
            self.ledger.balance(address)
        })
        .await?;

        let Some(fee) = required_fee(gas_price, gas_limit) else {
            tracing::warn!(%gas_price, gas_limit, "Fee overflows, treating as unaffordable");
            return Ok(false);
        };

        if balance < fee {
            tracing::info!(%balance, %fee, "Insufficient balance for the next transaction");
            return Ok(false);
        }

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fee_is_exact_product() {
        assert_eq!(
            required_fee(U256::from(5_000_000_000_000u64), 21_944),
            Some(U256::from(109_720_000_000_000_000u128))
        );
        assert_eq!(required_fee(U256::from(7), 0), Some(U256::ZERO));
    }

    #[test]
    fn overflowing_fee_is_none() {
        assert_eq!(required_fee(U256::MAX, 2), None);
        assert_eq!(required_fee(U256::MAX, 1), Some(U256::MAX));
    }
}
