use alloy::primitives::{Address, Bytes};
use inscribe_core::{
    error::EngineError,
    retry::{RetryPolicy, retry},
    signer::Account,
};
use inscription_indexer::InscriptionIndexer;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

/// What one account will send: `quota` transactions of `payload` to `recipient`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionPlan {
    pub recipient: Address,
    pub payload: Bytes,
    pub quota: u32,
}

/// Resolves the plan of an account before its loop starts. `None` means the
/// account has nothing to send.
pub trait PlanSource: Send + Sync {
    fn plan(
        &self,
        account: &Account,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<Option<SubmissionPlan>, EngineError>> + Send;
}

/// Self-addressed inscriptions with a fixed payload.
#[derive(Debug, Clone)]
pub struct MintPlan {
    payload: Bytes,
    per_address: u32,
}

impl MintPlan {
    pub fn new(payload: Bytes, per_address: u32) -> Result<Self, EngineError> {
        if per_address == 0 {
            return Err(EngineError::ValidationError {
                message: "per-address count must be greater than zero".to_string(),
            });
        }
        Ok(Self {
            payload,
            per_address,
        })
    }
}

impl PlanSource for MintPlan {
    async fn plan(
        &self,
        account: &Account,
        _cancel: &CancellationToken,
    ) -> Result<Option<SubmissionPlan>, EngineError> {
        Ok(Some(SubmissionPlan {
            recipient: account.address(),
            payload: self.payload.clone(),
            quota: self.per_address,
        }))
    }
}

/// Transfer inscription moving an account's whole `tick` balance.
pub fn collect_payload(tick: &str, amount: u64) -> Bytes {
    Bytes::from(
        format!(r#"data:,{{"p":"crc-20","op":"transfer","tick":"{tick}","amt":"{amount}"}}"#)
            .into_bytes(),
    )
}

/// Sweeps each account's tick balance to a single collector address.
pub struct CollectPlan {
    indexer: InscriptionIndexer,
    tick: String,
    collector: Address,
    retry: RetryPolicy,
}

impl CollectPlan {
    pub fn new(
        indexer: InscriptionIndexer,
        tick: &str,
        collector: Address,
        retry: RetryPolicy,
    ) -> Result<Self, EngineError> {
        let tick = tick.trim();
        if tick.is_empty() {
            return Err(EngineError::ValidationError {
                message: "tick is required".to_string(),
            });
        }
        if collector == Address::ZERO {
            return Err(EngineError::ValidationError {
                message: "collector address must not be the zero address".to_string(),
            });
        }
        Ok(Self {
            indexer,
            tick: tick.to_string(),
            collector,
            retry,
        })
    }
}

impl PlanSource for CollectPlan {
    async fn plan(
        &self,
        account: &Account,
        cancel: &CancellationToken,
    ) -> Result<Option<SubmissionPlan>, EngineError> {
        let address = account.address();
        if address == self.collector {
            tracing::info!("Account is the collector, skipping");
            return Ok(None);
        }

        let balance = retry(self.retry, cancel, "indexer_balance", || async {
            self.indexer
                .balance(address)
                .await
                .map_err(|e| EngineError::IndexerError {
                    message: e.to_string(),
                })
        })
        .await?;

        let amount = balance
            .for_tick(&self.tick)
            .map(|entry| entry.amount)
            .unwrap_or_default();
        if amount == 0 {
            tracing::info!(tick = %self.tick, "No balance to collect");
            return Ok(None);
        }

        tracing::info!(tick = %self.tick, amount, collector = %self.collector, "Collecting balance");
        Ok(Some(SubmissionPlan {
            recipient: self.collector,
            payload: collect_payload(&self.tick, amount),
            quota: 1,
        }))
    }
}

#[cfg(test)]
mod tests {
    use alloy::signers::local::PrivateKeySigner;

    use super::*;

    #[test]
    fn collect_payload_format() {
        assert_eq!(
            collect_payload("cros", 3000).as_ref(),
            br#"data:,{"p":"crc-20","op":"transfer","tick":"cros","amt":"3000"}"#
        );
    }

    #[tokio::test]
    async fn mint_plan_targets_own_address() {
        let account = Account::new(3, PrivateKeySigner::random());
        let plan = MintPlan::new(Bytes::from_static(b"hi"), 10)
            .unwrap()
            .plan(&account, &CancellationToken::new())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(plan.recipient, account.address());
        assert_eq!(plan.quota, 10);
        assert_eq!(plan.payload, Bytes::from_static(b"hi"));
    }

    #[test]
    fn mint_plan_rejects_zero_quota() {
        assert!(MintPlan::new(Bytes::from_static(b"hi"), 0).is_err());
    }
}
