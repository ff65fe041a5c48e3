use std::time::Duration;

use alloy::{
    primitives::{Address, B256, Bytes, U256},
    providers::{Provider, ProviderBuilder, RootProvider},
    rpc::client::RpcClient,
    transports::http::{
        Http,
        reqwest::{ClientBuilder as HttpClientBuilder, Url},
    },
};

use crate::error::{AlloyRpcErrorToEngineError, EngineError};

/// Gateway to the remote ledger node.
///
/// Every method is a single request/response round trip. Implementations must
/// be safe to share between account tasks.
pub trait LedgerClient: Send + Sync {
    fn rpc_url(&self) -> &Url;

    /// Network identifier used for replay-protected signatures.
    fn network_id(&self) -> impl Future<Output = Result<u64, EngineError>> + Send;

    /// Nonce of the next transaction for `address`, including pooled transactions.
    fn pending_nonce(
        &self,
        address: Address,
    ) -> impl Future<Output = Result<u64, EngineError>> + Send;

    fn suggested_gas_price(&self) -> impl Future<Output = Result<U256, EngineError>> + Send;

    fn balance(&self, address: Address) -> impl Future<Output = Result<U256, EngineError>> + Send;

    fn send_raw_transaction(
        &self,
        raw: Bytes,
    ) -> impl Future<Output = Result<B256, EngineError>> + Send;
}

pub struct LedgerConfig<'a> {
    pub rpc_url: &'a str,
    pub request_timeout: Duration,
}

/// [`LedgerClient`] backed by an alloy HTTP provider.
#[derive(Clone)]
pub struct RpcLedger {
    rpc_url: Url,
    pub provider: RootProvider,
}

impl LedgerConfig<'_> {
    pub fn to_ledger(&self) -> Result<RpcLedger, EngineError> {
        let rpc_url = Url::parse(self.rpc_url).map_err(|e| EngineError::RpcConfigError {
            message: format!("Failed to parse RPC URL {}: {e}", self.rpc_url),
        })?;

        let reqwest_client = HttpClientBuilder::new()
            .timeout(self.request_timeout)
            .build()
            .map_err(|e| EngineError::RpcConfigError {
                message: format!("Failed to build HTTP client: {e}"),
            })?;

        let transport = Http::with_client(reqwest_client, rpc_url.clone());
        let rpc_client = RpcClient::new(transport, false);

        Ok(RpcLedger {
            rpc_url,
            provider: ProviderBuilder::new()
                .disable_recommended_fillers()
                .connect_client(rpc_client),
        })
    }
}

impl LedgerClient for RpcLedger {
    fn rpc_url(&self) -> &Url {
        &self.rpc_url
    }

    async fn network_id(&self) -> Result<u64, EngineError> {
        self.provider
            .get_net_version()
            .await
            .map_err(|e| e.to_engine_error(self))
    }

    async fn pending_nonce(&self, address: Address) -> Result<u64, EngineError> {
        self.provider
            .get_transaction_count(address)
            .pending()
            .await
            .map_err(|e| e.to_engine_error(self))
    }

    async fn suggested_gas_price(&self) -> Result<U256, EngineError> {
        self.provider
            .get_gas_price()
            .await
            .map(U256::from)
            .map_err(|e| e.to_engine_error(self))
    }

    async fn balance(&self, address: Address) -> Result<U256, EngineError> {
        self.provider
            .get_balance(address)
            .await
            .map_err(|e| e.to_engine_error(self))
    }

    async fn send_raw_transaction(&self, raw: Bytes) -> Result<B256, EngineError> {
        self.provider
            .send_raw_transaction(&raw)
            .await
            .map(|pending| *pending.tx_hash())
            .map_err(|e| e.to_engine_error(self))
    }
}
