#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use alloy::consensus::transaction::SignerRecoverable;
use alloy::consensus::{Transaction, TxEnvelope};
use alloy::eips::eip2718::Decodable2718;
use alloy::primitives::{Address, B256, Bytes, U256};
use alloy::transports::http::reqwest::Url;

use inscribe_core::chain::LedgerClient;
use inscribe_core::error::{EngineError, RpcErrorKind, RpcErrorResponse};
use inscribe_core::signer::{AccountDeriver, MnemonicDeriver};

pub const TEST_MNEMONIC: &str = "test test test test test test test test test test test junk";
pub const NETWORK_ID: u64 = 25;
pub const GAS_PRICE: u64 = 5_000_000_000_000;

/// Plenty for dozens of sends at [`GAS_PRICE`].
pub fn funded() -> U256 {
    U256::from(10u128.pow(19))
}

// Setup tracing for tests
pub fn setup_tracing() {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "inscribe_executors=debug,inscribe_core=debug".into()
        }))
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

pub fn test_deriver() -> MnemonicDeriver {
    MnemonicDeriver::new(TEST_MNEMONIC).unwrap()
}

pub fn address_of(index: u32) -> Address {
    test_deriver().derive(index).unwrap().address()
}

pub fn rpc_error(message: &str) -> EngineError {
    EngineError::RpcError {
        rpc_url: "http://mock-ledger/".to_string(),
        message: format!("server returned an error response: {message}"),
        kind: RpcErrorKind::ErrorResp(RpcErrorResponse {
            code: -32000,
            message: message.to_string(),
            data: None,
        }),
    }
}

pub fn transport_error(message: &str) -> EngineError {
    EngineError::RpcError {
        rpc_url: "http://mock-ledger/".to_string(),
        message: message.to_string(),
        kind: RpcErrorKind::OtherTransportError {
            message: message.to_string(),
        },
    }
}

/// Scripted answer to the next broadcast of a sender.
#[derive(Debug, Clone)]
pub enum ScriptedSend {
    /// Node rejects; nothing lands.
    Reject(EngineError),
    /// Node already holds the transaction and reports an error anyway.
    AcceptAndReject(EngineError),
}

#[derive(Debug, Clone)]
pub struct SentTx {
    pub sender: Address,
    pub to: Option<Address>,
    pub nonce: u64,
    pub gas_price: u128,
    pub gas_limit: u64,
    pub input: Bytes,
    pub hash: B256,
}

#[derive(Default)]
struct LedgerState {
    pending: HashMap<Address, u64>,
    balances: HashMap<Address, U256>,
    /// Upcoming nonce polls that still report the value before the last send.
    lagging: HashMap<Address, u32>,
    scripted_sends: HashMap<Address, VecDeque<ScriptedSend>>,
    gas_price_failures: u32,
    broadcasts: u32,
    sent: Vec<SentTx>,
}

/// In-memory ledger. Transactions are attributed to the signer recovered
/// from the raw envelope.
pub struct MockLedger {
    url: Url,
    gas_price: U256,
    lag_polls: u32,
    state: Mutex<LedgerState>,
}

impl MockLedger {
    pub fn new() -> Self {
        Self {
            url: Url::parse("http://mock-ledger/").unwrap(),
            gas_price: U256::from(GAS_PRICE),
            lag_polls: 0,
            state: Mutex::new(LedgerState::default()),
        }
    }

    /// Nonce polls after each send that still show the old value.
    pub fn with_lag(mut self, polls: u32) -> Self {
        self.lag_polls = polls;
        self
    }

    pub fn with_balance(self, address: Address, balance: U256) -> Self {
        self.state.lock().unwrap().balances.insert(address, balance);
        self
    }

    pub fn with_nonce(self, address: Address, nonce: u64) -> Self {
        self.state.lock().unwrap().pending.insert(address, nonce);
        self
    }

    pub fn with_gas_price_failures(self, failures: u32) -> Self {
        self.state.lock().unwrap().gas_price_failures = failures;
        self
    }

    pub fn script_send(self, sender: Address, response: ScriptedSend) -> Self {
        self.state
            .lock()
            .unwrap()
            .scripted_sends
            .entry(sender)
            .or_default()
            .push_back(response);
        self
    }

    pub fn sent(&self) -> Vec<SentTx> {
        self.state.lock().unwrap().sent.clone()
    }

    pub fn sent_by(&self, sender: Address) -> Vec<SentTx> {
        self.sent().into_iter().filter(|tx| tx.sender == sender).collect()
    }

    /// Every broadcast attempt, rejected ones included.
    pub fn broadcasts(&self) -> u32 {
        self.state.lock().unwrap().broadcasts
    }

    /// Lands a transaction for `sender` without going through a broadcast.
    pub fn accept(&self, sender: Address) {
        let mut state = self.state.lock().unwrap();
        *state.pending.entry(sender).or_default() += 1;
        state.lagging.insert(sender, self.lag_polls);
    }

    pub fn node_nonce(&self, address: Address) -> u64 {
        self.state
            .lock()
            .unwrap()
            .pending
            .get(&address)
            .copied()
            .unwrap_or_default()
    }
}

impl LedgerClient for MockLedger {
    fn rpc_url(&self) -> &Url {
        &self.url
    }

    async fn network_id(&self) -> Result<u64, EngineError> {
        Ok(NETWORK_ID)
    }

    async fn pending_nonce(&self, address: Address) -> Result<u64, EngineError> {
        let mut state = self.state.lock().unwrap();
        let pending = state.pending.get(&address).copied().unwrap_or_default();
        match state.lagging.get_mut(&address) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                Ok(pending - 1)
            }
            _ => Ok(pending),
        }
    }

    async fn suggested_gas_price(&self) -> Result<U256, EngineError> {
        let mut state = self.state.lock().unwrap();
        if state.gas_price_failures > 0 {
            state.gas_price_failures -= 1;
            return Err(transport_error("connection refused"));
        }
        Ok(self.gas_price)
    }

    async fn balance(&self, address: Address) -> Result<U256, EngineError> {
        let state = self.state.lock().unwrap();
        Ok(state.balances.get(&address).copied().unwrap_or_default())
    }

    async fn send_raw_transaction(&self, raw: Bytes) -> Result<B256, EngineError> {
        let envelope = TxEnvelope::decode_2718(&mut raw.as_ref()).map_err(|e| {
            EngineError::InternalError {
                message: format!("undecodable transaction: {e}"),
            }
        })?;
        assert_eq!(envelope.chain_id(), Some(NETWORK_ID), "transaction must be EIP-155 protected");

        let sender = envelope
            .recover_signer()
            .map_err(|e| EngineError::InternalError {
                message: format!("unrecoverable signer: {e}"),
            })?;
        let tx = SentTx {
            sender,
            to: envelope.to(),
            nonce: envelope.nonce(),
            gas_price: envelope.gas_price().unwrap_or_default(),
            gas_limit: envelope.gas_limit(),
            input: envelope.input().clone(),
            hash: *envelope.tx_hash(),
        };

        let mut state = self.state.lock().unwrap();
        state.broadcasts += 1;

        let scripted = state
            .scripted_sends
            .get_mut(&sender)
            .and_then(|queue| queue.pop_front());
        let rejection = match scripted {
            Some(ScriptedSend::Reject(error)) => return Err(error),
            Some(ScriptedSend::AcceptAndReject(error)) => Some(error),
            None => None,
        };

        let pending = state.pending.get(&sender).copied().unwrap_or_default();
        if tx.nonce != pending {
            return Err(rpc_error(&format!(
                "account sequence mismatch, expected {pending}, got {}: incorrect account sequence",
                tx.nonce
            )));
        }

        let fee = U256::from(tx.gas_price) * U256::from(tx.gas_limit);
        let balance = state.balances.entry(sender).or_default();
        *balance = balance.saturating_sub(fee);
        state.pending.insert(sender, pending + 1);
        state.lagging.insert(sender, self.lag_polls);
        state.sent.push(tx.clone());

        match rejection {
            Some(error) => Err(error),
            None => Ok(tx.hash),
        }
    }
}
