use alloy::{
    consensus::{SignableTransaction, Signed, TxLegacy},
    network::TxSignerSync,
    primitives::Address,
    signers::local::{MnemonicBuilder, PrivateKeySigner, coins_bip39::English},
};

use crate::error::EngineError;

/// A seed-derived account. Owned by exactly one account task.
#[derive(Clone, Debug)]
pub struct Account {
    pub index: u32,
    signer: PrivateKeySigner,
}

impl Account {
    pub fn new(index: u32, signer: PrivateKeySigner) -> Self {
        Self { index, signer }
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Signs a legacy transaction. The transaction's `chain_id` must already be
    /// set so the signature is replay protected (EIP-155).
    pub fn sign_legacy(&self, mut tx: TxLegacy) -> Result<Signed<TxLegacy>, EngineError> {
        if tx.chain_id.is_none() {
            return Err(EngineError::SigningError {
                message: "refusing to sign a legacy transaction without a chain id".to_string(),
            });
        }

        let signature =
            self.signer
                .sign_transaction_sync(&mut tx)
                .map_err(|e| EngineError::SigningError {
                    message: format!("Failed to sign transaction for {}: {e}", self.address()),
                })?;

        Ok(tx.into_signed(signature))
    }
}

/// Maps a sequence index to an account.
pub trait AccountDeriver: Send + Sync {
    fn derive(&self, index: u32) -> Result<Account, EngineError>;
}

/// BIP-44 derivation along `m/44'/60'/0'/0/{index}`.
pub struct MnemonicDeriver {
    phrase: String,
}

impl MnemonicDeriver {
    pub fn new(phrase: impl Into<String>) -> Result<Self, EngineError> {
        let phrase = phrase.into();
        if phrase.trim().is_empty() {
            return Err(EngineError::ValidationError {
                message: "mnemonic is required".to_string(),
            });
        }

        let deriver = Self {
            phrase: phrase.trim().to_string(),
        };
        // Surface a bad phrase before any task is spawned.
        deriver.derive(0)?;
        Ok(deriver)
    }
}

impl AccountDeriver for MnemonicDeriver {
    fn derive(&self, index: u32) -> Result<Account, EngineError> {
        let signer = MnemonicBuilder::<English>::default()
            .phrase(self.phrase.as_str())
            .index(index)
            .and_then(|builder| builder.build())
            .map_err(|e| EngineError::SigningError {
                message: format!("Failed to derive account {index}: {e}"),
            })?;

        Ok(Account::new(index, signer))
    }
}

impl std::fmt::Debug for MnemonicDeriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MnemonicDeriver").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use alloy::{
        consensus::{Transaction, TxEnvelope},
        eips::eip2718::{Decodable2718, Encodable2718},
        primitives::{Bytes, TxKind, U256, address},
    };

    use super::*;

    const TEST_MNEMONIC: &str = "test test test test test test test test test test test junk";

    #[test]
    fn derives_standard_addresses() {
        let deriver = MnemonicDeriver::new(TEST_MNEMONIC).unwrap();

        assert_eq!(
            deriver.derive(0).unwrap().address(),
            address!("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266")
        );
        assert_eq!(
            deriver.derive(1).unwrap().address(),
            address!("0x70997970C51812dc3A010C7d01b50e0d17dc79C8")
        );
    }

    #[test]
    fn rejects_empty_mnemonic() {
        assert!(matches!(
            MnemonicDeriver::new("   "),
            Err(EngineError::ValidationError { .. })
        ));
    }

    #[test]
    fn rejects_invalid_mnemonic() {
        assert!(MnemonicDeriver::new("definitely not a bip39 phrase").is_err());
    }

    #[test]
    fn signs_replay_protected_legacy_transaction() {
        let account = MnemonicDeriver::new(TEST_MNEMONIC)
            .unwrap()
            .derive(0)
            .unwrap();

        let tx = TxLegacy {
            chain_id: Some(25),
            nonce: 7,
            gas_price: 5_000_000_000_000,
            gas_limit: 21_944,
            to: TxKind::Call(account.address()),
            value: U256::ZERO,
            input: Bytes::from_static(b"hi"),
        };

        let signed = account.sign_legacy(tx).unwrap();
        let hash = *signed.hash();
        let raw = TxEnvelope::from(signed).encoded_2718();

        let decoded = TxEnvelope::decode_2718(&mut raw.as_slice()).unwrap();
        assert_eq!(*decoded.tx_hash(), hash);
        assert_eq!(decoded.chain_id(), Some(25));
        assert_eq!(decoded.nonce(), 7);
        assert_eq!(decoded.input().as_ref(), b"hi");
    }

    #[test]
    fn refuses_unprotected_signature() {
        let account = MnemonicDeriver::new(TEST_MNEMONIC)
            .unwrap()
            .derive(0)
            .unwrap();

        let result = account.sign_legacy(TxLegacy::default());
        assert!(matches!(result, Err(EngineError::SigningError { .. })));
    }
}
