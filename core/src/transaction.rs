use alloy::{
    consensus::TxLegacy,
    primitives::{Address, Bytes, TxKind, U256},
};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// A fully priced, zero-value legacy transaction, built fresh for every attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxRequest {
    pub nonce: u64,
    pub to: Address,
    pub gas_limit: u64,
    pub gas_price: U256,
    pub payload: Bytes,
}

impl TxRequest {
    /// Converts into a legacy transaction bound to `network_id`.
    pub fn to_legacy(&self, network_id: u64) -> Result<TxLegacy, EngineError> {
        let gas_price =
            u128::try_from(self.gas_price).map_err(|_| EngineError::ValidationError {
                message: format!("gas price {} does not fit a legacy transaction", self.gas_price),
            })?;

        Ok(TxLegacy {
            chain_id: Some(network_id),
            nonce: self.nonce,
            gas_price,
            gas_limit: self.gas_limit,
            to: TxKind::Call(self.to),
            value: U256::ZERO,
            input: self.payload.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_zero_value_call() {
        let request = TxRequest {
            nonce: 3,
            to: Address::repeat_byte(0x11),
            gas_limit: 22_000,
            gas_price: U256::from(5_000u64),
            payload: Bytes::from_static(&[0x01]),
        };

        let tx = request.to_legacy(25).unwrap();
        assert_eq!(tx.chain_id, Some(25));
        assert_eq!(tx.value, U256::ZERO);
        assert_eq!(tx.to, TxKind::Call(Address::repeat_byte(0x11)));
        assert_eq!(tx.gas_price, 5_000);
        assert_eq!(tx.input, Bytes::from_static(&[0x01]));
    }

    #[test]
    fn rejects_gas_price_beyond_u128() {
        let request = TxRequest {
            nonce: 0,
            to: Address::ZERO,
            gas_limit: 21_000,
            gas_price: U256::from(u128::MAX) + U256::from(1u8),
            payload: Bytes::new(),
        };

        assert!(matches!(
            request.to_legacy(1),
            Err(EngineError::ValidationError { .. })
        ));
    }
}
