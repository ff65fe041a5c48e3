use inscribe_core::error::EngineError;

use super::profile::ErrorPolicy;

const SEQUENCE_CONFLICT_MARKERS: &[&str] = &[
    "invalid sequence",
    "account sequence mismatch",
    "incorrect account sequence",
];

const ALREADY_POOLED_MARKERS: &[&str] = &[
    "already in mempool",
    "tx already in mempool",
    "already known",
    "transaction already imported",
];

const INSUFFICIENT_FUNDS_MARKERS: &[&str] = &["insufficient funds"];

/// Broadcast failures the pipeline knows how to act on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BroadcastError {
    /// The node's view of the account sequence differs from ours.
    SequenceConflict { message: String },

    /// The node already holds this exact transaction.
    AlreadyPooled { message: String },

    InsufficientFunds { message: String },

    /// Anything else, including transport failures.
    Unclassified { message: String },
}

/// What the account task should do after a failed broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryStrategy {
    /// Wait and rebuild the same attempt with the same nonce.
    RetrySameNonce,
    /// Treat the transaction as accepted.
    TreatAsSent,
    /// Stop this account; the batch continues.
    SkipAccount,
    /// Stop the whole run.
    AbortRun,
}

/// Maps broadcast errors to [`BroadcastError`] and picks a recovery strategy.
pub struct BroadcastErrorMapper;

impl BroadcastErrorMapper {
    /// Reads the JSON-RPC error message when there is one, the error text otherwise.
    pub fn map_send_error(error: &EngineError) -> BroadcastError {
        match error.rpc_error_response() {
            Some(response) => Self::map_message(&response.message),
            None => Self::map_message(&error.to_string()),
        }
    }

    fn map_message(message: &str) -> BroadcastError {
        let msg_lower = message.to_lowercase();
        let contains_any = |markers: &[&str]| markers.iter().any(|m| msg_lower.contains(m));
        let message = message.to_string();

        if contains_any(SEQUENCE_CONFLICT_MARKERS) {
            BroadcastError::SequenceConflict { message }
        } else if contains_any(ALREADY_POOLED_MARKERS) {
            BroadcastError::AlreadyPooled { message }
        } else if contains_any(INSUFFICIENT_FUNDS_MARKERS) {
            BroadcastError::InsufficientFunds { message }
        } else {
            BroadcastError::Unclassified { message }
        }
    }

    pub fn recovery_strategy(error: &BroadcastError, policy: ErrorPolicy) -> RecoveryStrategy {
        match (policy, error) {
            (ErrorPolicy::Strict, _) => RecoveryStrategy::AbortRun,
            (ErrorPolicy::Classified, BroadcastError::SequenceConflict { .. }) => {
                RecoveryStrategy::RetrySameNonce
            }
            (ErrorPolicy::Classified, BroadcastError::AlreadyPooled { .. }) => {
                RecoveryStrategy::TreatAsSent
            }
            (ErrorPolicy::Classified, BroadcastError::InsufficientFunds { .. }) => {
                RecoveryStrategy::SkipAccount
            }
            (ErrorPolicy::Classified, BroadcastError::Unclassified { .. }) => {
                RecoveryStrategy::AbortRun
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use inscribe_core::error::{RpcErrorKind, RpcErrorResponse};

    use super::*;

    fn rpc_error(code: i64, message: &str) -> EngineError {
        EngineError::RpcError {
            rpc_url: "http://node".to_string(),
            message: message.to_string(),
            kind: RpcErrorKind::ErrorResp(RpcErrorResponse {
                code,
                message: message.to_string(),
                data: None,
            }),
        }
    }

    #[test]
    fn classifies_known_wordings() {
        let cases = [
            (
                "account sequence mismatch, expected 12, got 11: incorrect account sequence",
                RecoveryStrategy::RetrySameNonce,
            ),
            ("invalid sequence", RecoveryStrategy::RetrySameNonce),
            ("tx already in mempool", RecoveryStrategy::TreatAsSent),
            ("already known", RecoveryStrategy::TreatAsSent),
            ("Transaction already imported", RecoveryStrategy::TreatAsSent),
            (
                "insufficient funds for gas * price + value",
                RecoveryStrategy::SkipAccount,
            ),
            ("execution reverted", RecoveryStrategy::AbortRun),
        ];

        for (message, expected) in cases {
            let mapped = BroadcastErrorMapper::map_send_error(&rpc_error(-32000, message));
            assert_eq!(
                BroadcastErrorMapper::recovery_strategy(&mapped, ErrorPolicy::Classified),
                expected,
                "{message}"
            );
        }
    }

    #[test]
    fn strict_policy_always_aborts() {
        let mapped = BroadcastErrorMapper::map_send_error(&rpc_error(-32000, "already known"));
        assert_eq!(
            BroadcastErrorMapper::recovery_strategy(&mapped, ErrorPolicy::Strict),
            RecoveryStrategy::AbortRun
        );
    }

    #[test]
    fn falls_back_to_error_text_without_rpc_payload() {
        let transport = EngineError::RpcError {
            rpc_url: "http://node".to_string(),
            message: "connection reset".to_string(),
            kind: RpcErrorKind::OtherTransportError {
                message: "connection reset".to_string(),
            },
        };
        assert!(matches!(
            BroadcastErrorMapper::map_send_error(&transport),
            BroadcastError::Unclassified { .. }
        ));

        let text_only = EngineError::InternalError {
            message: "insufficient funds".to_string(),
        };
        assert!(matches!(
            BroadcastErrorMapper::map_send_error(&text_only),
            BroadcastError::InsufficientFunds { .. }
        ));
    }

    #[test]
    fn looks_through_exhausted_retries() {
        let wrapped = EngineError::RetriesExhausted {
            operation: "eth_sendRawTransaction".to_string(),
            attempts: 1,
            last_error: Box::new(rpc_error(-32000, "invalid sequence")),
        };
        assert!(matches!(
            BroadcastErrorMapper::map_send_error(&wrapped),
            BroadcastError::SequenceConflict { .. }
        ));
    }
}
