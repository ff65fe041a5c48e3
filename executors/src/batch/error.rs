use alloy::primitives::Address;
use inscribe_core::error::EngineError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that end a whole batch run.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BatchError {
    /// Raised before any network activity.
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Could not resolve the network id: {error}")]
    NetworkId { error: EngineError },

    #[error("Account {index} ({address}) hit a fatal error: {error}")]
    Fatal {
        index: u32,
        address: Address,
        error: EngineError,
    },
}

impl BatchError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}
