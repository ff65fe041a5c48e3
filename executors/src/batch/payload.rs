use alloy::primitives::Bytes;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PayloadError {
    #[error("either hex content or text content is required")]
    Missing,

    #[error("hex content and text content are mutually exclusive")]
    Ambiguous,

    #[error("invalid hex content: {message}")]
    InvalidHex { message: String },
}

/// Builds the call data attached to every minted transaction.
pub struct PayloadBuilder;

impl PayloadBuilder {
    /// Empty strings count as absent. Hex content may carry a `0x` prefix.
    pub fn build(hex_content: &str, text_content: &str) -> Result<Bytes, PayloadError> {
        let hex_content = hex_content.trim();
        let hex_content = hex_content
            .strip_prefix("0x")
            .or_else(|| hex_content.strip_prefix("0X"))
            .unwrap_or(hex_content);

        match (hex_content.is_empty(), text_content.is_empty()) {
            (true, true) => Err(PayloadError::Missing),
            (false, false) => Err(PayloadError::Ambiguous),
            (false, true) => hex::decode(hex_content)
                .map(Bytes::from)
                .map_err(|e| PayloadError::InvalidHex {
                    message: e.to_string(),
                }),
            (true, false) => Ok(Bytes::copy_from_slice(text_content.as_bytes())),
        }
    }
}
