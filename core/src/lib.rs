pub mod chain;
pub mod error;
pub mod retry;
pub mod signer;
pub mod transaction;
