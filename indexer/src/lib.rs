pub mod client;
pub mod error;
pub mod types;

pub use client::{InscriptionIndexer, InscriptionIndexerBuilder};
pub use error::IndexerError;
