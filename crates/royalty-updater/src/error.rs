//! Error types for the royalty updater

use solana_client::client_error::ClientError;
use solana_sdk::pubkey::Pubkey;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum UpdaterError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Keypair error: {0}")]
    Keypair(String),

    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Batch {batch} failed after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        batch: usize,
        attempts: u32,
        last_error: String,
    },

    #[error("Batch {batch} serializes to {size} bytes, over the {limit}-byte transaction limit; lower the batch size")]
    TransactionTooLarge {
        batch: usize,
        size: usize,
        limit: usize,
    },

    #[error("Royalty mismatch for {mint}: expected {expected} bps, found {found} bps")]
    VerificationFailed {
        mint: Pubkey,
        expected: u16,
        found: u16,
    },

    #[error("Metadata for {mint} could not be read back after update: {reason}")]
    MissingAfterUpdate { mint: Pubkey, reason: String },
}

pub type UpdaterResult<T> = Result<T, UpdaterError>;

impl From<std::io::Error> for UpdaterError {
    fn from(err: std::io::Error) -> Self {
        UpdaterError::InvalidInput(err.to_string())
    }
}

impl From<serde_json::Error> for UpdaterError {
    fn from(err: serde_json::Error) -> Self {
        UpdaterError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for UpdaterError {
    fn from(err: toml::de::Error) -> Self {
        UpdaterError::InvalidConfig(err.to_string())
    }
}

impl From<ClientError> for UpdaterError {
    fn from(err: ClientError) -> Self {
        UpdaterError::Rpc(err.to_string())
    }
}
