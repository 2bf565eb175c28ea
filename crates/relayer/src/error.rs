//! Error types for the relayer.

use thiserror::Error;

use crate::rpc::RpcError;

/// Main error type for the relayer.
#[derive(Debug, Error)]
pub enum RelayerError {
    /// RPC connection error.
    #[error("RPC error: {0}")]
    Rpc(#[from] RpcError),

    /// Contract interaction error.
    #[error("Contract error: {0}")]
    Contract(String),

    /// No appended state batch covers the given L2 height.
    #[error("no state batch covers L2 height {0}")]
    MissingBatch(u64),

    /// Proof construction error.
    #[error("Proof error: {0}")]
    Proof(String),

    /// Malformed event or calldata.
    #[error("Decode error: {0}")]
    Decode(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<eyre::Error> for RelayerError {
    fn from(err: eyre::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Result type alias for relayer operations.
pub type RelayerResult<T> = Result<T, RelayerError>;
