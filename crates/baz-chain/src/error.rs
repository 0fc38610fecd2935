//! Devnet errors

use baz_core::{Address, ChainId, Revert, TxHash};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("Unknown chain id {0}")]
    UnknownChain(ChainId),

    #[error("No {kind} contract at {address}")]
    UnknownContract { kind: &'static str, address: Address },

    #[error("Unknown transaction {0}")]
    UnknownTransaction(TxHash),

    #[error("Transaction {hash} reverted: {reason}")]
    Reverted { hash: TxHash, reason: String },

    #[error("Execution reverted: {0}")]
    Revert(#[from] Revert),

    #[error("State persistence failed for {path}: {message}")]
    Persistence { path: String, message: String },

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl ChainError {
    pub(crate) fn contract(kind: &'static str, address: Address) -> Self {
        Self::UnknownContract { kind, address }
    }

    /// Stable machine-readable code
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownChain(_) => "unknown_chain",
            Self::UnknownContract { .. } => "unknown_contract",
            Self::UnknownTransaction(_) => "unknown_transaction",
            Self::Reverted { .. } => "reverted",
            Self::Revert(r) => r.error_code(),
            Self::Persistence { .. } => "persistence_error",
            Self::Serialization(_) => "serialization_error",
        }
    }
}

pub type Result<T> = std::result::Result<T, ChainError>;
