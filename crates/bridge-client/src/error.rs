//! Wallet and bridge-flow errors

use baz_chain::ChainError;
use baz_core::{ChainId, ConfigError, TxHash};
use thiserror::Error;

use crate::transfer::TransferStep;

/// EIP-1193 provider failure
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Unrecognized chain ID {0}. Try adding the chain using wallet_addEthereumChain first.")]
    UnrecognizedChain(ChainId),

    #[error("User rejected the request")]
    UserRejected,

    #[error("Invalid chain parameters: {0}")]
    InvalidParams(String),

    #[error("Transaction {hash} reverted: {reason}")]
    Reverted { hash: TxHash, reason: String },

    #[error("Timed out waiting for receipt of {0}")]
    Timeout(TxHash),

    #[error("eth_call answered {got}, expected {expected}")]
    UnexpectedResult { expected: &'static str, got: String },

    #[error(transparent)]
    Chain(#[from] ChainError),
}

impl ProviderError {
    /// Numeric code as an EIP-1193 provider reports it
    pub fn code(&self) -> i64 {
        match self {
            Self::UnrecognizedChain(_) => 4902,
            Self::UserRejected => 4001,
            Self::InvalidParams(_) => -32602,
            Self::Reverted { .. } => -32000,
            Self::Timeout(_) | Self::UnexpectedResult { .. } | Self::Chain(_) => -32603,
        }
    }
}

/// Bridge transfer failure, tagged with the step that failed
#[derive(Debug, Error)]
pub enum FlowError {
    #[error("{step} failed: {source}")]
    Provider {
        step: TransferStep,
        #[source]
        source: ProviderError,
    },

    #[error("{step} transaction {hash} reverted: {reason}")]
    Reverted {
        step: TransferStep,
        hash: TxHash,
        reason: String,
    },

    #[error("Lock transaction {0} emitted no TokensLocked event")]
    MissingLockEvent(TxHash),

    #[error("Nonce {nonce} is already processed on the destination bridge")]
    NonceConsumed { nonce: u128 },

    #[error("Owner relay requested but no relayer wallet is attached")]
    NoRelayer,

    #[error("Amount must be greater than zero")]
    ZeroAmount,

    #[error("Transfer {0} is already complete")]
    AlreadyComplete(String),

    #[error("No contract set deployed on {0}")]
    NotDeployed(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl FlowError {
    pub(crate) fn provider(step: TransferStep) -> impl FnOnce(ProviderError) -> Self {
        move |source| Self::Provider { step, source }
    }

    /// Step the transfer stopped at, when the failure belongs to one
    pub fn step(&self) -> Option<TransferStep> {
        match self {
            Self::Provider { step, .. } | Self::Reverted { step, .. } => Some(*step),
            Self::MissingLockEvent(_) => Some(TransferStep::Lock),
            Self::NonceConsumed { .. } | Self::NoRelayer => Some(TransferStep::Unlock),
            Self::ZeroAmount
            | Self::AlreadyComplete(_)
            | Self::NotDeployed(_)
            | Self::Config(_) => None,
        }
    }
}
