//! Error types for BAZ

use thiserror::Error;

use crate::types::ParseHexError;

/// Core errors that can occur in BAZ
#[derive(Debug, Error)]
pub enum Error {
    #[error("Transaction reverted: {0}")]
    Revert(#[from] Revert),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid identifier: {0}")]
    Parse(#[from] ParseHexError),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Contract-level failure.
///
/// `Display` renders exactly the revert reason string a client would see.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Revert {
    #[error("Insufficient balance")]
    InsufficientBalance,

    #[error("Insufficient allowance")]
    InsufficientAllowance,

    #[error("Nonce already processed")]
    NonceAlreadyProcessed,

    #[error("Amount must be greater than zero")]
    ZeroAmount,

    #[error("Ownable: caller is not the owner")]
    NotOwner,

    #[error("Ownable: new owner is the zero address")]
    ZeroOwner,

    #[error("Pausable: paused")]
    Paused,

    #[error("Pausable: not paused")]
    NotPaused,

    #[error("ERC20: transfer amount exceeds balance")]
    TransferExceedsBalance,

    #[error("ERC20: insufficient allowance")]
    Erc20InsufficientAllowance,

    #[error("ERC20: burn amount exceeds balance")]
    BurnExceedsBalance,

    #[error("ERC20: transfer to the zero address")]
    TransferToZero,

    #[error("Arithmetic overflow")]
    Overflow,

    /// Reason string carried verbatim (AMM and farm reasons)
    #[error("{0}")]
    Reason(String),
}

impl Revert {
    pub fn reason(msg: impl Into<String>) -> Self {
        Self::Reason(msg.into())
    }

    /// Stable machine-readable code
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InsufficientBalance | Self::TransferExceedsBalance | Self::BurnExceedsBalance => {
                "insufficient_balance"
            }
            Self::InsufficientAllowance | Self::Erc20InsufficientAllowance => {
                "insufficient_allowance"
            }
            Self::NonceAlreadyProcessed => "nonce_already_processed",
            Self::ZeroAmount => "invalid_amount",
            Self::NotOwner | Self::ZeroOwner => "unauthorized",
            Self::Paused | Self::NotPaused => "paused_state",
            Self::TransferToZero => "invalid_recipient",
            Self::Overflow => "overflow",
            Self::Reason(_) => "reverted",
        }
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {message}")]
    Read { path: String, message: String },

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Unknown network: {0}")]
    UnknownNetwork(String),

    #[error("Duplicate chain id {0} in network list")]
    DuplicateChainId(u64),
}

/// Result type alias for BAZ operations
pub type Result<T> = std::result::Result<T, Error>;
