//! Bridge client
//!
//! Wallet provider abstraction, the devnet-backed wallet, and the
//! approve/lock/switch/unlock transfer flow with nonce recovery.

pub mod error;
pub mod provider;
pub mod recovery;
pub mod transfer;
pub mod watcher;

#[cfg(test)]
mod testkit;

pub use error::{FlowError, ProviderError};
pub use provider::{AddChainParams, DevnetWallet, NativeCurrency, SharedDevnet, WalletProvider};
pub use recovery::{lock_from_receipt, pending_unlocks, scan_locks, LockStatus};
pub use transfer::{BridgeEndpoint, BridgeFlow, BridgeRoute, BridgeTransfer, TransferStep, UnlockMode};
pub use watcher::{wait_for_receipt, WatchConfig};
