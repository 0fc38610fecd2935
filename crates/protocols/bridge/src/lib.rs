//! Lock/Unlock Bridge Protocol
//!
//! Moves a token balance "across" chains without a relayer: the user locks
//! on the source chain's bridge, then personally submits an unlock on the
//! destination chain's bridge quoting the nonce from the lock event.

pub mod contract;
pub mod state;

pub use contract::Bridge;
pub use state::{BridgeStatus, LockRecord, TransferState, UnlockRecord};
