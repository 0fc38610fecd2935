//! Bridge state types
//!
//! Records derived from bridge events and the status snapshot served to
//! clients.

use baz_core::{amount_str, Address, Amount, Event, Log};
use serde::{Deserialize, Serialize};

/// A lock observed on the source chain.
///
/// Immutable once emitted; the nonce is the ticket the user later presents
/// to the destination bridge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockRecord {
    /// Source bridge contract that emitted the lock
    pub bridge: Address,
    pub user: Address,
    #[serde(with = "amount_str")]
    pub amount: Amount,
    #[serde(with = "amount_str")]
    pub nonce: u128,
    pub target_chain: String,
}

impl LockRecord {
    /// Parse a `TokensLocked` log
    pub fn from_log(log: &Log) -> Option<Self> {
        match &log.event {
            Event::TokensLocked {
                user,
                amount,
                nonce,
                target_chain,
            } => Some(Self {
                bridge: log.address,
                user: *user,
                amount: *amount,
                nonce: *nonce,
                target_chain: target_chain.clone(),
            }),
            _ => None,
        }
    }

    /// First lock record among a receipt's logs
    pub fn find_in(logs: &[Log]) -> Option<Self> {
        logs.iter().find_map(Self::from_log)
    }
}

/// An unlock observed on the destination chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnlockRecord {
    pub bridge: Address,
    pub user: Address,
    #[serde(with = "amount_str")]
    pub amount: Amount,
    #[serde(with = "amount_str")]
    pub nonce: u128,
    pub source_chain: String,
}

impl UnlockRecord {
    pub fn from_log(log: &Log) -> Option<Self> {
        match &log.event {
            Event::TokensUnlocked {
                user,
                amount,
                nonce,
                source_chain,
            } => Some(Self {
                bridge: log.address,
                user: *user,
                amount: *amount,
                nonce: *nonce,
                source_chain: source_chain.clone(),
            }),
            _ => None,
        }
    }

    pub fn find_in(logs: &[Log]) -> Option<Self> {
        logs.iter().find_map(Self::from_log)
    }
}

/// Per-(user, nonce) progress as the client infers it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferState {
    /// Never locked
    Unlocked,
    /// Funds held on the source bridge
    Locked,
    /// Nonce consumed on the destination bridge
    UnlockedDestination,
}

/// Overall bridge state sent to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeStatus {
    pub address: Address,
    pub token: Address,
    pub owner: Address,
    pub paused: bool,
    pub chain_tag: String,
    pub target_chain: String,
    /// Token balance held by the bridge (decimal string, base units)
    pub balance: String,
    pub processed_nonces: usize,
    pub users: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_record_from_log() {
        let bridge = Address::from_label("bridge");
        let user = Address::from_label("alice");
        let logs = vec![
            Log {
                address: Address::from_label("baz"),
                event: Event::Transfer {
                    from: user,
                    to: bridge,
                    value: 100,
                },
            },
            Log {
                address: bridge,
                event: Event::TokensLocked {
                    user,
                    amount: 100,
                    nonce: 1,
                    target_chain: "amoy".into(),
                },
            },
        ];
        let record = LockRecord::find_in(&logs).unwrap();
        assert_eq!(record.bridge, bridge);
        assert_eq!(record.nonce, 1);
        assert_eq!(record.amount, 100);
        assert!(UnlockRecord::find_in(&logs).is_none());
    }
}
