//! Nonce recovery
//!
//! A lock's nonce lives only in its `TokensLocked` event. These helpers get
//! it back from a receipt, or from the source chain's logs when the receipt
//! is lost, and check each lock against the destination's processed set.

use baz_chain::{LogFilter, Receipt, View};
use baz_core::{Address, BlockNumber, TxHash};
use bridge::{LockRecord, TransferState};
use serde::Serialize;

use crate::provider::{ProviderResult, WalletProvider};
use crate::transfer::BridgeRoute;

/// The lock emitted by `bridge` in a successful receipt
pub fn lock_from_receipt(receipt: &Receipt, bridge: &Address) -> Option<LockRecord> {
    if !receipt.succeeded() {
        return None;
    }
    receipt
        .logs
        .iter()
        .filter(|log| log.address == *bridge)
        .find_map(LockRecord::from_log)
}

/// A source-chain lock and where it stands on the destination
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LockStatus {
    pub lock: LockRecord,
    pub lock_tx: TxHash,
    pub block_number: BlockNumber,
    pub state: TransferState,
}

impl LockStatus {
    pub fn is_pending(&self) -> bool {
        self.state == TransferState::Locked
    }
}

/// Every lock on the route's source bridge (optionally one user's), with the
/// destination's view of its nonce.
///
/// The destination set is keyed by nonce alone, so a lock shows as unlocked
/// once anyone has consumed its nonce there.
pub async fn scan_locks<P>(
    provider: &P,
    route: &BridgeRoute,
    user: Option<Address>,
) -> ProviderResult<Vec<LockStatus>>
where
    P: WalletProvider + ?Sized,
{
    provider.ensure_chain(&route.source.network).await?;
    let filter = LogFilter::default()
        .address(route.source.bridge)
        .event("TokensLocked");
    let locks: Vec<_> = provider
        .logs(filter)
        .await?
        .into_iter()
        .filter_map(|entry| {
            let lock = LockRecord::from_log(&entry.log())?;
            user.map_or(true, |u| u == lock.user)
                .then_some((lock, entry.transaction_hash, entry.block_number))
        })
        .collect();
    tracing::debug!(locks = locks.len(), "Scanned source bridge");

    provider.ensure_chain(&route.destination.network).await?;
    let mut statuses = Vec::with_capacity(locks.len());
    for (lock, lock_tx, block_number) in locks {
        let processed = provider
            .call_bool(View::IsNonceProcessed {
                bridge: route.destination.bridge,
                nonce: lock.nonce,
            })
            .await?;
        let state = if processed {
            TransferState::UnlockedDestination
        } else {
            TransferState::Locked
        };
        statuses.push(LockStatus {
            lock,
            lock_tx,
            block_number,
            state,
        });
    }
    Ok(statuses)
}

/// Locks whose nonce the destination bridge has not consumed yet
pub async fn pending_unlocks<P>(
    provider: &P,
    route: &BridgeRoute,
    user: Option<Address>,
) -> ProviderResult<Vec<LockStatus>>
where
    P: WalletProvider + ?Sized,
{
    let mut statuses = scan_locks(provider, route, user).await?;
    statuses.retain(LockStatus::is_pending);
    Ok(statuses)
}
