//! Receipt polling
//!
//! Waits on a provider for the receipt of a submitted transaction, giving up
//! after the configured timeout.

use std::time::{Duration, Instant};

use baz_chain::Receipt;
use baz_core::TxHash;

use crate::error::ProviderError;
use crate::provider::{ProviderResult, WalletProvider};

/// How often a pending receipt is polled (seconds)
const POLL_INTERVAL_SECS: u64 = 2;

/// Receipts pending longer than this are timed out (seconds)
const TIMEOUT_SECS: u64 = 5 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchConfig {
    pub poll_interval: Duration,
    pub timeout: Duration,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(POLL_INTERVAL_SECS),
            timeout: Duration::from_secs(TIMEOUT_SECS),
        }
    }
}

impl WatchConfig {
    /// Tight polling for the in-process devnet, where receipts are immediate
    pub fn in_process() -> Self {
        Self {
            poll_interval: Duration::from_millis(5),
            timeout: Duration::from_secs(2),
        }
    }
}

/// Poll `provider` until `hash` has a receipt or `config.timeout` elapses
pub async fn wait_for_receipt<P>(
    provider: &P,
    hash: &TxHash,
    config: &WatchConfig,
) -> ProviderResult<Receipt>
where
    P: WalletProvider + ?Sized,
{
    let started = Instant::now();
    loop {
        if let Some(receipt) = provider.transaction_receipt(hash).await? {
            return Ok(receipt);
        }
        if started.elapsed() >= config.timeout {
            tracing::warn!(tx = %hash, "Receipt wait timed out");
            return Err(ProviderError::Timeout(*hash));
        }
        tokio::time::sleep(config.poll_interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{DevnetWallet, SharedDevnet};
    use baz_chain::{Call, Devnet};
    use baz_core::{Address, AppConfig};
    use std::sync::Arc;
    use tokio::sync::RwLock;

    const SEPOLIA: u64 = 11_155_111;

    async fn wallet_with_token() -> (DevnetWallet, Address) {
        let config = AppConfig::default();
        let devnet: SharedDevnet = Arc::new(RwLock::new(Devnet::from_config(&config)));
        let wallet = DevnetWallet::new(devnet, config.operator, SEPOLIA);
        let hash = wallet
            .send_transaction(Call::DeployToken {
                name: "Bazaar Token".into(),
                symbol: "BAZ".into(),
                decimals: 18,
                initial_supply: 1_000,
            })
            .await
            .unwrap();
        let token = wallet
            .transaction_receipt(&hash)
            .await
            .unwrap()
            .unwrap()
            .contract_address
            .unwrap();
        (wallet, token)
    }

    #[tokio::test]
    async fn test_wait_returns_reverted_receipts() {
        let (wallet, token) = wallet_with_token().await;
        let bad = wallet
            .send_transaction(Call::Transfer {
                token,
                to: Address::from_label("alice"),
                amount: 1_000_000,
            })
            .await
            .unwrap();

        let receipt = wait_for_receipt(&wallet, &bad, &WatchConfig::in_process())
            .await
            .unwrap();
        assert_eq!(receipt.transaction_hash, bad);
        assert_eq!(
            receipt.revert_reason(),
            Some("ERC20: transfer amount exceeds balance")
        );
    }

    #[tokio::test]
    async fn test_unknown_hash_times_out() {
        let (wallet, _) = wallet_with_token().await;
        let missing = TxHash::digest(b"never sent");
        let config = WatchConfig {
            poll_interval: Duration::from_millis(1),
            timeout: Duration::from_millis(20),
        };

        let err = wait_for_receipt(&wallet, &missing, &config).await.unwrap_err();
        assert!(matches!(err, ProviderError::Timeout(h) if h == missing));
    }
}
