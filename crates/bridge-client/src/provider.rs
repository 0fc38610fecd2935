//! EIP-1193 style wallet provider
//!
//! The bridge flow only talks to a [`WalletProvider`]. [`DevnetWallet`] is
//! the implementation backed by the in-process devnet: it signs as a single
//! account and keeps its own notion of the selected chain and of which
//! chains the user has added.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use baz_chain::{Call, Devnet, LogEntry, LogFilter, Receipt, View, ViewResult};
use baz_core::{Address, Amount, ChainId, NetworkConfig, TxHash};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::ProviderError;
use crate::watcher::{self, WatchConfig};

/// Devnet shared between wallets and the API server
pub type SharedDevnet = Arc<RwLock<Devnet>>;

pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

/// `wallet_addEthereumChain` parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddChainParams {
    pub chain_id: ChainId,
    pub chain_name: String,
    pub native_currency: NativeCurrency,
    #[serde(default)]
    pub rpc_urls: Vec<String>,
    #[serde(default)]
    pub block_explorer_urls: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

impl AddChainParams {
    pub fn from_network(network: &NetworkConfig) -> Self {
        Self {
            chain_id: network.chain_id,
            chain_name: network.name.clone(),
            native_currency: NativeCurrency {
                name: "Ether".to_string(),
                symbol: "ETH".to_string(),
                decimals: 18,
            },
            rpc_urls: Vec::new(),
            block_explorer_urls: Vec::new(),
        }
    }
}

#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// `eth_requestAccounts`
    async fn accounts(&self) -> ProviderResult<Vec<Address>>;

    /// `eth_chainId`
    async fn chain_id(&self) -> ProviderResult<ChainId>;

    /// `wallet_switchEthereumChain`, 4902 when the wallet does not know the chain
    async fn switch_chain(&self, chain_id: ChainId) -> ProviderResult<()>;

    /// `wallet_addEthereumChain`
    async fn add_chain(&self, params: AddChainParams) -> ProviderResult<()>;

    /// `eth_sendTransaction` on the selected chain
    async fn send_transaction(&self, call: Call) -> ProviderResult<TxHash>;

    /// `eth_getTransactionReceipt`, `None` while pending
    async fn transaction_receipt(&self, hash: &TxHash) -> ProviderResult<Option<Receipt>>;

    /// `eth_call` on the selected chain
    async fn call(&self, view: View) -> ProviderResult<ViewResult>;

    /// `eth_getLogs` on the selected chain
    async fn logs(&self, filter: LogFilter) -> ProviderResult<Vec<LogEntry>>;

    /// `call` for a view that answers an amount
    async fn call_amount(&self, view: View) -> ProviderResult<Amount> {
        match self.call(view).await? {
            ViewResult::Amount(amount) => Ok(amount),
            other => Err(ProviderError::UnexpectedResult {
                expected: "an amount",
                got: format!("{:?}", other),
            }),
        }
    }

    /// `call` for a view that answers a flag
    async fn call_bool(&self, view: View) -> ProviderResult<bool> {
        match self.call(view).await? {
            ViewResult::Bool(flag) => Ok(flag),
            other => Err(ProviderError::UnexpectedResult {
                expected: "a bool",
                got: format!("{:?}", other),
            }),
        }
    }

    /// Poll until the receipt is available
    async fn wait_for_receipt(&self, hash: &TxHash) -> ProviderResult<Receipt> {
        watcher::wait_for_receipt(self, hash, &WatchConfig::default()).await
    }

    /// First account, the one that signs
    async fn account(&self) -> ProviderResult<Address> {
        self.accounts()
            .await?
            .into_iter()
            .next()
            .ok_or(ProviderError::UserRejected)
    }

    /// Switch, adding the chain first if the wallet answers 4902
    async fn ensure_chain(&self, params: &AddChainParams) -> ProviderResult<()> {
        if self.chain_id().await? == params.chain_id {
            return Ok(());
        }
        match self.switch_chain(params.chain_id).await {
            Err(ProviderError::UnrecognizedChain(id)) => {
                tracing::info!(chain = id, "Wallet does not know chain, adding it");
                self.add_chain(params.clone()).await?;
                self.switch_chain(params.chain_id).await
            }
            other => other,
        }
    }
}

struct WalletSession {
    chain_id: ChainId,
    known_chains: BTreeSet<ChainId>,
    reject_next: bool,
}

/// Wallet over the shared devnet, signing as one account
pub struct DevnetWallet {
    devnet: SharedDevnet,
    account: Address,
    session: Mutex<WalletSession>,
    watch: WatchConfig,
}

impl DevnetWallet {
    /// A wallet that initially only knows `chain_id`
    pub fn new(devnet: SharedDevnet, account: Address, chain_id: ChainId) -> Self {
        Self {
            devnet,
            account,
            session: Mutex::new(WalletSession {
                chain_id,
                known_chains: BTreeSet::from([chain_id]),
                reject_next: false,
            }),
            watch: WatchConfig::default(),
        }
    }

    /// Also know every chain in `chain_ids` (no 4902 on switch)
    pub fn with_known_chains(self, chain_ids: impl IntoIterator<Item = ChainId>) -> Self {
        self.lock_session().known_chains.extend(chain_ids);
        self
    }

    pub fn with_watch_config(mut self, watch: WatchConfig) -> Self {
        self.watch = watch;
        self
    }

    pub fn address(&self) -> Address {
        self.account
    }

    pub fn devnet(&self) -> &SharedDevnet {
        &self.devnet
    }

    /// Make the user reject the next request that needs a signature
    pub fn reject_next_request(&self) {
        self.lock_session().reject_next = true;
    }

    fn lock_session(&self) -> MutexGuard<'_, WalletSession> {
        self.session.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn current_chain(&self) -> ChainId {
        self.lock_session().chain_id
    }

    fn take_rejection(&self) -> bool {
        std::mem::take(&mut self.lock_session().reject_next)
    }
}

#[async_trait]
impl WalletProvider for DevnetWallet {
    async fn accounts(&self) -> ProviderResult<Vec<Address>> {
        Ok(vec![self.account])
    }

    async fn chain_id(&self) -> ProviderResult<ChainId> {
        Ok(self.current_chain())
    }

    async fn switch_chain(&self, chain_id: ChainId) -> ProviderResult<()> {
        if self.take_rejection() {
            return Err(ProviderError::UserRejected);
        }
        let mut session = self.lock_session();
        if !session.known_chains.contains(&chain_id) {
            return Err(ProviderError::UnrecognizedChain(chain_id));
        }
        if session.chain_id != chain_id {
            tracing::debug!(from = session.chain_id, to = chain_id, "Switching chain");
            session.chain_id = chain_id;
        }
        Ok(())
    }

    async fn add_chain(&self, params: AddChainParams) -> ProviderResult<()> {
        if self.take_rejection() {
            return Err(ProviderError::UserRejected);
        }
        if !self.devnet.read().await.contains(params.chain_id) {
            return Err(ProviderError::InvalidParams(format!(
                "no RPC endpoint serves chain {}",
                params.chain_id
            )));
        }
        self.lock_session().known_chains.insert(params.chain_id);
        tracing::debug!(chain = params.chain_id, name = %params.chain_name, "Chain added");
        Ok(())
    }

    async fn send_transaction(&self, call: Call) -> ProviderResult<TxHash> {
        if self.take_rejection() {
            return Err(ProviderError::UserRejected);
        }
        let chain_id = self.current_chain();
        let mut devnet = self.devnet.write().await;
        let receipt = devnet.chain_mut(chain_id)?.execute(self.account, call)?;
        Ok(receipt.transaction_hash)
    }

    async fn transaction_receipt(&self, hash: &TxHash) -> ProviderResult<Option<Receipt>> {
        let chain_id = self.current_chain();
        let devnet = self.devnet.read().await;
        Ok(devnet.chain(chain_id)?.receipt(hash).cloned())
    }

    async fn call(&self, view: View) -> ProviderResult<ViewResult> {
        let chain_id = self.current_chain();
        let devnet = self.devnet.read().await;
        Ok(devnet.chain(chain_id)?.view(&view)?)
    }

    async fn logs(&self, filter: LogFilter) -> ProviderResult<Vec<LogEntry>> {
        let chain_id = self.current_chain();
        let devnet = self.devnet.read().await;
        Ok(devnet.chain(chain_id)?.logs(&filter))
    }

    async fn wait_for_receipt(&self, hash: &TxHash) -> ProviderResult<Receipt> {
        watcher::wait_for_receipt(self, hash, &self.watch).await
    }
}
