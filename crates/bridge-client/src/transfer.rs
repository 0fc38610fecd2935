//! Bridge transfer orchestration
//!
//! A transfer moves a user's tokens from the source bridge to the
//! destination bridge in five steps:
//!
//! ```text
//! Approve -> Lock -> SwitchNetwork -> Unlock -> Complete
//! ```
//!
//! Each step waits for its receipt before the next one starts. A failure
//! leaves the [`BridgeTransfer`] at the failing step with every hash and the
//! nonce it has already collected, and [`BridgeFlow::resume`] picks it up
//! from there. Once the lock has a successful receipt the flow never locks
//! again; the nonce is recovered from that receipt instead.

use std::fmt;

use baz_chain::{Call, Deployment, Devnet, Receipt, View};
use baz_core::{amount_str, Address, Amount, AppConfig, ChainId, NetworkConfig, TxHash};
use bridge::UnlockRecord;
use serde::{Deserialize, Serialize};

use crate::error::{FlowError, ProviderError};
use crate::provider::{AddChainParams, WalletProvider};
use crate::recovery::lock_from_receipt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferStep {
    Approve,
    Lock,
    SwitchNetwork,
    Unlock,
    Complete,
}

impl fmt::Display for TransferStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Approve => "approve",
            Self::Lock => "lock",
            Self::SwitchNetwork => "switch network",
            Self::Unlock => "unlock",
            Self::Complete => "complete",
        };
        f.write_str(name)
    }
}

/// Who submits the destination unlock
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnlockMode {
    /// The user calls `selfUnlockTokens` from their own wallet
    #[default]
    SelfUnlock,
    /// The bridge owner calls `unlockTokens` for the user
    OwnerRelay,
}

/// One side of a route: the chain and its bridge contracts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeEndpoint {
    pub network: AddChainParams,
    pub bridge: Address,
    pub token: Address,
}

impl BridgeEndpoint {
    pub fn new(network: &NetworkConfig, deployment: &Deployment) -> Self {
        Self {
            network: AddChainParams::from_network(network),
            bridge: deployment.bridge,
            token: deployment.token,
        }
    }

    pub fn chain_id(&self) -> ChainId {
        self.network.chain_id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeRoute {
    pub source: BridgeEndpoint,
    pub destination: BridgeEndpoint,
}

impl BridgeRoute {
    pub fn new(source: BridgeEndpoint, destination: BridgeEndpoint) -> Self {
        Self {
            source,
            destination,
        }
    }

    /// Route between two configured networks with recorded deployments
    pub fn from_devnet(
        config: &AppConfig,
        devnet: &Devnet,
        source: &str,
        destination: &str,
    ) -> Result<Self, FlowError> {
        let endpoint = |name: &str| -> Result<BridgeEndpoint, FlowError> {
            let network = config.network(name)?;
            let deployment = devnet
                .deployment(network.chain_id)
                .ok_or_else(|| FlowError::NotDeployed(name.to_string()))?;
            Ok(BridgeEndpoint::new(network, deployment))
        };
        Ok(Self::new(endpoint(source)?, endpoint(destination)?))
    }

    pub fn reversed(&self) -> Self {
        Self::new(self.destination.clone(), self.source.clone())
    }
}

/// Progress record of one transfer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeTransfer {
    pub id: String,
    pub user: Address,
    #[serde(with = "amount_str")]
    pub amount: Amount,
    pub source_chain: ChainId,
    pub destination_chain: ChainId,
    pub mode: UnlockMode,
    pub step: TransferStep,
    pub approve_tx: Option<TxHash>,
    pub lock_tx: Option<TxHash>,
    pub unlock_tx: Option<TxHash>,
    pub nonce: Option<u128>,
    /// Why the last attempt stopped
    pub last_error: Option<String>,
}

impl BridgeTransfer {
    pub fn new(user: Address, amount: Amount, route: &BridgeRoute, mode: UnlockMode) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user,
            amount,
            source_chain: route.source.chain_id(),
            destination_chain: route.destination.chain_id(),
            mode,
            step: TransferStep::Approve,
            approve_tx: None,
            lock_tx: None,
            unlock_tx: None,
            nonce: None,
            last_error: None,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.step == TransferStep::Complete
    }
}

/// Drives transfers over a route with the user's wallet and, for
/// [`UnlockMode::OwnerRelay`], the bridge owner's wallet.
pub struct BridgeFlow<'a> {
    route: BridgeRoute,
    wallet: &'a dyn WalletProvider,
    relayer: Option<&'a dyn WalletProvider>,
}

impl<'a> BridgeFlow<'a> {
    pub fn new(route: BridgeRoute, wallet: &'a dyn WalletProvider) -> Self {
        Self {
            route,
            wallet,
            relayer: None,
        }
    }

    pub fn with_relayer(mut self, relayer: &'a dyn WalletProvider) -> Self {
        self.relayer = Some(relayer);
        self
    }

    pub fn route(&self) -> &BridgeRoute {
        &self.route
    }

    /// New transfer for the wallet's account
    pub async fn prepare(&self, amount: Amount, mode: UnlockMode) -> Result<BridgeTransfer, FlowError> {
        if amount == 0 {
            return Err(FlowError::ZeroAmount);
        }
        let user = self
            .wallet
            .account()
            .await
            .map_err(FlowError::provider(TransferStep::Approve))?;
        Ok(BridgeTransfer::new(user, amount, &self.route, mode))
    }

    /// Prepare and run a transfer. The record is returned even on failure.
    pub async fn start(
        &self,
        amount: Amount,
        mode: UnlockMode,
    ) -> (Option<BridgeTransfer>, Result<(), FlowError>) {
        match self.prepare(amount, mode).await {
            Ok(mut transfer) => {
                let result = self.run(&mut transfer).await;
                (Some(transfer), result)
            }
            Err(e) => (None, Err(e)),
        }
    }

    /// Advance until complete or until a step fails
    pub async fn run(&self, transfer: &mut BridgeTransfer) -> Result<(), FlowError> {
        while !transfer.is_complete() {
            if let Err(e) = self.advance(transfer).await {
                tracing::warn!(
                    transfer = %transfer.id,
                    step = %transfer.step,
                    error = %e,
                    "Bridge transfer stopped"
                );
                transfer.last_error = Some(e.to_string());
                return Err(e);
            }
        }
        transfer.last_error = None;
        tracing::info!(
            transfer = %transfer.id,
            nonce = ?transfer.nonce,
            "Bridge transfer complete"
        );
        Ok(())
    }

    /// Continue a stopped transfer from its recorded step
    pub async fn resume(&self, transfer: &mut BridgeTransfer) -> Result<(), FlowError> {
        if transfer.is_complete() {
            return Err(FlowError::AlreadyComplete(transfer.id.clone()));
        }
        tracing::info!(transfer = %transfer.id, step = %transfer.step, "Resuming bridge transfer");
        self.run(transfer).await
    }

    /// Perform the current step and move to the next one
    pub async fn advance(&self, transfer: &mut BridgeTransfer) -> Result<TransferStep, FlowError> {
        let next = match transfer.step {
            TransferStep::Approve => self.approve(transfer).await?,
            TransferStep::Lock => self.lock(transfer).await?,
            TransferStep::SwitchNetwork => self.switch_network(transfer).await?,
            TransferStep::Unlock => self.unlock(transfer).await?,
            TransferStep::Complete => return Ok(TransferStep::Complete),
        };
        tracing::debug!(transfer = %transfer.id, from = %transfer.step, to = %next, "Step done");
        transfer.step = next;
        Ok(next)
    }

    fn unlock_provider(&self, mode: UnlockMode) -> Result<&'a dyn WalletProvider, FlowError> {
        match mode {
            UnlockMode::SelfUnlock => Ok(self.wallet),
            UnlockMode::OwnerRelay => self.relayer.ok_or(FlowError::NoRelayer),
        }
    }

    async fn approve(&self, transfer: &mut BridgeTransfer) -> Result<TransferStep, FlowError> {
        let step = TransferStep::Approve;
        let source = &self.route.source;
        // A lock already on record means the allowance was spent
        if transfer.lock_tx.is_some() {
            return Ok(TransferStep::Lock);
        }
        self.wallet
            .ensure_chain(&source.network)
            .await
            .map_err(FlowError::provider(step))?;

        let allowance = self
            .wallet
            .call_amount(View::Allowance {
                token: source.token,
                owner: transfer.user,
                spender: source.bridge,
            })
            .await
            .map_err(FlowError::provider(step))?;
        if allowance >= transfer.amount {
            tracing::debug!(transfer = %transfer.id, allowance, "Allowance sufficient, skipping approve");
            return Ok(TransferStep::Lock);
        }

        let hash = self
            .wallet
            .send_transaction(Call::Approve {
                token: source.token,
                spender: source.bridge,
                amount: transfer.amount,
            })
            .await
            .map_err(FlowError::provider(step))?;
        transfer.approve_tx = Some(hash);
        confirmed(self.wallet, step, &hash).await?;
        Ok(TransferStep::Lock)
    }

    async fn lock(&self, transfer: &mut BridgeTransfer) -> Result<TransferStep, FlowError> {
        let step = TransferStep::Lock;
        let source = &self.route.source;
        self.wallet
            .ensure_chain(&source.network)
            .await
            .map_err(FlowError::provider(step))?;

        if let Some(hash) = transfer.lock_tx {
            let receipt = self
                .wallet
                .wait_for_receipt(&hash)
                .await
                .map_err(FlowError::provider(step))?;
            if receipt.succeeded() {
                tracing::info!(transfer = %transfer.id, tx = %hash, "Lock already confirmed, not locking again");
                return self.record_lock(transfer, &receipt);
            }
            tracing::warn!(tx = %hash, "Previous lock reverted, submitting a new one");
        }

        let hash = self
            .wallet
            .send_transaction(Call::LockTokens {
                bridge: source.bridge,
                amount: transfer.amount,
            })
            .await
            .map_err(FlowError::provider(step))?;
        transfer.lock_tx = Some(hash);
        let receipt = confirmed(self.wallet, step, &hash).await?;
        self.record_lock(transfer, &receipt)
    }

    fn record_lock(&self, transfer: &mut BridgeTransfer, receipt: &Receipt) -> Result<TransferStep, FlowError> {
        let lock = lock_from_receipt(receipt, &self.route.source.bridge)
            .ok_or(FlowError::MissingLockEvent(receipt.transaction_hash))?;
        tracing::info!(
            transfer = %transfer.id,
            user = %lock.user,
            nonce = %lock.nonce,
            target = %lock.target_chain,
            "Tokens locked"
        );
        transfer.nonce = Some(lock.nonce);
        Ok(TransferStep::SwitchNetwork)
    }

    async fn switch_network(&self, transfer: &mut BridgeTransfer) -> Result<TransferStep, FlowError> {
        let step = TransferStep::SwitchNetwork;
        self.unlock_provider(transfer.mode)?
            .ensure_chain(&self.route.destination.network)
            .await
            .map_err(FlowError::provider(step))?;
        Ok(TransferStep::Unlock)
    }

    async fn unlock(&self, transfer: &mut BridgeTransfer) -> Result<TransferStep, FlowError> {
        let step = TransferStep::Unlock;
        let destination = &self.route.destination;
        let provider = self.unlock_provider(transfer.mode)?;
        provider
            .ensure_chain(&destination.network)
            .await
            .map_err(FlowError::provider(step))?;

        if let Some(hash) = transfer.unlock_tx {
            let receipt = provider
                .wait_for_receipt(&hash)
                .await
                .map_err(FlowError::provider(step))?;
            if receipt.succeeded() {
                return Ok(TransferStep::Complete);
            }
        }

        let nonce = match transfer.nonce {
            Some(nonce) => nonce,
            None => self.recover_nonce(transfer).await?,
        };
        let processed = provider
            .call_bool(View::IsNonceProcessed {
                bridge: destination.bridge,
                nonce,
            })
            .await
            .map_err(FlowError::provider(step))?;
        if processed {
            return Err(FlowError::NonceConsumed { nonce });
        }

        let call = match transfer.mode {
            UnlockMode::SelfUnlock => Call::SelfUnlockTokens {
                bridge: destination.bridge,
                amount: transfer.amount,
                nonce,
            },
            UnlockMode::OwnerRelay => Call::UnlockTokens {
                bridge: destination.bridge,
                user: transfer.user,
                amount: transfer.amount,
                nonce,
            },
        };
        let hash = provider
            .send_transaction(call)
            .await
            .map_err(FlowError::provider(step))?;
        transfer.unlock_tx = Some(hash);
        let receipt = confirmed(provider, step, &hash).await?;
        if let Some(unlock) = UnlockRecord::find_in(&receipt.logs) {
            tracing::info!(
                transfer = %transfer.id,
                user = %unlock.user,
                nonce = %unlock.nonce,
                source = %unlock.source_chain,
                "Tokens unlocked"
            );
        }
        Ok(TransferStep::Complete)
    }

    /// Nonce from the recorded lock receipt, read on the source chain
    async fn recover_nonce(&self, transfer: &mut BridgeTransfer) -> Result<u128, FlowError> {
        let step = TransferStep::Unlock;
        let hash = transfer.lock_tx.ok_or(FlowError::Provider {
            step,
            source: ProviderError::InvalidParams("transfer has no lock transaction".to_string()),
        })?;
        self.wallet
            .ensure_chain(&self.route.source.network)
            .await
            .map_err(FlowError::provider(step))?;
        let receipt = self
            .wallet
            .wait_for_receipt(&hash)
            .await
            .map_err(FlowError::provider(step))?;
        let lock = lock_from_receipt(&receipt, &self.route.source.bridge)
            .ok_or(FlowError::MissingLockEvent(hash))?;
        transfer.nonce = Some(lock.nonce);
        self.unlock_provider(transfer.mode)?
            .ensure_chain(&self.route.destination.network)
            .await
            .map_err(FlowError::provider(step))?;
        Ok(lock.nonce)
    }
}

/// Wait for `hash` and fail the step if it reverted
async fn confirmed(
    provider: &dyn WalletProvider,
    step: TransferStep,
    hash: &TxHash,
) -> Result<Receipt, FlowError> {
    let receipt = provider
        .wait_for_receipt(hash)
        .await
        .map_err(FlowError::provider(step))?;
    match receipt.revert_reason() {
        None => Ok(receipt),
        Some(reason) => Err(FlowError::Reverted {
            step,
            hash: *hash,
            reason: reason.to_string(),
        }),
    }
}
