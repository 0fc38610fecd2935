//! Lock/unlock bridge contract
//!
//! One instance per chain. Locking moves tokens into the bridge and issues
//! the caller a per-user nonce; unlocking on the paired chain releases
//! tokens from that chain's pre-funded balance if the nonce has not been
//! consumed there yet.
//!
//! Nothing ties an unlock to a real lock on the other chain. The bridge is an
//! operator-trusted relay: both balances are funded by the owner, and the
//! processed-nonce set is the only replay guard.

use std::collections::{BTreeMap, BTreeSet};

use baz_core::{Address, Amount, Event, ExecContext, Revert};
use serde::{Deserialize, Serialize};
use token::Ledger;

use crate::state::{BridgeStatus, LockRecord};

/// Bridge contract state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bridge {
    pub address: Address,
    /// Bridged ERC20
    pub token: Address,
    pub owner: Address,
    /// This chain's tag, reported as the source of locks
    pub chain_tag: String,
    /// Paired chain's tag: target of locks, source of unlocks
    pub target_chain: String,
    pub paused: bool,
    #[serde(default)]
    user_nonces: BTreeMap<Address, u128>,
    /// Nonces consumed by unlocks on this contract. Keyed by nonce alone.
    #[serde(default)]
    processed_nonces: BTreeSet<u128>,
}

impl Bridge {
    pub fn new(
        address: Address,
        token: Address,
        owner: Address,
        chain_tag: impl Into<String>,
        target_chain: impl Into<String>,
    ) -> Self {
        Self {
            address,
            token,
            owner,
            chain_tag: chain_tag.into(),
            target_chain: target_chain.into(),
            paused: false,
            user_nonces: BTreeMap::new(),
            processed_nonces: BTreeSet::new(),
        }
    }

    fn only_owner(&self, ctx: &ExecContext) -> Result<(), Revert> {
        if ctx.sender != self.owner {
            return Err(Revert::NotOwner);
        }
        Ok(())
    }

    fn when_not_paused(&self) -> Result<(), Revert> {
        if self.paused {
            return Err(Revert::Paused);
        }
        Ok(())
    }

    // ─── Views ──────────────────────────────────────────────────────────────

    pub fn bridge_balance(&self, ledger: &Ledger) -> Amount {
        ledger.balance_of(&self.token, &self.address)
    }

    pub fn is_nonce_processed(&self, nonce: u128) -> bool {
        self.processed_nonces.contains(&nonce)
    }

    /// Number of locks `user` has made (the last nonce issued to them)
    pub fn user_nonce(&self, user: &Address) -> u128 {
        self.user_nonces.get(user).copied().unwrap_or(0)
    }

    pub fn status(&self, ledger: &Ledger) -> BridgeStatus {
        BridgeStatus {
            address: self.address,
            token: self.token,
            owner: self.owner,
            paused: self.paused,
            chain_tag: self.chain_tag.clone(),
            target_chain: self.target_chain.clone(),
            balance: self.bridge_balance(ledger).to_string(),
            processed_nonces: self.processed_nonces.len(),
            users: self.user_nonces.len(),
        }
    }

    // ─── Lock ───────────────────────────────────────────────────────────────

    /// `lockTokens(amount)`: pull `amount` from the caller (who must have
    /// approved the bridge) and issue the caller's next nonce.
    pub fn lock_tokens(
        &mut self,
        ledger: &mut Ledger,
        ctx: &mut ExecContext,
        amount: Amount,
    ) -> Result<LockRecord, Revert> {
        self.when_not_paused()?;
        if amount == 0 {
            return Err(Revert::ZeroAmount);
        }

        let user = ctx.sender;
        if ledger.balance_of(&self.token, &user) < amount {
            return Err(Revert::InsufficientBalance);
        }
        if ledger.allowance(&self.token, &user, &self.address) < amount {
            return Err(Revert::InsufficientAllowance);
        }

        let bridge = self.address;
        let token = self.token;
        ctx.call_as(bridge, |ctx| {
            ledger.transfer_from(ctx, &token, &user, &bridge, amount)
        })?;

        let nonce = self
            .user_nonce(&user)
            .checked_add(1)
            .ok_or(Revert::Overflow)?;
        self.user_nonces.insert(user, nonce);

        ctx.emit(
            self.address,
            Event::TokensLocked {
                user,
                amount,
                nonce,
                target_chain: self.target_chain.clone(),
            },
        );
        tracing::info!(
            bridge = %self.address,
            user = %user,
            amount = %amount,
            nonce = %nonce,
            target = %self.target_chain,
            "Tokens locked"
        );

        Ok(LockRecord {
            bridge: self.address,
            user,
            amount,
            nonce,
            target_chain: self.target_chain.clone(),
        })
    }

    // ─── Unlock ─────────────────────────────────────────────────────────────

    /// `unlockTokens(user, amount, nonce)`: owner releases funds to `user`
    pub fn unlock_tokens(
        &mut self,
        ledger: &mut Ledger,
        ctx: &mut ExecContext,
        user: &Address,
        amount: Amount,
        nonce: u128,
    ) -> Result<(), Revert> {
        self.only_owner(ctx)?;
        self.release(ledger, ctx, user, amount, nonce)
    }

    /// `selfUnlockTokens(amount, nonce)`: the caller releases funds to itself
    pub fn self_unlock_tokens(
        &mut self,
        ledger: &mut Ledger,
        ctx: &mut ExecContext,
        amount: Amount,
        nonce: u128,
    ) -> Result<(), Revert> {
        let user = ctx.sender;
        self.release(ledger, ctx, &user, amount, nonce)
    }

    fn release(
        &mut self,
        ledger: &mut Ledger,
        ctx: &mut ExecContext,
        user: &Address,
        amount: Amount,
        nonce: u128,
    ) -> Result<(), Revert> {
        self.when_not_paused()?;
        if amount == 0 {
            return Err(Revert::ZeroAmount);
        }
        if self.is_nonce_processed(nonce) {
            return Err(Revert::NonceAlreadyProcessed);
        }
        if self.bridge_balance(ledger) < amount {
            return Err(Revert::InsufficientBalance);
        }

        let bridge = self.address;
        let token = self.token;
        ctx.call_as(bridge, |ctx| ledger.transfer(ctx, &token, user, amount))?;
        self.processed_nonces.insert(nonce);

        ctx.emit(
            self.address,
            Event::TokensUnlocked {
                user: *user,
                amount,
                nonce,
                source_chain: self.target_chain.clone(),
            },
        );
        tracing::info!(
            bridge = %self.address,
            user = %user,
            amount = %amount,
            nonce = %nonce,
            "Tokens unlocked"
        );
        Ok(())
    }

    // ─── Admin ──────────────────────────────────────────────────────────────

    pub fn pause(&mut self, ctx: &mut ExecContext) -> Result<(), Revert> {
        self.only_owner(ctx)?;
        self.when_not_paused()?;
        self.paused = true;
        ctx.emit(
            self.address,
            Event::BridgePaused {
                account: ctx.sender,
            },
        );
        tracing::warn!(bridge = %self.address, "Bridge paused");
        Ok(())
    }

    pub fn unpause(&mut self, ctx: &mut ExecContext) -> Result<(), Revert> {
        self.only_owner(ctx)?;
        if !self.paused {
            return Err(Revert::NotPaused);
        }
        self.paused = false;
        ctx.emit(
            self.address,
            Event::BridgeUnpaused {
                account: ctx.sender,
            },
        );
        tracing::info!(bridge = %self.address, "Bridge unpaused");
        Ok(())
    }

    /// `emergencyWithdraw(amount)`: owner pulls funds out, ignoring pause
    /// state and any locks still waiting to be unlocked
    pub fn emergency_withdraw(
        &mut self,
        ledger: &mut Ledger,
        ctx: &mut ExecContext,
        amount: Amount,
    ) -> Result<(), Revert> {
        self.only_owner(ctx)?;
        if self.bridge_balance(ledger) < amount {
            return Err(Revert::InsufficientBalance);
        }
        let owner = self.owner;
        let bridge = self.address;
        let token = self.token;
        ctx.call_as(bridge, |ctx| ledger.transfer(ctx, &token, &owner, amount))?;
        ctx.emit(self.address, Event::EmergencyWithdrawal { to: owner, amount });
        tracing::warn!(bridge = %self.address, amount = %amount, "Emergency withdrawal");
        Ok(())
    }

    pub fn transfer_ownership(
        &mut self,
        ctx: &mut ExecContext,
        new_owner: &Address,
    ) -> Result<(), Revert> {
        self.only_owner(ctx)?;
        if new_owner.is_zero() {
            return Err(Revert::ZeroOwner);
        }
        let previous_owner = self.owner;
        self.owner = *new_owner;
        ctx.emit(
            self.address,
            Event::OwnershipTransferred {
                previous_owner,
                new_owner: *new_owner,
            },
        );
        Ok(())
    }
}
