//! MasterChef contract
//!
//! `accRewardPerShare` grows by `reward * ACC_PRECISION / lpSupply` every
//! time a pool is touched. A user's claim is
//! `amount * accRewardPerShare / ACC_PRECISION - rewardDebt`, and every
//! stake change resets `rewardDebt` to the current accrued value.

use std::collections::BTreeMap;

use baz_core::{Address, Amount, BlockNumber, Event, ExecContext, Revert};
use num_bigint::BigUint;
use num_traits::ToPrimitive;
use serde::{Deserialize, Serialize};
use token::Ledger;

use crate::state::{FarmStatus, PoolInfo, UserInfo};

/// Fixed-point scale for `acc_reward_per_share`
pub const ACC_PRECISION: u128 = 1_000_000_000_000;

const WITHDRAW_NOT_GOOD: &str = "withdraw: not good";
const INVALID_POOL: &str = "MasterChef: invalid pool";
const POOL_EXISTS: &str = "MasterChef: pool already exists";

fn mul_div(a: u128, b: u128, c: u128) -> Result<u128, Revert> {
    if c == 0 {
        return Ok(0);
    }
    (BigUint::from(a) * BigUint::from(b) / BigUint::from(c))
        .to_u128()
        .ok_or(Revert::Overflow)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Pool {
    info: PoolInfo,
    #[serde(default)]
    users: BTreeMap<Address, UserInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MasterChef {
    pub address: Address,
    pub reward_token: Address,
    pub owner: Address,
    pub reward_per_block: Amount,
    pub start_block: BlockNumber,
    pub total_alloc_point: u64,
    pools: Vec<Pool>,
}

impl MasterChef {
    pub fn new(
        address: Address,
        reward_token: Address,
        owner: Address,
        reward_per_block: Amount,
        start_block: BlockNumber,
    ) -> Self {
        Self {
            address,
            reward_token,
            owner,
            reward_per_block,
            start_block,
            total_alloc_point: 0,
            pools: Vec::new(),
        }
    }

    fn only_owner(&self, ctx: &ExecContext) -> Result<(), Revert> {
        if ctx.sender != self.owner {
            return Err(Revert::NotOwner);
        }
        Ok(())
    }

    fn pool(&self, pid: u64) -> Result<&Pool, Revert> {
        self.pools
            .get(pid as usize)
            .ok_or_else(|| Revert::reason(INVALID_POOL))
    }

    // ─── Views ──────────────────────────────────────────────────────────────

    pub fn pool_length(&self) -> usize {
        self.pools.len()
    }

    pub fn pool_info(&self, pid: u64) -> Option<&PoolInfo> {
        self.pools.get(pid as usize).map(|p| &p.info)
    }

    pub fn user_info(&self, pid: u64, user: &Address) -> UserInfo {
        self.pools
            .get(pid as usize)
            .and_then(|p| p.users.get(user).copied())
            .unwrap_or_default()
    }

    /// Reward accrued to the pool between `from` and `to`
    fn pool_reward(&self, info: &PoolInfo, from: BlockNumber, to: BlockNumber) -> Result<u128, Revert> {
        if to <= from || self.total_alloc_point == 0 {
            return Ok(0);
        }
        let blocks = u128::from(to - from);
        let emitted = blocks
            .checked_mul(self.reward_per_block)
            .ok_or(Revert::Overflow)?;
        mul_div(
            emitted,
            u128::from(info.alloc_point),
            u128::from(self.total_alloc_point),
        )
    }

    /// `pendingReward(pid, user)` as of `block`, projecting the pool's
    /// accumulator forward without touching state
    pub fn pending_reward(
        &self,
        ledger: &Ledger,
        pid: u64,
        user: &Address,
        block: BlockNumber,
    ) -> Result<Amount, Revert> {
        let pool = self.pool(pid)?;
        let info = &pool.info;
        let stake = pool.users.get(user).copied().unwrap_or_default();
        let lp_supply = ledger.balance_of(&info.lp_token, &self.address);

        let mut acc = info.acc_reward_per_share;
        if block > info.last_reward_block && lp_supply != 0 {
            let reward = self.pool_reward(info, info.last_reward_block, block)?;
            acc = acc
                .checked_add(mul_div(reward, ACC_PRECISION, lp_supply)?)
                .ok_or(Revert::Overflow)?;
        }
        Ok(mul_div(stake.amount, acc, ACC_PRECISION)?.saturating_sub(stake.reward_debt))
    }

    pub fn reward_balance(&self, ledger: &Ledger) -> Amount {
        ledger.balance_of(&self.reward_token, &self.address)
    }

    pub fn status(&self, ledger: &Ledger) -> FarmStatus {
        FarmStatus {
            address: self.address,
            reward_token: self.reward_token,
            owner: self.owner,
            reward_per_block: self.reward_per_block.to_string(),
            start_block: self.start_block,
            total_alloc_point: self.total_alloc_point,
            pools: self.pools.iter().map(|p| p.info.clone()).collect(),
            reward_balance: self.reward_balance(ledger).to_string(),
        }
    }

    // ─── Admin ──────────────────────────────────────────────────────────────

    /// `add(allocPoint, lpToken)`: returns the new pool id
    pub fn add(
        &mut self,
        ledger: &Ledger,
        ctx: &mut ExecContext,
        alloc_point: u64,
        lp_token: Address,
    ) -> Result<u64, Revert> {
        self.only_owner(ctx)?;
        if self.pools.iter().any(|p| p.info.lp_token == lp_token) {
            return Err(Revert::reason(POOL_EXISTS));
        }
        self.mass_update_pools(ledger, ctx.block.number)?;

        self.total_alloc_point = self
            .total_alloc_point
            .checked_add(alloc_point)
            .ok_or(Revert::Overflow)?;
        let pid = self.pools.len() as u64;
        self.pools.push(Pool {
            info: PoolInfo {
                lp_token,
                alloc_point,
                last_reward_block: ctx.block.number.max(self.start_block),
                acc_reward_per_share: 0,
            },
            users: BTreeMap::new(),
        });
        ctx.emit(
            self.address,
            Event::PoolAdded {
                pid,
                lp_token,
                alloc_point,
            },
        );
        tracing::info!(farm = %self.address, pid, lp_token = %lp_token, alloc_point, "Pool added");
        Ok(pid)
    }

    /// `set(pid, allocPoint)`
    pub fn set(
        &mut self,
        ledger: &Ledger,
        ctx: &mut ExecContext,
        pid: u64,
        alloc_point: u64,
    ) -> Result<(), Revert> {
        self.only_owner(ctx)?;
        let previous = self.pool(pid)?.info.alloc_point;
        let total = self
            .total_alloc_point
            .checked_sub(previous)
            .and_then(|t| t.checked_add(alloc_point))
            .ok_or(Revert::Overflow)?;
        self.mass_update_pools(ledger, ctx.block.number)?;
        self.total_alloc_point = total;
        self.pools[pid as usize].info.alloc_point = alloc_point;
        tracing::info!(farm = %self.address, pid, alloc_point, "Pool allocation updated");
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

    // ─── Accounting ─────────────────────────────────────────────────────────

    pub fn mass_update_pools(&mut self, ledger: &Ledger, block: BlockNumber) -> Result<(), Revert> {
        for pid in 0..self.pools.len() as u64 {
            self.update_pool(ledger, pid, block)?;
        }
        Ok(())
    }

    /// `updatePool(pid)`: fold rewards since `last_reward_block` into the
    /// accumulator
    pub fn update_pool(&mut self, ledger: &Ledger, pid: u64, block: BlockNumber) -> Result<(), Revert> {
        let info = self.pool(pid)?.info.clone();
        if block <= info.last_reward_block {
            return Ok(());
        }
        let lp_supply = ledger.balance_of(&info.lp_token, &self.address);
        let mut acc = info.acc_reward_per_share;
        if lp_supply != 0 {
            let reward = self.pool_reward(&info, info.last_reward_block, block)?;
            acc = acc
                .checked_add(mul_div(reward, ACC_PRECISION, lp_supply)?)
                .ok_or(Revert::Overflow)?;
        }
        let pool = &mut self.pools[pid as usize].info;
        pool.acc_reward_per_share = acc;
        pool.last_reward_block = block;
        Ok(())
    }

    /// Pay out whatever the user has accrued and return the amount paid
    fn settle(
        &self,
        ledger: &mut Ledger,
        ctx: &mut ExecContext,
        pid: u64,
        user: &Address,
    ) -> Result<Amount, Revert> {
        let pool = self.pool(pid)?;
        let stake = pool.users.get(user).copied().unwrap_or_default();
        let accrued = mul_div(stake.amount, pool.info.acc_reward_per_share, ACC_PRECISION)?;
        let pending = accrued.saturating_sub(stake.reward_debt);
        if pending == 0 {
            return Ok(0);
        }
        self.safe_reward_transfer(ledger, ctx, user, pending)
    }

    /// Transfer rewards, capped at what the farm holds
    fn safe_reward_transfer(
        &self,
        ledger: &mut Ledger,
        ctx: &mut ExecContext,
        to: &Address,
        amount: Amount,
    ) -> Result<Amount, Revert> {
        let available = self.reward_balance(ledger);
        let paid = amount.min(available);
        if paid < amount {
            tracing::warn!(
                farm = %self.address,
                owed = %amount,
                available = %available,
                "Reward balance short, paying what is available"
            );
        }
        if paid > 0 {
            let token = self.reward_token;
            ctx.call_as(self.address, |ctx| ledger.transfer(ctx, &token, to, paid))?;
        }
        Ok(paid)
    }

    fn reset_debt(&mut self, pid: u64, user: Address, amount: u128) -> Result<(), Revert> {
        let pool = &mut self.pools[pid as usize];
        let reward_debt = mul_div(amount, pool.info.acc_reward_per_share, ACC_PRECISION)?;
        pool.users.insert(
            user,
            UserInfo {
                amount,
                reward_debt,
            },
        );
        Ok(())
    }

    // ─── User actions ───────────────────────────────────────────────────────

    /// `deposit(pid, amount)`: harvests pending rewards then stakes `amount`
    /// LP (approved to the farm). A zero deposit is a plain harvest.
    pub fn deposit(
        &mut self,
        ledger: &mut Ledger,
        ctx: &mut ExecContext,
        pid: u64,
        amount: Amount,
    ) -> Result<Amount, Revert> {
        let user = ctx.sender;
        self.update_pool(ledger, pid, ctx.block.number)?;
        let paid = self.settle(ledger, ctx, pid, &user)?;

        let lp_token = self.pool(pid)?.info.lp_token;
        if amount > 0 {
            let farm = self.address;
            ctx.call_as(farm, |ctx| {
                ledger.transfer_from(ctx, &lp_token, &user, &farm, amount)
            })?;
        }
        let staked = self
            .user_info(pid, &user)
            .amount
            .checked_add(amount)
            .ok_or(Revert::Overflow)?;
        self.reset_debt(pid, user, staked)?;

        ctx.emit(self.address, Event::Deposit { user, pid, amount });
        tracing::debug!(farm = %self.address, pid, user = %user, amount = %amount, reward = %paid, "Deposit");
        Ok(paid)
    }

    /// `withdraw(pid, amount)`: harvests then unstakes `amount`
    pub fn withdraw(
        &mut self,
        ledger: &mut Ledger,
        ctx: &mut ExecContext,
        pid: u64,
        amount: Amount,
    ) -> Result<Amount, Revert> {
        let user = ctx.sender;
        let stake = self.pool(pid)?.users.get(&user).copied().unwrap_or_default();
        if stake.amount < amount {
            return Err(Revert::reason(WITHDRAW_NOT_GOOD));
        }
        self.update_pool(ledger, pid, ctx.block.number)?;
        let paid = self.settle(ledger, ctx, pid, &user)?;

        if amount > 0 {
            let lp_token = self.pool(pid)?.info.lp_token;
            ctx.call_as(self.address, |ctx| ledger.transfer(ctx, &lp_token, &user, amount))?;
        }
        self.reset_debt(pid, user, stake.amount - amount)?;

        ctx.emit(self.address, Event::Withdraw { user, pid, amount });
        tracing::debug!(farm = %self.address, pid, user = %user, amount = %amount, reward = %paid, "Withdraw");
        Ok(paid)
    }

    /// `harvest(pid)`: claim rewards without changing the stake
    pub fn harvest(
        &mut self,
        ledger: &mut Ledger,
        ctx: &mut ExecContext,
        pid: u64,
    ) -> Result<Amount, Revert> {
        let user = ctx.sender;
        self.update_pool(ledger, pid, ctx.block.number)?;
        let paid = self.settle(ledger, ctx, pid, &user)?;
        let staked = self.user_info(pid, &user).amount;
        self.reset_debt(pid, user, staked)?;
        ctx.emit(
            self.address,
            Event::Harvest {
                user,
                pid,
                amount: paid,
            },
        );
        Ok(paid)
    }

    /// `emergencyWithdraw(pid)`: return the whole stake and forfeit rewards
    pub fn emergency_withdraw(
        &mut self,
        ledger: &mut Ledger,
        ctx: &mut ExecContext,
        pid: u64,
    ) -> Result<Amount, Revert> {
        let user = ctx.sender;
        let pool = self.pool(pid)?;
        let lp_token = pool.info.lp_token;
        let amount = pool.users.get(&user).map(|u| u.amount).unwrap_or(0);

        if amount > 0 {
            ctx.call_as(self.address, |ctx| ledger.transfer(ctx, &lp_token, &user, amount))?;
        }
        self.pools[pid as usize].users.remove(&user);
        ctx.emit(
            self.address,
            Event::EmergencyFarmWithdraw { user, pid, amount },
        );
        tracing::warn!(farm = %self.address, pid, user = %user, amount = %amount, "Emergency farm withdrawal");
        Ok(amount)
    }
}
