//! Farm state types

use baz_core::{Address, BlockNumber};
use serde::{Deserialize, Serialize};

/// Per-pool accounting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolInfo {
    pub lp_token: Address,
    pub alloc_point: u64,
    pub last_reward_block: BlockNumber,
    /// Rewards per staked LP unit, scaled by `ACC_PRECISION`
    pub acc_reward_per_share: u128,
}

/// Per-user stake in one pool
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub amount: u128,
    pub reward_debt: u128,
}

/// Read-side summary of a farm
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FarmStatus {
    pub address: Address,
    pub reward_token: Address,
    pub owner: Address,
    pub reward_per_block: String,
    pub start_block: BlockNumber,
    pub total_alloc_point: u64,
    pub pools: Vec<PoolInfo>,
    /// Reward tokens still available to pay out
    pub reward_balance: String,
}
