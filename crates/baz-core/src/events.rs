//! Contract events and the execution context that collects them

use serde::{Deserialize, Serialize};

use crate::types::{amount_str, Address, Amount, BlockEnv};

/// Typed contract event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all_fields = "camelCase")]
pub enum Event {
    // ERC20
    Transfer {
        from: Address,
        to: Address,
        #[serde(with = "amount_str")]
        value: Amount,
    },
    Approval {
        owner: Address,
        spender: Address,
        #[serde(with = "amount_str")]
        value: Amount,
    },
    OwnershipTransferred {
        previous_owner: Address,
        new_owner: Address,
    },

    // Bridge
    TokensLocked {
        user: Address,
        #[serde(with = "amount_str")]
        amount: Amount,
        #[serde(with = "amount_str")]
        nonce: u128,
        target_chain: String,
    },
    TokensUnlocked {
        user: Address,
        #[serde(with = "amount_str")]
        amount: Amount,
        #[serde(with = "amount_str")]
        nonce: u128,
        source_chain: String,
    },
    BridgePaused {
        account: Address,
    },
    BridgeUnpaused {
        account: Address,
    },
    EmergencyWithdrawal {
        to: Address,
        #[serde(with = "amount_str")]
        amount: Amount,
    },

    // AMM
    PairCreated {
        token0: Address,
        token1: Address,
        pair: Address,
        index: u64,
    },
    Mint {
        sender: Address,
        #[serde(with = "amount_str")]
        amount0: Amount,
        #[serde(with = "amount_str")]
        amount1: Amount,
    },
    Burn {
        sender: Address,
        #[serde(with = "amount_str")]
        amount0: Amount,
        #[serde(with = "amount_str")]
        amount1: Amount,
        to: Address,
    },
    Swap {
        sender: Address,
        #[serde(with = "amount_str")]
        amount0_in: Amount,
        #[serde(with = "amount_str")]
        amount1_in: Amount,
        #[serde(with = "amount_str")]
        amount0_out: Amount,
        #[serde(with = "amount_str")]
        amount1_out: Amount,
        to: Address,
    },
    Sync {
        #[serde(with = "amount_str")]
        reserve0: Amount,
        #[serde(with = "amount_str")]
        reserve1: Amount,
    },

    // Farm
    PoolAdded {
        pid: u64,
        lp_token: Address,
        alloc_point: u64,
    },
    Deposit {
        user: Address,
        pid: u64,
        #[serde(with = "amount_str")]
        amount: Amount,
    },
    Withdraw {
        user: Address,
        pid: u64,
        #[serde(with = "amount_str")]
        amount: Amount,
    },
    Harvest {
        user: Address,
        pid: u64,
        #[serde(with = "amount_str")]
        amount: Amount,
    },
    EmergencyFarmWithdraw {
        user: Address,
        pid: u64,
        #[serde(with = "amount_str")]
        amount: Amount,
    },
}

impl Event {
    /// Event name as it appears in an ABI
    pub fn name(&self) -> &'static str {
        match self {
            Self::Transfer { .. } => "Transfer",
            Self::Approval { .. } => "Approval",
            Self::OwnershipTransferred { .. } => "OwnershipTransferred",
            Self::TokensLocked { .. } => "TokensLocked",
            Self::TokensUnlocked { .. } => "TokensUnlocked",
            Self::BridgePaused { .. } => "BridgePaused",
            Self::BridgeUnpaused { .. } => "BridgeUnpaused",
            Self::EmergencyWithdrawal { .. } => "EmergencyWithdrawal",
            Self::PairCreated { .. } => "PairCreated",
            Self::Mint { .. } => "Mint",
            Self::Burn { .. } => "Burn",
            Self::Swap { .. } => "Swap",
            Self::Sync { .. } => "Sync",
            Self::PoolAdded { .. } => "PoolAdded",
            Self::Deposit { .. } => "Deposit",
            Self::Withdraw { .. } => "Withdraw",
            Self::Harvest { .. } => "Harvest",
            Self::EmergencyFarmWithdraw { .. } => "EmergencyFarmWithdraw",
        }
    }
}

/// Event emitted by a contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Log {
    pub address: Address,
    pub event: Event,
}

/// Per-call execution context: who is calling, at which block, and where
/// emitted events go.
#[derive(Debug)]
pub struct ExecContext {
    pub sender: Address,
    pub block: BlockEnv,
    logs: Vec<Log>,
}

impl ExecContext {
    pub fn new(sender: Address, block: BlockEnv) -> Self {
        Self {
            sender,
            block,
            logs: Vec::new(),
        }
    }

    /// Run `f` with `caller` as the sender, restoring the previous sender
    /// afterwards. Contracts use this to act on their own behalf.
    pub fn call_as<T>(&mut self, caller: Address, f: impl FnOnce(&mut Self) -> T) -> T {
        let previous = std::mem::replace(&mut self.sender, caller);
        let out = f(self);
        self.sender = previous;
        out
    }

    pub fn emit(&mut self, address: Address, event: Event) {
        self.logs.push(Log { address, event });
    }

    pub fn logs(&self) -> &[Log] {
        &self.logs
    }

    pub fn into_logs(self) -> Vec<Log> {
        self.logs
    }
}
