//! Receipts, blocks and log queries

use baz_core::{Address, BlockNumber, ChainId, Event, Log, TxHash};
use serde::{Deserialize, Serialize};

use crate::error::{ChainError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "reason")]
pub enum TxStatus {
    Success,
    Reverted(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub transaction_hash: TxHash,
    pub chain_id: ChainId,
    pub block_number: BlockNumber,
    pub from: Address,
    /// Account nonce the transaction consumed
    pub nonce: u64,
    pub method: String,
    pub status: TxStatus,
    /// Empty when the transaction reverted
    pub logs: Vec<Log>,
    pub contract_address: Option<Address>,
}

impl Receipt {
    pub fn succeeded(&self) -> bool {
        self.status == TxStatus::Success
    }

    pub fn revert_reason(&self) -> Option<&str> {
        match &self.status {
            TxStatus::Reverted(reason) => Some(reason),
            TxStatus::Success => None,
        }
    }

    /// Turn a reverted receipt into an error
    pub fn ensure_success(self) -> Result<Self> {
        match self.status {
            TxStatus::Success => Ok(self),
            TxStatus::Reverted(reason) => Err(ChainError::Reverted {
                hash: self.transaction_hash,
                reason,
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub number: BlockNumber,
    pub timestamp: u64,
    pub transactions: Vec<TxHash>,
}

/// A log with its position on the chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub block_number: BlockNumber,
    pub transaction_hash: TxHash,
    pub log_index: usize,
    pub address: Address,
    pub event: Event,
}

impl LogEntry {
    pub fn log(&self) -> Log {
        Log {
            address: self.address,
            event: self.event.clone(),
        }
    }
}

/// `eth_getLogs`-style filter. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogFilter {
    pub address: Option<Address>,
    /// Event name, e.g. `TokensLocked`
    pub event: Option<String>,
    pub from_block: Option<BlockNumber>,
    pub to_block: Option<BlockNumber>,
}

impl LogFilter {
    pub fn address(mut self, address: Address) -> Self {
        self.address = Some(address);
        self
    }

    pub fn event(mut self, name: impl Into<String>) -> Self {
        self.event = Some(name.into());
        self
    }

    pub fn from_block(mut self, block: BlockNumber) -> Self {
        self.from_block = Some(block);
        self
    }

    pub fn to_block(mut self, block: BlockNumber) -> Self {
        self.to_block = Some(block);
        self
    }

    pub fn matches(&self, block: BlockNumber, log: &Log) -> bool {
        if self.from_block.is_some_and(|from| block < from) {
            return false;
        }
        if self.to_block.is_some_and(|to| block > to) {
            return false;
        }
        if self.address.is_some_and(|a| a != log.address) {
            return false;
        }
        if let Some(name) = &self.event {
            if name != log.event.name() {
                return false;
            }
        }
        true
    }
}
