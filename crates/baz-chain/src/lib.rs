//! baz-chain: In-process devnet for the BAZ contracts
//!
//! Hosts token, bridge, AMM and farm contracts on one or more chains with
//! EVM-shaped semantics: sender nonces, derived contract addresses, one
//! block per transaction, atomic execution, receipts and event logs.

pub mod call;
pub mod chain;
pub mod deploy;
pub mod devnet;
pub mod error;
pub mod receipt;

pub use call::{Call, TokenSummary, View, ViewResult};
pub use chain::{Chain, ContractState};
pub use deploy::{deploy_system, DeployParams, Deployment};
pub use devnet::Devnet;
pub use error::{ChainError, Result};
pub use receipt::{Block, LogEntry, LogFilter, Receipt, TxStatus};
