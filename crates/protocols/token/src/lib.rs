//! ERC20 Token Protocol
//!
//! Fungible token contracts (the bridged BAZ token, AMM LP tokens, farm
//! reward tokens) held in a per-chain ledger.

pub mod ledger;

pub use ledger::{Ledger, TokenInfo, TokenState};
