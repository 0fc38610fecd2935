//! baz-api: HTTP API over the BAZ devnet
//!
//! Read endpoints for chains, bridges, balances, receipts and logs, plus
//! transaction submission for local tooling.

pub mod dto;
pub mod routes;
pub mod server;
pub mod state;

#[cfg(test)]
mod test_support;

pub use server::*;
pub use state::{ApiFailure, ApiResult, AppState};
