//! Operator commands
//!
//! Each command works on a loaded [`Context`](crate::context::Context) and
//! returns a report the binary prints as text or JSON.

pub mod deploy;
pub mod fund;
pub mod recover;
pub mod serve;
pub mod status;
pub mod verify;

use std::sync::Arc;

use baz_core::{format_units, Amount};
use bridge_client::SharedDevnet;
use tokio::sync::RwLock;

use crate::context::Context;

/// Move the context's devnet behind a lock for wallet-driven commands
pub(crate) fn share(ctx: &mut Context) -> SharedDevnet {
    Arc::new(RwLock::new(std::mem::take(&mut ctx.devnet)))
}

/// Put the (possibly advanced) devnet back into the context
pub(crate) async fn unshare(ctx: &mut Context, shared: SharedDevnet) {
    ctx.devnet = match Arc::try_unwrap(shared) {
        Ok(lock) => lock.into_inner(),
        Err(shared) => shared.read().await.clone(),
    };
}

pub(crate) fn tokens(amount: Amount, decimals: u8, symbol: &str) -> String {
    format!("{} {}", format_units(amount, decimals), symbol)
}
