//! `baz recover`
//!
//! Lists locks the destination bridge never unlocked and, with `--relay`,
//! completes them as the bridge owner.

use std::fmt;

use anyhow::Result;
use baz_core::{Address, TxHash};
use bridge_client::{
    pending_unlocks, BridgeFlow, BridgeRoute, BridgeTransfer, DevnetWallet, LockStatus,
    SharedDevnet, TransferStep, UnlockMode, WatchConfig,
};
use serde::Serialize;

use crate::cli::RecoverArgs;
use crate::commands::{share, unshare};
use crate::context::{parse_account, Context};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayOutcome {
    pub nonce: u128,
    pub user: Address,
    pub unlock_tx: Option<TxHash>,
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoverReport {
    pub source: String,
    pub destination: String,
    pub pending: Vec<LockStatus>,
    pub relayed: Vec<RelayOutcome>,
}

impl RecoverReport {
    pub fn failures(&self) -> usize {
        self.relayed.iter().filter(|r| r.error.is_some()).count()
    }
}

pub async fn run(ctx: &mut Context, args: &RecoverArgs) -> Result<RecoverReport> {
    let destination = ctx.destination(&args.from, args.to.as_deref())?;
    let route = BridgeRoute::from_devnet(&ctx.config, &ctx.devnet, &args.from, &destination.name)?;
    let user = args.user.as_deref().map(parse_account).transpose()?;
    let operator = ctx.config.operator;

    let shared = share(ctx);
    let result = recover(&shared, route, operator, user, args.relay).await;
    unshare(ctx, shared).await;
    let (pending, relayed) = result?;

    Ok(RecoverReport {
        source: args.from.clone(),
        destination: destination.name,
        pending,
        relayed,
    })
}

async fn recover(
    shared: &SharedDevnet,
    route: BridgeRoute,
    operator: Address,
    user: Option<Address>,
    relay: bool,
) -> Result<(Vec<LockStatus>, Vec<RelayOutcome>)> {
    let wallet = DevnetWallet::new(shared.clone(), operator, route.source.chain_id())
        .with_known_chains([route.destination.chain_id()])
        .with_watch_config(WatchConfig::in_process());
    let pending = pending_unlocks(&wallet, &route, user).await?;
    tracing::info!(pending = pending.len(), "Scanned for unfinished transfers");
    if !relay {
        return Ok((pending, Vec::new()));
    }

    let flow = BridgeFlow::new(route.clone(), &wallet).with_relayer(&wallet);
    let mut relayed = Vec::with_capacity(pending.len());
    for status in &pending {
        let lock = &status.lock;
        let mut transfer = BridgeTransfer::new(lock.user, lock.amount, &route, UnlockMode::OwnerRelay);
        transfer.step = TransferStep::Unlock;
        transfer.lock_tx = Some(status.lock_tx);
        transfer.nonce = Some(lock.nonce);

        let error = flow.resume(&mut transfer).await.err().map(|e| e.to_string());
        if let Some(e) = &error {
            tracing::warn!(nonce = %lock.nonce, user = %lock.user, error = %e, "Relay failed");
        }
        relayed.push(RelayOutcome {
            nonce: lock.nonce,
            user: lock.user,
            unlock_tx: transfer.unlock_tx,
            error,
        });
    }
    Ok((pending, relayed))
}

impl fmt::Display for RecoverReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} -> {}: {} unfinished transfer(s)",
            self.source,
            self.destination,
            self.pending.len()
        )?;
        for status in &self.pending {
            writeln!(
                f,
                "  nonce {:<4} {} locked {} (block {}, {})",
                status.lock.nonce,
                status.lock.user,
                status.lock.amount,
                status.block_number,
                status.lock_tx
            )?;
        }
        for outcome in &self.relayed {
            match (&outcome.unlock_tx, &outcome.error) {
                (_, Some(e)) => writeln!(f, "  relay nonce {} failed: {}", outcome.nonce, e)?,
                (Some(tx), None) => writeln!(f, "  relayed nonce {} in {}", outcome.nonce, tx)?,
                (None, None) => writeln!(f, "  relayed nonce {}", outcome.nonce)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::deploy;
    use crate::context::temp_context;
    use baz_chain::Call;
    use baz_core::constants::ONE_TOKEN;

    /// Deployed devnet where `alice` locked 50 BAZ on sepolia and never unlocked
    fn stranded_lock(dir: &std::path::Path) -> Context {
        let mut ctx = temp_context(dir);
        deploy::run(&mut ctx, &[], false).unwrap();
        let operator = ctx.config.operator;
        let alice = Address::from_label("alice");
        let sepolia = ctx.config.network("sepolia").unwrap().clone();
        let amoy = ctx.config.network("amoy").unwrap().clone();
        let src = ctx.deployment(&sepolia).unwrap();
        let dst = ctx.deployment(&amoy).unwrap();

        let chain = ctx.chain_mut(&sepolia).unwrap();
        for (from, call) in [
            (operator, Call::Transfer { token: src.token, to: alice, amount: 50 * ONE_TOKEN }),
            (alice, Call::Approve { token: src.token, spender: src.bridge, amount: 50 * ONE_TOKEN }),
            (alice, Call::LockTokens { bridge: src.bridge, amount: 50 * ONE_TOKEN }),
        ] {
            chain.transact(from, call).unwrap();
        }
        ctx.chain_mut(&amoy)
            .unwrap()
            .transact(operator, Call::Transfer { token: dst.token, to: dst.bridge, amount: 500 * ONE_TOKEN })
            .unwrap();
        ctx
    }

    fn args(relay: bool, user: Option<&str>) -> RecoverArgs {
        RecoverArgs {
            from: "sepolia".into(),
            to: None,
            user: user.map(str::to_string),
            relay,
        }
    }

    #[tokio::test]
    async fn test_recover_lists_then_relays() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = stranded_lock(dir.path());
        let alice = Address::from_label("alice");

        let report = run(&mut ctx, &args(false, None)).await.unwrap();
        assert_eq!(report.pending.len(), 1);
        assert_eq!(report.pending[0].lock.user, alice);
        assert_eq!(report.pending[0].lock.nonce, 1);
        assert!(report.relayed.is_empty());

        let report = run(&mut ctx, &args(true, Some("alice"))).await.unwrap();
        assert_eq!(report.relayed.len(), 1);
        assert_eq!(report.failures(), 0);
        assert!(report.relayed[0].unlock_tx.is_some());

        let amoy = ctx.config.network("amoy").unwrap().clone();
        let token = ctx.deployment(&amoy).unwrap().token;
        assert_eq!(
            ctx.chain(&amoy).unwrap().ledger().balance_of(&token, &alice),
            50 * ONE_TOKEN
        );
        assert!(run(&mut ctx, &args(false, None)).await.unwrap().pending.is_empty());
    }

    #[tokio::test]
    async fn test_recover_user_filter() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = stranded_lock(dir.path());
        let report = run(&mut ctx, &args(false, Some("bob"))).await.unwrap();
        assert!(report.pending.is_empty());
    }
}
