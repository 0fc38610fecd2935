//! `baz serve`

use std::future::Future;

use anyhow::{Context as _, Result};
use baz_api::{start_server, AppState};

use crate::commands::{share, unshare};
use crate::context::Context;

/// Serve the API over the context's devnet until Ctrl-C
pub async fn run(ctx: &mut Context, port: Option<u16>) -> Result<()> {
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        }
        tracing::info!("Shutting down");
    };
    let port = port.unwrap_or(ctx.config.api_port);
    serve_until(ctx, port, shutdown).await
}

pub async fn serve_until(
    ctx: &mut Context,
    port: u16,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let shared = share(ctx);
    let state = AppState::with_persistence(
        ctx.config.clone(),
        shared.clone(),
        ctx.config.state_dir.clone(),
    );
    let result = start_server(state, port, shutdown)
        .await
        .with_context(|| format!("API server on port {} failed", port));
    unshare(ctx, shared).await;
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::deploy;
    use crate::context::temp_context;

    #[tokio::test]
    async fn test_serve_returns_devnet_on_shutdown() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = temp_context(dir.path());
        deploy::run(&mut ctx, &[], false).unwrap();

        serve_until(&mut ctx, 0, async {}).await.unwrap();
        let sepolia = ctx.config.network("sepolia").unwrap().clone();
        assert!(ctx.devnet.deployment(sepolia.chain_id).is_some());
        assert_eq!(ctx.chain(&sepolia).unwrap().block_number(), 5);
    }
}
