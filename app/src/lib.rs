//! BAZ operator tooling

pub mod cli;
pub mod commands;
pub mod context;

use std::fmt::Display;

use anyhow::{bail, Result};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command};
use context::Context;

/// Log to stderr, `RUST_LOG` overriding the default filter
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("baz=debug,bridge_client=debug,info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print<T: Serialize + Display>(report: &T, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        print!("{}", report);
    }
    Ok(())
}

/// Execute one CLI invocation
pub async fn run(cli: Cli) -> Result<()> {
    let mut ctx = Context::load(cli.config.as_deref())?;
    tracing::debug!(state_dir = %ctx.config.state_dir.display(), "Configuration loaded");

    match &cli.command {
        Command::Deploy { networks, force } => {
            let report = commands::deploy::run(&mut ctx, networks, *force)?;
            ctx.save()?;
            print(&report, cli.json)
        }
        Command::Fund(args) => {
            let report = commands::fund::run(&mut ctx, args)?;
            ctx.save()?;
            print(&report, cli.json)
        }
        Command::Verify { networks } => {
            let report = commands::verify::run(&ctx, networks)?;
            print(&report, cli.json)?;
            if !report.passed() {
                bail!("Deployment verification failed");
            }
            Ok(())
        }
        Command::BridgeTest(args) => {
            let result = commands::bridge_test::run(&mut ctx, args).await;
            // Blocks mined before a failure are kept
            ctx.save()?;
            let report = result?;
            print(&report, cli.json)?;
            if !report.replay_rejected {
                bail!("Destination bridge accepted a replayed nonce");
            }
            Ok(())
        }
        Command::Status { networks } => {
            let report = commands::status::run(&ctx, networks)?;
            print(&report, cli.json)
        }
        Command::Recover(args) => {
            let report = commands::recover::run(&mut ctx, args).await?;
            if args.relay {
                ctx.save()?;
            }
            print(&report, cli.json)?;
            if report.failures() > 0 {
                bail!("{} relay(s) failed", report.failures());
            }
            Ok(())
        }
        Command::Serve { port } => {
            commands::serve::run(&mut ctx, *port).await?;
            ctx.save()?;
            Ok(())
        }
    }
}
