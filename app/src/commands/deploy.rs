//! `baz deploy`

use std::fmt;

use anyhow::{Context as _, Result};
use baz_chain::{deploy_system, DeployParams, Deployment};
use serde::Serialize;

use crate::context::Context;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployReport {
    pub deployed: Vec<Deployment>,
    /// Networks that already had a contract set
    pub skipped: Vec<String>,
}

pub fn run(ctx: &mut Context, networks: &[String], force: bool) -> Result<DeployReport> {
    let mut report = DeployReport {
        deployed: Vec::new(),
        skipped: Vec::new(),
    };
    let operator = ctx.config.operator;

    for network in ctx.networks(networks)? {
        if !force && ctx.devnet.deployment(network.chain_id).is_some() {
            tracing::info!(network = %network.name, "Already deployed, skipping");
            report.skipped.push(network.name.clone());
            continue;
        }
        let params = DeployParams::from_config(&ctx.config, &network.name)?;
        let chain = ctx.chain_mut(&network)?;
        let deployment = deploy_system(chain, operator, &params)
            .with_context(|| format!("Deployment on {} failed", network.name))?;
        ctx.devnet.record_deployment(deployment.clone());
        report.deployed.push(deployment);
    }
    Ok(report)
}

impl fmt::Display for DeployReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for d in &self.deployed {
            writeln!(f, "{} (chain {}), block {}", d.network, d.chain_id, d.deployed_at)?;
            writeln!(f, "  token    {}", d.token)?;
            writeln!(f, "  bridge   {}", d.bridge)?;
            writeln!(f, "  factory  {}", d.factory)?;
            writeln!(f, "  router   {}", d.router)?;
            writeln!(f, "  farm     {}", d.farm)?;
        }
        for name in &self.skipped {
            writeln!(f, "{}: already deployed (use --force to redeploy)", name)?;
        }
        Ok(())
    }
}
