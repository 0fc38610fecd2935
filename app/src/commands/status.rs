//! `baz status`

use std::fmt;

use anyhow::{bail, Result};
use baz_chain::{Chain, Deployment, View, ViewResult};
use baz_core::{BlockNumber, ChainId, NetworkConfig};
use bridge::BridgeStatus;
use farm::FarmStatus;
use serde::Serialize;

use crate::context::Context;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainStatus {
    pub network: String,
    pub chain_id: ChainId,
    pub block_number: BlockNumber,
    pub timestamp: u64,
    pub deployment: Option<Deployment>,
    pub bridge: Option<BridgeStatus>,
    pub farm: Option<FarmStatus>,
    pub pairs: u64,
}

#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub chains: Vec<ChainStatus>,
}

pub fn run(ctx: &Context, networks: &[String]) -> Result<StatusReport> {
    let chains = ctx
        .networks(networks)?
        .iter()
        .map(|network| chain_status(ctx, network))
        .collect::<Result<Vec<_>>>()?;
    Ok(StatusReport { chains })
}

fn chain_status(ctx: &Context, network: &NetworkConfig) -> Result<ChainStatus> {
    let chain = ctx.chain(network)?;
    let head = chain.head();
    let deployment = ctx.devnet.deployment(network.chain_id).cloned();
    let mut status = ChainStatus {
        network: network.name.clone(),
        chain_id: network.chain_id,
        block_number: head.number,
        timestamp: head.timestamp,
        deployment: None,
        bridge: None,
        farm: None,
        pairs: 0,
    };
    let Some(deployment) = deployment else {
        return Ok(status);
    };

    status.bridge = match query(chain, View::BridgeStatus { bridge: deployment.bridge })? {
        ViewResult::Bridge(bridge) => Some(bridge),
        other => bail!("Unexpected bridge status answer: {:?}", other),
    };
    status.farm = match query(chain, View::FarmStatus { farm: deployment.farm })? {
        ViewResult::Farm(farm) => Some(farm),
        other => bail!("Unexpected farm status answer: {:?}", other),
    };
    status.pairs = match query(chain, View::AllPairsLength { factory: deployment.factory })? {
        ViewResult::Count(n) => n,
        other => bail!("Unexpected pair count answer: {:?}", other),
    };
    status.deployment = Some(deployment);
    Ok(status)
}

fn query(chain: &Chain, view: View) -> Result<ViewResult> {
    Ok(chain.view(&view)?)
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for chain in &self.chains {
            writeln!(
                f,
                "{} (chain {}): block {}, time {}",
                chain.network, chain.chain_id, chain.block_number, chain.timestamp
            )?;
            if chain.deployment.is_none() {
                writeln!(f, "  not deployed")?;
                continue;
            }
            if let Some(bridge) = &chain.bridge {
                writeln!(
                    f,
                    "  bridge {} -> {}: balance {}, {} users, {} nonces processed{}",
                    bridge.chain_tag,
                    bridge.target_chain,
                    bridge.balance,
                    bridge.users,
                    bridge.processed_nonces,
                    if bridge.paused { ", PAUSED" } else { "" }
                )?;
            }
            if let Some(farm) = &chain.farm {
                writeln!(
                    f,
                    "  farm: {} pools, {} reward/block, {} rewards left",
                    farm.pools.len(),
                    farm.reward_per_block,
                    farm.reward_balance
                )?;
            }
            writeln!(f, "  amm: {} pairs", chain.pairs)?;
        }
        Ok(())
    }
}
