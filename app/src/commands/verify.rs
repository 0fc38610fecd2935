//! `baz verify`

use std::fmt;

use anyhow::Result;
use baz_core::{Address, NetworkConfig};
use serde::Serialize;

use crate::context::Context;

#[derive(Debug, Serialize)]
pub struct Check {
    pub name: &'static str,
    pub ok: bool,
    pub detail: String,
}

#[derive(Debug, Serialize)]
pub struct NetworkChecks {
    pub network: String,
    pub checks: Vec<Check>,
}

#[derive(Debug, Serialize)]
pub struct VerifyReport {
    pub networks: Vec<NetworkChecks>,
}

impl VerifyReport {
    pub fn passed(&self) -> bool {
        self.networks
            .iter()
            .all(|n| n.checks.iter().all(|c| c.ok))
    }
}

struct Checker(Vec<Check>);

impl Checker {
    fn check(&mut self, name: &'static str, ok: bool, detail: impl Into<String>) {
        self.0.push(Check {
            name,
            ok,
            detail: detail.into(),
        });
    }

    fn eq<T: PartialEq + fmt::Display>(&mut self, name: &'static str, actual: T, expected: T) {
        let detail = if actual == expected {
            actual.to_string()
        } else {
            format!("{} (expected {})", actual, expected)
        };
        self.check(name, actual == expected, detail);
    }
}

pub fn run(ctx: &Context, networks: &[String]) -> Result<VerifyReport> {
    let networks = ctx
        .networks(networks)?
        .iter()
        .map(|network| verify_network(ctx, network))
        .collect::<Result<Vec<_>>>()?;
    Ok(VerifyReport { networks })
}

fn verify_network(ctx: &Context, network: &NetworkConfig) -> Result<NetworkChecks> {
    let mut c = Checker(Vec::new());
    let operator = ctx.config.operator;
    let Some(deployment) = ctx.devnet.deployment(network.chain_id) else {
        c.check("deployment recorded", false, "run `baz deploy`");
        return Ok(NetworkChecks {
            network: network.name.clone(),
            checks: c.0,
        });
    };
    let chain = ctx.chain(network)?;
    let state = chain.state();

    match state.ledger.token(&deployment.token) {
        Some(token) => {
            c.eq("token symbol", token.info.symbol.as_str(), ctx.config.token.symbol.as_str());
            c.eq("token decimals", token.info.decimals, ctx.config.token.decimals);
            c.eq("token owner", token.owner, operator);
        }
        None => c.check("token", false, format!("no token at {}", deployment.token)),
    }

    match chain.bridge(&deployment.bridge) {
        Some(bridge) => {
            c.eq("bridge token", bridge.token, deployment.token);
            c.eq("bridge owner", bridge.owner, operator);
            c.eq("bridge chain tag", bridge.chain_tag.as_str(), network.tag());
            match ctx.config.counterpart(&network.name) {
                Ok(counterpart) => {
                    c.eq("bridge target", bridge.target_chain.as_str(), counterpart.tag())
                }
                Err(e) => c.check("bridge target", false, e.to_string()),
            }
            c.check(
                "bridge live",
                !bridge.paused,
                if bridge.paused { "paused" } else { "accepting locks" },
            );
        }
        None => c.check("bridge", false, format!("no bridge at {}", deployment.bridge)),
    }

    c.check(
        "factory",
        chain.factory(&deployment.factory).is_some(),
        deployment.factory.to_string(),
    );
    match state.routers.get(&deployment.router) {
        Some(router) => c.eq("router factory", router.factory, deployment.factory),
        None => c.check("router", false, format!("no router at {}", deployment.router)),
    }

    match chain.farm(&deployment.farm) {
        Some(farm) => {
            c.eq("farm reward token", farm.reward_token, deployment.token);
            c.eq::<Address>("farm owner", farm.owner, operator);
        }
        None => c.check("farm", false, format!("no farm at {}", deployment.farm)),
    }

    Ok(NetworkChecks {
        network: network.name.clone(),
        checks: c.0,
    })
}

impl fmt::Display for VerifyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for network in &self.networks {
            writeln!(f, "{}", network.network)?;
            for check in &network.checks {
                let mark = if check.ok { "ok  " } else { "FAIL" };
                writeln!(f, "  [{}] {:<20} {}", mark, check.name, check.detail)?;
            }
        }
        Ok(())
    }
}
