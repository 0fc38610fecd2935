//! Standard BAZ contract set
//!
//! What the operator deploys on every network: the token, the bridge paired
//! with the counterpart network, the AMM factory and router, and the farm.

use baz_core::{Address, Amount, AppConfig, BlockNumber, ChainId, ConfigError};
use serde::{Deserialize, Serialize};

use crate::call::Call;
use crate::chain::Chain;
use crate::error::{ChainError, Result};

/// Addresses of a deployed contract set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deployment {
    pub chain_id: ChainId,
    pub network: String,
    pub token: Address,
    pub bridge: Address,
    pub factory: Address,
    pub router: Address,
    pub farm: Address,
    pub deployed_at: BlockNumber,
}

/// Deployment inputs, resolved from configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployParams {
    pub token_name: String,
    pub token_symbol: String,
    pub decimals: u8,
    pub initial_supply: Amount,
    /// Tag of the chain this chain's bridge sends to
    pub target_chain: String,
    pub reward_per_block: Amount,
    pub start_block: BlockNumber,
}

impl DeployParams {
    pub fn from_config(config: &AppConfig, network: &str) -> std::result::Result<Self, ConfigError> {
        let counterpart = config.counterpart(network)?;
        Ok(Self {
            token_name: config.token.name.clone(),
            token_symbol: config.token.symbol.clone(),
            decimals: config.token.decimals,
            initial_supply: config.token.initial_supply_units()?,
            target_chain: counterpart.tag().to_string(),
            reward_per_block: config.farm.reward_per_block_units(config.token.decimals)?,
            start_block: config.farm.start_block,
        })
    }
}

fn created(chain: &mut Chain, operator: Address, call: Call) -> Result<Address> {
    let method = call.method();
    chain
        .transact(operator, call)?
        .contract_address
        .ok_or_else(|| ChainError::Serialization(format!("{} produced no contract", method)))
}

/// Deploy the full contract set as `operator`
pub fn deploy_system(chain: &mut Chain, operator: Address, params: &DeployParams) -> Result<Deployment> {
    let token = created(
        chain,
        operator,
        Call::DeployToken {
            name: params.token_name.clone(),
            symbol: params.token_symbol.clone(),
            decimals: params.decimals,
            initial_supply: params.initial_supply,
        },
    )?;
    let chain_tag = chain.tag.clone();
    let bridge = created(
        chain,
        operator,
        Call::DeployBridge {
            token,
            chain_tag,
            target_chain: params.target_chain.clone(),
        },
    )?;
    let factory = created(chain, operator, Call::DeployFactory { fee_to_setter: operator })?;
    let router = created(chain, operator, Call::DeployRouter { factory })?;
    let farm = created(
        chain,
        operator,
        Call::DeployFarm {
            reward_token: token,
            reward_per_block: params.reward_per_block,
            start_block: params.start_block,
        },
    )?;

    let deployment = Deployment {
        chain_id: chain.chain_id,
        network: chain.name.clone(),
        token,
        bridge,
        factory,
        router,
        farm,
        deployed_at: chain.block_number(),
    };
    tracing::info!(
        chain = chain.chain_id,
        token = %token,
        bridge = %bridge,
        router = %router,
        farm = %farm,
        "Contract set deployed"
    );
    Ok(deployment)
}
