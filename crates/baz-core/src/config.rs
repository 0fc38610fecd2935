//! Configuration types for BAZ
//!
//! Configuration comes from an optional TOML file, then `BAZ_*` environment
//! variables override individual fields. Nothing operational (operator
//! account, network list, state location) is compiled in beyond dev defaults.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;
use crate::types::{constants, parse_units, Address, Amount, ChainId};

/// Environment variable overriding the operator account
pub const ENV_OPERATOR: &str = "BAZ_OPERATOR";
/// Environment variable overriding the state directory
pub const ENV_STATE_DIR: &str = "BAZ_STATE_DIR";
/// Environment variable overriding the API port
pub const ENV_API_PORT: &str = "BAZ_API_PORT";

/// One chain the tooling knows about
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Name used on the command line ("sepolia")
    pub name: String,

    /// EIP-155 chain id
    pub chain_id: ChainId,

    /// Tag carried in bridge events as source/target chain
    #[serde(default)]
    pub tag: Option<String>,

    /// Network whose bridge this network's bridge pairs with
    #[serde(default)]
    pub counterpart: Option<String>,
}

impl NetworkConfig {
    pub fn tag(&self) -> &str {
        self.tag.as_deref().unwrap_or(&self.name)
    }
}

/// Bridged token parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenConfig {
    pub name: String,
    pub symbol: String,
    #[serde(default = "default_decimals")]
    pub decimals: u8,
    /// Supply minted to the operator at deployment (decimal string, whole tokens)
    pub initial_supply: String,
}

fn default_decimals() -> u8 {
    constants::DEFAULT_DECIMALS
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            name: "Bazaar Token".to_string(),
            symbol: "BAZ".to_string(),
            decimals: default_decimals(),
            initial_supply: "1000000".to_string(),
        }
    }
}

impl TokenConfig {
    pub fn initial_supply_units(&self) -> Result<Amount, ConfigError> {
        parse_units(&self.initial_supply, self.decimals).map_err(|e| ConfigError::InvalidValue {
            key: "token.initial_supply".to_string(),
            message: e.to_string(),
        })
    }
}

/// Yield farm parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FarmConfig {
    /// Reward tokens per block (decimal string, whole tokens)
    pub reward_per_block: String,
    /// First block that accrues rewards
    #[serde(default)]
    pub start_block: u64,
}

impl Default for FarmConfig {
    fn default() -> Self {
        Self {
            reward_per_block: "1".to_string(),
            start_block: 0,
        }
    }
}

impl FarmConfig {
    pub fn reward_per_block_units(&self, decimals: u8) -> Result<Amount, ConfigError> {
        parse_units(&self.reward_per_block, decimals).map_err(|e| ConfigError::InvalidValue {
            key: "farm.reward_per_block".to_string(),
            message: e.to_string(),
        })
    }
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Known networks
    pub networks: Vec<NetworkConfig>,

    /// Account that deploys and owns contracts
    pub operator: Address,

    /// Directory holding devnet snapshots and deployment records
    #[serde(default = "default_state_dir")]
    pub state_dir: PathBuf,

    /// API server port
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Devnet genesis timestamp
    #[serde(default = "default_genesis_timestamp")]
    pub genesis_timestamp: u64,

    #[serde(default)]
    pub token: TokenConfig,

    #[serde(default)]
    pub farm: FarmConfig,
}

fn default_state_dir() -> PathBuf {
    PathBuf::from(".baz")
}

fn default_api_port() -> u16 {
    18545
}

fn default_genesis_timestamp() -> u64 {
    constants::DEFAULT_GENESIS_TIMESTAMP
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            networks: vec![
                NetworkConfig {
                    name: "sepolia".to_string(),
                    chain_id: 11_155_111,
                    tag: None,
                    counterpart: Some("amoy".to_string()),
                },
                NetworkConfig {
                    name: "amoy".to_string(),
                    chain_id: 80_002,
                    tag: None,
                    counterpart: Some("sepolia".to_string()),
                },
            ],
            operator: Address::from_label("operator"),
            state_dir: default_state_dir(),
            api_port: default_api_port(),
            genesis_timestamp: default_genesis_timestamp(),
            token: TokenConfig::default(),
            farm: FarmConfig::default(),
        }
    }
}

impl AppConfig {
    /// Parse a TOML document
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: AppConfig =
            toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` (or defaults when `None`), then apply process
    /// environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
                    path: path.display().to_string(),
                    message: e.to_string(),
                })?;
                Self::from_toml(&text)?
            }
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply `BAZ_*` overrides read through `lookup`
    pub fn apply_env(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(value) = lookup(ENV_OPERATOR) {
            self.operator = value.parse().map_err(|e| ConfigError::InvalidValue {
                key: ENV_OPERATOR.to_string(),
                message: format!("{}", e),
            })?;
        }
        if let Some(value) = lookup(ENV_STATE_DIR) {
            self.state_dir = PathBuf::from(value);
        }
        if let Some(value) = lookup(ENV_API_PORT) {
            self.api_port = value.parse().map_err(|_| ConfigError::InvalidValue {
                key: ENV_API_PORT.to_string(),
                message: format!("not a port number: {}", value),
            })?;
        }
        Ok(())
    }

    /// Check cross-field consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for network in &self.networks {
            if !seen.insert(network.chain_id) {
                return Err(ConfigError::DuplicateChainId(network.chain_id));
            }
        }
        for network in &self.networks {
            if let Some(counterpart) = &network.counterpart {
                if counterpart == &network.name {
                    return Err(ConfigError::InvalidValue {
                        key: format!("networks.{}.counterpart", network.name),
                        message: "a network cannot bridge to itself".to_string(),
                    });
                }
                self.network(counterpart)?;
            }
        }
        self.token.initial_supply_units()?;
        self.farm.reward_per_block_units(self.token.decimals)?;
        Ok(())
    }

    /// Look up a network by name
    pub fn network(&self, name: &str) -> Result<&NetworkConfig, ConfigError> {
        self.networks
            .iter()
            .find(|n| n.name == name)
            .ok_or_else(|| ConfigError::UnknownNetwork(name.to_string()))
    }

    /// Look up a network by chain id
    pub fn network_by_chain_id(&self, chain_id: ChainId) -> Option<&NetworkConfig> {
        self.networks.iter().find(|n| n.chain_id == chain_id)
    }

    /// The network paired with `name` for bridging
    pub fn counterpart(&self, name: &str) -> Result<&NetworkConfig, ConfigError> {
        let network = self.network(name)?;
        let counterpart = network
            .counterpart
            .as_deref()
            .ok_or_else(|| ConfigError::InvalidValue {
                key: format!("networks.{}.counterpart", name),
                message: "no counterpart configured".to_string(),
            })?;
        self.network(counterpart)
    }
}
