//! Loaded configuration plus devnet state, shared by every command

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context as _, Result};
use baz_chain::{Chain, Deployment, Devnet};
use baz_core::{Address, AppConfig, NetworkConfig};

pub struct Context {
    pub config: AppConfig,
    pub devnet: Devnet,
}

impl Context {
    /// Read config (file plus `BAZ_*` overrides) and the devnet snapshot
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let config = AppConfig::load(config_path).context("Failed to load configuration")?;
        Self::from_config(config)
    }

    pub fn from_config(config: AppConfig) -> Result<Self> {
        let devnet = Devnet::load_or_init(&config).with_context(|| {
            format!("Failed to open devnet state in {}", config.state_dir.display())
        })?;
        Ok(Self { config, devnet })
    }

    pub fn save(&self) -> Result<PathBuf> {
        self.devnet
            .save(&self.config.state_dir)
            .context("Failed to save devnet state")
    }

    /// Named networks, or every configured network when `names` is empty
    pub fn networks(&self, names: &[String]) -> Result<Vec<NetworkConfig>> {
        if names.is_empty() {
            return Ok(self.config.networks.clone());
        }
        names
            .iter()
            .map(|name| Ok(self.config.network(name)?.clone()))
            .collect()
    }

    /// `to`, or the counterpart configured for `from`
    pub fn destination(&self, from: &str, to: Option<&str>) -> Result<NetworkConfig> {
        let network = match to {
            Some(name) => self.config.network(name)?,
            None => self.config.counterpart(from)?,
        };
        Ok(network.clone())
    }

    pub fn chain(&self, network: &NetworkConfig) -> Result<&Chain> {
        Ok(self.devnet.chain(network.chain_id)?)
    }

    pub fn chain_mut(&mut self, network: &NetworkConfig) -> Result<&mut Chain> {
        Ok(self.devnet.chain_mut(network.chain_id)?)
    }

    pub fn deployment(&self, network: &NetworkConfig) -> Result<Deployment> {
        self.devnet
            .deployment(network.chain_id)
            .cloned()
            .ok_or_else(|| anyhow!("Nothing deployed on {}; run `baz deploy` first", network.name))
    }
}

/// `0x…` address, or a devnet label hashed into one
pub fn parse_account(value: &str) -> Result<Address> {
    if value.starts_with("0x") || value.starts_with("0X") {
        value
            .parse()
            .with_context(|| format!("Invalid address {}", value))
    } else {
        Ok(Address::from_label(value))
    }
}

#[cfg(test)]
pub(crate) fn temp_context(dir: &Path) -> Context {
    let mut config = AppConfig::default();
    config.state_dir = dir.to_path_buf();
    Context::from_config(config).unwrap()
}
