//! Multi-chain devnet and its on-disk snapshot

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use baz_core::{AppConfig, ChainId};
use serde::{Deserialize, Serialize};

use crate::chain::Chain;
use crate::deploy::Deployment;
use crate::error::{ChainError, Result};

/// Snapshot file inside the state directory
pub const SNAPSHOT_FILE: &str = "devnet.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Devnet {
    chains: BTreeMap<ChainId, Chain>,
    /// Standard contract set per chain, recorded by `deploy`
    #[serde(default)]
    deployments: BTreeMap<ChainId, Deployment>,
}

impl Devnet {
    /// One empty chain per configured network
    pub fn from_config(config: &AppConfig) -> Self {
        let chains = config
            .networks
            .iter()
            .map(|n| {
                (
                    n.chain_id,
                    Chain::new(n.chain_id, n.name.clone(), n.tag(), config.genesis_timestamp),
                )
            })
            .collect();
        Self {
            chains,
            deployments: BTreeMap::new(),
        }
    }

    pub fn add_chain(&mut self, chain: Chain) {
        self.chains.insert(chain.chain_id, chain);
    }

    pub fn chain_ids(&self) -> Vec<ChainId> {
        self.chains.keys().copied().collect()
    }

    pub fn chains(&self) -> impl Iterator<Item = &Chain> {
        self.chains.values()
    }

    pub fn contains(&self, chain_id: ChainId) -> bool {
        self.chains.contains_key(&chain_id)
    }

    pub fn chain(&self, chain_id: ChainId) -> Result<&Chain> {
        self.chains
            .get(&chain_id)
            .ok_or(ChainError::UnknownChain(chain_id))
    }

    pub fn chain_mut(&mut self, chain_id: ChainId) -> Result<&mut Chain> {
        self.chains
            .get_mut(&chain_id)
            .ok_or(ChainError::UnknownChain(chain_id))
    }

    pub fn chain_by_name(&self, name: &str) -> Option<&Chain> {
        self.chains.values().find(|c| c.name == name)
    }

    pub fn deployment(&self, chain_id: ChainId) -> Option<&Deployment> {
        self.deployments.get(&chain_id)
    }

    pub fn record_deployment(&mut self, deployment: Deployment) {
        self.deployments.insert(deployment.chain_id, deployment);
    }

    pub fn snapshot_path(dir: &Path) -> PathBuf {
        dir.join(SNAPSHOT_FILE)
    }

    /// Write the snapshot atomically (temp file, then rename)
    pub fn save(&self, dir: &Path) -> Result<PathBuf> {
        let path = Self::snapshot_path(dir);
        let persistence = |e: std::io::Error| ChainError::Persistence {
            path: path.display().to_string(),
            message: e.to_string(),
        };
        fs::create_dir_all(dir).map_err(persistence)?;
        let bytes =
            serde_json::to_vec_pretty(self).map_err(|e| ChainError::Serialization(e.to_string()))?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, bytes).map_err(persistence)?;
        fs::rename(&tmp, &path).map_err(persistence)?;
        tracing::debug!(path = %path.display(), "Devnet snapshot saved");
        Ok(path)
    }

    /// Read a snapshot, `None` if the directory has none yet
    pub fn load(dir: &Path) -> Result<Option<Self>> {
        let path = Self::snapshot_path(dir);
        if !path.exists() {
            return Ok(None);
        }
        let bytes = fs::read(&path).map_err(|e| ChainError::Persistence {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let devnet = serde_json::from_slice(&bytes).map_err(|e| ChainError::Persistence {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Ok(Some(devnet))
    }

    /// Load the snapshot in `config.state_dir`, or start fresh from config.
    /// Networks added to the config since the snapshot get empty chains.
    pub fn load_or_init(config: &AppConfig) -> Result<Self> {
        match Self::load(&config.state_dir)? {
            Some(mut devnet) => {
                for network in &config.networks {
                    if !devnet.contains(network.chain_id) {
                        devnet.add_chain(Chain::new(
                            network.chain_id,
                            network.name.clone(),
                            network.tag(),
                            config.genesis_timestamp,
                        ));
                    }
                }
                tracing::info!(chains = devnet.chains.len(), "Devnet snapshot loaded");
                Ok(devnet)
            }
            None => {
                tracing::info!("No devnet snapshot, starting from genesis");
                Ok(Self::from_config(config))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::call::Call;
    use baz_core::Address;

    #[test]
    fn test_from_config_creates_chains() {
        let devnet = Devnet::from_config(&AppConfig::default());
        assert_eq!(devnet.chain_ids(), vec![80_002, 11_155_111]);
        assert_eq!(devnet.chain_by_name("amoy").unwrap().tag, "amoy");
        assert!(matches!(
            devnet.chain(1),
            Err(ChainError::UnknownChain(1))
        ));
    }

    #[test]
    fn test_snapshot_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.state_dir = dir.path().to_path_buf();

        let mut devnet = Devnet::load_or_init(&config).unwrap();
        let owner = config.operator;
        let receipt = devnet
            .chain_mut(11_155_111)
            .unwrap()
            .transact(
                owner,
                Call::DeployToken {
                    name: "Bazaar Token".into(),
                    symbol: "BAZ".into(),
                    decimals: 18,
                    initial_supply: u128::from(u64::MAX) * 1_000,
                },
            )
            .unwrap();
        let token = receipt.contract_address.unwrap();
        devnet.save(dir.path()).unwrap();

        let restored = Devnet::load_or_init(&config).unwrap();
        let chain = restored.chain(11_155_111).unwrap();
        assert_eq!(chain.block_number(), 1);
        assert_eq!(
            chain.ledger().balance_of(&token, &owner),
            u128::from(u64::MAX) * 1_000
        );
        assert_eq!(chain.receipt(&receipt.transaction_hash), Some(&receipt));
        assert_eq!(chain.nonce_of(&owner), 1);
        assert_eq!(chain.nonce_of(&Address::from_label("nobody")), 0);
    }

    #[test]
    fn test_load_missing_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Devnet::load(dir.path()).unwrap().is_none());
    }
}
