//! Shared fixtures for flow tests

use std::sync::Arc;

use baz_chain::{deploy_system, Call, DeployParams, Devnet};
use baz_core::{constants::ONE_TOKEN, Address, Amount, AppConfig};
use tokio::sync::RwLock;

use crate::provider::{DevnetWallet, SharedDevnet, WalletProvider};
use crate::transfer::BridgeRoute;
use crate::watcher::WatchConfig;

pub struct Fixture {
    pub devnet: SharedDevnet,
    pub config: AppConfig,
    pub route: BridgeRoute,
}

impl Fixture {
    /// Both chains deployed, destination bridge funded with 1000 BAZ
    pub async fn new() -> Self {
        let fx = Self::unfunded().await;
        fund_destination(&fx, 1_000 * ONE_TOKEN).await;
        fx
    }

    pub async fn unfunded() -> Self {
        let config = AppConfig::default();
        let mut devnet = Devnet::from_config(&config);
        for name in ["sepolia", "amoy"] {
            let network = config.network(name).unwrap();
            let params = DeployParams::from_config(&config, name).unwrap();
            let chain = devnet.chain_mut(network.chain_id).unwrap();
            let deployment = deploy_system(chain, config.operator, &params).unwrap();
            devnet.record_deployment(deployment);
        }
        let route = BridgeRoute::from_devnet(&config, &devnet, "sepolia", "amoy").unwrap();
        Self {
            devnet: Arc::new(RwLock::new(devnet)),
            config,
            route,
        }
    }

    /// A user's wallet, on the source chain and unaware of the destination
    pub fn wallet(&self, user: Address) -> DevnetWallet {
        DevnetWallet::new(self.devnet.clone(), user, self.route.source.chain_id())
            .with_watch_config(WatchConfig::in_process())
    }

    pub fn operator_wallet(&self) -> DevnetWallet {
        self.wallet(self.config.operator)
            .with_known_chains([self.route.destination.chain_id()])
    }
}

pub async fn fund_user(fx: &Fixture, user: Address, amount: Amount) {
    let operator = fx.operator_wallet();
    let hash = operator
        .send_transaction(Call::Transfer {
            token: fx.route.source.token,
            to: user,
            amount,
        })
        .await
        .unwrap();
    assert!(operator.wait_for_receipt(&hash).await.unwrap().succeeded());
}

pub async fn fund_destination(fx: &Fixture, amount: Amount) {
    let operator = fx.operator_wallet();
    operator.switch_chain(fx.route.destination.chain_id()).await.unwrap();
    let hash = operator
        .send_transaction(Call::Transfer {
            token: fx.route.destination.token,
            to: fx.route.destination.bridge,
            amount,
        })
        .await
        .unwrap();
    assert!(operator.wait_for_receipt(&hash).await.unwrap().succeeded());
}
