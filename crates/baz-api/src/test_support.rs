//! Router fixture for handler tests

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
};
use baz_chain::{deploy_system, Call, DeployParams, Deployment, Devnet, Receipt};
use baz_core::{Address, AppConfig, ChainId};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;
use tower::ServiceExt;

use crate::{create_app, AppState};

pub const SEPOLIA: ChainId = 11_155_111;
pub const AMOY: ChainId = 80_002;

pub struct TestApp {
    pub state: AppState,
    deployments: BTreeMap<ChainId, Deployment>,
}

impl TestApp {
    /// Both networks with the standard contract set
    pub fn new() -> Self {
        let (config, devnet) = deployed();
        Self::wrap(AppState::new(config, devnet))
    }

    pub fn persistent(dir: PathBuf) -> Self {
        let (config, devnet) = deployed();
        Self::wrap(AppState::with_persistence(config, Arc::new(RwLock::new(devnet)), dir))
    }

    /// Empty chains, nothing deployed
    pub fn undeployed() -> Self {
        let config = AppConfig::default();
        let devnet = Devnet::from_config(&config);
        Self::wrap(AppState::new(config, devnet))
    }

    fn wrap(state: AppState) -> Self {
        let deployments = state
            .devnet()
            .try_read()
            .map(|devnet| {
                devnet
                    .chain_ids()
                    .into_iter()
                    .filter_map(|id| devnet.deployment(id).cloned().map(|d| (id, d)))
                    .collect()
            })
            .unwrap_or_default();
        Self { state, deployments }
    }

    pub fn operator(&self) -> Address {
        self.state.config().operator
    }

    pub fn deployment(&self, chain_id: ChainId) -> Deployment {
        self.deployments[&chain_id].clone()
    }

    /// Execute directly on the devnet, asserting success
    pub async fn submit(&self, chain_id: ChainId, from: Address, call: Call) -> Receipt {
        let mut devnet = self.state.devnet().write().await;
        devnet
            .chain_mut(chain_id)
            .unwrap()
            .transact(from, call)
            .unwrap()
    }
}

fn deployed() -> (AppConfig, Devnet) {
    let config = AppConfig::default();
    let mut devnet = Devnet::from_config(&config);
    for network in &config.networks {
        let params = DeployParams::from_config(&config, &network.name).unwrap();
        let chain = devnet.chain_mut(network.chain_id).unwrap();
        let deployment = deploy_system(chain, config.operator, &params).unwrap();
        devnet.record_deployment(deployment);
    }
    (config, devnet)
}

async fn send(app: &TestApp, request: Request<Body>) -> (StatusCode, Value) {
    let response = create_app(app.state.clone()).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

pub async fn get(app: &TestApp, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

pub async fn post_json<T: Serialize>(app: &TestApp, uri: &str, body: &T) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap();
    send(app, request).await
}

#[tokio::test]
async fn test_health() {
    let app = TestApp::new();
    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}
