//! Application state shared across API handlers

use std::path::PathBuf;
use std::sync::Arc;

use axum::{http::StatusCode, Json};
use baz_chain::{ChainError, Deployment, Devnet};
use baz_core::{AppConfig, ChainId};
use bridge_client::SharedDevnet;
use tokio::sync::RwLock;

use crate::dto::ApiError;

/// Status plus JSON body, the error half of every handler
pub type ApiFailure = (StatusCode, Json<ApiError>);

pub type ApiResult<T> = Result<Json<T>, ApiFailure>;

/// Map a devnet error onto an HTTP failure
pub fn chain_failure(err: ChainError) -> ApiFailure {
    let status = match &err {
        ChainError::UnknownChain(_)
        | ChainError::UnknownContract { .. }
        | ChainError::UnknownTransaction(_) => StatusCode::NOT_FOUND,
        ChainError::Reverted { .. } | ChainError::Revert(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ChainError::Persistence { .. } | ChainError::Serialization(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    if status.is_server_error() {
        tracing::error!("{}", err);
    }
    (status, Json(ApiError::new(err.error_code(), err.to_string())))
}

pub fn bad_request(message: impl Into<String>) -> ApiFailure {
    (StatusCode::BAD_REQUEST, Json(ApiError::bad_request(message)))
}

pub fn not_found(message: impl Into<String>) -> ApiFailure {
    (StatusCode::NOT_FOUND, Json(ApiError::not_found(message)))
}

/// Parse a path segment, answering 400 on failure
pub fn parse_param<T>(name: &str, value: &str) -> Result<T, ApiFailure>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e| bad_request(format!("Invalid {} '{}': {}", name, value, e)))
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AppConfig,
    devnet: SharedDevnet,
    /// Where to write the snapshot after each submitted transaction
    snapshot_dir: Option<PathBuf>,
}

impl AppState {
    pub fn new(config: AppConfig, devnet: Devnet) -> Self {
        Self::from_shared(config, Arc::new(RwLock::new(devnet)))
    }

    pub fn from_shared(config: AppConfig, devnet: SharedDevnet) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                devnet,
                snapshot_dir: None,
            }),
        }
    }

    /// Persist the devnet to `dir` after every submitted transaction
    pub fn with_persistence(config: AppConfig, devnet: SharedDevnet, dir: PathBuf) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                devnet,
                snapshot_dir: Some(dir),
            }),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    pub fn devnet(&self) -> &SharedDevnet {
        &self.inner.devnet
    }

    pub fn snapshot_dir(&self) -> Option<&PathBuf> {
        self.inner.snapshot_dir.as_ref()
    }

    /// Recorded contract set on a chain, 404 when nothing is deployed
    pub async fn deployment(&self, chain_id: ChainId) -> Result<Deployment, ApiFailure> {
        let devnet = self.inner.devnet.read().await;
        devnet.chain(chain_id).map_err(chain_failure)?;
        devnet
            .deployment(chain_id)
            .cloned()
            .ok_or_else(|| not_found(format!("No contracts deployed on chain {}", chain_id)))
    }
}
