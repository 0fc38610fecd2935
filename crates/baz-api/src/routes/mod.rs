//! API route handlers

pub mod amm;
pub mod bridge;
pub mod chains;
pub mod farm;
pub mod health;
pub mod tokens;

use axum::{routing::get, Router};

use crate::AppState;

/// Create the API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/chains", get(chains::list_chains))
        .nest("/chains/:chain_id", chains::router())
        .nest("/chains/:chain_id/bridge", bridge::router())
        .nest("/chains/:chain_id/tokens", tokens::router())
        .nest("/chains/:chain_id/amm", amm::router())
        .nest("/chains/:chain_id/farm", farm::router())
        .with_state(state)
}
