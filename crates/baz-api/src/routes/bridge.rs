//! Bridge endpoints for the chain's deployed bridge contract

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use baz_chain::{View, ViewResult};
use baz_core::{Address, ChainId};
use bridge::BridgeStatus;

use crate::dto::{NonceProcessedResponse, UserNonceResponse};
use crate::state::{chain_failure, parse_param, ApiFailure, ApiResult};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_status))
        .route("/nonce/:user", get(get_user_nonce))
        .route("/processed/:nonce", get(get_processed))
}

/// Run a view against the chain's deployed bridge
async fn bridge_view(
    state: &AppState,
    chain_id: ChainId,
    view: impl FnOnce(Address) -> View,
) -> Result<(Address, ViewResult), ApiFailure> {
    let bridge = state.deployment(chain_id).await?.bridge;
    let devnet = state.devnet().read().await;
    let result = devnet
        .chain(chain_id)
        .and_then(|chain| chain.view(&view(bridge)))
        .map_err(chain_failure)?;
    Ok((bridge, result))
}

/// GET /chains/:chain_id/bridge - Balance, owner, pause flag, counters
async fn get_status(
    State(state): State<AppState>,
    Path(chain_id): Path<ChainId>,
) -> ApiResult<BridgeStatus> {
    match bridge_view(&state, chain_id, |bridge| View::BridgeStatus { bridge }).await? {
        (_, ViewResult::Bridge(status)) => Ok(Json(status)),
        (bridge, other) => Err(unexpected(bridge, other)),
    }
}

/// GET /chains/:chain_id/bridge/nonce/:user - Last nonce issued to `user`
async fn get_user_nonce(
    State(state): State<AppState>,
    Path((chain_id, user)): Path<(ChainId, String)>,
) -> ApiResult<UserNonceResponse> {
    let user: Address = parse_param("address", &user)?;
    let (bridge, result) =
        bridge_view(&state, chain_id, |bridge| View::GetUserNonce { bridge, user }).await?;
    let nonce = result.amount().ok_or_else(|| unexpected(bridge, result.clone()))?;
    Ok(Json(UserNonceResponse { bridge, user, nonce }))
}

/// GET /chains/:chain_id/bridge/processed/:nonce - Whether `nonce` was used
/// to unlock on this chain
async fn get_processed(
    State(state): State<AppState>,
    Path((chain_id, nonce)): Path<(ChainId, String)>,
) -> ApiResult<NonceProcessedResponse> {
    let nonce: u128 = parse_param("nonce", &nonce)?;
    let (bridge, result) =
        bridge_view(&state, chain_id, |bridge| View::IsNonceProcessed { bridge, nonce }).await?;
    let processed = result.as_bool().ok_or_else(|| unexpected(bridge, result.clone()))?;
    Ok(Json(NonceProcessedResponse {
        bridge,
        nonce,
        processed,
    }))
}

fn unexpected(bridge: Address, result: ViewResult) -> ApiFailure {
    chain_failure(baz_chain::ChainError::Serialization(format!(
        "unexpected view result from {}: {:?}",
        bridge, result
    )))
}
