//! Farm reward queries

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use baz_chain::{ChainError, View};
use baz_core::{Address, ChainId};

use crate::dto::PendingRewardResponse;
use crate::state::{chain_failure, parse_param, ApiResult};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/:farm/pending/:pid/:user", get(get_pending))
}

/// GET /chains/:chain_id/farm/:farm/pending/:pid/:user
async fn get_pending(
    State(state): State<AppState>,
    Path((chain_id, farm, pid, user)): Path<(ChainId, String, String, String)>,
) -> ApiResult<PendingRewardResponse> {
    let farm: Address = parse_param("farm address", &farm)?;
    let pid: u64 = parse_param("pool id", &pid)?;
    let user: Address = parse_param("user address", &user)?;
    let devnet = state.devnet().read().await;
    let pending = devnet
        .chain(chain_id)
        .and_then(|chain| chain.view(&View::PendingReward { farm, pid, user }))
        .map_err(chain_failure)?
        .amount()
        .ok_or_else(|| {
            chain_failure(ChainError::Serialization(
                "pendingReward did not answer an amount".to_string(),
            ))
        })?;
    Ok(Json(PendingRewardResponse {
        farm,
        pid,
        user,
        pending,
    }))
}
