//! Token balances

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use baz_chain::ChainError;
use baz_core::{Address, ChainId};

use crate::dto::BalanceResponse;
use crate::state::{chain_failure, parse_param, ApiResult};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/:token/balance/:holder", get(get_balance))
}

/// GET /chains/:chain_id/tokens/:token/balance/:holder
async fn get_balance(
    State(state): State<AppState>,
    Path((chain_id, token, holder)): Path<(ChainId, String, String)>,
) -> ApiResult<BalanceResponse> {
    let token: Address = parse_param("token address", &token)?;
    let holder: Address = parse_param("holder address", &holder)?;
    let devnet = state.devnet().read().await;
    let ledger = devnet.chain(chain_id).map_err(chain_failure)?.ledger();
    let info = &ledger
        .token(&token)
        .ok_or_else(|| chain_failure(ChainError::UnknownContract { kind: "token", address: token }))?
        .info;
    Ok(Json(BalanceResponse::new(
        token,
        holder,
        info.symbol.clone(),
        info.decimals,
        ledger.balance_of(&token, &holder),
    )))
}

#[cfg(test)]
mod tests {
    use crate::test_support::{get, TestApp, SEPOLIA};
    use axum::http::StatusCode;
    use baz_core::Address;

    #[tokio::test]
    async fn test_operator_balance() {
        let app = TestApp::new();
        let token = app.deployment(SEPOLIA).token;
        let uri = format!("/chains/11155111/tokens/{}/balance/{}", token, app.operator());
        let (status, body) = get(&app, &uri).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["symbol"], "BAZ");
        assert_eq!(body["formatted"], "1000000");

        let stranger = Address::from_label("stranger");
        let uri = format!("/chains/11155111/tokens/{}/balance/{}", stranger, stranger);
        let (status, body) = get(&app, &uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "unknown_contract");
    }
}
