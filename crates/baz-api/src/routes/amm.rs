//! AMM quotes against the chain's deployed factory

use amm::calculator::{apply_slippage, suggest_min_output};
use axum::{
    extract::{Path, State},
    routing::post,
    Json, Router,
};
use baz_chain::ChainError;
use baz_core::ChainId;

use crate::dto::{QuoteRequest, QuoteResponse};
use crate::state::{bad_request, chain_failure, not_found, ApiResult};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/quote", post(get_quote))
}

/// POST /chains/:chain_id/amm/quote - Quote a single-hop swap
async fn get_quote(
    State(state): State<AppState>,
    Path(chain_id): Path<ChainId>,
    Json(request): Json<QuoteRequest>,
) -> ApiResult<QuoteResponse> {
    let factory_address = state.deployment(chain_id).await?.factory;
    let devnet = state.devnet().read().await;
    let chain = devnet.chain(chain_id).map_err(chain_failure)?;
    let factory = chain.factory(&factory_address).ok_or_else(|| {
        chain_failure(ChainError::UnknownContract {
            kind: "factory",
            address: factory_address,
        })
    })?;

    let pair = factory
        .get_pair(&request.token_in, &request.token_out)
        .and_then(|address| factory.pair(&address))
        .ok_or_else(|| {
            not_found(format!(
                "No pair for {} / {}",
                request.token_in, request.token_out
            ))
        })?;
    let info = pair.info(chain.ledger());

    let quote = amm::quote_swap(&info, &request.token_in, request.amount_in)
        .ok_or_else(|| bad_request("Insufficient liquidity for this trade"))?;
    let min_amount_out = match request.slippage_bps {
        Some(bps) if bps > 10_000 => {
            return Err(bad_request(format!("Slippage {} bps exceeds 100%", bps)))
        }
        Some(bps) => apply_slippage(quote.amount_out, bps),
        None => suggest_min_output(quote.amount_out),
    };
    Ok(Json(QuoteResponse::from_quote(quote, min_amount_out)))
}
