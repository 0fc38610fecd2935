//! Chains, transactions and logs

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use baz_chain::{LogEntry, LogFilter, Receipt};
use baz_core::{ChainId, TxHash};

use crate::dto::{ChainSummary, SubmitTxRequest};
use crate::state::{chain_failure, parse_param, ApiResult};
use crate::AppState;

/// Routes under /chains/:chain_id
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/tx", post(submit_tx))
        .route("/tx/:hash", get(get_receipt))
        .route("/logs", get(get_logs))
}

/// GET /chains - Every chain with its head block and deployment
pub async fn list_chains(State(state): State<AppState>) -> Json<Vec<ChainSummary>> {
    let devnet = state.devnet().read().await;
    let chains = devnet
        .chains()
        .map(|chain| {
            let head = chain.head();
            ChainSummary {
                chain_id: chain.chain_id,
                name: chain.name.clone(),
                tag: chain.tag.clone(),
                block_number: head.number,
                timestamp: head.timestamp,
                deployment: devnet.deployment(chain.chain_id).cloned(),
            }
        })
        .collect();
    Json(chains)
}

/// POST /chains/:chain_id/tx - Execute a call as `from`.
///
/// A reverted transaction is still mined; the response is 422 with the
/// revert reason.
async fn submit_tx(
    State(state): State<AppState>,
    Path(chain_id): Path<ChainId>,
    Json(request): Json<SubmitTxRequest>,
) -> ApiResult<Receipt> {
    let method = request.call.method();
    let mut devnet = state.devnet().write().await;
    let receipt = devnet
        .chain_mut(chain_id)
        .map_err(chain_failure)?
        .execute(request.from, request.call)
        .map_err(chain_failure)?;
    tracing::debug!(chain = chain_id, method, tx = %receipt.transaction_hash, "Transaction submitted");

    if let Some(dir) = state.snapshot_dir() {
        devnet.save(dir).map_err(chain_failure)?;
    }
    receipt.ensure_success().map(Json).map_err(chain_failure)
}

/// GET /chains/:chain_id/tx/:hash - Receipt by hash
async fn get_receipt(
    State(state): State<AppState>,
    Path((chain_id, hash)): Path<(ChainId, String)>,
) -> ApiResult<Receipt> {
    let hash: TxHash = parse_param("transaction hash", &hash)?;
    let devnet = state.devnet().read().await;
    let chain = devnet.chain(chain_id).map_err(chain_failure)?;
    chain
        .receipt(&hash)
        .cloned()
        .map(Json)
        .ok_or_else(|| chain_failure(baz_chain::ChainError::UnknownTransaction(hash)))
}

/// GET /chains/:chain_id/logs?address=&event=&fromBlock=&toBlock=
async fn get_logs(
    State(state): State<AppState>,
    Path(chain_id): Path<ChainId>,
    Query(filter): Query<LogFilter>,
) -> ApiResult<Vec<LogEntry>> {
    let devnet = state.devnet().read().await;
    let chain = devnet.chain(chain_id).map_err(chain_failure)?;
    Ok(Json(chain.logs(&filter)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{get, post_json, TestApp, SEPOLIA};
    use axum::http::StatusCode;
    use baz_chain::Call;
    use baz_core::Address;

    #[tokio::test]
    async fn test_list_chains() {
        let app = TestApp::new();
        let (status, body) = get(&app, "/chains").await;
        assert_eq!(status, StatusCode::OK);
        let chains = body.as_array().unwrap();
        assert_eq!(chains.len(), 2);
        assert_eq!(chains[1]["chainId"], SEPOLIA);
        assert_eq!(chains[1]["tag"], "sepolia");
        assert_eq!(chains[1]["blockNumber"], 5);
        assert!(chains[1]["deployment"]["bridge"].is_string());
    }

    #[tokio::test]
    async fn test_submit_and_fetch_receipt() {
        let app = TestApp::new();
        let token = app.deployment(SEPOLIA).token;
        let request = SubmitTxRequest {
            from: app.operator(),
            call: Call::Transfer {
                token,
                to: Address::from_label("alice"),
                amount: 42,
            },
        };
        let (status, receipt) = post_json(&app, "/chains/11155111/tx", &request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(receipt["method"], "transfer");
        assert_eq!(receipt["status"]["status"], "success");

        let hash = receipt["transactionHash"].as_str().unwrap();
        let (status, fetched) = get(&app, &format!("/chains/11155111/tx/{}", hash)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["blockNumber"], 6);

        let (status, logs) = get(&app, "/chains/11155111/logs?event=Transfer&fromBlock=6").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(logs.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_reverted_tx_is_422_and_still_mined() {
        let app = TestApp::new();
        let bridge = app.deployment(SEPOLIA).bridge;
        let request = SubmitTxRequest {
            from: Address::from_label("alice"),
            call: Call::LockTokens { bridge, amount: 1 },
        };
        let (status, body) = post_json(&app, "/chains/11155111/tx", &request).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["code"], "reverted");
        assert!(body["message"].as_str().unwrap().ends_with("Insufficient balance"));

        let devnet = app.state.devnet().read().await;
        assert_eq!(devnet.chain(SEPOLIA).unwrap().block_number(), 6);
    }

    #[tokio::test]
    async fn test_unknown_chain_and_bad_hash() {
        let app = TestApp::new();
        let (status, body) = get(&app, "/chains/1/logs").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "unknown_chain");

        let (status, body) = get(&app, "/chains/11155111/tx/0x1234").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "bad_request");

        let missing = TxHash::digest(b"missing");
        let (status, body) = get(&app, &format!("/chains/11155111/tx/{}", missing)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "unknown_transaction");
    }

    #[tokio::test]
    async fn test_snapshot_written_after_submit() {
        let dir = tempfile::tempdir().unwrap();
        let app = TestApp::persistent(dir.path().to_path_buf());
        let request = SubmitTxRequest {
            from: app.operator(),
            call: Call::PauseBridge {
                bridge: app.deployment(SEPOLIA).bridge,
            },
        };
        let (status, _) = post_json(&app, "/chains/11155111/tx", &request).await;
        assert_eq!(status, StatusCode::OK);

        let restored = baz_chain::Devnet::load(dir.path()).unwrap().unwrap();
        let bridge = restored.chain(SEPOLIA).unwrap().bridge(&app.deployment(SEPOLIA).bridge).unwrap();
        assert!(bridge.paused);
    }
}
