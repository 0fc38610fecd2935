//! Data Transfer Objects for API requests and responses
//!
//! Amounts leave the API as decimal strings.

use amm::SwapQuote;
use baz_chain::{Call, Deployment};
use baz_core::{amount_str, format_units, Address, Amount, BlockNumber, ChainId};
use serde::{Deserialize, Serialize};

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Generic API error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("not_found", message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new("bad_request", message)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainSummary {
    pub chain_id: ChainId,
    pub name: String,
    pub tag: String,
    pub block_number: BlockNumber,
    pub timestamp: u64,
    pub deployment: Option<Deployment>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserNonceResponse {
    pub bridge: Address,
    pub user: Address,
    /// Last nonce issued to the user, "0" before the first lock
    #[serde(with = "amount_str")]
    pub nonce: u128,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NonceProcessedResponse {
    pub bridge: Address,
    #[serde(with = "amount_str")]
    pub nonce: u128,
    pub processed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceResponse {
    pub token: Address,
    pub holder: Address,
    pub symbol: String,
    #[serde(with = "amount_str")]
    pub balance: Amount,
    /// Balance in whole tokens
    pub formatted: String,
}

impl BalanceResponse {
    pub fn new(token: Address, holder: Address, symbol: String, decimals: u8, balance: Amount) -> Self {
        Self {
            token,
            holder,
            symbol,
            balance,
            formatted: format_units(balance, decimals),
        }
    }
}

/// Transaction submitted on behalf of `from`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitTxRequest {
    pub from: Address,
    pub call: Call,
}

/// Swap quote request against the chain's deployed factory
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    pub token_in: Address,
    pub token_out: Address,
    #[serde(with = "amount_str")]
    pub amount_in: Amount,
    /// Tolerated slippage in basis points, 50 when omitted
    #[serde(default)]
    pub slippage_bps: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResponse {
    pub pair: Address,
    pub token_in: Address,
    pub token_out: Address,
    #[serde(with = "amount_str")]
    pub amount_in: Amount,
    #[serde(with = "amount_str")]
    pub amount_out: Amount,
    #[serde(with = "amount_str")]
    pub min_amount_out: Amount,
    #[serde(with = "amount_str")]
    pub fee_amount: Amount,
    pub price_impact: f64,
    pub effective_rate: f64,
}

impl QuoteResponse {
    pub fn from_quote(quote: SwapQuote, min_amount_out: Amount) -> Self {
        Self {
            pair: quote.pair,
            token_in: quote.token_in,
            token_out: quote.token_out,
            amount_in: quote.amount_in,
            amount_out: quote.amount_out,
            min_amount_out,
            fee_amount: quote.fee_amount,
            price_impact: quote.price_impact,
            effective_rate: quote.effective_rate,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingRewardResponse {
    pub farm: Address,
    pub pid: u64,
    pub user: Address,
    #[serde(with = "amount_str")]
    pub pending: Amount,
}
