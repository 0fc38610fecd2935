//! AMM State Types
//!
//! Read-side views of pairs and quotes handed to clients.

use std::fmt;

use baz_core::Address;
use serde::{Deserialize, Serialize};

/// Snapshot of a pair's reserves and LP supply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairInfo {
    /// Pair contract (also the LP token)
    pub address: Address,
    pub token0: Address,
    pub token1: Address,
    pub reserve0: u128,
    pub reserve1: u128,
    /// Circulating LP supply, including the locked minimum
    pub total_supply: u128,
}

impl PairInfo {
    /// Reserves ordered as (reserve of `token`, reserve of the other token)
    pub fn reserves_for(&self, token: &Address) -> Option<(u128, u128)> {
        if token == &self.token0 {
            Some((self.reserve0, self.reserve1))
        } else if token == &self.token1 {
            Some((self.reserve1, self.reserve0))
        } else {
            None
        }
    }
}

impl fmt::Display for PairInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Pair {} | {}: {} | {}: {} | LP: {}",
            self.address.short(),
            self.token0.short(),
            self.reserve0,
            self.token1.short(),
            self.reserve1,
            self.total_supply
        )
    }
}

/// Swap quote with calculated values
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapQuote {
    pub pair: Address,
    pub token_in: Address,
    pub token_out: Address,
    pub amount_in: u128,
    /// Expected output
    pub amount_out: u128,
    /// Price impact percentage
    pub price_impact: f64,
    /// Fee amount deducted from the input
    pub fee_amount: u128,
    /// Effective rate after fees
    pub effective_rate: f64,
    /// Suggested min output with default slippage
    pub min_output_suggested: u128,
}

/// Amounts actually deposited by `addLiquidity`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiquidityAdded {
    pub pair: Address,
    pub amount_a: u128,
    pub amount_b: u128,
    pub liquidity: u128,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserves_for() {
        let pair = PairInfo {
            address: Address::from_label("pair"),
            token0: Address::from_label("x"),
            token1: Address::from_label("y"),
            reserve0: 10,
            reserve1: 20,
            total_supply: 14,
        };
        assert_eq!(pair.reserves_for(&pair.token1), Some((20, 10)));
        assert_eq!(pair.reserves_for(&Address::from_label("z")), None);
        assert!(pair.to_string().starts_with("Pair 0x"));
    }
}
