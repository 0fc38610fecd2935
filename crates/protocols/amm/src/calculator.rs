//! AMM Calculator
//!
//! Swap math using constant product formula (x * y = k).
//!
//! Reserves are `u128`, so every product goes through `BigInt` before
//! dividing back down.

use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};

/// `a * b / c` without intermediate overflow. `None` when `c` is zero or the
/// result does not fit in `u128`.
pub fn mul_div(a: u128, b: u128, c: u128) -> Option<u128> {
    if c == 0 {
        return None;
    }
    let result = BigUint::from(a) * BigUint::from(b) / BigUint::from(c);
    result.to_u128()
}

/// Calculate swap output using constant product formula
///
/// Formula: output = (reserves_out * input * fee_num) / (reserves_in * fee_denom + input * fee_num)
pub fn calculate_output(
    reserves_in: u128,
    reserves_out: u128,
    input_amount: u128,
    fee_num: u32,
    fee_denom: u32,
) -> u128 {
    if reserves_in == 0 || reserves_out == 0 || input_amount == 0 {
        return 0;
    }

    let input_with_fee = BigUint::from(input_amount) * BigUint::from(fee_num);
    let numerator = BigUint::from(reserves_out) * &input_with_fee;
    let denominator = BigUint::from(reserves_in) * BigUint::from(fee_denom) + input_with_fee;

    if denominator.is_zero() {
        return 0;
    }

    (numerator / denominator).to_u128().unwrap_or(0)
}

/// Calculate required input for desired output (reverse calculation)
///
/// Formula: input = (reserves_in * output * fee_denom) / ((reserves_out - output) * fee_num) + 1
pub fn calculate_input(
    reserves_in: u128,
    reserves_out: u128,
    output_amount: u128,
    fee_num: u32,
    fee_denom: u32,
) -> Option<u128> {
    if reserves_in == 0 || reserves_out == 0 || output_amount == 0 {
        return None;
    }
    if output_amount >= reserves_out {
        return None; // Can't take more than reserves
    }

    let numerator =
        BigUint::from(reserves_in) * BigUint::from(output_amount) * BigUint::from(fee_denom);
    let denominator = BigUint::from(reserves_out - output_amount) * BigUint::from(fee_num);

    if denominator.is_zero() {
        return None;
    }

    let result = numerator / denominator + BigUint::from(1u8); // Round up
    result.to_u128()
}

/// Equivalent amount of the other asset at current reserves
///
/// Formula: amount_b = amount_a * reserve_b / reserve_a
pub fn quote(amount_a: u128, reserve_a: u128, reserve_b: u128) -> Option<u128> {
    if amount_a == 0 || reserve_a == 0 || reserve_b == 0 {
        return None;
    }
    mul_div(amount_a, reserve_b, reserve_a)
}

/// Calculate spot price (reserves_out / reserves_in)
pub fn calculate_spot_price(reserves_in: u128, reserves_out: u128) -> f64 {
    if reserves_in == 0 {
        return 0.0;
    }
    reserves_out as f64 / reserves_in as f64
}

/// Calculate price impact as percentage
pub fn calculate_price_impact(
    reserves_in: u128,
    reserves_out: u128,
    input_amount: u128,
    output_amount: u128,
) -> f64 {
    if input_amount == 0 || output_amount == 0 {
        return 0.0;
    }

    let spot_price = calculate_spot_price(reserves_in, reserves_out);
    let execution_price = output_amount as f64 / input_amount as f64;

    if spot_price == 0.0 {
        return 0.0;
    }

    ((spot_price - execution_price) / spot_price).abs() * 100.0
}

/// Calculate effective rate after fees
pub fn calculate_effective_rate(input_amount: u128, output_amount: u128) -> f64 {
    if input_amount == 0 {
        return 0.0;
    }
    output_amount as f64 / input_amount as f64
}

/// Apply slippage tolerance (basis points) to an output amount
pub fn apply_slippage(output: u128, slippage_bps: u32) -> u128 {
    let keep = 10_000u32.saturating_sub(slippage_bps);
    mul_div(output, keep as u128, 10_000).unwrap_or(0)
}

/// Suggest minimum output with default slippage (0.5%)
pub fn suggest_min_output(output: u128) -> u128 {
    apply_slippage(output, 50)
}

/// Calculate share of pool for given LP amount
pub fn calculate_pool_share(lp_amount: u128, lp_supply: u128) -> f64 {
    if lp_supply == 0 {
        return 0.0;
    }
    (lp_amount as f64 / lp_supply as f64) * 100.0
}

/// Calculate LP token reward for a deposit into a live pool.
///
/// reward = min(input_0 * supply_lp / reserve_0, input_1 * supply_lp / reserve_1)
///
/// `None` if an intermediate overflows `u128`.
pub fn calculate_lp_reward(
    reserve_0: u128,
    reserve_1: u128,
    supply_lp: u128,
    input_0: u128,
    input_1: u128,
) -> Option<u128> {
    if reserve_0 == 0 || reserve_1 == 0 || supply_lp == 0 {
        return Some(0);
    }
    let reward_0 = mul_div(input_0, supply_lp, reserve_0)?;
    let reward_1 = mul_div(input_1, supply_lp, reserve_1)?;
    Some(reward_0.min(reward_1))
}

/// Calculate user's share of pool reserves when redeeming LP tokens.
///
/// Returns (amount_0, amount_1), `None` on overflow.
/// amount_0 = lp_input * reserve_0 / supply_lp
/// amount_1 = lp_input * reserve_1 / supply_lp
pub fn calculate_redeem_shares(
    reserve_0: u128,
    reserve_1: u128,
    supply_lp: u128,
    lp_input: u128,
) -> Option<(u128, u128)> {
    if supply_lp == 0 {
        return Some((0, 0));
    }
    Some((
        mul_div(lp_input, reserve_0, supply_lp)?,
        mul_div(lp_input, reserve_1, supply_lp)?,
    ))
}

/// Calculate initial LP share for pool creation using geometric mean.
///
/// Formula: sqrt(amount_0 * amount_1)
/// The product can exceed `u128::MAX`, so the root is taken on a `BigUint`.
///
/// Returns 0 if either amount is 0.
pub fn calculate_initial_lp_share(amount_0: u128, amount_1: u128) -> u128 {
    if amount_0 == 0 || amount_1 == 0 {
        return 0;
    }
    let product = BigUint::from(amount_0) * BigUint::from(amount_1);
    product.sqrt().to_u128().unwrap_or(u128::MAX)
}

/// Check the fee-adjusted constant product after a swap.
///
/// `balance_adj = balance * fee_denom - amount_in * (fee_denom - fee_num)`
/// and the swap is valid when `adj_0 * adj_1 >= reserve_0 * reserve_1 * fee_denom²`.
pub fn satisfies_invariant(
    balances: (u128, u128),
    amounts_in: (u128, u128),
    reserves: (u128, u128),
    fee_num: u32,
    fee_denom: u32,
) -> bool {
    let denom = BigUint::from(fee_denom);
    let fee = BigUint::from(fee_denom - fee_num);
    let adjusted = |balance: u128, amount_in: u128| -> Option<BigUint> {
        let scaled = BigUint::from(balance) * &denom;
        let charged = BigUint::from(amount_in) * &fee;
        if scaled < charged {
            None
        } else {
            Some(scaled - charged)
        }
    };
    let (Some(adj_0), Some(adj_1)) = (
        adjusted(balances.0, amounts_in.0),
        adjusted(balances.1, amounts_in.1),
    ) else {
        return false;
    };
    adj_0 * adj_1 >= BigUint::from(reserves.0) * BigUint::from(reserves.1) * &denom * &denom
}

use crate::constants::fees::{DEFAULT_FEE_DENOM, DEFAULT_FEE_NUM};
use crate::state::{PairInfo, SwapQuote};

/// Calculate a swap quote for `amount_in` of `token_in` against a pair
pub fn quote_swap(
    pair: &PairInfo,
    token_in: &baz_core::Address,
    amount_in: u128,
) -> Option<SwapQuote> {
    let (reserves_in, reserves_out, token_out) = if token_in == &pair.token0 {
        (pair.reserve0, pair.reserve1, pair.token1)
    } else if token_in == &pair.token1 {
        (pair.reserve1, pair.reserve0, pair.token0)
    } else {
        return None;
    };

    let output = calculate_output(
        reserves_in,
        reserves_out,
        amount_in,
        DEFAULT_FEE_NUM,
        DEFAULT_FEE_DENOM,
    );
    if output == 0 {
        return None;
    }

    let fee_amount = mul_div(
        amount_in,
        (DEFAULT_FEE_DENOM - DEFAULT_FEE_NUM) as u128,
        DEFAULT_FEE_DENOM as u128,
    )
    .unwrap_or(0);

    Some(SwapQuote {
        pair: pair.address,
        token_in: *token_in,
        token_out,
        amount_in,
        amount_out: output,
        price_impact: calculate_price_impact(reserves_in, reserves_out, amount_in, output),
        fee_amount,
        effective_rate: calculate_effective_rate(amount_in, output),
        min_output_suggested: suggest_min_output(output),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use baz_core::Address;

    #[test]
    fn test_calculate_output() {
        // 1000/10000 reserves, swap 10 with 0.3% fee
        let output = calculate_output(1_000_000_000_000, 10_000_000_000, 10_000_000_000, 997, 1000);
        assert!(output > 0);
        assert!(output < 100_000_000);
    }

    #[test]
    fn test_calculate_output_matches_reference() {
        // Uniswap V2 getAmountOut(1000, 100000, 100000) = 987
        assert_eq!(calculate_output(100_000, 100_000, 1_000, 997, 1000), 987);
    }

    #[test]
    fn test_calculate_input_inverts_output() {
        let out = calculate_output(5_000_000, 2_000_000, 10_000, 997, 1000);
        let needed = calculate_input(5_000_000, 2_000_000, out, 997, 1000).unwrap();
        assert!(needed <= 10_000);
        assert!(calculate_output(5_000_000, 2_000_000, needed, 997, 1000) >= out);
    }

    #[test]
    fn test_calculate_input_rejects_draining() {
        assert_eq!(calculate_input(100, 200, 200, 997, 1000), None);
        assert_eq!(calculate_input(100, 200, 0, 997, 1000), None);
    }

    #[test]
    fn test_calculate_output_large_reserves() {
        // Products exceed u128 without BigUint
        let r = u128::MAX / 4;
        assert!(calculate_output(r, r, r / 10, 997, 1000) > 0);
    }

    #[test]
    fn test_quote() {
        assert_eq!(quote(10, 100, 400), Some(40));
        assert_eq!(quote(0, 100, 400), None);
    }

    #[test]
    fn test_calculate_price_impact() {
        let impact = calculate_price_impact(1000, 2000, 100, 180);
        // Spot price = 2.0, execution price = 1.8, impact = 10%
        assert!((impact - 10.0).abs() < 0.1);
    }

    #[test]
    fn test_apply_slippage() {
        assert_eq!(apply_slippage(10_000, 50), 9_950);
        assert_eq!(suggest_min_output(1_000_000), 995_000);
        assert_eq!(apply_slippage(10_000, 20_000), 0);
    }

    #[test]
    fn test_calculate_lp_reward_takes_minimum() {
        assert_eq!(calculate_lp_reward(1_000, 2_000, 500, 100, 100), Some(25));
        assert_eq!(calculate_lp_reward(0, 2_000, 500, 100, 100), Some(0));
        assert_eq!(calculate_lp_reward(1, 1, u128::MAX, 2, 2), None);
    }

    #[test]
    fn test_calculate_redeem_shares() {
        assert_eq!(calculate_redeem_shares(1_000, 4_000, 2_000, 500), Some((250, 1_000)));
        assert_eq!(calculate_redeem_shares(100, 200, 0, 50), Some((0, 0)));
    }

    #[test]
    fn test_initial_lp_share() {
        assert_eq!(calculate_initial_lp_share(100, 400), 200);
        assert_eq!(calculate_initial_lp_share(1000, 1000), 1000);
        assert_eq!(calculate_initial_lp_share(0, 1000), 0);
        assert!(calculate_initial_lp_share(u128::MAX / 2, u128::MAX / 2) > 0);
    }

    #[test]
    fn test_invariant_check() {
        // 1000 in, 987 out against 100000/100000 passes; 988 out fails
        let reserves = (100_000, 100_000);
        assert!(satisfies_invariant(
            (101_000, 100_000 - 987),
            (1_000, 0),
            reserves,
            997,
            1000
        ));
        assert!(!satisfies_invariant(
            (101_000, 100_000 - 988),
            (1_000, 0),
            reserves,
            997,
            1000
        ));
    }

    #[test]
    fn test_quote_swap() {
        let token0 = Address::from_label("a");
        let token1 = Address::from_label("b");
        let pair = PairInfo {
            address: Address::from_label("pair"),
            token0,
            token1,
            reserve0: 100_000,
            reserve1: 100_000,
            total_supply: 100_000,
        };
        let q = quote_swap(&pair, &token0, 1_000).unwrap();
        assert_eq!(q.amount_out, 987);
        assert_eq!(q.token_out, token1);
        assert_eq!(q.fee_amount, 3);
        assert!(quote_swap(&pair, &Address::from_label("c"), 1_000).is_none());
    }
}
