//! AMM Constants
//!
//! Fee parameters, LP token parameters, and revert reasons for the
//! constant-product pool.

/// Swap fee parameters
pub mod fees {
    /// Default fee numerator (0.3% fee = 997/1000)
    pub const DEFAULT_FEE_NUM: u32 = 997;

    /// Default fee denominator
    pub const DEFAULT_FEE_DENOM: u32 = 1000;
}

/// LP token constants
pub mod lp {
    /// Liquidity permanently locked to the zero address on first mint
    pub const MINIMUM_LIQUIDITY: u128 = 1_000;

    /// Reserves are stored as uint112 in the reference pair
    pub const MAX_RESERVE: u128 = (1u128 << 112) - 1;

    pub const NAME: &str = "BAZ Swap LP";
    pub const SYMBOL: &str = "BAZ-LP";
    pub const DECIMALS: u8 = 18;
}

/// Revert reason strings
pub mod reasons {
    pub const IDENTICAL_ADDRESSES: &str = "UniswapV2: IDENTICAL_ADDRESSES";
    pub const ZERO_ADDRESS: &str = "UniswapV2: ZERO_ADDRESS";
    pub const PAIR_EXISTS: &str = "UniswapV2: PAIR_EXISTS";
    pub const INSUFFICIENT_LIQUIDITY_MINTED: &str = "UniswapV2: INSUFFICIENT_LIQUIDITY_MINTED";
    pub const INSUFFICIENT_LIQUIDITY_BURNED: &str = "UniswapV2: INSUFFICIENT_LIQUIDITY_BURNED";
    pub const INSUFFICIENT_OUTPUT_AMOUNT: &str = "UniswapV2: INSUFFICIENT_OUTPUT_AMOUNT";
    pub const INSUFFICIENT_INPUT_AMOUNT: &str = "UniswapV2: INSUFFICIENT_INPUT_AMOUNT";
    pub const INSUFFICIENT_LIQUIDITY: &str = "UniswapV2: INSUFFICIENT_LIQUIDITY";
    pub const INVALID_TO: &str = "UniswapV2: INVALID_TO";
    pub const K: &str = "UniswapV2: K";
    pub const OVERFLOW: &str = "UniswapV2: OVERFLOW";

    pub const EXPIRED: &str = "UniswapV2Router: EXPIRED";
    pub const INSUFFICIENT_A_AMOUNT: &str = "UniswapV2Router: INSUFFICIENT_A_AMOUNT";
    pub const INSUFFICIENT_B_AMOUNT: &str = "UniswapV2Router: INSUFFICIENT_B_AMOUNT";
    pub const ROUTER_INSUFFICIENT_OUTPUT: &str = "UniswapV2Router: INSUFFICIENT_OUTPUT_AMOUNT";
    pub const EXCESSIVE_INPUT_AMOUNT: &str = "UniswapV2Router: EXCESSIVE_INPUT_AMOUNT";

    pub const INVALID_PATH: &str = "UniswapV2Library: INVALID_PATH";
    pub const LIBRARY_INSUFFICIENT_AMOUNT: &str = "UniswapV2Library: INSUFFICIENT_AMOUNT";
    pub const LIBRARY_INSUFFICIENT_INPUT: &str = "UniswapV2Library: INSUFFICIENT_INPUT_AMOUNT";
    pub const LIBRARY_INSUFFICIENT_OUTPUT: &str = "UniswapV2Library: INSUFFICIENT_OUTPUT_AMOUNT";
    pub const LIBRARY_INSUFFICIENT_LIQUIDITY: &str = "UniswapV2Library: INSUFFICIENT_LIQUIDITY";
    pub const PAIR_NOT_FOUND: &str = "UniswapV2Library: PAIR_NOT_FOUND";
}
