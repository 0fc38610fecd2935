//! Constant-Product AMM
//!
//! Uniswap-V2 style pairs, the factory that creates them, and a router for
//! liquidity management and multi-hop swaps. All contracts settle through the
//! shared token [`token::Ledger`].

pub mod calculator;
pub mod constants;
pub mod factory;
pub mod pair;
pub mod router;
pub mod state;

// Re-exports
pub use calculator::{calculate_output, calculate_price_impact, quote_swap};
pub use constants::{fees, lp, reasons};
pub use factory::{pair_address, Factory};
pub use pair::{sort_tokens, Pair};
pub use router::{
    get_amount_in, get_amount_out, get_amounts_in, get_amounts_out, quote_amount, AddLiquidity,
    RemoveLiquidity, Router,
};
pub use state::{LiquidityAdded, PairInfo, SwapQuote};
