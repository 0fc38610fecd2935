//! Constant-product pair
//!
//! Liquidity and swap inputs arrive as plain token transfers to the pair;
//! `mint`, `burn` and `swap` read them back as balance minus reserve. The
//! pair's address is also its LP token in the ledger.

use baz_core::{Address, Event, ExecContext, Revert};
use serde::{Deserialize, Serialize};
use token::{Ledger, TokenInfo};

use crate::calculator::{
    calculate_initial_lp_share, calculate_lp_reward, calculate_redeem_shares, satisfies_invariant,
};
use crate::constants::{fees, lp, reasons};
use crate::state::PairInfo;

/// Order two tokens the way the factory keys pairs
pub fn sort_tokens(a: Address, b: Address) -> Result<(Address, Address), Revert> {
    if a == b {
        return Err(Revert::reason(reasons::IDENTICAL_ADDRESSES));
    }
    let (token0, token1) = if a < b { (a, b) } else { (b, a) };
    if token0.is_zero() {
        return Err(Revert::reason(reasons::ZERO_ADDRESS));
    }
    Ok((token0, token1))
}

/// Pair contract state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pair {
    pub address: Address,
    pub factory: Address,
    pub token0: Address,
    pub token1: Address,
    pub reserve0: u128,
    pub reserve1: u128,
    pub block_timestamp_last: u64,
}

impl Pair {
    /// Create the pair and register its LP token in the ledger
    pub fn deploy(
        ledger: &mut Ledger,
        address: Address,
        factory: Address,
        token0: Address,
        token1: Address,
    ) -> Self {
        ledger.deploy(
            address,
            TokenInfo {
                name: lp::NAME.to_string(),
                symbol: lp::SYMBOL.to_string(),
                decimals: lp::DECIMALS,
            },
            address,
        );
        Self {
            address,
            factory,
            token0,
            token1,
            reserve0: 0,
            reserve1: 0,
            block_timestamp_last: 0,
        }
    }

    pub fn get_reserves(&self) -> (u128, u128, u64) {
        (self.reserve0, self.reserve1, self.block_timestamp_last)
    }

    pub fn info(&self, ledger: &Ledger) -> PairInfo {
        PairInfo {
            address: self.address,
            token0: self.token0,
            token1: self.token1,
            reserve0: self.reserve0,
            reserve1: self.reserve1,
            total_supply: ledger.total_supply(&self.address),
        }
    }

    fn balances(&self, ledger: &Ledger) -> (u128, u128) {
        (
            ledger.balance_of(&self.token0, &self.address),
            ledger.balance_of(&self.token1, &self.address),
        )
    }

    fn update(
        &mut self,
        ctx: &mut ExecContext,
        balance0: u128,
        balance1: u128,
    ) -> Result<(), Revert> {
        if balance0 > lp::MAX_RESERVE || balance1 > lp::MAX_RESERVE {
            return Err(Revert::reason(reasons::OVERFLOW));
        }
        self.reserve0 = balance0;
        self.reserve1 = balance1;
        self.block_timestamp_last = ctx.block.timestamp;
        ctx.emit(
            self.address,
            Event::Sync {
                reserve0: balance0,
                reserve1: balance1,
            },
        );
        Ok(())
    }

    /// Issue LP tokens to `to` for whatever was transferred in since the
    /// last update
    pub fn mint(
        &mut self,
        ledger: &mut Ledger,
        ctx: &mut ExecContext,
        to: &Address,
    ) -> Result<u128, Revert> {
        let (balance0, balance1) = self.balances(ledger);
        let amount0 = balance0.saturating_sub(self.reserve0);
        let amount1 = balance1.saturating_sub(self.reserve1);
        let total_supply = ledger.total_supply(&self.address);

        let liquidity = if total_supply == 0 {
            let root = calculate_initial_lp_share(amount0, amount1);
            if root <= lp::MINIMUM_LIQUIDITY {
                return Err(Revert::reason(reasons::INSUFFICIENT_LIQUIDITY_MINTED));
            }
            ledger.mint_unchecked(ctx, &self.address, &Address::ZERO, lp::MINIMUM_LIQUIDITY)?;
            root - lp::MINIMUM_LIQUIDITY
        } else {
            calculate_lp_reward(self.reserve0, self.reserve1, total_supply, amount0, amount1)
                .ok_or(Revert::Overflow)?
        };

        if liquidity == 0 {
            return Err(Revert::reason(reasons::INSUFFICIENT_LIQUIDITY_MINTED));
        }
        ledger.mint_unchecked(ctx, &self.address, to, liquidity)?;
        self.update(ctx, balance0, balance1)?;
        ctx.emit(
            self.address,
            Event::Mint {
                sender: ctx.sender,
                amount0,
                amount1,
            },
        );
        tracing::debug!(pair = %self.address, liquidity = %liquidity, "LP minted");
        Ok(liquidity)
    }

    /// Burn the LP tokens held by the pair itself and send the underlying
    /// share to `to`
    pub fn burn(
        &mut self,
        ledger: &mut Ledger,
        ctx: &mut ExecContext,
        to: &Address,
    ) -> Result<(u128, u128), Revert> {
        let (balance0, balance1) = self.balances(ledger);
        let liquidity = ledger.balance_of(&self.address, &self.address);
        let total_supply = ledger.total_supply(&self.address);

        let (amount0, amount1) =
            calculate_redeem_shares(balance0, balance1, total_supply, liquidity).ok_or(Revert::Overflow)?;
        if amount0 == 0 || amount1 == 0 {
            return Err(Revert::reason(reasons::INSUFFICIENT_LIQUIDITY_BURNED));
        }

        let pair = self.address;
        let (token0, token1) = (self.token0, self.token1);
        ledger.burn(ctx, &pair, &pair, liquidity)?;
        ctx.call_as(pair, |ctx| -> Result<(), Revert> {
            ledger.transfer(ctx, &token0, to, amount0)?;
            ledger.transfer(ctx, &token1, to, amount1)
        })?;

        let (balance0, balance1) = self.balances(ledger);
        self.update(ctx, balance0, balance1)?;
        ctx.emit(
            self.address,
            Event::Burn {
                sender: ctx.sender,
                amount0,
                amount1,
                to: *to,
            },
        );
        Ok((amount0, amount1))
    }

    /// Send the requested outputs to `to`, then require that enough input
    /// arrived to keep the fee-adjusted product from shrinking
    pub fn swap(
        &mut self,
        ledger: &mut Ledger,
        ctx: &mut ExecContext,
        amount0_out: u128,
        amount1_out: u128,
        to: &Address,
    ) -> Result<(), Revert> {
        if amount0_out == 0 && amount1_out == 0 {
            return Err(Revert::reason(reasons::INSUFFICIENT_OUTPUT_AMOUNT));
        }
        if amount0_out >= self.reserve0 || amount1_out >= self.reserve1 {
            return Err(Revert::reason(reasons::INSUFFICIENT_LIQUIDITY));
        }
        if to == &self.token0 || to == &self.token1 {
            return Err(Revert::reason(reasons::INVALID_TO));
        }

        let pair = self.address;
        let (token0, token1) = (self.token0, self.token1);
        ctx.call_as(pair, |ctx| -> Result<(), Revert> {
            if amount0_out > 0 {
                ledger.transfer(ctx, &token0, to, amount0_out)?;
            }
            if amount1_out > 0 {
                ledger.transfer(ctx, &token1, to, amount1_out)?;
            }
            Ok(())
        })?;

        let (balance0, balance1) = self.balances(ledger);
        let amount0_in = balance0.saturating_sub(self.reserve0 - amount0_out);
        let amount1_in = balance1.saturating_sub(self.reserve1 - amount1_out);
        if amount0_in == 0 && amount1_in == 0 {
            return Err(Revert::reason(reasons::INSUFFICIENT_INPUT_AMOUNT));
        }
        if !satisfies_invariant(
            (balance0, balance1),
            (amount0_in, amount1_in),
            (self.reserve0, self.reserve1),
            fees::DEFAULT_FEE_NUM,
            fees::DEFAULT_FEE_DENOM,
        ) {
            return Err(Revert::reason(reasons::K));
        }

        self.update(ctx, balance0, balance1)?;
        ctx.emit(
            self.address,
            Event::Swap {
                sender: ctx.sender,
                amount0_in,
                amount1_in,
                amount0_out,
                amount1_out,
                to: *to,
            },
        );
        Ok(())
    }

    /// Send any balance above reserves to `to`
    pub fn skim(
        &mut self,
        ledger: &mut Ledger,
        ctx: &mut ExecContext,
        to: &Address,
    ) -> Result<(), Revert> {
        let (balance0, balance1) = self.balances(ledger);
        let excess0 = balance0.saturating_sub(self.reserve0);
        let excess1 = balance1.saturating_sub(self.reserve1);
        let pair = self.address;
        let (token0, token1) = (self.token0, self.token1);
        ctx.call_as(pair, |ctx| -> Result<(), Revert> {
            if excess0 > 0 {
                ledger.transfer(ctx, &token0, to, excess0)?;
            }
            if excess1 > 0 {
                ledger.transfer(ctx, &token1, to, excess1)?;
            }
            Ok(())
        })
    }

    /// Force reserves to match balances
    pub fn sync(&mut self, ledger: &Ledger, ctx: &mut ExecContext) -> Result<(), Revert> {
        let (balance0, balance1) = self.balances(ledger);
        self.update(ctx, balance0, balance1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use baz_core::BlockEnv;

    struct Fixture {
        ledger: Ledger,
        pair: Pair,
        lp_provider: Address,
    }

    fn ctx(sender: Address) -> ExecContext {
        ExecContext::new(
            sender,
            BlockEnv {
                number: 5,
                timestamp: 60,
            },
        )
    }

    fn fixture() -> Fixture {
        let owner = Address::from_label("owner");
        let lp_provider = Address::from_label("lp");
        let mut ledger = Ledger::new();
        let (token0, token1) =
            sort_tokens(Address::from_label("baz"), Address::from_label("usd")).unwrap();
        for token in [token0, token1] {
            ledger.deploy(
                token,
                TokenInfo {
                    name: "T".into(),
                    symbol: "T".into(),
                    decimals: 18,
                },
                owner,
            );
            ledger
                .mint(&mut ctx(owner), &token, &lp_provider, 10_000_000)
                .unwrap();
        }
        let pair = Pair::deploy(
            &mut ledger,
            Address::from_label("pair"),
            Address::from_label("factory"),
            token0,
            token1,
        );
        Fixture {
            ledger,
            pair,
            lp_provider,
        }
    }

    impl Fixture {
        fn deposit(&mut self, who: Address, amount0: u128, amount1: u128) {
            let pair = self.pair.address;
            let (t0, t1) = (self.pair.token0, self.pair.token1);
            let mut c = ctx(who);
            self.ledger.transfer(&mut c, &t0, &pair, amount0).unwrap();
            self.ledger.transfer(&mut c, &t1, &pair, amount1).unwrap();
        }
    }

    #[test]
    fn test_sort_tokens() {
        let a = Address::from_label("a");
        let b = Address::from_label("b");
        assert_eq!(sort_tokens(a, b).unwrap(), sort_tokens(b, a).unwrap());
        assert_eq!(
            sort_tokens(a, a).unwrap_err().to_string(),
            reasons::IDENTICAL_ADDRESSES
        );
        assert_eq!(
            sort_tokens(Address::ZERO, a).unwrap_err().to_string(),
            reasons::ZERO_ADDRESS
        );
    }

    #[test]
    fn test_first_mint_locks_minimum_liquidity() {
        let mut f = fixture();
        let provider = f.lp_provider;
        f.deposit(provider, 1_000_000, 4_000_000);
        let liquidity = f
            .pair
            .mint(&mut f.ledger, &mut ctx(provider), &provider)
            .unwrap();

        assert_eq!(liquidity, 2_000_000 - lp::MINIMUM_LIQUIDITY);
        assert_eq!(f.ledger.balance_of(&f.pair.address, &Address::ZERO), lp::MINIMUM_LIQUIDITY);
        assert_eq!(f.pair.get_reserves().0, 1_000_000);
        assert_eq!(f.pair.get_reserves().1, 4_000_000);
    }

    #[test]
    fn test_tiny_first_mint_rejected() {
        let mut f = fixture();
        let provider = f.lp_provider;
        f.deposit(provider, 1_000, 1_000);
        let err = f
            .pair
            .mint(&mut f.ledger, &mut ctx(provider), &provider)
            .unwrap_err();
        assert_eq!(err.to_string(), reasons::INSUFFICIENT_LIQUIDITY_MINTED);
    }

    #[test]
    fn test_second_mint_is_proportional() {
        let mut f = fixture();
        let provider = f.lp_provider;
        f.deposit(provider, 1_000_000, 1_000_000);
        f.pair.mint(&mut f.ledger, &mut ctx(provider), &provider).unwrap();

        f.deposit(provider, 500_000, 800_000);
        let liquidity = f
            .pair
            .mint(&mut f.ledger, &mut ctx(provider), &provider)
            .unwrap();
        assert_eq!(liquidity, 500_000);
    }

    #[test]
    fn test_burn_returns_share() {
        let mut f = fixture();
        let provider = f.lp_provider;
        f.deposit(provider, 1_000_000, 4_000_000);
        let liquidity = f
            .pair
            .mint(&mut f.ledger, &mut ctx(provider), &provider)
            .unwrap();

        let pair = f.pair.address;
        f.ledger
            .transfer(&mut ctx(provider), &pair, &pair, liquidity / 2)
            .unwrap();
        let (a0, a1) = f
            .pair
            .burn(&mut f.ledger, &mut ctx(provider), &provider)
            .unwrap();
        assert_eq!(a0, 499_750);
        assert_eq!(a1, 1_999_000);
        assert_eq!(f.pair.reserve0, 1_000_000 - a0);
    }

    #[test]
    fn test_swap_enforces_k() {
        let mut f = fixture();
        let provider = f.lp_provider;
        f.deposit(provider, 100_000, 100_000);
        f.pair.mint(&mut f.ledger, &mut ctx(provider), &provider).unwrap();

        let trader = provider;
        let token0 = f.pair.token0;
        let pair = f.pair.address;
        f.ledger
            .transfer(&mut ctx(trader), &token0, &pair, 1_000)
            .unwrap();

        let mut greedy = f.pair.clone();
        let mut greedy_ledger = f.ledger.clone();
        assert_eq!(
            greedy
                .swap(&mut greedy_ledger, &mut ctx(trader), 0, 988, &trader)
                .unwrap_err()
                .to_string(),
            reasons::K
        );

        f.pair
            .swap(&mut f.ledger, &mut ctx(trader), 0, 987, &trader)
            .unwrap();
        assert_eq!(f.pair.reserve0, 101_000);
        assert_eq!(f.pair.reserve1, 100_000 - 987);
    }

    #[test]
    fn test_swap_without_input_fails() {
        let mut f = fixture();
        let provider = f.lp_provider;
        f.deposit(provider, 100_000, 100_000);
        f.pair.mint(&mut f.ledger, &mut ctx(provider), &provider).unwrap();
        let err = f
            .pair
            .swap(&mut f.ledger, &mut ctx(provider), 0, 10, &provider)
            .unwrap_err();
        assert_eq!(err.to_string(), reasons::INSUFFICIENT_INPUT_AMOUNT);
    }

    #[test]
    fn test_swap_output_bounds() {
        let mut f = fixture();
        let provider = f.lp_provider;
        f.deposit(provider, 100_000, 100_000);
        f.pair.mint(&mut f.ledger, &mut ctx(provider), &provider).unwrap();
        assert_eq!(
            f.pair
                .swap(&mut f.ledger, &mut ctx(provider), 0, 0, &provider)
                .unwrap_err()
                .to_string(),
            reasons::INSUFFICIENT_OUTPUT_AMOUNT
        );
        assert_eq!(
            f.pair
                .swap(&mut f.ledger, &mut ctx(provider), 100_000, 0, &provider)
                .unwrap_err()
                .to_string(),
            reasons::INSUFFICIENT_LIQUIDITY
        );
    }

    #[test]
    fn test_skim_and_sync() {
        let mut f = fixture();
        let provider = f.lp_provider;
        f.deposit(provider, 100_000, 100_000);
        f.pair.mint(&mut f.ledger, &mut ctx(provider), &provider).unwrap();
        f.deposit(provider, 50, 70);

        let collector = Address::from_label("collector");
        f.pair.skim(&mut f.ledger, &mut ctx(provider), &collector).unwrap();
        assert_eq!(f.ledger.balance_of(&f.pair.token0, &collector), 50);
        assert_eq!(f.ledger.balance_of(&f.pair.token1, &collector), 70);

        f.deposit(provider, 5, 5);
        f.pair.sync(&f.ledger, &mut ctx(provider)).unwrap();
        assert_eq!(f.pair.reserve0, 100_005);
    }
}
