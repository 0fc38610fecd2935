//! Router: liquidity management and multi-hop swaps
//!
//! The router never holds tokens. It pulls the caller's tokens straight into
//! pairs with `transferFrom`, so callers approve the router first.

use baz_core::{Address, ExecContext, Revert};
use serde::{Deserialize, Serialize};
use token::Ledger;

use crate::calculator::{calculate_input, calculate_output, quote};
use crate::constants::{fees, reasons};
use crate::factory::Factory;
use crate::pair::{sort_tokens, Pair};
use crate::state::LiquidityAdded;

/// `quote(amountA, reserveA, reserveB)` with library reverts
pub fn quote_amount(amount_a: u128, reserve_a: u128, reserve_b: u128) -> Result<u128, Revert> {
    if amount_a == 0 {
        return Err(Revert::reason(reasons::LIBRARY_INSUFFICIENT_AMOUNT));
    }
    if reserve_a == 0 || reserve_b == 0 {
        return Err(Revert::reason(reasons::LIBRARY_INSUFFICIENT_LIQUIDITY));
    }
    quote(amount_a, reserve_a, reserve_b).ok_or(Revert::Overflow)
}

/// `getAmountOut(amountIn, reserveIn, reserveOut)`
pub fn get_amount_out(amount_in: u128, reserve_in: u128, reserve_out: u128) -> Result<u128, Revert> {
    if amount_in == 0 {
        return Err(Revert::reason(reasons::LIBRARY_INSUFFICIENT_INPUT));
    }
    if reserve_in == 0 || reserve_out == 0 {
        return Err(Revert::reason(reasons::LIBRARY_INSUFFICIENT_LIQUIDITY));
    }
    Ok(calculate_output(
        reserve_in,
        reserve_out,
        amount_in,
        fees::DEFAULT_FEE_NUM,
        fees::DEFAULT_FEE_DENOM,
    ))
}

/// `getAmountIn(amountOut, reserveIn, reserveOut)`
pub fn get_amount_in(amount_out: u128, reserve_in: u128, reserve_out: u128) -> Result<u128, Revert> {
    if amount_out == 0 {
        return Err(Revert::reason(reasons::LIBRARY_INSUFFICIENT_OUTPUT));
    }
    if reserve_in == 0 || reserve_out == 0 || amount_out >= reserve_out {
        return Err(Revert::reason(reasons::LIBRARY_INSUFFICIENT_LIQUIDITY));
    }
    calculate_input(
        reserve_in,
        reserve_out,
        amount_out,
        fees::DEFAULT_FEE_NUM,
        fees::DEFAULT_FEE_DENOM,
    )
    .ok_or(Revert::Overflow)
}

/// Chained `getAmountOut` along `path`; element 0 is `amount_in`
pub fn get_amounts_out(
    factory: &Factory,
    amount_in: u128,
    path: &[Address],
) -> Result<Vec<u128>, Revert> {
    if path.len() < 2 {
        return Err(Revert::reason(reasons::INVALID_PATH));
    }
    let mut amounts = Vec::with_capacity(path.len());
    amounts.push(amount_in);
    for hop in path.windows(2) {
        let (reserve_in, reserve_out) = factory.get_reserves(&hop[0], &hop[1])?;
        let last = amounts[amounts.len() - 1];
        amounts.push(get_amount_out(last, reserve_in, reserve_out)?);
    }
    Ok(amounts)
}

/// Chained `getAmountIn` walking `path` backwards; last element is `amount_out`
pub fn get_amounts_in(
    factory: &Factory,
    amount_out: u128,
    path: &[Address],
) -> Result<Vec<u128>, Revert> {
    if path.len() < 2 {
        return Err(Revert::reason(reasons::INVALID_PATH));
    }
    let mut amounts = vec![0u128; path.len()];
    amounts[path.len() - 1] = amount_out;
    for i in (1..path.len()).rev() {
        let (reserve_in, reserve_out) = factory.get_reserves(&path[i - 1], &path[i])?;
        amounts[i - 1] = get_amount_in(amounts[i], reserve_in, reserve_out)?;
    }
    Ok(amounts)
}

/// Arguments to `addLiquidity`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddLiquidity {
    pub token_a: Address,
    pub token_b: Address,
    pub amount_a_desired: u128,
    pub amount_b_desired: u128,
    pub amount_a_min: u128,
    pub amount_b_min: u128,
    pub to: Address,
    pub deadline: u64,
}

/// Arguments to `removeLiquidity`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveLiquidity {
    pub token_a: Address,
    pub token_b: Address,
    pub liquidity: u128,
    pub amount_a_min: u128,
    pub amount_b_min: u128,
    pub to: Address,
    pub deadline: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Router {
    pub address: Address,
    pub factory: Address,
}

fn pair_for<'a>(
    factory: &'a mut Factory,
    token_a: &Address,
    token_b: &Address,
) -> Result<&'a mut Pair, Revert> {
    let address = factory
        .get_pair(token_a, token_b)
        .ok_or_else(|| Revert::reason(reasons::PAIR_NOT_FOUND))?;
    factory
        .pair_mut(&address)
        .ok_or_else(|| Revert::reason(reasons::PAIR_NOT_FOUND))
}

impl Router {
    pub fn new(address: Address, factory: Address) -> Self {
        Self { address, factory }
    }

    fn ensure(&self, ctx: &ExecContext, deadline: u64) -> Result<(), Revert> {
        if deadline < ctx.block.timestamp {
            return Err(Revert::reason(reasons::EXPIRED));
        }
        Ok(())
    }

    fn pull(
        &self,
        ledger: &mut Ledger,
        ctx: &mut ExecContext,
        token: &Address,
        to: &Address,
        amount: u128,
    ) -> Result<(), Revert> {
        let from = ctx.sender;
        ctx.call_as(self.address, |ctx| {
            ledger.transfer_from(ctx, token, &from, to, amount)
        })
    }

    fn optimal_amounts(
        &self,
        factory: &Factory,
        args: &AddLiquidity,
    ) -> Result<(u128, u128), Revert> {
        let (reserve_a, reserve_b) = factory.get_reserves(&args.token_a, &args.token_b)?;
        if reserve_a == 0 && reserve_b == 0 {
            return Ok((args.amount_a_desired, args.amount_b_desired));
        }
        let amount_b_optimal = quote_amount(args.amount_a_desired, reserve_a, reserve_b)?;
        if amount_b_optimal <= args.amount_b_desired {
            if amount_b_optimal < args.amount_b_min {
                return Err(Revert::reason(reasons::INSUFFICIENT_B_AMOUNT));
            }
            return Ok((args.amount_a_desired, amount_b_optimal));
        }
        let amount_a_optimal = quote_amount(args.amount_b_desired, reserve_b, reserve_a)?;
        if amount_a_optimal > args.amount_a_desired || amount_a_optimal < args.amount_a_min {
            return Err(Revert::reason(reasons::INSUFFICIENT_A_AMOUNT));
        }
        Ok((amount_a_optimal, args.amount_b_desired))
    }

    /// `addLiquidity`: create the pair if needed, deposit at the current
    /// ratio and mint LP to `to`
    pub fn add_liquidity(
        &self,
        ledger: &mut Ledger,
        factory: &mut Factory,
        ctx: &mut ExecContext,
        args: &AddLiquidity,
    ) -> Result<LiquidityAdded, Revert> {
        self.ensure(ctx, args.deadline)?;
        if factory.get_pair(&args.token_a, &args.token_b).is_none() {
            factory.create_pair(ledger, ctx, args.token_a, args.token_b)?;
        }
        let (amount_a, amount_b) = self.optimal_amounts(factory, args)?;

        let pair = pair_for(factory, &args.token_a, &args.token_b)?;
        let pair_address = pair.address;
        self.pull(ledger, ctx, &args.token_a, &pair_address, amount_a)?;
        self.pull(ledger, ctx, &args.token_b, &pair_address, amount_b)?;
        let liquidity = ctx.call_as(self.address, |ctx| pair.mint(ledger, ctx, &args.to))?;

        tracing::debug!(
            pair = %pair_address,
            amount_a = %amount_a,
            amount_b = %amount_b,
            liquidity = %liquidity,
            "Liquidity added"
        );
        Ok(LiquidityAdded {
            pair: pair_address,
            amount_a,
            amount_b,
            liquidity,
        })
    }

    /// `removeLiquidity`: burn LP and return both tokens to `to`
    pub fn remove_liquidity(
        &self,
        ledger: &mut Ledger,
        factory: &mut Factory,
        ctx: &mut ExecContext,
        args: &RemoveLiquidity,
    ) -> Result<(u128, u128), Revert> {
        self.ensure(ctx, args.deadline)?;
        let pair = pair_for(factory, &args.token_a, &args.token_b)?;
        let pair_address = pair.address;
        self.pull(ledger, ctx, &pair_address, &pair_address, args.liquidity)?;
        let (amount0, amount1) = ctx.call_as(self.address, |ctx| pair.burn(ledger, ctx, &args.to))?;

        let (token0, _) = sort_tokens(args.token_a, args.token_b)?;
        let (amount_a, amount_b) = if args.token_a == token0 {
            (amount0, amount1)
        } else {
            (amount1, amount0)
        };
        if amount_a < args.amount_a_min {
            return Err(Revert::reason(reasons::INSUFFICIENT_A_AMOUNT));
        }
        if amount_b < args.amount_b_min {
            return Err(Revert::reason(reasons::INSUFFICIENT_B_AMOUNT));
        }
        Ok((amount_a, amount_b))
    }

    /// `swapExactTokensForTokens`
    #[allow(clippy::too_many_arguments)]
    pub fn swap_exact_tokens_for_tokens(
        &self,
        ledger: &mut Ledger,
        factory: &mut Factory,
        ctx: &mut ExecContext,
        amount_in: u128,
        amount_out_min: u128,
        path: &[Address],
        to: &Address,
        deadline: u64,
    ) -> Result<Vec<u128>, Revert> {
        self.ensure(ctx, deadline)?;
        let amounts = get_amounts_out(factory, amount_in, path)?;
        if amounts[amounts.len() - 1] < amount_out_min {
            return Err(Revert::reason(reasons::ROUTER_INSUFFICIENT_OUTPUT));
        }
        self.execute_path(ledger, factory, ctx, &amounts, path, to)?;
        Ok(amounts)
    }

    /// `swapTokensForExactTokens`
    #[allow(clippy::too_many_arguments)]
    pub fn swap_tokens_for_exact_tokens(
        &self,
        ledger: &mut Ledger,
        factory: &mut Factory,
        ctx: &mut ExecContext,
        amount_out: u128,
        amount_in_max: u128,
        path: &[Address],
        to: &Address,
        deadline: u64,
    ) -> Result<Vec<u128>, Revert> {
        self.ensure(ctx, deadline)?;
        let amounts = get_amounts_in(factory, amount_out, path)?;
        if amounts[0] > amount_in_max {
            return Err(Revert::reason(reasons::EXCESSIVE_INPUT_AMOUNT));
        }
        self.execute_path(ledger, factory, ctx, &amounts, path, to)?;
        Ok(amounts)
    }

    fn execute_path(
        &self,
        ledger: &mut Ledger,
        factory: &mut Factory,
        ctx: &mut ExecContext,
        amounts: &[u128],
        path: &[Address],
        to: &Address,
    ) -> Result<(), Revert> {
        let first_pair = factory
            .get_pair(&path[0], &path[1])
            .ok_or_else(|| Revert::reason(reasons::PAIR_NOT_FOUND))?;
        self.pull(ledger, ctx, &path[0], &first_pair, amounts[0])?;

        for i in 0..path.len() - 1 {
            let (input, output) = (path[i], path[i + 1]);
            let (token0, _) = sort_tokens(input, output)?;
            let amount_out = amounts[i + 1];
            let (amount0_out, amount1_out) = if input == token0 {
                (0, amount_out)
            } else {
                (amount_out, 0)
            };
            let recipient = if i + 2 < path.len() {
                factory
                    .get_pair(&output, &path[i + 2])
                    .ok_or_else(|| Revert::reason(reasons::PAIR_NOT_FOUND))?
            } else {
                *to
            };
            let pair = pair_for(factory, &input, &output)?;
            ctx.call_as(self.address, |ctx| {
                pair.swap(ledger, ctx, amount0_out, amount1_out, &recipient)
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use baz_core::BlockEnv;
    use token::TokenInfo;

    const SUPPLY: u128 = 1_000_000_000;

    struct Env {
        ledger: Ledger,
        factory: Factory,
        router: Router,
        user: Address,
        tokens: Vec<Address>,
    }

    fn ctx(sender: Address, timestamp: u64) -> ExecContext {
        ExecContext::new(
            sender,
            BlockEnv {
                number: 1,
                timestamp,
            },
        )
    }

    fn setup() -> Env {
        let owner = Address::from_label("owner");
        let user = Address::from_label("user");
        let factory = Factory::new(Address::from_label("factory"), owner);
        let router = Router::new(Address::from_label("router"), factory.address);
        let mut ledger = Ledger::new();
        let tokens: Vec<Address> = ["baz", "usd", "eth"]
            .iter()
            .map(|l| Address::from_label(l))
            .collect();
        for token in &tokens {
            ledger.deploy(
                *token,
                TokenInfo {
                    name: "T".into(),
                    symbol: "T".into(),
                    decimals: 18,
                },
                owner,
            );
            ledger.mint(&mut ctx(owner, 0), token, &user, SUPPLY).unwrap();
            ledger
                .approve(&mut ctx(user, 0), token, &router.address, u128::MAX)
                .unwrap();
        }
        Env {
            ledger,
            factory,
            router,
            user,
            tokens,
        }
    }

    impl Env {
        fn add(&mut self, a: usize, b: usize, amount_a: u128, amount_b: u128) -> LiquidityAdded {
            let args = AddLiquidity {
                token_a: self.tokens[a],
                token_b: self.tokens[b],
                amount_a_desired: amount_a,
                amount_b_desired: amount_b,
                amount_a_min: 0,
                amount_b_min: 0,
                to: self.user,
                deadline: 100,
            };
            self.router
                .add_liquidity(&mut self.ledger, &mut self.factory, &mut ctx(self.user, 10), &args)
                .unwrap()
        }
    }

    #[test]
    fn test_add_liquidity_creates_pair() {
        let mut env = setup();
        let added = env.add(0, 1, 1_000_000, 4_000_000);
        assert_eq!(added.liquidity, 2_000_000 - 1_000);
        assert_eq!(env.factory.get_pair(&env.tokens[0], &env.tokens[1]), Some(added.pair));
        assert_eq!(env.ledger.balance_of(&added.pair, &env.user), added.liquidity);
        assert_eq!(
            env.factory.get_reserves(&env.tokens[0], &env.tokens[1]).unwrap(),
            (1_000_000, 4_000_000)
        );
    }

    #[test]
    fn test_add_liquidity_uses_optimal_ratio() {
        let mut env = setup();
        env.add(0, 1, 1_000_000, 4_000_000);
        let added = env.add(0, 1, 100_000, 1_000_000);
        assert_eq!(added.amount_a, 100_000);
        assert_eq!(added.amount_b, 400_000);

        let added = env.add(0, 1, 1_000_000, 40_000);
        assert_eq!(added.amount_a, 10_000);
        assert_eq!(added.amount_b, 40_000);
    }

    #[test]
    fn test_add_liquidity_min_amount() {
        let mut env = setup();
        env.add(0, 1, 1_000_000, 4_000_000);
        let args = AddLiquidity {
            token_a: env.tokens[0],
            token_b: env.tokens[1],
            amount_a_desired: 100_000,
            amount_b_desired: 1_000_000,
            amount_a_min: 0,
            amount_b_min: 500_000,
            to: env.user,
            deadline: 100,
        };
        let err = env
            .router
            .add_liquidity(&mut env.ledger, &mut env.factory, &mut ctx(env.user, 10), &args)
            .unwrap_err();
        assert_eq!(err.to_string(), reasons::INSUFFICIENT_B_AMOUNT);
    }

    #[test]
    fn test_deadline_expired() {
        let mut env = setup();
        let args = AddLiquidity {
            token_a: env.tokens[0],
            token_b: env.tokens[1],
            amount_a_desired: 1,
            amount_b_desired: 1,
            amount_a_min: 0,
            amount_b_min: 0,
            to: env.user,
            deadline: 5,
        };
        let err = env
            .router
            .add_liquidity(&mut env.ledger, &mut env.factory, &mut ctx(env.user, 10), &args)
            .unwrap_err();
        assert_eq!(err.to_string(), reasons::EXPIRED);
    }

    #[test]
    fn test_remove_liquidity_round_trip() {
        let mut env = setup();
        let added = env.add(0, 1, 1_000_000, 4_000_000);
        env.ledger
            .approve(&mut ctx(env.user, 10), &added.pair, &env.router.address, u128::MAX)
            .unwrap();
        let args = RemoveLiquidity {
            token_a: env.tokens[1],
            token_b: env.tokens[0],
            liquidity: added.liquidity,
            amount_a_min: 0,
            amount_b_min: 0,
            to: env.user,
            deadline: 100,
        };
        let (amount_usd, amount_baz) = env
            .router
            .remove_liquidity(&mut env.ledger, &mut env.factory, &mut ctx(env.user, 10), &args)
            .unwrap();
        // The locked minimum keeps a sliver of each reserve behind
        assert_eq!(amount_baz, 999_500);
        assert_eq!(amount_usd, 3_998_000);
        assert_eq!(env.ledger.balance_of(&added.pair, &env.user), 0);
    }

    #[test]
    fn test_swap_exact_in_single_hop() {
        let mut env = setup();
        env.add(0, 1, 100_000, 100_000);
        let path = [env.tokens[0], env.tokens[1]];
        let before = env.ledger.balance_of(&env.tokens[1], &env.user);
        let amounts = env
            .router
            .swap_exact_tokens_for_tokens(
                &mut env.ledger,
                &mut env.factory,
                &mut ctx(env.user, 10),
                1_000,
                900,
                &path,
                &env.user.clone(),
                100,
            )
            .unwrap();
        assert_eq!(amounts, vec![1_000, 987]);
        assert_eq!(env.ledger.balance_of(&env.tokens[1], &env.user), before + 987);
    }

    #[test]
    fn test_swap_exact_in_min_output() {
        let mut env = setup();
        env.add(0, 1, 100_000, 100_000);
        let path = [env.tokens[0], env.tokens[1]];
        let user = env.user;
        let err = env
            .router
            .swap_exact_tokens_for_tokens(
                &mut env.ledger,
                &mut env.factory,
                &mut ctx(user, 10),
                1_000,
                988,
                &path,
                &user,
                100,
            )
            .unwrap_err();
        assert_eq!(err.to_string(), reasons::ROUTER_INSUFFICIENT_OUTPUT);
    }

    #[test]
    fn test_multi_hop_exact_out() {
        let mut env = setup();
        env.add(0, 1, 1_000_000, 1_000_000);
        env.add(1, 2, 1_000_000, 1_000_000);
        let user = env.user;
        let path = [env.tokens[0], env.tokens[1], env.tokens[2]];

        let quoted = get_amounts_in(&env.factory, 5_000, &path).unwrap();
        let before = env.ledger.balance_of(&env.tokens[2], &user);
        let amounts = env
            .router
            .swap_tokens_for_exact_tokens(
                &mut env.ledger,
                &mut env.factory,
                &mut ctx(user, 10),
                5_000,
                quoted[0],
                &path,
                &user,
                100,
            )
            .unwrap();
        assert_eq!(amounts, quoted);
        assert_eq!(env.ledger.balance_of(&env.tokens[2], &user), before + 5_000);

        let err = env
            .router
            .swap_tokens_for_exact_tokens(
                &mut env.ledger,
                &mut env.factory,
                &mut ctx(user, 10),
                5_000,
                1,
                &path,
                &user,
                100,
            )
            .unwrap_err();
        assert_eq!(err.to_string(), reasons::EXCESSIVE_INPUT_AMOUNT);
    }

    #[test]
    fn test_library_reverts() {
        let env = setup();
        assert_eq!(
            get_amounts_out(&env.factory, 10, &[env.tokens[0]])
                .unwrap_err()
                .to_string(),
            reasons::INVALID_PATH
        );
        assert_eq!(
            get_amounts_out(&env.factory, 10, &[env.tokens[0], env.tokens[1]])
                .unwrap_err()
                .to_string(),
            reasons::PAIR_NOT_FOUND
        );
        assert_eq!(get_amount_out(0, 1, 1).unwrap_err().to_string(), reasons::LIBRARY_INSUFFICIENT_INPUT);
        assert_eq!(get_amount_in(10, 0, 1).unwrap_err().to_string(), reasons::LIBRARY_INSUFFICIENT_LIQUIDITY);
        assert_eq!(quote_amount(10, 100, 400).unwrap(), 40);
    }
}
