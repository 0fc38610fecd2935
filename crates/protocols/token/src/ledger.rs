//! ERC20 Ledger
//!
//! Every token deployed on a chain lives in one ledger keyed by contract
//! address, so a contract that moves several tokens (a pair, the farm) can
//! do so through a single `&mut Ledger`.

use std::collections::BTreeMap;

use baz_core::{Address, Amount, Event, ExecContext, Revert};
use serde::{Deserialize, Serialize};

/// Static token metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

/// State of one ERC20 contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenState {
    pub info: TokenInfo,
    /// Account allowed to mint
    pub owner: Address,
    pub total_supply: Amount,
    #[serde(default)]
    balances: BTreeMap<Address, Amount>,
    /// owner → spender → remaining allowance
    #[serde(default)]
    allowances: BTreeMap<Address, BTreeMap<Address, Amount>>,
}

impl TokenState {
    pub fn new(info: TokenInfo, owner: Address) -> Self {
        Self {
            info,
            owner,
            total_supply: 0,
            balances: BTreeMap::new(),
            allowances: BTreeMap::new(),
        }
    }

    pub fn balance_of(&self, account: &Address) -> Amount {
        self.balances.get(account).copied().unwrap_or(0)
    }

    pub fn allowance(&self, owner: &Address, spender: &Address) -> Amount {
        self.allowances
            .get(owner)
            .and_then(|m| m.get(spender))
            .copied()
            .unwrap_or(0)
    }

    /// Number of accounts with a non-zero balance
    pub fn holder_count(&self) -> usize {
        self.balances.values().filter(|b| **b > 0).count()
    }

    fn set_balance(&mut self, account: Address, amount: Amount) {
        if amount == 0 {
            self.balances.remove(&account);
        } else {
            self.balances.insert(account, amount);
        }
    }

    fn set_allowance(&mut self, owner: Address, spender: Address, amount: Amount) {
        self.allowances
            .entry(owner)
            .or_default()
            .insert(spender, amount);
    }
}

/// All ERC20 contracts on one chain
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    tokens: BTreeMap<Address, TokenState>,
}

fn no_token(token: &Address) -> Revert {
    Revert::reason(format!("Address: call to non-contract {}", token))
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a token contract at `address`
    pub fn deploy(&mut self, address: Address, info: TokenInfo, owner: Address) {
        tracing::debug!(token = %address, symbol = %info.symbol, "ERC20 deployed");
        self.tokens.insert(address, TokenState::new(info, owner));
    }

    pub fn contains(&self, token: &Address) -> bool {
        self.tokens.contains_key(token)
    }

    pub fn token(&self, token: &Address) -> Option<&TokenState> {
        self.tokens.get(token)
    }

    pub fn tokens(&self) -> impl Iterator<Item = (&Address, &TokenState)> {
        self.tokens.iter()
    }

    fn state_mut(&mut self, token: &Address) -> Result<&mut TokenState, Revert> {
        self.tokens.get_mut(token).ok_or_else(|| no_token(token))
    }

    pub fn balance_of(&self, token: &Address, account: &Address) -> Amount {
        self.tokens
            .get(token)
            .map(|t| t.balance_of(account))
            .unwrap_or(0)
    }

    pub fn allowance(&self, token: &Address, owner: &Address, spender: &Address) -> Amount {
        self.tokens
            .get(token)
            .map(|t| t.allowance(owner, spender))
            .unwrap_or(0)
    }

    pub fn total_supply(&self, token: &Address) -> Amount {
        self.tokens.get(token).map(|t| t.total_supply).unwrap_or(0)
    }

    /// Owner-gated mint
    pub fn mint(
        &mut self,
        ctx: &mut ExecContext,
        token: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), Revert> {
        let state = self.state_mut(token)?;
        if state.owner != ctx.sender {
            return Err(Revert::NotOwner);
        }
        if to.is_zero() {
            return Err(Revert::reason("ERC20: mint to the zero address"));
        }
        Self::mint_into(state, ctx, token, to, amount)
    }

    /// Mint without an owner check, for contracts that own a token outright
    /// (a pair minting its LP token, the locked minimum liquidity).
    pub fn mint_unchecked(
        &mut self,
        ctx: &mut ExecContext,
        token: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), Revert> {
        let state = self.state_mut(token)?;
        Self::mint_into(state, ctx, token, to, amount)
    }

    fn mint_into(
        state: &mut TokenState,
        ctx: &mut ExecContext,
        token: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), Revert> {
        state.total_supply = state
            .total_supply
            .checked_add(amount)
            .ok_or(Revert::Overflow)?;
        let balance = state.balance_of(to) + amount;
        state.set_balance(*to, balance);
        ctx.emit(
            *token,
            Event::Transfer {
                from: Address::ZERO,
                to: *to,
                value: amount,
            },
        );
        Ok(())
    }

    /// Destroy `amount` from `from`'s balance
    pub fn burn(
        &mut self,
        ctx: &mut ExecContext,
        token: &Address,
        from: &Address,
        amount: Amount,
    ) -> Result<(), Revert> {
        let state = self.state_mut(token)?;
        let balance = state.balance_of(from);
        if balance < amount {
            return Err(Revert::BurnExceedsBalance);
        }
        state.set_balance(*from, balance - amount);
        state.total_supply -= amount;
        ctx.emit(
            *token,
            Event::Transfer {
                from: *from,
                to: Address::ZERO,
                value: amount,
            },
        );
        Ok(())
    }

    /// `transfer(to, amount)` from the caller
    pub fn transfer(
        &mut self,
        ctx: &mut ExecContext,
        token: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), Revert> {
        let from = ctx.sender;
        self.move_balance(ctx, token, &from, to, amount)
    }

    /// `approve(spender, amount)` from the caller
    pub fn approve(
        &mut self,
        ctx: &mut ExecContext,
        token: &Address,
        spender: &Address,
        amount: Amount,
    ) -> Result<(), Revert> {
        let owner = ctx.sender;
        let state = self.state_mut(token)?;
        state.set_allowance(owner, *spender, amount);
        ctx.emit(
            *token,
            Event::Approval {
                owner,
                spender: *spender,
                value: amount,
            },
        );
        Ok(())
    }

    /// `transferFrom(from, to, amount)` spending the caller's allowance.
    ///
    /// An allowance of `Amount::MAX` is treated as infinite and not decreased.
    pub fn transfer_from(
        &mut self,
        ctx: &mut ExecContext,
        token: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), Revert> {
        let spender = ctx.sender;
        let state = self.state_mut(token)?;
        let allowance = state.allowance(from, &spender);
        if allowance < amount {
            return Err(Revert::Erc20InsufficientAllowance);
        }
        if allowance != Amount::MAX {
            state.set_allowance(*from, spender, allowance - amount);
        }
        self.move_balance(ctx, token, from, to, amount)
    }

    fn move_balance(
        &mut self,
        ctx: &mut ExecContext,
        token: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), Revert> {
        if to.is_zero() {
            return Err(Revert::TransferToZero);
        }
        let state = self.state_mut(token)?;
        let from_balance = state.balance_of(from);
        if from_balance < amount {
            return Err(Revert::TransferExceedsBalance);
        }
        state.set_balance(*from, from_balance - amount);
        let to_balance = state.balance_of(to);
        state.set_balance(*to, to_balance + amount);
        ctx.emit(
            *token,
            Event::Transfer {
                from: *from,
                to: *to,
                value: amount,
            },
        );
        Ok(())
    }

    /// Owner-gated ownership transfer
    pub fn transfer_ownership(
        &mut self,
        ctx: &mut ExecContext,
        token: &Address,
        new_owner: &Address,
    ) -> Result<(), Revert> {
        let state = self.state_mut(token)?;
        if state.owner != ctx.sender {
            return Err(Revert::NotOwner);
        }
        if new_owner.is_zero() {
            return Err(Revert::ZeroOwner);
        }
        let previous_owner = state.owner;
        state.owner = *new_owner;
        ctx.emit(
            *token,
            Event::OwnershipTransferred {
                previous_owner,
                new_owner: *new_owner,
            },
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use baz_core::BlockEnv;

    fn block() -> BlockEnv {
        BlockEnv {
            number: 1,
            timestamp: 12,
        }
    }

    fn setup() -> (Ledger, Address, Address, Address) {
        let owner = Address::from_label("owner");
        let alice = Address::from_label("alice");
        let token = Address::from_label("baz");
        let mut ledger = Ledger::new();
        ledger.deploy(
            token,
            TokenInfo {
                name: "Bazaar Token".into(),
                symbol: "BAZ".into(),
                decimals: 18,
            },
            owner,
        );
        let mut ctx = ExecContext::new(owner, block());
        ledger.mint(&mut ctx, &token, &alice, 1_000).unwrap();
        (ledger, token, owner, alice)
    }

    #[test]
    fn test_mint_requires_owner() {
        let (mut ledger, token, _owner, alice) = setup();
        let mut ctx = ExecContext::new(alice, block());
        assert_eq!(
            ledger.mint(&mut ctx, &token, &alice, 5),
            Err(Revert::NotOwner)
        );
        assert_eq!(ledger.total_supply(&token), 1_000);
    }

    #[test]
    fn test_transfer_moves_balance_and_emits() {
        let (mut ledger, token, _owner, alice) = setup();
        let bob = Address::from_label("bob");
        let mut ctx = ExecContext::new(alice, block());
        ledger.transfer(&mut ctx, &token, &bob, 400).unwrap();
        assert_eq!(ledger.balance_of(&token, &alice), 600);
        assert_eq!(ledger.balance_of(&token, &bob), 400);
        assert_eq!(ctx.logs().len(), 1);
        assert_eq!(ctx.logs()[0].address, token);
    }

    #[test]
    fn test_transfer_exceeding_balance_fails() {
        let (mut ledger, token, _owner, alice) = setup();
        let mut ctx = ExecContext::new(alice, block());
        assert_eq!(
            ledger.transfer(&mut ctx, &token, &Address::from_label("bob"), 1_001),
            Err(Revert::TransferExceedsBalance)
        );
        assert_eq!(ledger.balance_of(&token, &alice), 1_000);
    }

    #[test]
    fn test_transfer_from_spends_allowance() {
        let (mut ledger, token, _owner, alice) = setup();
        let spender = Address::from_label("bridge");
        let mut ctx = ExecContext::new(alice, block());
        ledger.approve(&mut ctx, &token, &spender, 300).unwrap();

        let mut ctx = ExecContext::new(spender, block());
        ledger
            .transfer_from(&mut ctx, &token, &alice, &spender, 200)
            .unwrap();
        assert_eq!(ledger.allowance(&token, &alice, &spender), 100);
        assert_eq!(ledger.balance_of(&token, &spender), 200);
        assert_eq!(
            ledger.transfer_from(&mut ctx, &token, &alice, &spender, 101),
            Err(Revert::Erc20InsufficientAllowance)
        );
    }

    #[test]
    fn test_infinite_allowance_not_decreased() {
        let (mut ledger, token, _owner, alice) = setup();
        let spender = Address::from_label("router");
        let mut ctx = ExecContext::new(alice, block());
        ledger
            .approve(&mut ctx, &token, &spender, Amount::MAX)
            .unwrap();
        let mut ctx = ExecContext::new(spender, block());
        ledger
            .transfer_from(&mut ctx, &token, &alice, &spender, 10)
            .unwrap();
        assert_eq!(ledger.allowance(&token, &alice, &spender), Amount::MAX);
    }

    #[test]
    fn test_burn_reduces_supply() {
        let (mut ledger, token, _owner, alice) = setup();
        let mut ctx = ExecContext::new(alice, block());
        ledger.burn(&mut ctx, &token, &alice, 250).unwrap();
        assert_eq!(ledger.total_supply(&token), 750);
        assert_eq!(
            ledger.burn(&mut ctx, &token, &alice, 751),
            Err(Revert::BurnExceedsBalance)
        );
    }

    #[test]
    fn test_unknown_token_reverts() {
        let (mut ledger, _token, _owner, alice) = setup();
        let mut ctx = ExecContext::new(alice, block());
        let err = ledger
            .transfer(&mut ctx, &Address::from_label("nothing"), &alice, 1)
            .unwrap_err();
        assert!(err.to_string().starts_with("Address: call to non-contract"));
    }

    #[test]
    fn test_transfer_ownership() {
        let (mut ledger, token, owner, alice) = setup();
        let mut ctx = ExecContext::new(owner, block());
        assert_eq!(
            ledger.transfer_ownership(&mut ctx, &token, &Address::ZERO),
            Err(Revert::ZeroOwner)
        );
        ledger.transfer_ownership(&mut ctx, &token, &alice).unwrap();
        assert_eq!(ledger.token(&token).unwrap().owner, alice);
    }
}
