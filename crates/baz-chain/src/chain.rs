//! Single devnet chain
//!
//! Every transaction mines its own block. Contract state is cloned before
//! dispatch and restored if the call reverts, so a reverted transaction
//! leaves nothing behind but its receipt and the sender's bumped nonce.

use std::collections::BTreeMap;

use amm::{AddLiquidity, Factory, Pair, RemoveLiquidity, Router};
use baz_core::constants::BLOCK_TIME_SECS;
use baz_core::{
    Address, BlockEnv, BlockNumber, ChainId, ExecContext, Revert, TxHash,
};
use bridge::Bridge;
use farm::MasterChef;
use serde::{Deserialize, Serialize};
use token::{Ledger, TokenInfo};

use crate::call::{Call, TokenSummary, View, ViewResult};
use crate::error::{ChainError, Result};
use crate::receipt::{Block, LogEntry, LogFilter, Receipt, TxStatus};

fn non_contract(address: &Address) -> Revert {
    Revert::reason(format!("Address: call to non-contract {}", address))
}

/// All contracts deployed on one chain
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractState {
    pub ledger: Ledger,
    pub bridges: BTreeMap<Address, Bridge>,
    pub factories: BTreeMap<Address, Factory>,
    pub routers: BTreeMap<Address, Router>,
    pub farms: BTreeMap<Address, MasterChef>,
}

impl ContractState {
    fn bridge_mut(&mut self, address: &Address) -> std::result::Result<&mut Bridge, Revert> {
        self.bridges
            .get_mut(address)
            .ok_or_else(|| non_contract(address))
    }

    fn router(&self, address: &Address) -> std::result::Result<Router, Revert> {
        self.routers
            .get(address)
            .cloned()
            .ok_or_else(|| non_contract(address))
    }

    /// Pair contract, wherever its factory is
    pub fn pair(&self, address: &Address) -> Option<&Pair> {
        self.factories.values().find_map(|f| f.pair(address))
    }

    /// What kind of contract lives at `address`, if any
    pub fn contract_kind(&self, address: &Address) -> Option<&'static str> {
        if self.bridges.contains_key(address) {
            Some("bridge")
        } else if self.farms.contains_key(address) {
            Some("farm")
        } else if self.factories.contains_key(address) {
            Some("factory")
        } else if self.routers.contains_key(address) {
            Some("router")
        } else if self.pair(address).is_some() {
            Some("pair")
        } else if self.ledger.contains(address) {
            Some("token")
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chain {
    pub chain_id: ChainId,
    /// Network name ("sepolia")
    pub name: String,
    /// Tag used by bridges on this chain
    pub tag: String,
    pub genesis_timestamp: u64,
    state: ContractState,
    nonces: BTreeMap<Address, u64>,
    blocks: Vec<Block>,
    receipts: BTreeMap<TxHash, Receipt>,
}

impl Chain {
    pub fn new(
        chain_id: ChainId,
        name: impl Into<String>,
        tag: impl Into<String>,
        genesis_timestamp: u64,
    ) -> Self {
        Self {
            chain_id,
            name: name.into(),
            tag: tag.into(),
            genesis_timestamp,
            state: ContractState::default(),
            nonces: BTreeMap::new(),
            blocks: vec![Block {
                number: 0,
                timestamp: genesis_timestamp,
                transactions: Vec::new(),
            }],
            receipts: BTreeMap::new(),
        }
    }

    // ─── Chain queries ──────────────────────────────────────────────────────

    pub fn block_number(&self) -> BlockNumber {
        self.blocks.len() as BlockNumber - 1
    }

    pub fn block(&self, number: BlockNumber) -> Option<&Block> {
        self.blocks.get(number as usize)
    }

    fn timestamp_of(&self, number: BlockNumber) -> u64 {
        self.genesis_timestamp + number * BLOCK_TIME_SECS
    }

    /// Environment a view sees: the head block
    pub fn head(&self) -> BlockEnv {
        let number = self.block_number();
        BlockEnv {
            number,
            timestamp: self.timestamp_of(number),
        }
    }

    /// Next nonce `account` will use
    pub fn nonce_of(&self, account: &Address) -> u64 {
        self.nonces.get(account).copied().unwrap_or(0)
    }

    pub fn receipt(&self, hash: &TxHash) -> Option<&Receipt> {
        self.receipts.get(hash)
    }

    pub fn state(&self) -> &ContractState {
        &self.state
    }

    pub fn ledger(&self) -> &Ledger {
        &self.state.ledger
    }

    pub fn bridge(&self, address: &Address) -> Option<&Bridge> {
        self.state.bridges.get(address)
    }

    pub fn farm(&self, address: &Address) -> Option<&MasterChef> {
        self.state.farms.get(address)
    }

    pub fn factory(&self, address: &Address) -> Option<&Factory> {
        self.state.factories.get(address)
    }

    /// Logs matching `filter`, in chain order
    pub fn logs(&self, filter: &LogFilter) -> Vec<LogEntry> {
        let from = filter.from_block.unwrap_or(0) as usize;
        let to = filter
            .to_block
            .map(|b| b as usize)
            .unwrap_or(self.blocks.len());
        self.blocks
            .iter()
            .skip(from)
            .take_while(|block| block.number as usize <= to)
            .flat_map(|block| block.transactions.iter())
            .filter_map(|hash| self.receipts.get(hash))
            .flat_map(|receipt| {
                receipt
                    .logs
                    .iter()
                    .enumerate()
                    .filter(|(_, log)| filter.matches(receipt.block_number, log))
                    .map(|(log_index, log)| LogEntry {
                        block_number: receipt.block_number,
                        transaction_hash: receipt.transaction_hash,
                        log_index,
                        address: log.address,
                        event: log.event.clone(),
                    })
            })
            .collect()
    }

    // ─── Transactions ───────────────────────────────────────────────────────

    fn tx_hash(&self, from: &Address, nonce: u64, call: &Call) -> Result<TxHash> {
        let encoded =
            serde_json::to_vec(call).map_err(|e| ChainError::Serialization(e.to_string()))?;
        let mut preimage = Vec::with_capacity(36 + encoded.len());
        preimage.extend_from_slice(&self.chain_id.to_be_bytes());
        preimage.extend_from_slice(&from.0);
        preimage.extend_from_slice(&nonce.to_be_bytes());
        preimage.extend_from_slice(&encoded);
        Ok(TxHash::digest(preimage))
    }

    /// Execute `call` as `from` in a new block.
    ///
    /// A revert is not an error here: it yields a receipt with
    /// [`TxStatus::Reverted`]. Use [`Receipt::ensure_success`] to fail on it.
    pub fn execute(&mut self, from: Address, call: Call) -> Result<Receipt> {
        let nonce = self.nonce_of(&from);
        let hash = self.tx_hash(&from, nonce, &call)?;
        let number = self.block_number() + 1;
        let env = BlockEnv {
            number,
            timestamp: self.timestamp_of(number),
        };

        let snapshot = self.state.clone();
        let mut ctx = ExecContext::new(from, env);
        let outcome = self.dispatch(&mut ctx, nonce, &call);
        self.nonces.insert(from, nonce + 1);

        let (status, logs, contract_address) = match outcome {
            Ok(created) => {
                tracing::debug!(
                    chain = self.chain_id,
                    tx = %hash,
                    method = call.method(),
                    from = %from,
                    "Transaction succeeded"
                );
                (TxStatus::Success, ctx.into_logs(), created)
            }
            Err(revert) => {
                self.state = snapshot;
                tracing::warn!(
                    chain = self.chain_id,
                    tx = %hash,
                    method = call.method(),
                    from = %from,
                    reason = %revert,
                    "Transaction reverted"
                );
                (TxStatus::Reverted(revert.to_string()), Vec::new(), None)
            }
        };

        let receipt = Receipt {
            transaction_hash: hash,
            chain_id: self.chain_id,
            block_number: number,
            from,
            nonce,
            method: call.method().to_string(),
            status,
            logs,
            contract_address,
        };
        self.blocks.push(Block {
            number,
            timestamp: env.timestamp,
            transactions: vec![hash],
        });
        self.receipts.insert(hash, receipt.clone());
        Ok(receipt)
    }

    /// Execute and turn a revert into [`ChainError::Reverted`]
    pub fn transact(&mut self, from: Address, call: Call) -> Result<Receipt> {
        self.execute(from, call)?.ensure_success()
    }

    fn dispatch(
        &mut self,
        ctx: &mut ExecContext,
        nonce: u64,
        call: &Call,
    ) -> std::result::Result<Option<Address>, Revert> {
        let from = ctx.sender;
        let created = Address::create(&from, nonce);
        let state = &mut self.state;

        match call {
            Call::DeployToken {
                name,
                symbol,
                decimals,
                initial_supply,
            } => {
                state.ledger.deploy(
                    created,
                    TokenInfo {
                        name: name.clone(),
                        symbol: symbol.clone(),
                        decimals: *decimals,
                    },
                    from,
                );
                if *initial_supply > 0 {
                    state.ledger.mint(ctx, &created, &from, *initial_supply)?;
                }
                tracing::info!(chain = self.chain_id, token = %created, symbol = %symbol, "Token deployed");
                Ok(Some(created))
            }
            Call::DeployBridge {
                token,
                chain_tag,
                target_chain,
            } => {
                if !state.ledger.contains(token) {
                    return Err(non_contract(token));
                }
                state.bridges.insert(
                    created,
                    Bridge::new(created, *token, from, chain_tag.clone(), target_chain.clone()),
                );
                tracing::info!(chain = self.chain_id, bridge = %created, target = %target_chain, "Bridge deployed");
                Ok(Some(created))
            }
            Call::DeployFactory { fee_to_setter } => {
                state
                    .factories
                    .insert(created, Factory::new(created, *fee_to_setter));
                Ok(Some(created))
            }
            Call::DeployRouter { factory } => {
                if !state.factories.contains_key(factory) {
                    return Err(non_contract(factory));
                }
                state.routers.insert(created, Router::new(created, *factory));
                Ok(Some(created))
            }
            Call::DeployFarm {
                reward_token,
                reward_per_block,
                start_block,
            } => {
                if !state.ledger.contains(reward_token) {
                    return Err(non_contract(reward_token));
                }
                state.farms.insert(
                    created,
                    MasterChef::new(created, *reward_token, from, *reward_per_block, *start_block),
                );
                Ok(Some(created))
            }

            Call::Mint { token, to, amount } => {
                state.ledger.mint(ctx, token, to, *amount)?;
                Ok(None)
            }
            Call::Burn { token, amount } => {
                state.ledger.burn(ctx, token, &from, *amount)?;
                Ok(None)
            }
            Call::Transfer { token, to, amount } => {
                state.ledger.transfer(ctx, token, to, *amount)?;
                Ok(None)
            }
            Call::Approve {
                token,
                spender,
                amount,
            } => {
                state.ledger.approve(ctx, token, spender, *amount)?;
                Ok(None)
            }
            Call::TransferFrom {
                token,
                from: owner,
                to,
                amount,
            } => {
                state.ledger.transfer_from(ctx, token, owner, to, *amount)?;
                Ok(None)
            }
            Call::TransferOwnership {
                contract,
                new_owner,
            } => {
                if let Some(bridge) = state.bridges.get_mut(contract) {
                    bridge.transfer_ownership(ctx, new_owner)?;
                } else if let Some(farm) = state.farms.get_mut(contract) {
                    farm.transfer_ownership(ctx, new_owner)?;
                } else {
                    state.ledger.transfer_ownership(ctx, contract, new_owner)?;
                }
                Ok(None)
            }

            Call::LockTokens { bridge, amount } => {
                let ContractState {
                    ledger, bridges, ..
                } = state;
                let bridge = bridges.get_mut(bridge).ok_or_else(|| non_contract(bridge))?;
                bridge.lock_tokens(ledger, ctx, *amount)?;
                Ok(None)
            }
            Call::UnlockTokens {
                bridge,
                user,
                amount,
                nonce,
            } => {
                let ContractState {
                    ledger, bridges, ..
                } = state;
                let bridge = bridges.get_mut(bridge).ok_or_else(|| non_contract(bridge))?;
                bridge.unlock_tokens(ledger, ctx, user, *amount, *nonce)?;
                Ok(None)
            }
            Call::SelfUnlockTokens {
                bridge,
                amount,
                nonce,
            } => {
                let ContractState {
                    ledger, bridges, ..
                } = state;
                let bridge = bridges.get_mut(bridge).ok_or_else(|| non_contract(bridge))?;
                bridge.self_unlock_tokens(ledger, ctx, *amount, *nonce)?;
                Ok(None)
            }
            Call::PauseBridge { bridge } => {
                state.bridge_mut(bridge)?.pause(ctx)?;
                Ok(None)
            }
            Call::UnpauseBridge { bridge } => {
                state.bridge_mut(bridge)?.unpause(ctx)?;
                Ok(None)
            }
            Call::EmergencyWithdraw { bridge, amount } => {
                let ContractState {
                    ledger, bridges, ..
                } = state;
                let bridge = bridges.get_mut(bridge).ok_or_else(|| non_contract(bridge))?;
                bridge.emergency_withdraw(ledger, ctx, *amount)?;
                Ok(None)
            }

            Call::CreatePair {
                factory,
                token_a,
                token_b,
            } => {
                let ContractState {
                    ledger, factories, ..
                } = state;
                let factory = factories
                    .get_mut(factory)
                    .ok_or_else(|| non_contract(factory))?;
                factory.create_pair(ledger, ctx, *token_a, *token_b)?;
                Ok(None)
            }
            Call::AddLiquidity {
                router,
                token_a,
                token_b,
                amount_a_desired,
                amount_b_desired,
                amount_a_min,
                amount_b_min,
                to,
                deadline,
            } => {
                let router = state.router(router)?;
                let args = AddLiquidity {
                    token_a: *token_a,
                    token_b: *token_b,
                    amount_a_desired: *amount_a_desired,
                    amount_b_desired: *amount_b_desired,
                    amount_a_min: *amount_a_min,
                    amount_b_min: *amount_b_min,
                    to: *to,
                    deadline: *deadline,
                };
                let ContractState {
                    ledger, factories, ..
                } = state;
                let factory = factories
                    .get_mut(&router.factory)
                    .ok_or_else(|| non_contract(&router.factory))?;
                router.add_liquidity(ledger, factory, ctx, &args)?;
                Ok(None)
            }
            Call::RemoveLiquidity {
                router,
                token_a,
                token_b,
                liquidity,
                amount_a_min,
                amount_b_min,
                to,
                deadline,
            } => {
                let router = state.router(router)?;
                let args = RemoveLiquidity {
                    token_a: *token_a,
                    token_b: *token_b,
                    liquidity: *liquidity,
                    amount_a_min: *amount_a_min,
                    amount_b_min: *amount_b_min,
                    to: *to,
                    deadline: *deadline,
                };
                let ContractState {
                    ledger, factories, ..
                } = state;
                let factory = factories
                    .get_mut(&router.factory)
                    .ok_or_else(|| non_contract(&router.factory))?;
                router.remove_liquidity(ledger, factory, ctx, &args)?;
                Ok(None)
            }
            Call::SwapExactTokensForTokens {
                router,
                amount_in,
                amount_out_min,
                path,
                to,
                deadline,
            } => {
                let router = state.router(router)?;
                let ContractState {
                    ledger, factories, ..
                } = state;
                let factory = factories
                    .get_mut(&router.factory)
                    .ok_or_else(|| non_contract(&router.factory))?;
                router.swap_exact_tokens_for_tokens(
                    ledger,
                    factory,
                    ctx,
                    *amount_in,
                    *amount_out_min,
                    path,
                    to,
                    *deadline,
                )?;
                Ok(None)
            }
            Call::SwapTokensForExactTokens {
                router,
                amount_out,
                amount_in_max,
                path,
                to,
                deadline,
            } => {
                let router = state.router(router)?;
                let ContractState {
                    ledger, factories, ..
                } = state;
                let factory = factories
                    .get_mut(&router.factory)
                    .ok_or_else(|| non_contract(&router.factory))?;
                router.swap_tokens_for_exact_tokens(
                    ledger,
                    factory,
                    ctx,
                    *amount_out,
                    *amount_in_max,
                    path,
                    to,
                    *deadline,
                )?;
                Ok(None)
            }
            Call::Skim { pair, to } => {
                let ContractState {
                    ledger, factories, ..
                } = state;
                let pair = factories
                    .values_mut()
                    .find_map(|f| f.pair_mut(pair))
                    .ok_or_else(|| non_contract(pair))?;
                pair.skim(ledger, ctx, to)?;
                Ok(None)
            }
            Call::Sync { pair } => {
                let ContractState {
                    ledger, factories, ..
                } = state;
                let pair = factories
                    .values_mut()
                    .find_map(|f| f.pair_mut(pair))
                    .ok_or_else(|| non_contract(pair))?;
                pair.sync(ledger, ctx)?;
                Ok(None)
            }

            Call::AddPool {
                farm,
                alloc_point,
                lp_token,
            } => {
                let ContractState { ledger, farms, .. } = state;
                let farm = farms.get_mut(farm).ok_or_else(|| non_contract(farm))?;
                farm.add(ledger, ctx, *alloc_point, *lp_token)?;
                Ok(None)
            }
            Call::SetPool {
                farm,
                pid,
                alloc_point,
            } => {
                let ContractState { ledger, farms, .. } = state;
                let farm = farms.get_mut(farm).ok_or_else(|| non_contract(farm))?;
                farm.set(ledger, ctx, *pid, *alloc_point)?;
                Ok(None)
            }
            Call::Deposit { farm, pid, amount } => {
                let ContractState { ledger, farms, .. } = state;
                let farm = farms.get_mut(farm).ok_or_else(|| non_contract(farm))?;
                farm.deposit(ledger, ctx, *pid, *amount)?;
                Ok(None)
            }
            Call::Withdraw { farm, pid, amount } => {
                let ContractState { ledger, farms, .. } = state;
                let farm = farms.get_mut(farm).ok_or_else(|| non_contract(farm))?;
                farm.withdraw(ledger, ctx, *pid, *amount)?;
                Ok(None)
            }
            Call::Harvest { farm, pid } => {
                let ContractState { ledger, farms, .. } = state;
                let farm = farms.get_mut(farm).ok_or_else(|| non_contract(farm))?;
                farm.harvest(ledger, ctx, *pid)?;
                Ok(None)
            }
            Call::FarmEmergencyWithdraw { farm, pid } => {
                let ContractState { ledger, farms, .. } = state;
                let farm = farms.get_mut(farm).ok_or_else(|| non_contract(farm))?;
                farm.emergency_withdraw(ledger, ctx, *pid)?;
                Ok(None)
            }
        }
    }

    // ─── Views ──────────────────────────────────────────────────────────────

    fn require_token(&self, token: &Address) -> Result<()> {
        if self.state.ledger.contains(token) {
            Ok(())
        } else {
            Err(ChainError::contract("token", *token))
        }
    }

    fn require_bridge(&self, address: &Address) -> Result<&Bridge> {
        self.bridge(address)
            .ok_or_else(|| ChainError::contract("bridge", *address))
    }

    fn require_farm(&self, address: &Address) -> Result<&MasterChef> {
        self.farm(address)
            .ok_or_else(|| ChainError::contract("farm", *address))
    }

    fn require_router_factory(&self, router: &Address) -> Result<&Factory> {
        let router = self
            .state
            .routers
            .get(router)
            .ok_or_else(|| ChainError::contract("router", *router))?;
        self.factory(&router.factory)
            .ok_or_else(|| ChainError::contract("factory", router.factory))
    }

    /// Read-only call against the head state
    pub fn view(&self, view: &View) -> Result<ViewResult> {
        let ledger = &self.state.ledger;
        let result = match view {
            View::BalanceOf { token, account } => {
                self.require_token(token)?;
                ViewResult::Amount(ledger.balance_of(token, account))
            }
            View::Allowance {
                token,
                owner,
                spender,
            } => {
                self.require_token(token)?;
                ViewResult::Amount(ledger.allowance(token, owner, spender))
            }
            View::TotalSupply { token } => {
                self.require_token(token)?;
                ViewResult::Amount(ledger.total_supply(token))
            }
            View::TokenInfo { token } => {
                let state = ledger
                    .token(token)
                    .ok_or_else(|| ChainError::contract("token", *token))?;
                ViewResult::Token(TokenSummary {
                    address: *token,
                    name: state.info.name.clone(),
                    symbol: state.info.symbol.clone(),
                    decimals: state.info.decimals,
                    owner: state.owner,
                    total_supply: state.total_supply,
                    holders: state.holder_count(),
                })
            }
            View::Owner { contract } => {
                let owner = if let Some(bridge) = self.bridge(contract) {
                    bridge.owner
                } else if let Some(farm) = self.farm(contract) {
                    farm.owner
                } else if let Some(factory) = self.factory(contract) {
                    factory.fee_to_setter
                } else if let Some(token) = ledger.token(contract) {
                    token.owner
                } else {
                    return Err(ChainError::contract("ownable", *contract));
                };
                ViewResult::Address(owner)
            }

            View::GetBridgeBalance { bridge } => {
                ViewResult::Amount(self.require_bridge(bridge)?.bridge_balance(ledger))
            }
            View::IsNonceProcessed { bridge, nonce } => {
                ViewResult::Bool(self.require_bridge(bridge)?.is_nonce_processed(*nonce))
            }
            View::GetUserNonce { bridge, user } => {
                ViewResult::Amount(self.require_bridge(bridge)?.user_nonce(user))
            }
            View::Paused { bridge } => ViewResult::Bool(self.require_bridge(bridge)?.paused),
            View::BridgeStatus { bridge } => {
                ViewResult::Bridge(self.require_bridge(bridge)?.status(ledger))
            }

            View::GetPair {
                factory,
                token_a,
                token_b,
            } => {
                let factory = self
                    .factory(factory)
                    .ok_or_else(|| ChainError::contract("factory", *factory))?;
                ViewResult::OptionalAddress(factory.get_pair(token_a, token_b))
            }
            View::AllPairsLength { factory } => {
                let factory = self
                    .factory(factory)
                    .ok_or_else(|| ChainError::contract("factory", *factory))?;
                ViewResult::Count(factory.all_pairs_length() as u64)
            }
            View::GetReserves { pair } => {
                let pair = self
                    .state
                    .pair(pair)
                    .ok_or_else(|| ChainError::contract("pair", *pair))?;
                let (reserve0, reserve1, block_timestamp_last) = pair.get_reserves();
                ViewResult::Reserves {
                    reserve0,
                    reserve1,
                    block_timestamp_last,
                }
            }
            View::GetAmountsOut {
                router,
                amount_in,
                path,
            } => {
                let factory = self.require_router_factory(router)?;
                let amounts = amm::get_amounts_out(factory, *amount_in, path)?;
                ViewResult::Amounts(amounts.iter().map(|a| a.to_string()).collect())
            }
            View::GetAmountsIn {
                router,
                amount_out,
                path,
            } => {
                let factory = self.require_router_factory(router)?;
                let amounts = amm::get_amounts_in(factory, *amount_out, path)?;
                ViewResult::Amounts(amounts.iter().map(|a| a.to_string()).collect())
            }

            View::PendingReward { farm, pid, user } => {
                let farm = self.require_farm(farm)?;
                ViewResult::Amount(farm.pending_reward(ledger, *pid, user, self.block_number())?)
            }
            View::UserInfo { farm, pid, user } => {
                let info = self.require_farm(farm)?.user_info(*pid, user);
                ViewResult::UserInfo {
                    amount: info.amount,
                    reward_debt: info.reward_debt,
                }
            }
            View::FarmStatus { farm } => ViewResult::Farm(self.require_farm(farm)?.status(ledger)),
        };
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use baz_core::constants::ONE_TOKEN;
    use baz_core::Event;

    const GENESIS: u64 = 1_000;

    fn chain() -> Chain {
        Chain::new(11_155_111, "sepolia", "sepolia", GENESIS)
    }

    fn deploy_token(chain: &mut Chain, owner: Address, supply: u128) -> Address {
        chain
            .transact(
                owner,
                Call::DeployToken {
                    name: "Bazaar Token".into(),
                    symbol: "BAZ".into(),
                    decimals: 18,
                    initial_supply: supply,
                },
            )
            .unwrap()
            .contract_address
            .unwrap()
    }

    #[test]
    fn test_blocks_advance_per_transaction() {
        let mut chain = chain();
        let owner = Address::from_label("owner");
        assert_eq!(chain.block_number(), 0);
        let token = deploy_token(&mut chain, owner, ONE_TOKEN);
        assert_eq!(token, Address::create(&owner, 0));
        assert_eq!(chain.block_number(), 1);
        assert_eq!(chain.head().timestamp, GENESIS + BLOCK_TIME_SECS);
        assert_eq!(chain.nonce_of(&owner), 1);
        assert_eq!(chain.block(1).unwrap().transactions.len(), 1);
    }

    #[test]
    fn test_reverted_transaction_rolls_back() {
        let mut chain = chain();
        let owner = Address::from_label("owner");
        let user = Address::from_label("user");
        let token = deploy_token(&mut chain, owner, 1_000);
        let bridge = chain
            .transact(
                owner,
                Call::DeployBridge {
                    token,
                    chain_tag: "sepolia".into(),
                    target_chain: "amoy".into(),
                },
            )
            .unwrap()
            .contract_address
            .unwrap();
        chain
            .transact(owner, Call::Transfer { token, to: user, amount: 100 })
            .unwrap();
        chain
            .transact(user, Call::Approve { token, spender: bridge, amount: 50 })
            .unwrap();

        let receipt = chain
            .execute(user, Call::LockTokens { bridge, amount: 80 })
            .unwrap();
        assert!(!receipt.succeeded());
        assert_eq!(receipt.revert_reason(), Some("Insufficient allowance"));
        assert!(receipt.logs.is_empty());
        assert_eq!(chain.ledger().balance_of(&token, &user), 100);
        assert_eq!(chain.ledger().allowance(&token, &user, &bridge), 50);
        assert_eq!(chain.bridge(&bridge).unwrap().user_nonce(&user), 0);
        // The failed transaction still consumed a nonce and a block
        assert_eq!(chain.nonce_of(&user), 2);
        assert_eq!(chain.receipt(&receipt.transaction_hash), Some(&receipt));

        let err = chain
            .transact(user, Call::LockTokens { bridge, amount: 80 })
            .unwrap_err();
        assert!(matches!(err, ChainError::Reverted { .. }));
    }

    #[test]
    fn test_tx_hashes_are_unique() {
        let mut chain = chain();
        let owner = Address::from_label("owner");
        let token = deploy_token(&mut chain, owner, 1_000);
        let call = Call::Transfer {
            token,
            to: Address::from_label("a"),
            amount: 1,
        };
        let first = chain.transact(owner, call.clone()).unwrap();
        let second = chain.transact(owner, call).unwrap();
        assert_ne!(first.transaction_hash, second.transaction_hash);
    }

    #[test]
    fn test_log_filter() {
        let mut chain = chain();
        let owner = Address::from_label("owner");
        let token = deploy_token(&mut chain, owner, 1_000);
        for to in ["a", "b", "c"] {
            chain
                .transact(
                    owner,
                    Call::Transfer {
                        token,
                        to: Address::from_label(to),
                        amount: 1,
                    },
                )
                .unwrap();
        }

        let all = chain.logs(&LogFilter::default().event("Transfer"));
        assert_eq!(all.len(), 4);
        let ranged = chain.logs(&LogFilter::default().from_block(3).to_block(4));
        assert_eq!(ranged.len(), 2);
        assert!(ranged.iter().all(|l| matches!(l.event, Event::Transfer { .. })));
        assert!(chain
            .logs(&LogFilter::default().address(Address::from_label("other")))
            .is_empty());
    }

    #[test]
    fn test_views_report_unknown_contracts() {
        let chain = chain();
        let nowhere = Address::from_label("nowhere");
        let err = chain
            .view(&View::BalanceOf {
                token: nowhere,
                account: nowhere,
            })
            .unwrap_err();
        assert_eq!(err.error_code(), "unknown_contract");
        assert!(chain.view(&View::Paused { bridge: nowhere }).is_err());
    }

    #[test]
    fn test_call_to_missing_contract_reverts() {
        let mut chain = chain();
        let receipt = chain
            .execute(
                Address::from_label("user"),
                Call::LockTokens {
                    bridge: Address::from_label("nowhere"),
                    amount: 1,
                },
            )
            .unwrap();
        assert!(receipt
            .revert_reason()
            .unwrap()
            .starts_with("Address: call to non-contract"));
    }

    #[test]
    fn test_amm_through_calls() {
        let mut chain = chain();
        let owner = Address::from_label("owner");
        let baz = deploy_token(&mut chain, owner, 10 * ONE_TOKEN);
        let usd = deploy_token(&mut chain, owner, 10 * ONE_TOKEN);
        let factory = chain
            .transact(owner, Call::DeployFactory { fee_to_setter: owner })
            .unwrap()
            .contract_address
            .unwrap();
        let router = chain
            .transact(owner, Call::DeployRouter { factory })
            .unwrap()
            .contract_address
            .unwrap();
        for token in [baz, usd] {
            chain
                .transact(owner, Call::Approve { token, spender: router, amount: u128::MAX })
                .unwrap();
        }
        chain
            .transact(
                owner,
                Call::AddLiquidity {
                    router,
                    token_a: baz,
                    token_b: usd,
                    amount_a_desired: ONE_TOKEN,
                    amount_b_desired: 2 * ONE_TOKEN,
                    amount_a_min: 0,
                    amount_b_min: 0,
                    to: owner,
                    deadline: u64::MAX,
                },
            )
            .unwrap();

        let pair = match chain
            .view(&View::GetPair {
                factory,
                token_a: usd,
                token_b: baz,
            })
            .unwrap()
        {
            ViewResult::OptionalAddress(Some(pair)) => pair,
            other => panic!("unexpected {:?}", other),
        };
        assert_eq!(chain.state().contract_kind(&pair), Some("pair"));

        let quoted = chain
            .view(&View::GetAmountsOut {
                router,
                amount_in: ONE_TOKEN / 10,
                path: vec![baz, usd],
            })
            .unwrap()
            .amounts()
            .unwrap();
        let before = chain.ledger().balance_of(&usd, &owner);
        chain
            .transact(
                owner,
                Call::SwapExactTokensForTokens {
                    router,
                    amount_in: ONE_TOKEN / 10,
                    amount_out_min: quoted[1],
                    path: vec![baz, usd],
                    to: owner,
                    deadline: u64::MAX,
                },
            )
            .unwrap();
        assert_eq!(chain.ledger().balance_of(&usd, &owner), before + quoted[1]);
    }
}
