//! Pair factory
//!
//! Pairs live inside the factory, keyed by their deterministic address.

use std::collections::BTreeMap;

use baz_core::{keccak256, Address, Event, ExecContext, Revert};
use serde::{Deserialize, Serialize};
use token::Ledger;

use crate::constants::reasons;
use crate::pair::{sort_tokens, Pair};
use crate::state::PairInfo;

/// CREATE2-style pair address: last 20 bytes of keccak(factory ‖ token0 ‖ token1)
pub fn pair_address(factory: &Address, token0: &Address, token1: &Address) -> Address {
    let mut buf = Vec::with_capacity(60);
    buf.extend_from_slice(&factory.0);
    buf.extend_from_slice(&token0.0);
    buf.extend_from_slice(&token1.0);
    let hash = keccak256(&buf);
    let mut out = [0u8; 20];
    out.copy_from_slice(&hash[12..]);
    Address(out)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Factory {
    pub address: Address,
    pub fee_to_setter: Address,
    pairs: BTreeMap<Address, Pair>,
    all_pairs: Vec<Address>,
}

impl Factory {
    pub fn new(address: Address, fee_to_setter: Address) -> Self {
        Self {
            address,
            fee_to_setter,
            pairs: BTreeMap::new(),
            all_pairs: Vec::new(),
        }
    }

    pub fn create_pair(
        &mut self,
        ledger: &mut Ledger,
        ctx: &mut ExecContext,
        token_a: Address,
        token_b: Address,
    ) -> Result<Address, Revert> {
        let (token0, token1) = sort_tokens(token_a, token_b)?;
        let address = pair_address(&self.address, &token0, &token1);
        if self.pairs.contains_key(&address) {
            return Err(Revert::reason(reasons::PAIR_EXISTS));
        }

        let pair = Pair::deploy(ledger, address, self.address, token0, token1);
        self.pairs.insert(address, pair);
        self.all_pairs.push(address);
        ctx.emit(
            self.address,
            Event::PairCreated {
                token0,
                token1,
                pair: address,
                index: self.all_pairs.len() as u64,
            },
        );
        tracing::info!(pair = %address, token0 = %token0, token1 = %token1, "Pair created");
        Ok(address)
    }

    /// `getPair(tokenA, tokenB)`; order of arguments does not matter
    pub fn get_pair(&self, token_a: &Address, token_b: &Address) -> Option<Address> {
        let (token0, token1) = sort_tokens(*token_a, *token_b).ok()?;
        let address = pair_address(&self.address, &token0, &token1);
        self.pairs.contains_key(&address).then_some(address)
    }

    pub fn all_pairs(&self, index: usize) -> Option<Address> {
        self.all_pairs.get(index).copied()
    }

    pub fn all_pairs_length(&self) -> usize {
        self.all_pairs.len()
    }

    pub fn pair(&self, address: &Address) -> Option<&Pair> {
        self.pairs.get(address)
    }

    pub fn pair_mut(&mut self, address: &Address) -> Option<&mut Pair> {
        self.pairs.get_mut(address)
    }

    pub fn pairs(&self) -> impl Iterator<Item = &Pair> {
        self.all_pairs.iter().filter_map(|a| self.pairs.get(a))
    }

    pub fn pair_infos(&self, ledger: &Ledger) -> Vec<PairInfo> {
        self.pairs().map(|p| p.info(ledger)).collect()
    }

    /// Ordered reserves for (token_a, token_b) as the router library sees them
    pub fn get_reserves(&self, token_a: &Address, token_b: &Address) -> Result<(u128, u128), Revert> {
        let address = self
            .get_pair(token_a, token_b)
            .ok_or_else(|| Revert::reason(reasons::PAIR_NOT_FOUND))?;
        let pair = self
            .pairs
            .get(&address)
            .ok_or_else(|| Revert::reason(reasons::PAIR_NOT_FOUND))?;
        if token_a == &pair.token0 {
            Ok((pair.reserve0, pair.reserve1))
        } else {
            Ok((pair.reserve1, pair.reserve0))
        }
    }
}
