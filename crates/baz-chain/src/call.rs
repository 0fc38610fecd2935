//! Transaction and query vocabulary
//!
//! `Call` is everything a signed transaction can do on the devnet; `View` is
//! everything a read-only `eth_call` can ask. Both serialize as
//! `{"methodName": {..args}}` with amounts as decimal strings.

use baz_core::{amount_str, Address, Amount, BlockNumber};
use serde::{Deserialize, Serialize};

fn default_decimals() -> u8 {
    baz_core::constants::DEFAULT_DECIMALS
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Call {
    // ─── Deployments ────────────────────────────────────────────────────────
    DeployToken {
        name: String,
        symbol: String,
        #[serde(default = "default_decimals")]
        decimals: u8,
        /// Minted to the deployer
        #[serde(with = "amount_str")]
        initial_supply: Amount,
    },
    DeployBridge {
        token: Address,
        chain_tag: String,
        target_chain: String,
    },
    DeployFactory {
        fee_to_setter: Address,
    },
    DeployRouter {
        factory: Address,
    },
    DeployFarm {
        reward_token: Address,
        #[serde(with = "amount_str")]
        reward_per_block: Amount,
        start_block: BlockNumber,
    },

    // ─── ERC20 ──────────────────────────────────────────────────────────────
    Mint {
        token: Address,
        to: Address,
        #[serde(with = "amount_str")]
        amount: Amount,
    },
    Burn {
        token: Address,
        #[serde(with = "amount_str")]
        amount: Amount,
    },
    Transfer {
        token: Address,
        to: Address,
        #[serde(with = "amount_str")]
        amount: Amount,
    },
    Approve {
        token: Address,
        spender: Address,
        #[serde(with = "amount_str")]
        amount: Amount,
    },
    TransferFrom {
        token: Address,
        from: Address,
        to: Address,
        #[serde(with = "amount_str")]
        amount: Amount,
    },
    /// Ownable `transferOwnership` on a token, bridge or farm
    TransferOwnership {
        contract: Address,
        new_owner: Address,
    },

    // ─── Bridge ─────────────────────────────────────────────────────────────
    LockTokens {
        bridge: Address,
        #[serde(with = "amount_str")]
        amount: Amount,
    },
    UnlockTokens {
        bridge: Address,
        user: Address,
        #[serde(with = "amount_str")]
        amount: Amount,
        #[serde(with = "amount_str")]
        nonce: u128,
    },
    SelfUnlockTokens {
        bridge: Address,
        #[serde(with = "amount_str")]
        amount: Amount,
        #[serde(with = "amount_str")]
        nonce: u128,
    },
    PauseBridge {
        bridge: Address,
    },
    UnpauseBridge {
        bridge: Address,
    },
    EmergencyWithdraw {
        bridge: Address,
        #[serde(with = "amount_str")]
        amount: Amount,
    },

    // ─── AMM ────────────────────────────────────────────────────────────────
    CreatePair {
        factory: Address,
        token_a: Address,
        token_b: Address,
    },
    AddLiquidity {
        router: Address,
        token_a: Address,
        token_b: Address,
        #[serde(with = "amount_str")]
        amount_a_desired: Amount,
        #[serde(with = "amount_str")]
        amount_b_desired: Amount,
        #[serde(with = "amount_str")]
        amount_a_min: Amount,
        #[serde(with = "amount_str")]
        amount_b_min: Amount,
        to: Address,
        deadline: u64,
    },
    RemoveLiquidity {
        router: Address,
        token_a: Address,
        token_b: Address,
        #[serde(with = "amount_str")]
        liquidity: Amount,
        #[serde(with = "amount_str")]
        amount_a_min: Amount,
        #[serde(with = "amount_str")]
        amount_b_min: Amount,
        to: Address,
        deadline: u64,
    },
    SwapExactTokensForTokens {
        router: Address,
        #[serde(with = "amount_str")]
        amount_in: Amount,
        #[serde(with = "amount_str")]
        amount_out_min: Amount,
        path: Vec<Address>,
        to: Address,
        deadline: u64,
    },
    SwapTokensForExactTokens {
        router: Address,
        #[serde(with = "amount_str")]
        amount_out: Amount,
        #[serde(with = "amount_str")]
        amount_in_max: Amount,
        path: Vec<Address>,
        to: Address,
        deadline: u64,
    },
    Skim {
        pair: Address,
        to: Address,
    },
    Sync {
        pair: Address,
    },

    // ─── Farm ───────────────────────────────────────────────────────────────
    AddPool {
        farm: Address,
        alloc_point: u64,
        lp_token: Address,
    },
    SetPool {
        farm: Address,
        pid: u64,
        alloc_point: u64,
    },
    Deposit {
        farm: Address,
        pid: u64,
        #[serde(with = "amount_str")]
        amount: Amount,
    },
    Withdraw {
        farm: Address,
        pid: u64,
        #[serde(with = "amount_str")]
        amount: Amount,
    },
    Harvest {
        farm: Address,
        pid: u64,
    },
    FarmEmergencyWithdraw {
        farm: Address,
        pid: u64,
    },
}

impl Call {
    /// ABI-style method name
    pub fn method(&self) -> &'static str {
        match self {
            Self::DeployToken { .. } => "deployToken",
            Self::DeployBridge { .. } => "deployBridge",
            Self::DeployFactory { .. } => "deployFactory",
            Self::DeployRouter { .. } => "deployRouter",
            Self::DeployFarm { .. } => "deployFarm",
            Self::Mint { .. } => "mint",
            Self::Burn { .. } => "burn",
            Self::Transfer { .. } => "transfer",
            Self::Approve { .. } => "approve",
            Self::TransferFrom { .. } => "transferFrom",
            Self::TransferOwnership { .. } => "transferOwnership",
            Self::LockTokens { .. } => "lockTokens",
            Self::UnlockTokens { .. } => "unlockTokens",
            Self::SelfUnlockTokens { .. } => "selfUnlockTokens",
            Self::PauseBridge { .. } => "pauseBridge",
            Self::UnpauseBridge { .. } => "unpauseBridge",
            Self::EmergencyWithdraw { .. } => "emergencyWithdraw",
            Self::CreatePair { .. } => "createPair",
            Self::AddLiquidity { .. } => "addLiquidity",
            Self::RemoveLiquidity { .. } => "removeLiquidity",
            Self::SwapExactTokensForTokens { .. } => "swapExactTokensForTokens",
            Self::SwapTokensForExactTokens { .. } => "swapTokensForExactTokens",
            Self::Skim { .. } => "skim",
            Self::Sync { .. } => "sync",
            Self::AddPool { .. } => "add",
            Self::SetPool { .. } => "set",
            Self::Deposit { .. } => "deposit",
            Self::Withdraw { .. } => "withdraw",
            Self::Harvest { .. } => "harvest",
            Self::FarmEmergencyWithdraw { .. } => "emergencyWithdraw",
        }
    }

    pub fn is_deployment(&self) -> bool {
        matches!(
            self,
            Self::DeployToken { .. }
                | Self::DeployBridge { .. }
                | Self::DeployFactory { .. }
                | Self::DeployRouter { .. }
                | Self::DeployFarm { .. }
        )
    }
}

/// Read-only queries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum View {
    BalanceOf {
        token: Address,
        account: Address,
    },
    Allowance {
        token: Address,
        owner: Address,
        spender: Address,
    },
    TotalSupply {
        token: Address,
    },
    TokenInfo {
        token: Address,
    },
    Owner {
        contract: Address,
    },

    GetBridgeBalance {
        bridge: Address,
    },
    IsNonceProcessed {
        bridge: Address,
        #[serde(with = "amount_str")]
        nonce: u128,
    },
    GetUserNonce {
        bridge: Address,
        user: Address,
    },
    Paused {
        bridge: Address,
    },
    BridgeStatus {
        bridge: Address,
    },

    GetPair {
        factory: Address,
        token_a: Address,
        token_b: Address,
    },
    AllPairsLength {
        factory: Address,
    },
    GetReserves {
        pair: Address,
    },
    GetAmountsOut {
        router: Address,
        #[serde(with = "amount_str")]
        amount_in: Amount,
        path: Vec<Address>,
    },
    GetAmountsIn {
        router: Address,
        #[serde(with = "amount_str")]
        amount_out: Amount,
        path: Vec<Address>,
    },

    PendingReward {
        farm: Address,
        pid: u64,
        user: Address,
    },
    UserInfo {
        farm: Address,
        pid: u64,
        user: Address,
    },
    FarmStatus {
        farm: Address,
    },
}

/// Token metadata returned by [`View::TokenInfo`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenSummary {
    pub address: Address,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub owner: Address,
    #[serde(with = "amount_str")]
    pub total_supply: Amount,
    pub holders: usize,
}

/// Typed answer to a [`View`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ViewResult {
    Amount(#[serde(with = "amount_str")] Amount),
    Bool(bool),
    Address(Address),
    OptionalAddress(Option<Address>),
    Count(u64),
    Amounts(Vec<String>),
    Reserves {
        #[serde(with = "amount_str")]
        reserve0: Amount,
        #[serde(with = "amount_str")]
        reserve1: Amount,
        block_timestamp_last: u64,
    },
    Token(TokenSummary),
    Bridge(bridge::BridgeStatus),
    UserInfo {
        #[serde(with = "amount_str")]
        amount: Amount,
        #[serde(with = "amount_str")]
        reward_debt: Amount,
    },
    Farm(farm::FarmStatus),
}

impl ViewResult {
    pub fn amount(&self) -> Option<Amount> {
        match self {
            Self::Amount(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn amounts(&self) -> Option<Vec<Amount>> {
        match self {
            Self::Amounts(v) => v.iter().map(|s| s.parse().ok()).collect(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use baz_core::constants::ONE_TOKEN;

    #[test]
    fn test_call_json_shape() {
        let call = Call::LockTokens {
            bridge: Address::from_label("bridge"),
            amount: 100 * ONE_TOKEN,
        };
        let json = serde_json::to_value(&call).unwrap();
        assert_eq!(json["lockTokens"]["amount"], "100000000000000000000");
        let back: Call = serde_json::from_value(json).unwrap();
        assert_eq!(back, call);
        assert_eq!(call.method(), "lockTokens");
    }

    #[test]
    fn test_call_accepts_numeric_amounts() {
        let bridge = Address::from_label("bridge");
        let json = format!(
            r#"{{"selfUnlockTokens":{{"bridge":"{}","amount":100,"nonce":1}}}}"#,
            bridge
        );
        let call: Call = serde_json::from_str(&json).unwrap();
        assert_eq!(
            call,
            Call::SelfUnlockTokens {
                bridge,
                amount: 100,
                nonce: 1
            }
        );
    }

    #[test]
    fn test_deploy_token_default_decimals() {
        let call: Call =
            serde_json::from_str(r#"{"deployToken":{"name":"BAZ","symbol":"BAZ","initialSupply":"0"}}"#)
                .unwrap();
        assert!(call.is_deployment());
        assert!(matches!(call, Call::DeployToken { decimals: 18, .. }));
    }

    #[test]
    fn test_view_result_accessors() {
        assert_eq!(ViewResult::Amount(5).amount(), Some(5));
        assert_eq!(ViewResult::Bool(true).as_bool(), Some(true));
        assert_eq!(
            ViewResult::Amounts(vec!["1".into(), "2".into()]).amounts(),
            Some(vec![1, 2])
        );
        assert_eq!(ViewResult::Count(1).amount(), None);
    }
}
