//! `baz fund`

use std::fmt;

use anyhow::{Context as _, Result};
use baz_chain::Call;
use baz_core::{amount_str, parse_units, Address, Amount, TxHash};
use serde::Serialize;

use crate::cli::{FundArgs, FundTarget};
use crate::commands::tokens;
use crate::context::{parse_account, Context};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FundReport {
    pub network: String,
    pub recipient: Address,
    #[serde(with = "amount_str")]
    pub amount: Amount,
    #[serde(with = "amount_str")]
    pub balance_after: Amount,
    pub transaction_hash: TxHash,
    #[serde(skip)]
    decimals: u8,
    #[serde(skip)]
    symbol: String,
}

pub fn run(ctx: &mut Context, args: &FundArgs) -> Result<FundReport> {
    let network = ctx.config.network(&args.network)?.clone();
    let deployment = ctx.deployment(&network)?;
    let decimals = ctx.config.token.decimals;
    let amount = parse_units(&args.amount, decimals)
        .with_context(|| format!("Invalid amount {}", args.amount))?;
    let recipient = match (args.target, args.to.as_deref()) {
        (Some(FundTarget::Bridge), _) => deployment.bridge,
        (Some(FundTarget::Farm), _) => deployment.farm,
        (None, Some(to)) => parse_account(to)?,
        (None, None) => anyhow::bail!("Pass --to or --target"),
    };

    let operator = ctx.config.operator;
    let chain = ctx.chain_mut(&network)?;
    let receipt = chain
        .transact(
            operator,
            Call::Transfer {
                token: deployment.token,
                to: recipient,
                amount,
            },
        )
        .with_context(|| format!("Funding {} on {} failed", recipient, network.name))?;
    let balance_after = chain.ledger().balance_of(&deployment.token, &recipient);
    tracing::info!(network = %network.name, to = %recipient, amount = %amount, "Funded");

    Ok(FundReport {
        network: network.name,
        recipient,
        amount,
        balance_after,
        transaction_hash: receipt.transaction_hash,
        decimals,
        symbol: ctx.config.token.symbol.clone(),
    })
}

impl fmt::Display for FundReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Sent {} to {} on {} ({})",
            tokens(self.amount, self.decimals, &self.symbol),
            self.recipient,
            self.network,
            self.transaction_hash
        )?;
        writeln!(
            f,
            "Balance now {}",
            tokens(self.balance_after, self.decimals, &self.symbol)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::deploy;
    use crate::context::temp_context;
    use baz_core::constants::ONE_TOKEN;

    fn args(to: Option<&str>, target: Option<FundTarget>, amount: &str) -> FundArgs {
        FundArgs {
            network: "amoy".to_string(),
            amount: amount.to_string(),
            to: to.map(str::to_string),
            target,
        }
    }

    #[test]
    fn test_fund_bridge_and_account() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = temp_context(dir.path());
        deploy::run(&mut ctx, &[], false).unwrap();

        let report = run(&mut ctx, &args(None, Some(FundTarget::Bridge), "2500")).unwrap();
        let amoy = ctx.config.network("amoy").unwrap().clone();
        assert_eq!(report.recipient, ctx.deployment(&amoy).unwrap().bridge);
        assert_eq!(report.balance_after, 2_500 * ONE_TOKEN);

        let report = run(&mut ctx, &args(Some("alice"), None, "0.5")).unwrap();
        assert_eq!(report.recipient, Address::from_label("alice"));
        assert_eq!(report.amount, ONE_TOKEN / 2);
        assert!(report.to_string().contains("0.5 BAZ"));
    }

    #[test]
    fn test_fund_errors() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = temp_context(dir.path());
        assert!(run(&mut ctx, &args(Some("alice"), None, "1")).is_err());

        deploy::run(&mut ctx, &[], false).unwrap();
        assert!(run(&mut ctx, &args(Some("alice"), None, "1.2.3")).is_err());
        // More than the operator holds
        let err = run(&mut ctx, &args(Some("alice"), None, "2000000")).unwrap_err();
        assert!(format!("{:#}", err).contains("transfer amount exceeds balance"));
    }
}
