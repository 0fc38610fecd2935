//! Command-line interface

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use bridge_client::UnlockMode;

#[derive(Debug, Parser)]
#[command(name = "baz")]
#[command(about = "Operator tooling for the BAZ bridge, AMM and farm", long_about = None)]
#[command(version)]
pub struct Cli {
    /// TOML config file (defaults apply when omitted)
    #[arg(short, long, env = "BAZ_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Deploy token, bridge, AMM and farm on each network
    Deploy {
        /// Networks to deploy on (all configured networks when omitted)
        #[arg(short, long = "network")]
        networks: Vec<String>,

        /// Redeploy even where a contract set is already recorded
        #[arg(long)]
        force: bool,
    },

    /// Send BAZ from the operator to an account, a bridge or the farm
    Fund(FundArgs),

    /// Check recorded deployments against on-chain state and config
    Verify {
        #[arg(short, long = "network")]
        networks: Vec<String>,
    },

    /// Run a full approve/lock/switch/unlock transfer and a replay check
    BridgeTest(BridgeTestArgs),

    /// Show chain heads, bridge and farm state
    Status {
        #[arg(short, long = "network")]
        networks: Vec<String>,
    },

    /// List locks not yet unlocked on the destination, optionally relaying them
    Recover(RecoverArgs),

    /// Serve the HTTP API over the devnet
    Serve {
        /// Port (config `api_port` / BAZ_API_PORT when omitted)
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FundTarget {
    /// The network's bridge contract
    Bridge,
    /// The network's farm (reward pool)
    Farm,
}

#[derive(Debug, Args)]
pub struct FundArgs {
    #[arg(short, long)]
    pub network: String,

    /// Amount in whole tokens ("1000", "0.5")
    #[arg(short, long)]
    pub amount: String,

    /// Recipient account (0x address or devnet label)
    #[arg(long, conflicts_with = "target", required_unless_present = "target")]
    pub to: Option<String>,

    /// Fund one of the deployed contracts instead of an account
    #[arg(long, value_enum)]
    pub target: Option<FundTarget>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum UnlockArg {
    /// User calls selfUnlockTokens
    #[default]
    SelfUnlock,
    /// Operator calls unlockTokens for the user
    Relay,
}

impl From<UnlockArg> for UnlockMode {
    fn from(arg: UnlockArg) -> Self {
        match arg {
            UnlockArg::SelfUnlock => UnlockMode::SelfUnlock,
            UnlockArg::Relay => UnlockMode::OwnerRelay,
        }
    }
}

#[derive(Debug, Args)]
pub struct BridgeTestArgs {
    /// Source network
    #[arg(long, default_value = "sepolia")]
    pub from: String,

    /// Destination network (the source's counterpart when omitted)
    #[arg(long)]
    pub to: Option<String>,

    /// Test account (0x address or devnet label)
    #[arg(long, default_value = "bridge-tester")]
    pub user: String,

    /// Whole tokens given to the test account before the transfer
    #[arg(long, default_value = "1000")]
    pub seed: String,

    /// Whole tokens to bridge
    #[arg(long, default_value = "100")]
    pub amount: String,

    #[arg(long, value_enum, default_value_t = UnlockArg::SelfUnlock)]
    pub unlock: UnlockArg,
}

#[derive(Debug, Args)]
pub struct RecoverArgs {
    /// Network the tokens were locked on
    #[arg(long)]
    pub from: String,

    /// Destination network (the source's counterpart when omitted)
    #[arg(long)]
    pub to: Option<String>,

    /// Only this user's locks
    #[arg(long)]
    pub user: Option<String>,

    /// Unlock every pending lock as the bridge owner
    #[arg(long)]
    pub relay: bool,
}
