use std::path::PathBuf;

use alloy::primitives::Address;
use clap::{Args, Parser, Subcommand};

/// Inscription tools for Cronos
#[derive(Parser, Debug)]
#[command(name = "inscribe", author, version, about, long_about = None)]
pub struct Cli {
    /// Write Prometheus metrics to this file when the command ends
    #[arg(long, global = true)]
    pub metrics_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Mint inscriptions account by account, stopping at the first broadcast error
    Mint(MintArgs),
    /// Mint inscriptions from every account concurrently
    AsyncMint(MintArgs),
    /// Transfer each account's tick balance to a collector address
    Collect(CollectArgs),
    /// Show tick balances over a range of accounts
    Balance(BalanceArgs),
    /// List ticks with holders, minting progress and deploy time
    Ticks(TicksArgs),
}

#[derive(Args, Debug, Clone)]
pub struct AccountRange {
    /// BIP-39 mnemonic the accounts are derived from
    #[arg(short, long, env = "INSCRIBE_MNEMONIC", hide_env_values = true)]
    pub mnemonic: String,

    /// Start index of bip-44 sequence addresses
    #[arg(short, long, default_value_t = 0)]
    pub start_index: u32,

    /// End index of bip-44 sequence addresses (inclusive)
    #[arg(short, long, default_value_t = 0)]
    pub end_index: u32,
}

#[derive(Args, Debug, Clone)]
pub struct MintArgs {
    #[command(flatten)]
    pub range: AccountRange,

    /// Ledger node RPC URL
    #[arg(short, long)]
    pub rpc: String,

    /// Inscription payload as hex
    #[arg(long, conflicts_with = "text_content")]
    pub hex_content: Option<String>,

    /// Inscription payload as text
    #[arg(long)]
    pub text_content: Option<String>,

    /// How many inscriptions each address mints
    #[arg(
        short,
        long,
        default_value_t = 10,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub per_address_minted: u32,
}

#[derive(Args, Debug, Clone)]
pub struct CollectArgs {
    #[command(flatten)]
    pub range: AccountRange,

    /// Ledger node RPC URL
    #[arg(short, long)]
    pub rpc: String,

    /// Tick to collect
    #[arg(short, long)]
    pub tick: String,

    /// Address receiving every balance
    #[arg(short, long)]
    pub collector: Address,
}

#[derive(Args, Debug, Clone)]
pub struct BalanceArgs {
    #[command(flatten)]
    pub range: AccountRange,

    /// Only show this tick
    #[arg(short, long)]
    pub tick: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct TicksArgs {
    /// Sort by deployed time (default)
    #[arg(long)]
    pub sort_by_deployed_time: bool,

    /// Sort by minting progress
    #[arg(long)]
    pub sort_by_minting_progress: bool,

    /// Sort by holders
    #[arg(long)]
    pub sort_by_holders: bool,
}
