//! # CLI Interface
//!
//! Defines the command-line argument structure for `linkledger-node` using
//! `clap` derive. Supports four subcommands: `replay`, `mint`, `demo`,
//! and `version`.

use clap::{Args, Parser, Subcommand};
use linkledger::HashAlgorithm;
use std::path::PathBuf;

use crate::logging::LogFormat;

/// linkledger node tooling.
///
/// Feeds blocks into a ledger, reports which branch ended up canonical,
/// and mints correctly hashed blocks for testing producers.
#[derive(Parser, Debug)]
#[command(
    name = "linkledger-node",
    about = "Hash-linked ledger with fork resolution",
    version,
    propagate_version = true
)]
pub struct LedgerNodeCli {
    /// Log output format. Logs always go to stderr.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the node binary.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Append every block in a JSON Lines file and print a summary.
    Replay(ReplayArgs),
    /// Print a correctly hashed block as JSON.
    Mint(MintArgs),
    /// Run a two-branch fork scenario and print the resulting chain.
    Demo(DemoArgs),
    /// Print version information and exit.
    Version,
}

/// Arguments for the `replay` subcommand.
#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// JSON Lines file, one block per line. Blank lines are skipped.
    #[arg(long, short = 'i')]
    pub input: PathBuf,

    /// Ledger configuration file (JSON). Defaults apply when omitted.
    #[arg(long, short = 'c', env = "LINKLEDGER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Also print Prometheus metrics after the summary.
    #[arg(long)]
    pub metrics: bool,
}

/// Arguments for the `mint` subcommand.
#[derive(Args, Debug)]
pub struct MintArgs {
    /// Position of the block. 0 for genesis.
    #[arg(long)]
    pub index: u64,

    /// Opaque payload.
    #[arg(long, default_value = "")]
    pub payload: String,

    /// Creation time in milliseconds. Defaults to now.
    #[arg(long)]
    pub timestamp: Option<u64>,

    /// Hash of the block being extended. Omit for genesis.
    #[arg(long)]
    pub previous_hash: Option<String>,

    /// Hash algorithm: blake3 or sha256.
    #[arg(long, default_value = "blake3", value_parser = parse_algorithm)]
    pub algorithm: HashAlgorithm,
}

/// Arguments for the `demo` subcommand.
#[derive(Args, Debug)]
pub struct DemoArgs {
    /// Also print Prometheus metrics after the chain.
    #[arg(long)]
    pub metrics: bool,
}

fn parse_algorithm(raw: &str) -> Result<HashAlgorithm, String> {
    HashAlgorithm::parse(raw).ok_or_else(|| format!("unknown hash algorithm: {}", raw))
}
