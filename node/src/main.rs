// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # linkledger Node
//!
//! Entry point for the `linkledger-node` binary. Parses CLI arguments,
//! initializes logging, and runs one of four subcommands:
//!
//! - `replay`  : append blocks from a JSON Lines file and print a summary
//! - `mint`    : print a correctly hashed block as JSON
//! - `demo`    : run a two-branch fork scenario
//! - `version` : print build version information
//!
//! Results go to stdout as JSON; logs go to stderr.

mod cli;
mod demo;
mod logging;
mod metrics;
mod replay;

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;

use linkledger::{Block, BlockHash, Ledger, LedgerConfig};

use cli::{Commands, LedgerNodeCli};
use metrics::LedgerMetrics;

fn main() -> Result<()> {
    let cli = LedgerNodeCli::parse();

    match cli.command {
        Commands::Version => {
            print_version();
            Ok(())
        }
        command => {
            logging::init_logging(logging::DEFAULT_FILTER, cli.log_format);
            match command {
                Commands::Replay(args) => run_replay(args),
                Commands::Mint(args) => run_mint(args),
                Commands::Demo(args) => run_demo(args),
                Commands::Version => Ok(()),
            }
        }
    }
}

/// Loads the ledger config from `path`, or defaults when none is given.
fn load_config(path: Option<&Path>) -> Result<LedgerConfig> {
    match path {
        Some(path) => LedgerConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path.display())),
        None => Ok(LedgerConfig::default()),
    }
}

fn run_replay(args: cli::ReplayArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    tracing::info!(
        input = %args.input.display(),
        algorithm = %config.hash_algorithm,
        "replaying blocks"
    );

    let file = File::open(&args.input)
        .with_context(|| format!("failed to open {}", args.input.display()))?;
    let metrics = args.metrics.then(LedgerMetrics::new).transpose()?;

    let (_, report) = replay::replay(BufReader::new(file), config, metrics.as_ref())?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    if let Some(metrics) = metrics {
        print!("{}", metrics.encode()?);
    }
    Ok(())
}

fn run_mint(args: cli::MintArgs) -> Result<()> {
    let timestamp = match args.timestamp {
        Some(ts) => ts,
        None => u64::try_from(chrono::Utc::now().timestamp_millis())
            .context("system clock is before the Unix epoch")?,
    };
    let previous_hash = args.previous_hash.map(BlockHash::new);
    let block = Block::mint(
        &args.algorithm,
        args.index,
        args.payload,
        timestamp,
        previous_hash,
    );
    tracing::debug!(hash = %block.hash(), algorithm = %args.algorithm, "block minted");
    println!("{}", block.to_json());
    Ok(())
}

fn run_demo(args: cli::DemoArgs) -> Result<()> {
    let mut ledger = Ledger::new();
    let metrics = args.metrics.then(LedgerMetrics::new).transpose()?;

    let steps = demo::run(&mut ledger, metrics.as_ref()).context("demo scenario was rejected")?;
    for step in &steps {
        tracing::info!(
            index = step.block.index(),
            payload = step.block.payload(),
            outcome = ?step.outcome,
            canonical_length = step.canonical_len,
            "appended"
        );
    }

    for block in ledger.canonical_chain() {
        println!("{:>3}  {}  {}", block.index(), block.hash().short(), block.payload());
    }
    let report = replay::summarize(&ledger, steps.len(), Vec::new());
    println!("{}", serde_json::to_string_pretty(&report)?);

    if let Some(metrics) = metrics {
        print!("{}", metrics.encode()?);
    }
    Ok(())
}

/// Prints version information to stdout.
fn print_version() {
    println!("linkledger-node {}", env!("CARGO_PKG_VERSION"));
    println!("ledger          {}", linkledger::config::LEDGER_VERSION);
}
