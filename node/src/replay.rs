//! # Block Replay
//!
//! Feeds a stream of JSON-encoded blocks, one per line, into a fresh ledger
//! and reports what happened. Undecodable lines count as malformed blocks;
//! they are reported like any other rejection and never abort the run.

use std::io::BufRead;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, warn};

use linkledger::{
    AppendOutcome, Block, BlockHash, Ledger, LedgerConfig, LedgerError, LedgerStats,
    RejectionKind,
};

use crate::metrics::LedgerMetrics;

/// One refused line.
#[derive(Debug, Clone, Serialize)]
pub struct Rejection {
    /// 1-based line number in the input.
    pub line: usize,
    pub kind: RejectionKind,
    pub reason: String,
}

/// Summary printed by `replay` and `demo`.
#[derive(Debug, Serialize)]
pub struct ReplayReport {
    /// Non-blank lines processed.
    pub blocks_read: usize,
    pub tip: Option<BlockHash>,
    pub height: Option<u64>,
    /// Tip first, genesis last.
    pub canonical_chain: Vec<BlockHash>,
    pub fork_indices: Vec<u64>,
    /// Result of the whole-ledger audit against the accepted genesis.
    pub valid: bool,
    pub rejections: Vec<Rejection>,
    pub stats: LedgerStats,
}

/// Replay every line of `reader` into a new ledger built from `config`.
pub fn replay<R: BufRead>(
    reader: R,
    config: LedgerConfig,
    metrics: Option<&LedgerMetrics>,
) -> Result<(Ledger, ReplayReport)> {
    let mut ledger = Ledger::with_config(config);
    let mut rejections = Vec::new();
    let mut blocks_read = 0;

    for (offset, line) in reader.lines().enumerate() {
        let line_no = offset + 1;
        let line = line.with_context(|| format!("failed to read line {}", line_no))?;
        if line.trim().is_empty() {
            continue;
        }
        blocks_read += 1;

        let result = Block::from_json(&line).and_then(|block| ledger.append_with_outcome(block));
        if let Some(metrics) = metrics {
            metrics.observe(&result);
            metrics.set_canonical_length(ledger.canonical_len());
        }

        match result {
            Ok(outcome) => log_outcome(line_no, outcome, &ledger),
            Err(err) => {
                warn!(line = line_no, kind = %err.kind(), "block rejected: {}", err);
                rejections.push(rejection(line_no, &err));
            }
        }
    }

    let report = summarize(&ledger, blocks_read, rejections);
    info!(
        blocks_read = report.blocks_read,
        accepted = report.stats.accepted,
        rejected = report.rejections.len(),
        canonical_length = report.canonical_chain.len(),
        "replay finished"
    );
    Ok((ledger, report))
}

fn log_outcome(line: usize, outcome: AppendOutcome, ledger: &Ledger) {
    match outcome {
        AppendOutcome::Reorganized { depth } => {
            info!(line, depth, canonical_length = ledger.canonical_len(), "reorganized")
        }
        other => info!(line, outcome = ?other, "block accepted"),
    }
}

fn rejection(line: usize, err: &LedgerError) -> Rejection {
    Rejection {
        line,
        kind: err.kind(),
        reason: err.to_string(),
    }
}

/// Build the report for an already populated ledger.
pub fn summarize(ledger: &Ledger, blocks_read: usize, rejections: Vec<Rejection>) -> ReplayReport {
    let valid = ledger
        .genesis()
        .map(|genesis| ledger.is_valid_chain(genesis))
        .unwrap_or(false);

    ReplayReport {
        blocks_read,
        tip: ledger.tip().map(|b| b.hash().clone()),
        height: ledger.height(),
        canonical_chain: ledger.canonical_hashes().to_vec(),
        fork_indices: ledger.fork_indices(),
        valid,
        rejections,
        stats: ledger.stats().clone(),
    }
}
