//! # Ledger Errors
//!
//! Every rejected append returns a [`LedgerError`]. The variants line up with
//! the validation pipeline in [`crate::chain::Ledger::append`], in the order
//! the checks run, so the variant alone tells a caller which rule failed.
//!
//! None of these represent a corrupted ledger. Append is all-or-nothing: a
//! rejected block leaves every index, the genesis pointer and the canonical
//! chain exactly as they were.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::chain::BlockHash;

/// Convenience alias used across the crate.
pub type LedgerResult<T> = std::result::Result<T, LedgerError>;

/// Reasons a block can be refused by the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// A field is missing or mistyped, or the payload is over the
    /// configured limit.
    #[error("malformed block: {reason}")]
    MalformedBlock {
        /// Which structural rule was broken.
        reason: String,
    },

    /// A genesis-shaped block was submitted after genesis was already set.
    #[error("duplicate genesis: ledger already rooted at {existing}, rejected {candidate}")]
    DuplicateGenesis {
        /// Hash of the genesis block the ledger already holds.
        existing: BlockHash,
        /// Hash of the rejected candidate.
        candidate: BlockHash,
    },

    /// The first block submitted to an empty ledger is not a valid genesis.
    #[error("invalid genesis block {hash}: {reason}")]
    InvalidGenesis {
        /// Declared hash of the rejected block.
        hash: BlockHash,
        /// Why it cannot root the ledger.
        reason: String,
    },

    /// The candidate's previous hash does not name any accepted block.
    #[error("missing predecessor for block {hash} at index {index}: {}", display_previous(.previous_hash))]
    MissingPredecessor {
        /// Declared hash of the candidate.
        hash: BlockHash,
        /// Index the candidate claims.
        index: u64,
        /// The unresolved predecessor reference.
        previous_hash: Option<BlockHash>,
    },

    /// The candidate does not point at the given predecessor, or its index is
    /// not exactly one past it.
    #[error(
        "invalid linkage for block {hash}: index {index} does not extend predecessor {predecessor} at index {predecessor_index}"
    )]
    InvalidLinkage {
        /// Declared hash of the candidate.
        hash: BlockHash,
        /// Index the candidate claims.
        index: u64,
        /// Hash of the predecessor it was checked against.
        predecessor: BlockHash,
        /// Index of that predecessor.
        predecessor_index: u64,
    },

    /// The declared hash does not match the recomputed content hash.
    #[error("hash mismatch at index {index}: declared {declared}, computed {computed}")]
    HashMismatch {
        /// Index the candidate claims.
        index: u64,
        /// Hash carried by the block.
        declared: BlockHash,
        /// Hash recomputed from the block's fields.
        computed: BlockHash,
    },

    /// The exact same block has already been accepted.
    #[error("block {hash} already accepted")]
    DuplicateBlock {
        /// Hash of the resubmitted block.
        hash: BlockHash,
    },
}

fn display_previous(previous: &Option<BlockHash>) -> String {
    match previous {
        Some(hash) => hash.to_string(),
        None => "<none>".to_string(),
    }
}

impl LedgerError {
    /// Shorthand for a [`LedgerError::MalformedBlock`].
    pub fn malformed(reason: impl Into<String>) -> Self {
        LedgerError::MalformedBlock {
            reason: reason.into(),
        }
    }

    /// Stable, payload-free classification of this error.
    pub fn kind(&self) -> RejectionKind {
        match self {
            LedgerError::MalformedBlock { .. } => RejectionKind::MalformedBlock,
            LedgerError::DuplicateGenesis { .. } => RejectionKind::DuplicateGenesis,
            LedgerError::InvalidGenesis { .. } => RejectionKind::InvalidGenesis,
            LedgerError::MissingPredecessor { .. } => RejectionKind::MissingPredecessor,
            LedgerError::InvalidLinkage { .. } => RejectionKind::InvalidLinkage,
            LedgerError::HashMismatch { .. } => RejectionKind::HashMismatch,
            LedgerError::DuplicateBlock { .. } => RejectionKind::DuplicateBlock,
        }
    }
}

/// Payload-free tag for a [`LedgerError`], used as a statistics key and as
/// a metrics label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionKind {
    MalformedBlock,
    DuplicateGenesis,
    InvalidGenesis,
    MissingPredecessor,
    InvalidLinkage,
    HashMismatch,
    DuplicateBlock,
}

impl RejectionKind {
    /// Every kind, in validation order.
    pub const ALL: [RejectionKind; 7] = [
        RejectionKind::MalformedBlock,
        RejectionKind::DuplicateGenesis,
        RejectionKind::InvalidGenesis,
        RejectionKind::MissingPredecessor,
        RejectionKind::InvalidLinkage,
        RejectionKind::HashMismatch,
        RejectionKind::DuplicateBlock,
    ];

    /// Snake-case label, e.g. `"hash_mismatch"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectionKind::MalformedBlock => "malformed_block",
            RejectionKind::DuplicateGenesis => "duplicate_genesis",
            RejectionKind::InvalidGenesis => "invalid_genesis",
            RejectionKind::MissingPredecessor => "missing_predecessor",
            RejectionKind::InvalidLinkage => "invalid_linkage",
            RejectionKind::HashMismatch => "hash_mismatch",
            RejectionKind::DuplicateBlock => "duplicate_block",
        }
    }
}

impl std::fmt::Display for RejectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised while loading a [`crate::config::LedgerConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// The config document is not valid JSON for [`crate::config::LedgerConfig`].
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// The document parsed but holds an unusable value.
    #[error("invalid config: {0}")]
    Invalid(String),
}
