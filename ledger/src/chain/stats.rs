//! Append bookkeeping: how many blocks were accepted, why others were
//! refused, and how often the canonical chain switched branches.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::RejectionKind;

/// What a successful append did to the canonical chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AppendOutcome {
    /// The block became the ledger's genesis.
    Genesis,
    /// The block extended the current canonical tip.
    Extended,
    /// The block was recorded off the canonical chain.
    Forked,
    /// The block became the new tip on a different branch. `depth` is the
    /// number of previously canonical blocks that are no longer canonical.
    Reorganized { depth: u64 },
}

/// Running counters kept by the ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerStats {
    /// Blocks accepted, genesis included.
    pub accepted: u64,
    /// Rejections by kind.
    pub rejected: BTreeMap<RejectionKind, u64>,
    /// Accepted blocks that landed off the canonical chain.
    pub forks: u64,
    /// Canonical tip switches onto another branch.
    pub reorgs: u64,
    /// Deepest reorganization seen so far.
    pub max_reorg_depth: u64,
}

impl LedgerStats {
    pub(crate) fn record_accepted(&mut self, outcome: AppendOutcome) {
        self.accepted += 1;
        match outcome {
            AppendOutcome::Forked => self.forks += 1,
            AppendOutcome::Reorganized { depth } => {
                self.reorgs += 1;
                self.max_reorg_depth = self.max_reorg_depth.max(depth);
            }
            AppendOutcome::Genesis | AppendOutcome::Extended => {}
        }
    }

    pub(crate) fn record_rejected(&mut self, kind: RejectionKind) {
        *self.rejected.entry(kind).or_insert(0) += 1;
    }

    /// Total rejections across all kinds.
    pub fn total_rejected(&self) -> u64 {
        self.rejected.values().sum()
    }

    /// Rejections of one kind.
    pub fn rejected_of(&self, kind: RejectionKind) -> u64 {
        self.rejected.get(&kind).copied().unwrap_or(0)
    }
}
