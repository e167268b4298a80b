//! Thread-safe handle around a [`Ledger`].
//!
//! Appends take the write lock for the whole validate-then-insert sequence,
//! so concurrent appends are linearized and each one sees the effects of the
//! ones before it. Readers share the read lock. Lock guards never escape:
//! every accessor returns owned data.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::crypto::{BlockHash, BlockHasher, HashAlgorithm};
use crate::error::LedgerResult;

use super::block::Block;
use super::ledger::Ledger;
use super::stats::{AppendOutcome, LedgerStats};

/// Cloneable, `Send + Sync` ledger handle. Clones share one ledger.
#[derive(Debug)]
pub struct SharedLedger<H: BlockHasher = HashAlgorithm> {
    inner: Arc<RwLock<Ledger<H>>>,
}

impl<H: BlockHasher> Clone for SharedLedger<H> {
    fn clone(&self) -> Self {
        SharedLedger {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<H: BlockHasher> From<Ledger<H>> for SharedLedger<H> {
    fn from(ledger: Ledger<H>) -> Self {
        SharedLedger::new(ledger)
    }
}

impl<H: BlockHasher> SharedLedger<H> {
    pub fn new(ledger: Ledger<H>) -> Self {
        SharedLedger {
            inner: Arc::new(RwLock::new(ledger)),
        }
    }

    pub fn append(&self, block: Block) -> LedgerResult<()> {
        self.inner.write().append(block)
    }

    pub fn append_with_outcome(&self, block: Block) -> LedgerResult<AppendOutcome> {
        self.inner.write().append_with_outcome(block)
    }

    pub fn is_valid_successor(&self, candidate: &Block, predecessor: &Block) -> bool {
        self.inner.read().is_valid_successor(candidate, predecessor)
    }

    pub fn is_valid_chain(&self, expected_genesis: &Block) -> bool {
        self.inner.read().is_valid_chain(expected_genesis)
    }

    pub fn genesis(&self) -> Option<Block> {
        self.inner.read().genesis().cloned()
    }

    pub fn tip(&self) -> Option<Block> {
        self.inner.read().tip().cloned()
    }

    /// Snapshot of the canonical chain, tip first.
    pub fn canonical_chain(&self) -> Vec<Block> {
        self.inner
            .read()
            .canonical_chain()
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn canonical_len(&self) -> usize {
        self.inner.read().canonical_len()
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    pub fn get(&self, hash: &BlockHash) -> Option<Block> {
        self.inner.read().get(hash).cloned()
    }

    pub fn stats(&self) -> LedgerStats {
        self.inner.read().stats().clone()
    }

    /// Run `f` under the read lock. Keep `f` short; appends wait on it.
    pub fn read<R>(&self, f: impl FnOnce(&Ledger<H>) -> R) -> R {
        f(&self.inner.read())
    }
}
