//! # Ledger: validation, fork bookkeeping and canonical chain selection
//!
//! The ledger accepts blocks one at a time and keeps every block it has ever
//! accepted, including blocks on branches that lost. Two indexes are kept in
//! lockstep:
//!
//! ```text
//! by_hash   BlockHash -> Block              every accepted block, once
//! by_index  u64       -> [BlockHash, ...]   fork bucket per position,
//!                                            in acceptance order
//! ```
//!
//! On top of those sit the genesis pointer and the canonical chain: the
//! hash-linked path from the current tip back to genesis, stored tip first.
//!
//! ## Append pipeline
//!
//! ```text
//! structure ─▶ genesis exclusivity ─▶ genesis | predecessor + successor ─▶ duplicate ─▶ insert
//! ```
//!
//! The first failing stage decides the error, and nothing is written until
//! every stage has passed.
//!
//! ## Canonical chain
//!
//! The canonical chain is recomputed only when a new block's index would
//! make it longer (`index + 1 > canonical.len()`). Every accepted block sits
//! exactly one index above an accepted predecessor, so only such a block can
//! raise the maximum length, and walking back from it always reaches genesis.
//!
//! Ties keep the incumbent. A second block at the frontier index is recorded
//! as a fork and the canonical chain stays put until some branch grows past
//! it. Whichever block first reaches a new length becomes the tip.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::{LedgerConfig, GENESIS_INDEX};
use crate::crypto::{BlockHash, BlockHasher, HashAlgorithm};
use crate::error::{LedgerError, LedgerResult};

use super::block::Block;
use super::stats::{AppendOutcome, LedgerStats};

/// Coarse lifecycle state of a ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerPhase {
    /// Nothing accepted yet; only a valid genesis can be appended.
    Empty,
    /// Exactly the genesis block is present.
    HasGenesis,
    /// Genesis plus at least one successor.
    Growing,
}

/// Append-only block store with fork tracking.
///
/// Generic over the [`BlockHasher`] used to re-verify declared hashes. The
/// default, [`HashAlgorithm`], follows [`LedgerConfig::hash_algorithm`]; a
/// ledger built with [`Ledger::with_hasher`] ignores that field.
#[derive(Debug, Clone)]
pub struct Ledger<H: BlockHasher = HashAlgorithm> {
    config: LedgerConfig,
    hasher: H,
    by_hash: HashMap<BlockHash, Block>,
    by_index: BTreeMap<u64, Vec<BlockHash>>,
    genesis: Option<BlockHash>,
    /// Tip first, genesis last.
    canonical: Vec<BlockHash>,
    stats: LedgerStats,
}

impl Default for Ledger<HashAlgorithm> {
    fn default() -> Self {
        Self::new()
    }
}

impl Ledger<HashAlgorithm> {
    /// Empty ledger with the default configuration.
    pub fn new() -> Self {
        Self::with_config(LedgerConfig::default())
    }

    /// Empty ledger hashing with `config.hash_algorithm`.
    pub fn with_config(config: LedgerConfig) -> Self {
        let hasher = config.hash_algorithm;
        Self::with_hasher(config, hasher)
    }

    /// Ledger seeded with a freshly minted genesis block.
    pub fn bootstrap(
        config: LedgerConfig,
        payload: impl Into<String>,
        timestamp: u64,
    ) -> LedgerResult<Self> {
        let mut ledger = Self::with_config(config);
        let genesis = Block::genesis(&ledger.hasher, payload, timestamp);
        ledger.append(genesis)?;
        Ok(ledger)
    }
}

impl<H: BlockHasher> Ledger<H> {
    /// Empty ledger with an explicit hasher.
    pub fn with_hasher(config: LedgerConfig, hasher: H) -> Self {
        Ledger {
            config,
            hasher,
            by_hash: HashMap::new(),
            by_index: BTreeMap::new(),
            genesis: None,
            canonical: Vec::new(),
            stats: LedgerStats::default(),
        }
    }

    // -----------------------------------------------------------------------
    // Append
    // -----------------------------------------------------------------------

    /// Validate `block` and, if it passes, record it and update the
    /// canonical chain.
    ///
    /// # Errors
    ///
    /// In check order: [`LedgerError::MalformedBlock`],
    /// [`LedgerError::DuplicateGenesis`], [`LedgerError::InvalidGenesis`]
    /// (empty ledger only), [`LedgerError::MissingPredecessor`],
    /// [`LedgerError::InvalidLinkage`], [`LedgerError::HashMismatch`],
    /// [`LedgerError::DuplicateBlock`]. The ledger is unchanged on error.
    pub fn append(&mut self, block: Block) -> LedgerResult<()> {
        self.append_with_outcome(block).map(|_| ())
    }

    /// [`Ledger::append`], also reporting what happened to the canonical chain.
    pub fn append_with_outcome(&mut self, block: Block) -> LedgerResult<AppendOutcome> {
        if let Err(err) = self.validate(&block) {
            debug!(
                index = block.index(),
                hash = %block.hash().short(),
                kind = %err.kind(),
                "block rejected: {}",
                err
            );
            self.stats.record_rejected(err.kind());
            return Err(err);
        }

        let outcome = self.insert(block);
        self.stats.record_accepted(outcome);
        Ok(outcome)
    }

    fn validate(&self, block: &Block) -> LedgerResult<()> {
        block.check_structure(self.config.max_payload_bytes)?;

        if let Some(existing) = &self.genesis {
            if block.is_genesis_candidate() {
                return Err(LedgerError::DuplicateGenesis {
                    existing: existing.clone(),
                    candidate: block.hash().clone(),
                });
            }
        }

        if self.by_hash.is_empty() {
            self.check_genesis(block)?;
        } else {
            let predecessor = block
                .previous_hash()
                .and_then(|hash| self.by_hash.get(hash))
                .ok_or_else(|| LedgerError::MissingPredecessor {
                    hash: block.hash().clone(),
                    index: block.index(),
                    previous_hash: block.previous_hash().cloned(),
                })?;
            self.check_successor(block, predecessor)?;
        }

        if self.by_hash.contains_key(block.hash()) {
            return Err(LedgerError::DuplicateBlock {
                hash: block.hash().clone(),
            });
        }

        Ok(())
    }

    fn check_genesis(&self, block: &Block) -> LedgerResult<()> {
        let reason = if block.index() != GENESIS_INDEX {
            format!("index is {}, genesis must be {}", block.index(), GENESIS_INDEX)
        } else if let Some(previous) = block.previous_hash() {
            format!("genesis must not reference a predecessor, found {}", previous)
        } else {
            let computed = block.compute_hash(&self.hasher);
            if &computed == block.hash() {
                return Ok(());
            }
            format!("declared hash does not match computed {}", computed)
        };

        Err(LedgerError::InvalidGenesis {
            hash: block.hash().clone(),
            reason,
        })
    }

    fn insert(&mut self, block: Block) -> AppendOutcome {
        let hash = block.hash().clone();
        let index = block.index();
        let parent = block.previous_hash().cloned();
        let becomes_genesis = self.by_hash.is_empty();

        if becomes_genesis {
            self.genesis = Some(hash.clone());
        }
        self.by_index.entry(index).or_default().push(hash.clone());
        self.by_hash.insert(hash.clone(), block);

        if index < self.canonical.len() as u64 {
            debug!(index, hash = %hash.short(), "block recorded off the canonical chain");
            return AppendOutcome::Forked;
        }

        let replacement = self.trace_to_genesis(&hash);
        let previous_canonical = std::mem::replace(&mut self.canonical, replacement);

        if becomes_genesis {
            info!(hash = %hash, "genesis accepted");
            return AppendOutcome::Genesis;
        }

        if parent.as_ref() == previous_canonical.first() {
            debug!(index, hash = %hash.short(), "canonical chain extended");
            return AppendOutcome::Extended;
        }

        let retained: HashSet<&BlockHash> = self.canonical.iter().collect();
        let depth = previous_canonical
            .iter()
            .take_while(|h| !retained.contains(h))
            .count() as u64;
        info!(
            index,
            depth,
            new_tip = %hash.short(),
            old_tip = %previous_canonical.first().map(BlockHash::short).unwrap_or_default(),
            "canonical chain reorganized"
        );
        AppendOutcome::Reorganized { depth }
    }

    /// Walk `previous_hash` links from `tip` through accepted blocks.
    /// Returns the hashes visited, tip first.
    fn trace_to_genesis(&self, tip: &BlockHash) -> Vec<BlockHash> {
        let mut path = Vec::with_capacity(self.canonical.len() + 1);
        let mut cursor = Some(tip);
        while let Some(hash) = cursor {
            let Some(block) = self.by_hash.get(hash) else {
                break;
            };
            path.push(hash.clone());
            cursor = block.previous_hash();
        }
        path
    }

    // -----------------------------------------------------------------------
    // Read-only validation
    // -----------------------------------------------------------------------

    /// Check whether `candidate` may directly extend `predecessor`:
    ///
    /// 1. `predecessor.index == candidate.index - 1`
    /// 2. `predecessor.hash == candidate.previous_hash`
    /// 3. `predecessor` is an accepted block
    /// 4. `candidate`'s declared hash recomputes correctly
    pub fn check_successor(&self, candidate: &Block, predecessor: &Block) -> LedgerResult<()> {
        let index_linked = candidate.index().checked_sub(1) == Some(predecessor.index());
        let hash_linked = candidate.previous_hash() == Some(predecessor.hash());
        if !index_linked || !hash_linked {
            return Err(LedgerError::InvalidLinkage {
                hash: candidate.hash().clone(),
                index: candidate.index(),
                predecessor: predecessor.hash().clone(),
                predecessor_index: predecessor.index(),
            });
        }

        if !self.by_hash.contains_key(predecessor.hash()) {
            return Err(LedgerError::MissingPredecessor {
                hash: candidate.hash().clone(),
                index: candidate.index(),
                previous_hash: candidate.previous_hash().cloned(),
            });
        }

        candidate.verify_hash(&self.hasher)
    }

    /// Boolean form of [`Ledger::check_successor`]. Never mutates.
    pub fn is_valid_successor(&self, candidate: &Block, predecessor: &Block) -> bool {
        self.check_successor(candidate, predecessor).is_ok()
    }

    /// Alias of [`Ledger::is_valid_successor`].
    pub fn is_valid_new_block(&self, candidate: &Block, predecessor: &Block) -> bool {
        self.is_valid_successor(candidate, predecessor)
    }

    /// Whole-ledger integrity audit against a known genesis block.
    ///
    /// Intended as a sanity check, not a hot path. Any ledger built only
    /// through successful appends passes. The first violation found is
    /// logged at `debug` level.
    pub fn is_valid_chain(&self, expected_genesis: &Block) -> bool {
        match self.audit(expected_genesis) {
            Ok(()) => true,
            Err(violation) => {
                debug!(%violation, "ledger audit failed");
                false
            }
        }
    }

    fn audit(&self, expected_genesis: &Block) -> Result<(), String> {
        let genesis = self.genesis().ok_or("ledger has no genesis")?;
        if !genesis.is_genesis_candidate() {
            return Err(format!("genesis {} is not genesis-shaped", genesis.hash()));
        }
        if genesis != expected_genesis {
            return Err(format!(
                "genesis {} differs from expected {}",
                genesis.hash(),
                expected_genesis.hash()
            ));
        }

        let highest = self.height().unwrap_or(GENESIS_INDEX);
        for index in 1..=highest {
            let bucket = self
                .by_index
                .get(&index)
                .ok_or_else(|| format!("no blocks at index {} below height {}", index, highest))?;
            for hash in bucket {
                let block = self
                    .by_hash
                    .get(hash)
                    .ok_or_else(|| format!("indexed block {} is not stored", hash))?;
                let predecessor = block
                    .previous_hash()
                    .and_then(|prev| self.by_hash.get(prev))
                    .ok_or_else(|| format!("block {} has no stored predecessor", hash))?;
                self.check_successor(block, predecessor)
                    .map_err(|e| e.to_string())?;
            }
        }

        let roots = self.by_index.get(&GENESIS_INDEX).map_or(0, Vec::len);
        if roots != 1 {
            return Err(format!("expected exactly one block at index 0, found {}", roots));
        }

        let indexed: usize = self.by_index.values().map(Vec::len).sum();
        if indexed != self.by_hash.len() {
            return Err(format!(
                "{} blocks indexed by position but {} stored by hash",
                indexed,
                self.by_hash.len()
            ));
        }

        self.audit_canonical(genesis, highest)
    }

    fn audit_canonical(&self, genesis: &Block, highest: u64) -> Result<(), String> {
        if self.canonical.len() as u64 != highest + 1 {
            return Err(format!(
                "canonical chain has {} blocks, expected {}",
                self.canonical.len(),
                highest + 1
            ));
        }
        if self.canonical.last() != Some(genesis.hash()) {
            return Err("canonical chain does not end at genesis".to_string());
        }
        for pair in self.canonical.windows(2) {
            let child = self
                .by_hash
                .get(&pair[0])
                .ok_or_else(|| format!("canonical block {} is not stored", pair[0]))?;
            if child.previous_hash() != Some(&pair[1]) {
                return Err(format!("canonical block {} does not link to {}", pair[0], pair[1]));
            }
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Getters
    // -----------------------------------------------------------------------

    /// The genesis block, once accepted.
    pub fn genesis(&self) -> Option<&Block> {
        self.genesis.as_ref().and_then(|hash| self.by_hash.get(hash))
    }

    /// Canonical chain, tip first and genesis last.
    pub fn canonical_chain(&self) -> Vec<&Block> {
        self.canonical
            .iter()
            .filter_map(|hash| self.by_hash.get(hash))
            .collect()
    }

    /// Hashes of the canonical chain, tip first.
    pub fn canonical_hashes(&self) -> &[BlockHash] {
        &self.canonical
    }

    /// Number of blocks on the canonical chain.
    pub fn canonical_len(&self) -> usize {
        self.canonical.len()
    }

    /// Head of the canonical chain.
    pub fn tip(&self) -> Option<&Block> {
        self.canonical.first().and_then(|hash| self.by_hash.get(hash))
    }

    /// Highest populated index, `None` while empty.
    pub fn height(&self) -> Option<u64> {
        self.by_index.keys().next_back().copied()
    }

    /// Lifecycle state, derived from how many blocks are stored.
    pub fn phase(&self) -> LedgerPhase {
        match self.by_hash.len() {
            0 => LedgerPhase::Empty,
            1 => LedgerPhase::HasGenesis,
            _ => LedgerPhase::Growing,
        }
    }

    /// Total accepted blocks across all branches.
    pub fn len(&self) -> usize {
        self.by_hash.len()
    }

    /// True until genesis is accepted.
    pub fn is_empty(&self) -> bool {
        self.by_hash.is_empty()
    }

    /// Look up an accepted block on any branch.
    pub fn get(&self, hash: &BlockHash) -> Option<&Block> {
        self.by_hash.get(hash)
    }

    /// Whether `hash` names an accepted block.
    pub fn contains(&self, hash: &BlockHash) -> bool {
        self.by_hash.contains_key(hash)
    }

    /// Every accepted block at `index`, in acceptance order.
    pub fn blocks_at(&self, index: u64) -> Vec<&Block> {
        self.by_index
            .get(&index)
            .map(|bucket| bucket.iter().filter_map(|h| self.by_hash.get(h)).collect())
            .unwrap_or_default()
    }

    /// Indices that hold more than one block.
    pub fn fork_indices(&self) -> Vec<u64> {
        self.by_index
            .iter()
            .filter(|(_, bucket)| bucket.len() > 1)
            .map(|(index, _)| *index)
            .collect()
    }

    /// All accepted blocks, by index then acceptance order.
    pub fn iter(&self) -> impl Iterator<Item = &Block> + '_ {
        self.by_index
            .values()
            .flatten()
            .filter_map(|hash| self.by_hash.get(hash))
    }

    /// Running append counters.
    pub fn stats(&self) -> &LedgerStats {
        &self.stats
    }

    /// Configuration the ledger was built with.
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Hasher used to re-verify declared hashes.
    pub fn hasher(&self) -> &H {
        &self.hasher
    }
}
