//! # Block Structure
//!
//! A block is an immutable, content-addressed record: a position in the
//! ledger, an opaque payload, a creation timestamp and a pointer to the block
//! it extends.
//!
//! ## Block Layout
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │  Block                                           │
//! │  ├── index: u64            (genesis = 0)         │
//! │  ├── payload: String       (opaque, may be "")   │
//! │  ├── timestamp: u64        (milliseconds)        │
//! │  ├── hash: BlockHash       (declared identity)   │
//! │  └── previous_hash: Option<BlockHash>            │
//! │                             (None only at root)  │
//! └──────────────────────────────────────────────────┘
//! ```
//!
//! The declared `hash` is whatever the producer put there. Nothing in this
//! module trusts it: [`Block::hash_matches`] recomputes it, and the ledger
//! calls that before accepting anything.

use serde::{Deserialize, Serialize};

use crate::config::GENESIS_INDEX;
use crate::crypto::{BlockHash, BlockHasher};
use crate::error::{LedgerError, LedgerResult};

/// An immutable ledger record. Identity is [`Block::hash`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Block {
    index: u64,
    payload: String,
    timestamp: u64,
    hash: BlockHash,
    previous_hash: Option<BlockHash>,
}

impl Block {
    /// Assemble a block from its fields and a caller-supplied hash.
    ///
    /// No validation happens here; a block with a wrong hash is still
    /// constructible and will be rejected by the ledger.
    pub fn new(
        index: u64,
        payload: impl Into<String>,
        timestamp: u64,
        hash: BlockHash,
        previous_hash: Option<BlockHash>,
    ) -> Self {
        Block {
            index,
            payload: payload.into(),
            timestamp,
            hash,
            previous_hash,
        }
    }

    /// Build a block and fill in its hash with `hasher`.
    pub fn mint<H: BlockHasher + ?Sized>(
        hasher: &H,
        index: u64,
        payload: impl Into<String>,
        timestamp: u64,
        previous_hash: Option<BlockHash>,
    ) -> Self {
        let payload = payload.into();
        let hash = hasher.hash_block(index, &payload, timestamp, previous_hash.as_ref());
        Block::new(index, payload, timestamp, hash, previous_hash)
    }

    /// Mint a genesis block: index 0, no predecessor.
    pub fn genesis<H: BlockHasher + ?Sized>(
        hasher: &H,
        payload: impl Into<String>,
        timestamp: u64,
    ) -> Self {
        Block::mint(hasher, GENESIS_INDEX, payload, timestamp, None)
    }

    /// Mint the block that directly extends `parent`.
    pub fn successor<H: BlockHasher + ?Sized>(
        hasher: &H,
        parent: &Block,
        payload: impl Into<String>,
        timestamp: u64,
    ) -> Self {
        Block::mint(
            hasher,
            parent.index + 1,
            payload,
            timestamp,
            Some(parent.hash.clone()),
        )
    }

    /// Decode a block from JSON. Missing or mistyped fields are reported as
    /// [`LedgerError::MalformedBlock`].
    pub fn from_json(json: &str) -> LedgerResult<Self> {
        serde_json::from_str(json).map_err(|e| LedgerError::malformed(e.to_string()))
    }

    /// Encode as a single-line JSON object.
    pub fn to_json(&self) -> String {
        // A struct of strings and integers always serializes.
        serde_json::to_string(self).unwrap_or_default()
    }

    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn payload(&self) -> &str {
        &self.payload
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    /// The declared hash.
    pub fn hash(&self) -> &BlockHash {
        &self.hash
    }

    /// The predecessor reference, `None` for a genesis block.
    pub fn previous_hash(&self) -> Option<&BlockHash> {
        self.previous_hash.as_ref()
    }

    /// Index 0 and no predecessor. Says nothing about the hash.
    pub fn is_genesis_candidate(&self) -> bool {
        self.index == GENESIS_INDEX && self.previous_hash.is_none()
    }

    /// Recompute the content hash from this block's fields.
    pub fn compute_hash<H: BlockHasher + ?Sized>(&self, hasher: &H) -> BlockHash {
        hasher.hash_block(
            self.index,
            &self.payload,
            self.timestamp,
            self.previous_hash.as_ref(),
        )
    }

    /// Whether the declared hash equals the recomputed one.
    pub fn hash_matches<H: BlockHasher + ?Sized>(&self, hasher: &H) -> bool {
        self.compute_hash(hasher) == self.hash
    }

    /// Like [`Block::hash_matches`] but reports both hashes on mismatch.
    pub fn verify_hash<H: BlockHasher + ?Sized>(&self, hasher: &H) -> LedgerResult<()> {
        let computed = self.compute_hash(hasher);
        if computed != self.hash {
            return Err(LedgerError::HashMismatch {
                index: self.index,
                declared: self.hash.clone(),
                computed,
            });
        }
        Ok(())
    }

    /// Structural check the type system cannot express: `payload` fits in
    /// `max_payload_bytes`.
    ///
    /// Hash text is deliberately not inspected here. Any textual hash is
    /// well-formed; a value that names no accepted block or does not
    /// recompute is caught by the linkage and hash checks instead.
    pub fn check_structure(&self, max_payload_bytes: usize) -> LedgerResult<()> {
        if self.payload.len() > max_payload_bytes {
            return Err(LedgerError::malformed(format!(
                "payload is {} bytes, limit is {}",
                self.payload.len(),
                max_payload_bytes
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::HashAlgorithm;

    const H: HashAlgorithm = HashAlgorithm::Blake3;

    #[test]
    fn genesis_block_properties() {
        let genesis = Block::genesis(&H, "TEST", 1);
        assert_eq!(genesis.index(), 0);
        assert_eq!(genesis.payload(), "TEST");
        assert_eq!(genesis.timestamp(), 1);
        assert!(genesis.previous_hash().is_none());
        assert!(genesis.is_genesis_candidate());
        assert!(genesis.hash_matches(&H));
    }

    #[test]
    fn genesis_candidate_shape() {
        let good = Block::genesis(&H, "GOOD", 123);
        let bad = Block::mint(&H, 1, "BAD", 123, Some(BlockHash::new("abc")));
        assert!(good.is_genesis_candidate());
        assert!(!bad.is_genesis_candidate());
    }

    #[test]
    fn successor_links_to_parent() {
        let genesis = Block::genesis(&H, "TEST", 1);
        let child = Block::successor(&H, &genesis, "FOO", 2);
        assert_eq!(child.index(), 1);
        assert_eq!(child.previous_hash(), Some(genesis.hash()));
        assert!(child.hash_matches(&H));
    }

    #[test]
    fn tampered_hash_is_detected() {
        let genesis = Block::genesis(&H, "TEST", 1);
        let forged = Block::new(1, "FOO", 2, genesis.hash().clone(), Some(genesis.hash().clone()));
        assert!(!forged.hash_matches(&H));
        let err = forged.verify_hash(&H).unwrap_err();
        assert!(matches!(err, LedgerError::HashMismatch { index: 1, .. }));
    }

    #[test]
    fn structure_ignores_hash_text() {
        // Linkage and hash are checked by the ledger, not here.
        let odd = Block::new(54, "DOG", 4567, BlockHash::new("null"), Some(BlockHash::new("")));
        assert!(odd.check_structure(1024).is_ok());
    }

    #[test]
    fn structure_rejects_oversized_payload() {
        let block = Block::genesis(&H, "x".repeat(17), 1);
        let err = block.check_structure(16).unwrap_err();
        assert!(matches!(err, LedgerError::MalformedBlock { .. }));
        assert!(block.check_structure(17).is_ok());
    }

    #[test]
    fn json_roundtrip_and_missing_fields() {
        let genesis = Block::genesis(&H, "TEST", 1);
        let recovered = Block::from_json(&genesis.to_json()).unwrap();
        assert_eq!(genesis, recovered);
        assert!(genesis.to_json().contains(r#""previous_hash":null"#));

        let err = Block::from_json(r#"{ "index": 0, "payload": "TEST", "timestamp": 1 }"#).unwrap_err();
        assert!(matches!(err, LedgerError::MalformedBlock { .. }));

        let err = Block::from_json(
            r#"{ "index": "zero", "payload": "TEST", "timestamp": 1, "hash": "ab", "previous_hash": null }"#,
        )
        .unwrap_err();
        assert!(matches!(err, LedgerError::MalformedBlock { .. }));
    }

    #[test]
    fn json_without_previous_hash_is_genesis_shaped() {
        let genesis = Block::genesis(&H, "TEST", 1);
        let json = format!(
            r#"{{ "index": 0, "payload": "TEST", "timestamp": 1, "hash": "{}" }}"#,
            genesis.hash()
        );
        let decoded = Block::from_json(&json).unwrap();
        assert_eq!(decoded, genesis);
    }
}
