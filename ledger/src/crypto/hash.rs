//! # Block Hashing
//!
//! Content addressing for ledger blocks. A block's identity is the digest of
//! its four logical fields: `index`, `payload`, `timestamp` and the optional
//! `previous_hash`. The ledger never mints hashes on append; it recomputes
//! them here and compares against what the producer declared.
//!
//! ## Preimage layout
//!
//! ```text
//! index        u64 little-endian
//! payload_len  u64 little-endian
//! payload      UTF-8 bytes
//! timestamp    u64 little-endian
//! prev_tag     0x00 (absent) | 0x01 (present)
//! prev_len     u64 little-endian   (present only)
//! prev         hex text bytes      (present only)
//! ```
//!
//! Every variable-length field is length-prefixed, so no two distinct field
//! tuples share a preimage. The absent predecessor gets its own tag byte and
//! can never be confused with a real hash, nor with the strings `"null"` or
//! `""`.
//!
//! ## Algorithms
//!
//! - **BLAKE3** (default) in `derive_key` mode with [`BLOCK_HASH_DOMAIN`] as
//!   the context string.
//! - **SHA-256** over `domain || 0x00 || preimage`, for setups that want a
//!   digest other tooling already speaks.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::config::BLOCK_HASH_DOMAIN;

// ---------------------------------------------------------------------------
// BlockHash
// ---------------------------------------------------------------------------

/// Lowercase hex rendering of a block digest.
///
/// The wrapper does not validate on construction. The ledger accepts any
/// text here and relies on recomputation and linkage to reject bad values.
/// Use [`BlockHash::check_shape`] to test a value against a digest length.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockHash(String);

impl BlockHash {
    /// Wrap a hex string as-is.
    pub fn new(hex: impl Into<String>) -> Self {
        BlockHash(hex.into())
    }

    /// Hex-encode raw digest bytes.
    pub fn from_digest(digest: &[u8]) -> Self {
        BlockHash(hex::encode(digest))
    }

    /// Borrow the hex text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 12 hex characters, for log lines.
    pub fn short(&self) -> &str {
        let end = self.0.len().min(12);
        self.0.get(..end).unwrap_or(&self.0)
    }

    /// Check that this is non-empty lowercase hex encoding exactly
    /// `digest_len` bytes. Returns a human-readable reason on failure.
    pub fn check_shape(&self, digest_len: usize) -> Result<(), String> {
        if self.0.is_empty() {
            return Err("hash is empty".to_string());
        }
        if self.0.chars().any(|c| c.is_ascii_uppercase()) {
            return Err(format!("hash {} is not lowercase hex", self.0));
        }
        let bytes = hex::decode(&self.0).map_err(|e| format!("hash {} is not hex: {}", self.0, e))?;
        if bytes.len() != digest_len {
            return Err(format!(
                "hash {} encodes {} bytes, expected {}",
                self.0,
                bytes.len(),
                digest_len
            ));
        }
        Ok(())
    }
}

impl fmt::Display for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for BlockHash {
    fn from(value: String) -> Self {
        BlockHash(value)
    }
}

impl From<&str> for BlockHash {
    fn from(value: &str) -> Self {
        BlockHash(value.to_string())
    }
}

impl AsRef<str> for BlockHash {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// Hasher trait
// ---------------------------------------------------------------------------

/// A content-addressing primitive for blocks.
///
/// Implementors only supply the raw digest; the preimage layout is shared so
/// every hasher treats the absent predecessor identically.
pub trait BlockHasher: fmt::Debug + Send + Sync {
    /// Digest an encoded preimage.
    fn digest(&self, preimage: &[u8]) -> Vec<u8>;

    /// Output length in bytes.
    fn digest_len(&self) -> usize;

    /// Short algorithm name for logs and config files.
    fn name(&self) -> &'static str;

    /// Hash a block's logical fields.
    fn hash_block(
        &self,
        index: u64,
        payload: &str,
        timestamp: u64,
        previous_hash: Option<&BlockHash>,
    ) -> BlockHash {
        let preimage = block_preimage(index, payload, timestamp, previous_hash);
        BlockHash::from_digest(&self.digest(&preimage))
    }
}

/// Encode the hash preimage for a block. See the module docs for the layout.
pub fn block_preimage(
    index: u64,
    payload: &str,
    timestamp: u64,
    previous_hash: Option<&BlockHash>,
) -> Vec<u8> {
    let prev_len = previous_hash.map_or(0, |h| h.as_str().len() + 8);
    let mut preimage = Vec::with_capacity(8 + 8 + payload.len() + 8 + 1 + prev_len);
    preimage.extend_from_slice(&index.to_le_bytes());
    preimage.extend_from_slice(&(payload.len() as u64).to_le_bytes());
    preimage.extend_from_slice(payload.as_bytes());
    preimage.extend_from_slice(&timestamp.to_le_bytes());
    match previous_hash {
        None => preimage.push(0x00),
        Some(hash) => {
            preimage.push(0x01);
            preimage.extend_from_slice(&(hash.as_str().len() as u64).to_le_bytes());
            preimage.extend_from_slice(hash.as_str().as_bytes());
        }
    }
    preimage
}

// ---------------------------------------------------------------------------
// Implementations
// ---------------------------------------------------------------------------

/// BLAKE3 in `derive_key` mode, keyed by [`BLOCK_HASH_DOMAIN`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Blake3Hasher;

impl BlockHasher for Blake3Hasher {
    fn digest(&self, preimage: &[u8]) -> Vec<u8> {
        domain_separated_hash(BLOCK_HASH_DOMAIN, preimage).to_vec()
    }

    fn digest_len(&self) -> usize {
        blake3::OUT_LEN
    }

    fn name(&self) -> &'static str {
        "blake3"
    }
}

/// SHA-256 over `domain || 0x00 || preimage`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sha256Hasher;

impl BlockHasher for Sha256Hasher {
    fn digest(&self, preimage: &[u8]) -> Vec<u8> {
        let mut hasher = Sha256::new();
        hasher.update(BLOCK_HASH_DOMAIN.as_bytes());
        hasher.update([0x00]);
        hasher.update(preimage);
        hasher.finalize().to_vec()
    }

    fn digest_len(&self) -> usize {
        32
    }

    fn name(&self) -> &'static str {
        "sha256"
    }
}

/// Runtime-selectable hash algorithm. This is what [`crate::config::LedgerConfig`]
/// stores and what the ledger uses unless given a custom [`BlockHasher`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    #[default]
    Blake3,
    Sha256,
}

impl HashAlgorithm {
    /// Parse `"blake3"` or `"sha256"` (case-insensitive).
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "blake3" => Some(HashAlgorithm::Blake3),
            "sha256" | "sha-256" => Some(HashAlgorithm::Sha256),
            _ => None,
        }
    }
}

impl BlockHasher for HashAlgorithm {
    fn digest(&self, preimage: &[u8]) -> Vec<u8> {
        match self {
            HashAlgorithm::Blake3 => Blake3Hasher.digest(preimage),
            HashAlgorithm::Sha256 => Sha256Hasher.digest(preimage),
        }
    }

    fn digest_len(&self) -> usize {
        match self {
            HashAlgorithm::Blake3 => Blake3Hasher.digest_len(),
            HashAlgorithm::Sha256 => Sha256Hasher.digest_len(),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            HashAlgorithm::Blake3 => Blake3Hasher.name(),
            HashAlgorithm::Sha256 => Sha256Hasher.name(),
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Hash block fields with the default algorithm (BLAKE3).
///
/// # Example
///
/// ```
/// use linkledger::crypto::hash_block;
///
/// let genesis = hash_block(0, "TEST", 1, None);
/// let child = hash_block(1, "FOO", 2, Some(&genesis));
/// assert_ne!(genesis, child);
/// ```
pub fn hash_block(
    index: u64,
    payload: &str,
    timestamp: u64,
    previous_hash: Option<&BlockHash>,
) -> BlockHash {
    HashAlgorithm::default().hash_block(index, payload, timestamp, previous_hash)
}

/// Domain-separated BLAKE3 via `derive_key`. Same data under two different
/// contexts never produces the same digest.
pub fn domain_separated_hash(context: &str, data: &[u8]) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new_derive_key(context);
    hasher.update(data);
    *hasher.finalize().as_bytes()
}
