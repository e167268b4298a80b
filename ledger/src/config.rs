//! # Ledger Configuration & Constants
//!
//! Every tunable of the ledger lives here. The constants are the defaults;
//! [`LedgerConfig`] is what a running ledger actually consults, and it can be
//! loaded from a JSON document so the node binary and tests share one format.
//!
//! Changing the hash algorithm or the hash domain after blocks exist
//! invalidates every previously minted hash, so pick them once per ledger.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::crypto::HashAlgorithm;
use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// Versioning
// ---------------------------------------------------------------------------

/// Crate version, reported by the node's `version` subcommand.
pub const LEDGER_VERSION: &str = env!("CARGO_PKG_VERSION");

// ---------------------------------------------------------------------------
// Hashing
// ---------------------------------------------------------------------------

/// BLAKE3 `derive_key` context (and SHA-256 prefix) for block hashes.
/// Part of every block identity. Do not edit.
pub const BLOCK_HASH_DOMAIN: &str = "linkledger 2026-01 block hash v1";

/// Algorithm used when no config says otherwise.
pub const DEFAULT_HASH_ALGORITHM: HashAlgorithm = HashAlgorithm::Blake3;

// ---------------------------------------------------------------------------
// Block shape
// ---------------------------------------------------------------------------

/// Index of the genesis block.
pub const GENESIS_INDEX: u64 = 0;

/// Largest payload accepted by default. 1 MiB.
pub const DEFAULT_MAX_PAYLOAD_BYTES: usize = 1024 * 1024;

// ---------------------------------------------------------------------------
// LedgerConfig
// ---------------------------------------------------------------------------

/// Runtime configuration of a [`crate::chain::Ledger`].
///
/// Unknown fields are rejected so a typo in a config file fails loudly
/// instead of silently falling back to a default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LedgerConfig {
    /// Hash algorithm used to re-verify declared block hashes.
    pub hash_algorithm: HashAlgorithm,
    /// Upper bound on payload size, in bytes. Larger payloads are malformed.
    pub max_payload_bytes: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            hash_algorithm: DEFAULT_HASH_ALGORITHM,
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
        }
    }
}

impl LedgerConfig {
    /// Parse and validate a JSON document. Missing fields take defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: LedgerConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&raw)
    }

    /// Reject values no ledger can run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_payload_bytes == 0 {
            return Err(ConfigError::Invalid(
                "max_payload_bytes must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Same config with a different hash algorithm.
    pub fn with_hash_algorithm(mut self, algorithm: HashAlgorithm) -> Self {
        self.hash_algorithm = algorithm;
        self
    }
}
