// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # linkledger: Core Library
//!
//! An append-only, hash-linked ledger that accepts competing branches and
//! always knows which one is canonical.
//!
//! Each block names its predecessor by hash. The ledger validates every
//! candidate against what it already holds, keeps all valid branches, and
//! tracks the longest one from the tip back to a single genesis block.
//!
//! ## Architecture
//!
//! - **crypto**: Block hashing. BLAKE3 by default, SHA-256 on request.
//! - **chain**: Blocks, the ledger, fork bookkeeping and a shared handle.
//! - **config**: Constants and the runtime [`LedgerConfig`].
//! - **error**: Every way an append can fail, as data.
//!
//! ## Quick start
//!
//! ```
//! use linkledger::{Block, Ledger, LedgerConfig};
//!
//! let mut ledger = Ledger::bootstrap(LedgerConfig::default(), "TEST", 1).unwrap();
//! let genesis = ledger.genesis().unwrap().clone();
//!
//! let next = Block::successor(ledger.hasher(), &genesis, "FOO", 2);
//! ledger.append(next).unwrap();
//!
//! assert_eq!(ledger.canonical_len(), 2);
//! assert!(ledger.is_valid_chain(&genesis));
//! ```

pub mod chain;
pub mod config;
pub mod crypto;
pub mod error;

pub use chain::{AppendOutcome, Block, Ledger, LedgerPhase, LedgerStats, SharedLedger};
pub use config::LedgerConfig;
pub use crypto::{BlockHash, BlockHasher, HashAlgorithm};
pub use error::{ConfigError, LedgerError, LedgerResult, RejectionKind};
