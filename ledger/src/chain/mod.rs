//! # Chain Module
//!
//! Blocks and the ledger that links them.
//!
//! ## Architecture
//!
//! ```text
//! block.rs   Block structure, minting, JSON form, structural checks
//! ledger.rs  Append pipeline, fork buckets, canonical chain, audit
//! stats.rs   Append outcomes and running counters
//! shared.rs  Arc<RwLock<Ledger>> handle for concurrent callers
//! ```
//!
//! ## Data Flow
//!
//! ```text
//! Block ──append──▶ Ledger ──▶ by_hash / by_index
//!                     │
//!                     └──▶ canonical chain (tip → genesis)
//! ```
//!
//! ## Design Decisions
//!
//! 1. **Every accepted block is kept.** Losing branches stay queryable via
//!    [`Ledger::blocks_at`] and [`Ledger::get`]; only the canonical pointer
//!    moves.
//!
//! 2. **Longest chain, incumbent keeps ties.** The first block to reach a new
//!    height becomes the tip. Equal-length rivals are recorded as forks.
//!
//! 3. **No interior mutability in `Ledger`.** Appends take `&mut self`.
//!    Callers that need sharing wrap it in [`SharedLedger`].

pub mod block;
pub mod ledger;
pub mod shared;
pub mod stats;

pub use crate::crypto::BlockHash;
pub use block::Block;
pub use ledger::{Ledger, LedgerPhase};
pub use shared::SharedLedger;
pub use stats::{AppendOutcome, LedgerStats};
