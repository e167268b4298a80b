//! # Hashing Primitives
//!
//! The ledger treats hashing as an opaque content-addressing primitive:
//! same logical inputs, same output, negligible collision probability.
//! Everything here is a thin wrapper around the `blake3` and `sha2` crates.

pub mod hash;

pub use hash::{
    block_preimage, hash_block, Blake3Hasher, BlockHash, BlockHasher, HashAlgorithm,
    Sha256Hasher,
};
