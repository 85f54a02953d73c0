//! Transaction script validation support for the utxod node.
//!
//! This crate houses the pieces of script validation that are shared across
//! the mempool, block-template construction, and block connection: currently
//! the signature-verification cache. The script interpreter itself lives with
//! the validation engine and consumes this crate.

pub mod sig_cache;

pub use sig_cache::{
    SigCache, SigCacheConfig, SigHash, DEFAULT_SIG_CACHE_MAX_ENTRIES, SIG_HASH_SIZE,
};
