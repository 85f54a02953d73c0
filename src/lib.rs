//! # Utxod
//!
//! Building blocks for a UTXO cryptocurrency full node. This umbrella crate
//! re-exports the workspace members so downstream code can depend on a
//! single crate:
//!
//! - [`txscript`] - transaction script validation support, including the
//!   signature-verification cache used by the validation engine
//! - [`jsonrpc`] - JSON-RPC data contracts for the wallet server boundary,
//!   including the wallet notification types and their registry
//!
//! ## Example
//!
//! ```rust
//! use utxod::txscript::SigCache;
//!
//! let cache = SigCache::new(1000);
//! assert!(cache.is_empty());
//! ```

#![warn(missing_docs)]

pub use utxod_jsonrpc as jsonrpc;
pub use utxod_txscript as txscript;
