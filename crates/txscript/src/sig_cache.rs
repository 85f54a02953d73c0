//! Signature verification cache.
//!
//! ECDSA verification is the most expensive step of script validation, and
//! the same signature is typically checked several times as a transaction
//! moves from the mempool into a block. The cache remembers triplets that
//! have already been proven valid so repeated checks become a map lookup.

use std::collections::HashSet;

use parking_lot::RwLock;
use rand::Rng;
use secp256k1::ecdsa::Signature;
use secp256k1::PublicKey;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Size of a signature hash in bytes.
pub const SIG_HASH_SIZE: usize = 32;

/// Default maximum number of entries held by a [`SigCache`].
pub const DEFAULT_SIG_CACHE_MAX_ENTRIES: usize = 100_000;

/// The hash of the transaction data a signature commits to, as produced by
/// the script engine.
pub type SigHash = [u8; SIG_HASH_SIZE];

/// Key identifying one proven-valid signature triplet.
///
/// Equality is value equality over the canonical encodings: the raw
/// signature hash, the DER-encoded signature, and the compressed public
/// key. Two independently parsed objects with the same encodings map to
/// the same entry, and two different triplets never alias.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SigCacheKey {
    sig_hash: SigHash,
    signature: Vec<u8>,
    public_key: Vec<u8>,
}

impl SigCacheKey {
    fn new(sig_hash: SigHash, signature: &Signature, public_key: &PublicKey) -> Self {
        Self {
            sig_hash,
            signature: signature.serialize_der().to_vec(),
            public_key: public_key.serialize().to_vec(),
        }
    }
}

/// Configuration for a [`SigCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigCacheConfig {
    /// Maximum number of entries the cache can hold. Zero disables caching.
    pub max_entries: usize,
}

impl Default for SigCacheConfig {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_SIG_CACHE_MAX_ENTRIES,
        }
    }
}

/// Set of signature triplets already proven valid, plus a dense list of the
/// same keys so a uniformly random victim can be picked in O(1).
struct SigCacheStore {
    valid_sigs: HashSet<SigCacheKey>,
    entries: Vec<SigCacheKey>,
}

/// A bounded, concurrency-safe cache of proven-valid signature triplets.
///
/// The cache only ever records positive verification outcomes; callers must
/// add a triplet only after the signature has actually been verified. When
/// the cache is full, adding a new triplet evicts one existing entry chosen
/// uniformly at random; eviction is independent of access history and
/// cannot be steered by a peer driving insertions.
///
/// Reads take a shared lock and writes an exclusive one, so concurrent
/// `exists` calls never block each other.
pub struct SigCache {
    store: RwLock<SigCacheStore>,
    max_entries: usize,
}

impl SigCache {
    /// Creates a new signature cache holding at most `max_entries` entries.
    ///
    /// A `max_entries` of zero is legal and disables caching entirely:
    /// every [`add`](Self::add) becomes a no-op and every
    /// [`exists`](Self::exists) returns false.
    pub fn new(max_entries: usize) -> Self {
        Self {
            store: RwLock::new(SigCacheStore {
                valid_sigs: HashSet::new(),
                entries: Vec::new(),
            }),
            max_entries,
        }
    }

    /// Creates a new signature cache from a [`SigCacheConfig`].
    pub fn with_config(config: SigCacheConfig) -> Self {
        Self::new(config.max_entries)
    }

    /// Returns the maximum number of entries the cache can hold.
    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// Returns the number of entries currently in the cache.
    pub fn len(&self) -> usize {
        self.store.read().entries.len()
    }

    /// Returns whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.store.read().entries.is_empty()
    }

    /// Checks whether the given triplet has already been proven valid.
    ///
    /// Comparison is by canonical encoding, so a signature or public key
    /// re-parsed from serialized bytes matches the instance originally
    /// added. The check never mutates the cache; there is no recency
    /// bookkeeping to update.
    ///
    /// # Arguments
    ///
    /// * `sig_hash` - The signature hash the signature commits to
    /// * `signature` - The signature to look up
    /// * `public_key` - The public key the signature was verified against
    ///
    /// # Returns
    ///
    /// True if the exact triplet is present in the cache
    pub fn exists(&self, sig_hash: SigHash, signature: &Signature, public_key: &PublicKey) -> bool {
        let key = SigCacheKey::new(sig_hash, signature, public_key);
        self.store.read().valid_sigs.contains(&key)
    }

    /// Records a triplet as proven valid.
    ///
    /// Callers must only add a triplet after the signature has been
    /// verified against the public key over the signature hash; the cache
    /// cannot check this itself. Adding a triplet that is already present
    /// has no effect. When the cache is full, one existing entry chosen
    /// uniformly at random is evicted to make room.
    ///
    /// # Arguments
    ///
    /// * `sig_hash` - The signature hash the signature commits to
    /// * `signature` - The verified signature
    /// * `public_key` - The public key the signature was verified against
    pub fn add(&self, sig_hash: SigHash, signature: &Signature, public_key: &PublicKey) {
        if self.max_entries == 0 {
            return;
        }

        let key = SigCacheKey::new(sig_hash, signature, public_key);
        let mut store = self.store.write();

        if store.valid_sigs.contains(&key) {
            return;
        }

        if store.entries.len() >= self.max_entries {
            evict_random(&mut store);
        }

        store.entries.push(key.clone());
        store.valid_sigs.insert(key);
    }
}

impl Default for SigCache {
    fn default() -> Self {
        Self::with_config(SigCacheConfig::default())
    }
}

impl std::fmt::Debug for SigCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigCache")
            .field("len", &self.len())
            .field("max_entries", &self.max_entries)
            .finish()
    }
}

/// Removes one entry chosen uniformly at random from a non-empty store.
fn evict_random(store: &mut SigCacheStore) {
    let victim = rand::thread_rng().gen_range(0..store.entries.len());
    let evicted = store.entries.swap_remove(victim);
    store.valid_sigs.remove(&evicted);

    debug!(
        "signature cache full, evicted entry for sighash {}",
        hex::encode(evicted.sig_hash)
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::RngCore;
    use secp256k1::{Message, Secp256k1, SecretKey};

    /// Returns a random signature hash, a signature over it, and the
    /// corresponding public key.
    fn gen_random_sig() -> (SigHash, Signature, PublicKey) {
        let secp = Secp256k1::new();
        let mut rng = rand::thread_rng();

        let secret_key = loop {
            let mut bytes = [0u8; 32];
            rng.fill_bytes(&mut bytes);
            if let Ok(key) = SecretKey::from_slice(&bytes) {
                break key;
            }
        };
        let public_key = PublicKey::from_secret_key(&secp, &secret_key);

        let mut sig_hash = [0u8; SIG_HASH_SIZE];
        rng.fill_bytes(&mut sig_hash);
        let signature = secp.sign_ecdsa(&Message::from_digest(sig_hash), &secret_key);

        (sig_hash, signature, public_key)
    }

    /// Re-parses a signature and public key from their serialized bytes,
    /// yielding instances distinct from the originals.
    fn reparse(signature: &Signature, public_key: &PublicKey) -> (Signature, PublicKey) {
        let sig_copy = Signature::from_der(&signature.serialize_der()).unwrap();
        let key_copy = PublicKey::from_slice(&public_key.serialize()).unwrap();
        (sig_copy, key_copy)
    }

    #[test]
    fn test_sig_cache_add_exists() {
        let cache = SigCache::new(200);

        let (sig_hash, signature, public_key) = gen_random_sig();
        cache.add(sig_hash, &signature, &public_key);

        // Lookup must succeed with freshly parsed copies, not just the
        // instances that were added.
        let (sig_copy, key_copy) = reparse(&signature, &public_key);
        assert!(
            cache.exists(sig_hash, &sig_copy, &key_copy),
            "previously added triplet not found in signature cache"
        );
    }

    #[test]
    fn test_sig_cache_add_evict_entry() {
        let max_entries = 100;
        let cache = SigCache::new(max_entries);

        for _ in 0..max_entries {
            let (sig_hash, signature, public_key) = gen_random_sig();
            cache.add(sig_hash, &signature, &public_key);

            let (sig_copy, key_copy) = reparse(&signature, &public_key);
            assert!(
                cache.exists(sig_hash, &sig_copy, &key_copy),
                "previously added triplet not found in signature cache"
            );
        }
        assert_eq!(cache.len(), max_entries);

        // Adding one more entry evicts a random previous one; the count
        // stays at capacity and the new entry is present.
        let (new_hash, new_sig, new_key) = gen_random_sig();
        cache.add(new_hash, &new_sig, &new_key);

        assert_eq!(cache.len(), max_entries);
        let (sig_copy, key_copy) = reparse(&new_sig, &new_key);
        assert!(cache.exists(new_hash, &sig_copy, &key_copy));
    }

    #[test]
    fn test_sig_cache_zero_capacity() {
        let cache = SigCache::new(0);

        let (sig_hash, signature, public_key) = gen_random_sig();
        cache.add(sig_hash, &signature, &public_key);

        assert!(!cache.exists(sig_hash, &signature, &public_key));
        assert_eq!(cache.len(), 0);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_sig_cache_duplicate_add() {
        let cache = SigCache::new(10);

        let (sig_hash, signature, public_key) = gen_random_sig();
        cache.add(sig_hash, &signature, &public_key);
        cache.add(sig_hash, &signature, &public_key);

        assert_eq!(cache.len(), 1);
        assert!(cache.exists(sig_hash, &signature, &public_key));
    }

    #[test]
    fn test_sig_cache_eviction_removes_exactly_one() {
        let cache = SigCache::new(2);

        let triple_a = gen_random_sig();
        let triple_b = gen_random_sig();
        let triple_c = gen_random_sig();

        cache.add(triple_a.0, &triple_a.1, &triple_a.2);
        cache.add(triple_b.0, &triple_b.1, &triple_b.2);
        assert_eq!(cache.len(), 2);

        cache.add(triple_c.0, &triple_c.1, &triple_c.2);
        assert_eq!(cache.len(), 2);
        assert!(cache.exists(triple_c.0, &triple_c.1, &triple_c.2));

        // Exactly one of the two original entries survives; which one is
        // up to the random victim selection.
        let survivors = [&triple_a, &triple_b]
            .iter()
            .filter(|(sig_hash, signature, public_key)| {
                cache.exists(*sig_hash, signature, public_key)
            })
            .count();
        assert_eq!(survivors, 1);
    }

    #[test]
    fn test_sig_cache_config() {
        assert_eq!(
            SigCacheConfig::default().max_entries,
            DEFAULT_SIG_CACHE_MAX_ENTRIES
        );

        let cache = SigCache::with_config(SigCacheConfig { max_entries: 5 });
        assert_eq!(cache.max_entries(), 5);
        assert!(cache.is_empty());

        // The config layer deserializes straight into the struct.
        let config: SigCacheConfig = serde_json::from_str(r#"{"max_entries": 25000}"#).unwrap();
        assert_eq!(config.max_entries, 25_000);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        /// The entry count never exceeds capacity and the most recently
        /// added triplet is always present, whatever the insert sequence.
        #[test]
        fn test_sig_cache_capacity_invariant(digests in proptest::collection::vec(any::<[u8; 32]>(), 1..48)) {
            let secp = Secp256k1::new();
            let secret_key = SecretKey::from_slice(&[0x11u8; 32]).unwrap();
            let public_key = PublicKey::from_secret_key(&secp, &secret_key);

            let max_entries = 8;
            let cache = SigCache::new(max_entries);

            for digest in digests {
                let signature = secp.sign_ecdsa(&Message::from_digest(digest), &secret_key);
                cache.add(digest, &signature, &public_key);

                prop_assert!(cache.len() <= max_entries);
                prop_assert!(cache.exists(digest, &signature, &public_key));
            }
        }
    }
}
