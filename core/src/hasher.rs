//! Hashing partition keys into buckets
//!
//! The default hasher is xxHash64 over a key's canonical bytes. It is fast
//! and stable across processes and platforms, but it is NOT cryptographic:
//! anyone who can choose keys can force collisions. Never use it for
//! security decisions.

use xxhash_rust::xxh64::xxh64;

use crate::errors::{Error, Result};
use crate::models::Key;

/// Maps keys to `u64` hashes and reduces them to buckets
///
/// Implementations must be pure: the same key always yields the same hash.
/// Collisions are expected.
pub trait KeyHasher: Send + Sync {
    fn hash(&self, key: &Key) -> u64;

    /// `hash(key) mod n`
    fn bucket(&self, key: &Key, n: u32) -> Result<u32> {
        if n == 0 {
            return Err(Error::InvalidPartitionCount(n));
        }
        Ok(reduce(self.hash(key), n))
    }
}

/// Reduce a hash to a bucket index; `n` must be non-zero
#[inline]
pub(crate) fn reduce(hash: u64, n: u32) -> u32 {
    (hash % u64::from(n)) as u32
}

/// xxHash64 key hasher
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct XxHasher {
    seed: u64,
}

impl XxHasher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_seed(seed: u64) -> Self {
        Self { seed }
    }
}

impl KeyHasher for XxHasher {
    fn hash(&self, key: &Key) -> u64 {
        key.with_canonical_bytes(|bytes| xxh64(bytes, self.seed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_consistent_hashing() {
        let hasher = XxHasher::new();
        let key = Key::from("order-123");
        let hash = hasher.hash(&key);

        for _ in 0..100 {
            assert_eq!(hasher.hash(&key), hash);
        }
    }

    #[test]
    fn test_hash_is_stable_across_processes() {
        // xxHash64 reference values, seed 0
        let hasher = XxHasher::new();
        assert_eq!(hasher.hash(&Key::from("")), 0xEF46_DB37_51D8_E999);
        assert_eq!(hasher.hash(&Key::from("a")), 0xD24E_C4F1_A98C_6E5B);
    }

    #[test]
    fn test_seed_changes_hash() {
        let key = Key::from("device-7");
        assert_ne!(XxHasher::new().hash(&key), XxHasher::with_seed(42).hash(&key));
    }

    #[test]
    fn test_bucket_range() {
        let hasher = XxHasher::new();
        let keys = ["a", "b", "c", "d", "e", "order-1", "order-2", "user-abc"];
        for key in keys {
            let bucket = hasher.bucket(&Key::from(key), 5).unwrap();
            assert!(bucket < 5, "Bucket {} out of range for key {}", bucket, key);
        }
    }

    #[test]
    fn test_zero_buckets_rejected() {
        let hasher = XxHasher::new();
        let err = hasher.bucket(&Key::from("a"), 0).unwrap_err();
        assert!(matches!(err, Error::InvalidPartitionCount(0)));
    }

    #[test]
    fn test_distribution() {
        let hasher = XxHasher::new();
        let mut counts: HashMap<u32, u32> = HashMap::new();

        for i in 0..10000 {
            let key = Key::from(format!("key-{}", i));
            *counts.entry(hasher.bucket(&key, 4).unwrap()).or_insert(0) += 1;
        }

        // Each bucket should have roughly 25% (allow 20-30%)
        for bucket in 0..4 {
            let count = counts.get(&bucket).unwrap_or(&0);
            let percentage = (*count as f64 / 10000.0) * 100.0;
            assert!(
                percentage > 20.0 && percentage < 30.0,
                "Bucket {} has {}% which is outside expected range",
                bucket,
                percentage
            );
        }
    }

    #[test]
    fn test_integer_and_string_keys_hash_independently() {
        let hasher = XxHasher::new();
        // Collisions are tolerated, but these encodings differ in length
        assert_ne!(hasher.hash(&Key::Int(1)), hasher.hash(&Key::from("1")));
    }
}
