//! Bounded-memory summaries for approximate profiling
//!
//! - `HyperLogLog`: distinct-key estimate in `2^p` bytes.
//! - `MisraGries`: heavy-hitter counts that never over-count, so a key
//!   reported above a row ceiling truly is above it.

use rustc_hash::FxHashMap;
use xxhash_rust::xxh64::xxh64;

use crate::models::Key;

/// Seed for sketch hashing, independent of the partition hash seed
const SKETCH_SEED: u64 = 0x9E37_79B9_7F4A_7C15;

pub const MIN_PRECISION: u8 = 4;
pub const MAX_PRECISION: u8 = 18;
pub const DEFAULT_PRECISION: u8 = 14;

/// HyperLogLog sketch for approximate distinct-count estimation.
///
/// Uses 2^p registers (p=14 → 16384 registers → 16KB).
/// Standard error: 1.04 / sqrt(m) ≈ 0.81% for p=14.
#[derive(Debug, Clone)]
pub struct HyperLogLog {
    registers: Vec<u8>,
    p: u8,
}

impl HyperLogLog {
    /// Create a sketch with precision `p`, clamped to 4..=18
    pub fn new(p: u8) -> Self {
        let p = p.clamp(MIN_PRECISION, MAX_PRECISION);
        Self {
            registers: vec![0; 1 << p],
            p,
        }
    }

    pub fn precision(&self) -> u8 {
        self.p
    }

    pub fn insert(&mut self, key: &Key) {
        let hash = key.with_canonical_bytes(|bytes| xxh64(bytes, SKETCH_SEED));
        self.insert_hash(hash);
    }

    /// Insert a pre-hashed value
    pub fn insert_hash(&mut self, hash: u64) {
        let p = u32::from(self.p);
        let idx = (hash >> (64 - p)) as usize;
        // Sentinel bit caps rho at 64 - p + 1
        let remaining = (hash << p) | (1_u64 << (p - 1));
        let rho = remaining.leading_zeros() as u8 + 1;
        if rho > self.registers[idx] {
            self.registers[idx] = rho;
        }
    }

    /// Estimated number of distinct keys inserted
    pub fn estimate(&self) -> f64 {
        let m = self.registers.len() as f64;
        let alpha = match self.registers.len() {
            16 => 0.673,
            32 => 0.697,
            64 => 0.709,
            _ => 0.7213 / (1.0 + 1.079 / m),
        };

        let raw = alpha * m * m
            / self
                .registers
                .iter()
                .map(|&r| 2f64.powi(-i32::from(r)))
                .sum::<f64>();

        // Small range correction (linear counting)
        let zeros = self.registers.iter().filter(|&&r| r == 0).count();
        if raw <= 2.5 * m && zeros > 0 {
            m * (m / zeros as f64).ln()
        } else {
            raw
        }
    }

    /// Relative standard error of `estimate`
    pub fn standard_error(&self) -> f64 {
        1.04 / (self.registers.len() as f64).sqrt()
    }
}

/// Misra–Gries frequent-items summary with at most `capacity` counters
///
/// For every key, `counter <= true count <= counter + max_undercount()`,
/// where an untracked key's counter is zero.
#[derive(Debug, Clone)]
pub struct MisraGries {
    capacity: usize,
    counters: FxHashMap<Key, u64>,
    decrements: u64,
}

impl MisraGries {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            counters: FxHashMap::with_capacity_and_hasher(capacity + 1, Default::default()),
            decrements: 0,
        }
    }

    pub fn insert(&mut self, key: Key) {
        if let Some(count) = self.counters.get_mut(&key) {
            *count += 1;
            return;
        }
        if self.counters.len() < self.capacity {
            self.counters.insert(key, 1);
            return;
        }
        // Full: the new key cancels one occurrence of every tracked key
        self.decrements += 1;
        self.counters.retain(|_, count| {
            *count -= 1;
            *count > 0
        });
    }

    /// Largest possible gap between a counter and the true count
    pub fn max_undercount(&self) -> u64 {
        self.decrements
    }

    /// Currently tracked keys: every key with more than `n / (capacity + 1)`
    /// of the `n` inserted rows is among them
    pub fn keys(&self) -> impl Iterator<Item = &Key> {
        self.counters.keys()
    }
}
