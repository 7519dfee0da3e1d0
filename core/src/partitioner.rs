//! Partition schemes for mapping keys to partitions
//!
//! Hash-mod assignment guarantees every row with the same key lands in the
//! same partition. This is what keeps per-key aggregates correct after an
//! export is split.

use std::num::NonZeroU32;

use crate::dataset::{Dataset, Row};
use crate::errors::{Error, Result};
use crate::hasher::{reduce, KeyHasher, XxHasher};
use crate::models::{Key, MAX_PARTITION_COUNT};

/// Immutable `{partition_count, hasher}` pair
///
/// Assignment is always recomputed from the scheme; nothing is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionScheme<H = XxHasher> {
    partition_count: NonZeroU32,
    hasher: H,
}

impl PartitionScheme<XxHasher> {
    /// Scheme with the default xxHash64 hasher
    pub fn new(partition_count: u32) -> Result<Self> {
        Self::with_hasher(partition_count, XxHasher::new())
    }
}

impl<H: KeyHasher> PartitionScheme<H> {
    pub fn with_hasher(partition_count: u32, hasher: H) -> Result<Self> {
        let partition_count = NonZeroU32::new(partition_count)
            .filter(|n| n.get() <= MAX_PARTITION_COUNT)
            .ok_or(Error::InvalidPartitionCount(partition_count))?;
        Ok(Self {
            partition_count,
            hasher,
        })
    }

    /// Map a key to a partition number (0-based)
    pub fn assign(&self, key: &Key) -> u32 {
        reduce(self.hasher.hash(key), self.partition_count.get())
    }

    /// Get the partition count
    pub fn partition_count(&self) -> u32 {
        self.partition_count.get()
    }

    pub fn hasher(&self) -> &H {
        &self.hasher
    }

    /// Rows of `dataset` assigned to partition `index`, lazily
    ///
    /// This is the export-side filter `hash(key) mod N == index`. Rows
    /// without a value in `column` belong to no partition.
    pub fn slice<'a, D>(
        &'a self,
        dataset: &'a D,
        column: &'a str,
        index: u32,
    ) -> Result<impl Iterator<Item = &'a D::Row> + 'a>
    where
        D: Dataset + ?Sized,
    {
        if index >= self.partition_count() {
            return Err(Error::InvalidPartitionIndex {
                index,
                partition_count: self.partition_count(),
            });
        }
        Ok(dataset
            .rows()
            .filter(move |row| row.key(column).is_some_and(|key| self.assign(&key) == index)))
    }
}
