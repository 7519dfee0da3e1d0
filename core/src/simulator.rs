//! Histograms of rows per partition for a candidate partition count
//!
//! All rows of a key hash to the same bucket, so a histogram can be built
//! from the profiled key→count table without touching the raw rows. The
//! raw-row path exists for approximate profiles, which keep no table.

use tracing::trace;

use crate::dataset::{Dataset, Row};
use crate::errors::{Error, Result};
use crate::hasher::{reduce, KeyHasher};
use crate::models::{Histogram, Key, MAX_PARTITION_COUNT};
use crate::profiler::Profile;

/// Profiled key counts with each key hashed once up front
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashedKeyTable {
    /// `(hash, rows)` per distinct key
    entries: Vec<(u64, u64)>,
}

impl HashedKeyTable {
    pub fn build<'a, H>(hasher: &H, counts: impl IntoIterator<Item = &'a (Key, u64)>) -> Self
    where
        H: KeyHasher + ?Sized,
    {
        Self {
            entries: counts
                .into_iter()
                .map(|(key, rows)| (hasher.hash(key), *rows))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// What a simulation runs over
pub enum SimulationInput<'a, D: ?Sized> {
    /// Pre-hashed key counts (preferred)
    Keys(&'a HashedKeyTable),
    /// Raw rows, re-extracting and re-hashing each key
    Rows { dataset: &'a D, column: &'a str },
}

impl<D: ?Sized> Clone for SimulationInput<'_, D> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<D: ?Sized> Copy for SimulationInput<'_, D> {}

impl<'a, D> SimulationInput<'a, D>
where
    D: Dataset + ?Sized,
{
    /// Key table when the profile is exact, raw rows otherwise
    pub fn for_profile(
        profile: &Profile,
        table: Option<&'a HashedKeyTable>,
        dataset: &'a D,
        column: &'a str,
    ) -> Self {
        match table {
            Some(table) if profile.is_exact() => SimulationInput::Keys(table),
            _ => SimulationInput::Rows { dataset, column },
        }
    }
}

/// Computes per-partition row counts with a given hasher
#[derive(Debug, Clone, Copy)]
pub struct PartitionSimulator<'h, H: ?Sized> {
    hasher: &'h H,
}

impl<'h, H> PartitionSimulator<'h, H>
where
    H: KeyHasher + ?Sized,
{
    pub fn new(hasher: &'h H) -> Self {
        Self { hasher }
    }

    /// Histogram from the pre-hashed key table
    pub fn simulate_keys(&self, table: &HashedKeyTable, partition_count: u32) -> Result<Histogram> {
        check_count(partition_count)?;
        let mut histogram = Histogram::zeroed(partition_count);
        for &(hash, rows) in &table.entries {
            histogram.add(reduce(hash, partition_count), rows);
        }
        trace!(partition_count, max = histogram.max(), "Simulated from key table");
        Ok(histogram)
    }

    /// Histogram from raw rows; rows without the key are not counted
    pub fn simulate_rows<D>(&self, dataset: &D, column: &str, partition_count: u32) -> Result<Histogram>
    where
        D: Dataset + ?Sized,
    {
        check_count(partition_count)?;
        let mut histogram = Histogram::zeroed(partition_count);
        for key in dataset.rows().filter_map(|row| row.key(column)) {
            histogram.add(reduce(self.hasher.hash(&key), partition_count), 1);
        }
        trace!(partition_count, max = histogram.max(), "Simulated from raw rows");
        Ok(histogram)
    }

    pub fn simulate<D>(&self, input: SimulationInput<'_, D>, partition_count: u32) -> Result<Histogram>
    where
        D: Dataset + ?Sized,
    {
        match input {
            SimulationInput::Keys(table) => self.simulate_keys(table, partition_count),
            SimulationInput::Rows { dataset, column } => {
                self.simulate_rows(dataset, column, partition_count)
            }
        }
    }
}

fn check_count(partition_count: u32) -> Result<()> {
    if partition_count == 0 || partition_count > MAX_PARTITION_COUNT {
        return Err(Error::InvalidPartitionCount(partition_count));
    }
    Ok(())
}
