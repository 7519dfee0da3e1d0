//! Dataset profiling
//!
//! Produces the totals the solver needs: row counts, distinct keys and the
//! heaviest key. The heaviest key matters because a key is never split, so
//! no partition count can put fewer than its rows into one partition.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::{Deadline, ProfileConfig};
use crate::dataset::Dataset;
use crate::errors::{Error, Result};
use crate::extractor::KeyExtractor;
use crate::models::Key;
use crate::sketch::{HyperLogLog, MisraGries};

/// Rows between deadline checks
const DEADLINE_CHECK_INTERVAL: usize = 4096;

/// Summary of one dataset snapshot for one key column
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub key_column: String,
    /// Every row seen, including rows without the key
    pub total_rows: u64,
    pub distinct_keys: u64,
    /// True when `distinct_keys` is an estimate
    pub distinct_keys_estimated: bool,
    /// Relative standard error of an estimated `distinct_keys`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distinct_keys_standard_error: Option<f64>,
    /// Rows of the heaviest key
    ///
    /// Always an exact count. In approximate mode it covers the heavy-hitter
    /// candidates only; any other key holds at most
    /// [`untracked_key_bound`](Profile::untracked_key_bound) rows.
    pub max_rows_for_any_single_key: u64,
    pub heaviest_key: Option<Key>,
    /// Rows without a value in the key column
    pub skipped_rows: u64,
    /// Exact per-key counts sorted by key; exact mode only
    #[serde(skip)]
    key_counts: Option<Vec<(Key, u64)>>,
    /// Exact counts of the heavy-hitter candidates; approximate mode only
    #[serde(skip)]
    heavy_counts: Option<Vec<(Key, u64)>>,
    #[serde(skip)]
    untracked_key_bound: u64,
}

impl Profile {
    /// Rows that carry a key and so land in some partition
    pub fn keyed_rows(&self) -> u64 {
        self.total_rows - self.skipped_rows
    }

    /// Exact key→count table, sorted by key
    pub fn key_counts(&self) -> Option<&[(Key, u64)]> {
        self.key_counts.as_deref()
    }

    pub fn is_exact(&self) -> bool {
        !self.distinct_keys_estimated
    }

    /// Number of keys known to hold more than `threshold` rows
    ///
    /// In approximate mode only the heavy-hitter candidates are counted, so
    /// this never over-reports.
    pub fn keys_above(&self, threshold: u64) -> u64 {
        self.key_counts
            .as_deref()
            .or(self.heavy_counts.as_deref())
            .map_or(0, |counts| counts.iter().filter(|(_, c)| *c > threshold).count() as u64)
    }

    /// Most rows a key without an exact count could hold
    ///
    /// Zero in exact mode. In approximate mode this is the Misra–Gries
    /// undercount: a key outside the candidate set appeared at most this
    /// many times.
    pub fn untracked_key_bound(&self) -> u64 {
        self.untracked_key_bound
    }
}

/// Profiles datasets by key column
#[derive(Debug, Clone, Default)]
pub struct DatasetProfiler {
    config: ProfileConfig,
}

impl DatasetProfiler {
    pub fn new(config: ProfileConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ProfileConfig {
        &self.config
    }

    pub fn profile<D>(&self, dataset: &D, column: &str) -> Result<Profile>
    where
        D: Dataset + ?Sized,
    {
        self.profile_until(dataset, column, &Deadline::none())
    }

    /// Profile, failing with `DeadlineExceeded` if `deadline` passes
    pub fn profile_until<D>(&self, dataset: &D, column: &str, deadline: &Deadline) -> Result<Profile>
    where
        D: Dataset + ?Sized,
    {
        let extractor = KeyExtractor::new(column);
        let profile = if self.config.exact_counting {
            self.profile_exact(dataset, &extractor, deadline)?
        } else {
            self.profile_approximate(dataset, &extractor, deadline)?
        };

        if profile.skipped_rows > 0 {
            warn!(
                column = %column,
                skipped_rows = profile.skipped_rows,
                total_rows = profile.total_rows,
                "Rows without partition key skipped"
            );
        }
        info!(
            column = %column,
            total_rows = profile.total_rows,
            distinct_keys = profile.distinct_keys,
            estimated = profile.distinct_keys_estimated,
            max_rows_for_any_single_key = profile.max_rows_for_any_single_key,
            "Profiled dataset"
        );

        Ok(profile)
    }

    fn profile_exact<D>(&self, dataset: &D, extractor: &KeyExtractor, deadline: &Deadline) -> Result<Profile>
    where
        D: Dataset + ?Sized,
    {
        let capacity = dataset.len_hint().unwrap_or(0).min(1 << 16);
        let mut counts: FxHashMap<Key, u64> =
            FxHashMap::with_capacity_and_hasher(capacity, Default::default());
        let mut total_rows = 0u64;
        let mut skipped_rows = 0u64;

        for (i, key) in extractor.extract_all(dataset).enumerate() {
            if i % DEADLINE_CHECK_INTERVAL == 0 {
                deadline.check()?;
            }
            total_rows += 1;
            match key {
                Some(key) => *counts.entry(key).or_insert(0) += 1,
                None => skipped_rows += 1,
            }
        }
        check_usable(extractor.column(), total_rows, skipped_rows)?;

        let mut key_counts: Vec<(Key, u64)> = counts.into_iter().collect();
        key_counts.sort_unstable_by(|a, b| a.0.cmp(&b.0));

        let heaviest = heaviest_entry(&key_counts);
        debug!(distinct_keys = key_counts.len(), "Exact key counts built");

        Ok(Profile {
            key_column: extractor.column().to_string(),
            total_rows,
            distinct_keys: key_counts.len() as u64,
            distinct_keys_estimated: false,
            distinct_keys_standard_error: None,
            max_rows_for_any_single_key: heaviest.as_ref().map_or(0, |h| h.1),
            heaviest_key: heaviest.map(|h| h.0),
            skipped_rows,
            key_counts: Some(key_counts),
            heavy_counts: None,
            untracked_key_bound: 0,
        })
    }

    fn profile_approximate<D>(
        &self,
        dataset: &D,
        extractor: &KeyExtractor,
        deadline: &Deadline,
    ) -> Result<Profile>
    where
        D: Dataset + ?Sized,
    {
        let mut hll = HyperLogLog::new(self.config.hll_precision);
        let mut heavy = MisraGries::new(self.config.heavy_hitter_capacity);
        let mut total_rows = 0u64;
        let mut skipped_rows = 0u64;

        for (i, key) in extractor.extract_all(dataset).enumerate() {
            if i % DEADLINE_CHECK_INTERVAL == 0 {
                deadline.check()?;
            }
            total_rows += 1;
            match key {
                Some(key) => {
                    hll.insert(&key);
                    heavy.insert(key);
                }
                None => skipped_rows += 1,
            }
        }
        check_usable(extractor.column(), total_rows, skipped_rows)?;

        let keyed_rows = total_rows - skipped_rows;
        let distinct_keys = (hll.estimate().round() as u64).clamp(1, keyed_rows);

        // Second pass: exact counts for the candidates the summary kept
        let mut candidates: FxHashMap<Key, u64> = heavy.keys().map(|key| (key.clone(), 0)).collect();
        for (i, key) in extractor.extract_all(dataset).enumerate() {
            if i % DEADLINE_CHECK_INTERVAL == 0 {
                deadline.check()?;
            }
            if let Some(key) = key {
                if let Some(count) = candidates.get_mut(&key) {
                    *count += 1;
                }
            }
        }
        let mut heavy_counts: Vec<(Key, u64)> = candidates.into_iter().collect();
        heavy_counts.sort_unstable_by(|a, b| a.0.cmp(&b.0));

        let heaviest = heaviest_entry(&heavy_counts);
        debug!(
            distinct_keys,
            hll_precision = hll.precision(),
            candidates = heavy_counts.len(),
            untracked_key_bound = heavy.max_undercount(),
            "Approximate profile built"
        );

        Ok(Profile {
            key_column: extractor.column().to_string(),
            total_rows,
            distinct_keys,
            distinct_keys_estimated: true,
            distinct_keys_standard_error: Some(hll.standard_error()),
            max_rows_for_any_single_key: heaviest.as_ref().map_or(0, |h| h.1),
            heaviest_key: heaviest.map(|h| h.0),
            skipped_rows,
            key_counts: None,
            heavy_counts: Some(heavy_counts),
            untracked_key_bound: heavy.max_undercount(),
        })
    }
}

/// Largest count in a key-sorted table; the smaller key wins ties
fn heaviest_entry(counts: &[(Key, u64)]) -> Option<(Key, u64)> {
    counts
        .iter()
        .fold(None::<&(Key, u64)>, |best, entry| match best {
            Some(b) if b.1 >= entry.1 => best,
            _ => Some(entry),
        })
        .cloned()
}

fn check_usable(column: &str, total_rows: u64, skipped_rows: u64) -> Result<()> {
    if total_rows == 0 {
        return Err(Error::EmptyDataset);
    }
    if skipped_rows == total_rows {
        return Err(Error::NoUsableKey {
            column: column.to_string(),
        });
    }
    Ok(())
}
