//! Minimum partition count search
//!
//! 1. Profile the dataset once.
//! 2. Reject constraints no partition count can meet (a key that alone
//!    exceeds the ceiling).
//! 3. Derive a lower bound, then simulate a bounded window of candidates
//!    in parallel and accept the smallest one whose fullest partition fits.
//!
//! The whole window is simulated before choosing, so the answer never
//! depends on thread scheduling.

use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use tracing::{debug, info, warn};

use crate::config::{Deadline, ProfileConfig, SolverConfig};
use crate::dataset::Dataset;
use crate::errors::{Error, Result, SearchDiagnostics};
use crate::hasher::{KeyHasher, XxHasher};
use crate::models::{Histogram, SizingResult, MAX_PARTITION_COUNT};
use crate::profiler::{DatasetProfiler, Profile};
use crate::simulator::{HashedKeyTable, PartitionSimulator, SimulationInput};
use crate::validator::PartitionKeyValidator;

/// Smallest partition count that is certainly needed
///
/// The larger of:
/// - `ceil(keyed_rows / max_rows)`: partitions needed by volume alone;
/// - keys holding more than `max_rows / 2` rows: no two of them can share
///   a partition.
///
/// Never below 1 and never above the true minimum.
pub fn lower_bound(profile: &Profile, max_rows_per_partition: u64) -> u32 {
    let max_rows = max_rows_per_partition.max(1);
    let by_volume = profile.keyed_rows().div_ceil(max_rows);
    let by_heavy_keys = profile.keys_above(max_rows / 2);
    by_volume.max(by_heavy_keys).clamp(1, u64::from(u32::MAX)) as u32
}

/// Fails with `Infeasible` when the profile's heaviest key alone exceeds
/// the ceiling
fn check_feasible(profile: &Profile, max_rows: u64) -> Result<()> {
    if profile.max_rows_for_any_single_key <= max_rows {
        return Ok(());
    }
    let column = profile.key_column.as_str();
    let key = profile
        .heaviest_key
        .as_ref()
        .map(|k| k.to_string())
        .unwrap_or_default();
    warn!(
        column = %column,
        key = %key,
        key_rows = profile.max_rows_for_any_single_key,
        max_rows,
        "Single key exceeds partition limit"
    );
    Err(Error::Infeasible {
        column: column.to_string(),
        key,
        key_rows: profile.max_rows_for_any_single_key,
        max_rows_per_partition: max_rows,
    })
}

/// Finds the smallest hash partition count that keeps every partition
/// within a row ceiling
#[derive(Debug, Clone)]
pub struct MinimumPartitionSolver<H = XxHasher> {
    config: SolverConfig,
    hasher: H,
}

impl MinimumPartitionSolver<XxHasher> {
    /// Solver using xxHash64 seeded from `config.hash_seed`
    pub fn new(config: SolverConfig) -> Self {
        let hasher = XxHasher::with_seed(config.hash_seed);
        Self { config, hasher }
    }
}

impl Default for MinimumPartitionSolver<XxHasher> {
    fn default() -> Self {
        Self::new(SolverConfig::default())
    }
}

impl<H: KeyHasher> MinimumPartitionSolver<H> {
    pub fn with_hasher(config: SolverConfig, hasher: H) -> Self {
        Self { config, hasher }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    pub fn hasher(&self) -> &H {
        &self.hasher
    }

    /// Profile `dataset` by `column` and find the minimum partition count
    pub fn solve<D>(&self, dataset: &D, column: &str, max_rows_per_partition: u64) -> Result<SizingResult>
    where
        D: Dataset + Sync + ?Sized,
    {
        self.check_request(max_rows_per_partition)?;
        let deadline = self.config.deadline();
        let profile = DatasetProfiler::new(self.config.profile).profile_until(dataset, column, &deadline)?;
        self.search(dataset, &profile, max_rows_per_partition, &deadline)
    }

    /// Like [`solve`](Self::solve), after checking the downstream
    /// grouping/join columns against the key. Their warnings are attached
    /// to the result.
    pub fn solve_checked<D, I, S>(
        &self,
        dataset: &D,
        column: &str,
        max_rows_per_partition: u64,
        downstream_columns: I,
    ) -> Result<SizingResult>
    where
        D: Dataset + Sync + ?Sized,
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut warnings = PartitionKeyValidator::new(column).validate(downstream_columns);
        let mut result = self.solve(dataset, column, max_rows_per_partition)?;
        warnings.append(&mut result.warnings);
        result.warnings = warnings;
        Ok(result)
    }

    /// Search using a profile the caller already computed for `dataset`
    pub fn solve_profiled<D>(
        &self,
        dataset: &D,
        profile: &Profile,
        max_rows_per_partition: u64,
    ) -> Result<SizingResult>
    where
        D: Dataset + Sync + ?Sized,
    {
        self.solve_profiled_until(dataset, profile, max_rows_per_partition, &self.config.deadline())
    }

    /// Search with a profile and a deadline that is already running
    pub fn solve_profiled_until<D>(
        &self,
        dataset: &D,
        profile: &Profile,
        max_rows_per_partition: u64,
        deadline: &Deadline,
    ) -> Result<SizingResult>
    where
        D: Dataset + Sync + ?Sized,
    {
        self.check_request(max_rows_per_partition)?;
        self.search(dataset, profile, max_rows_per_partition, deadline)
    }

    fn check_request(&self, max_rows_per_partition: u64) -> Result<()> {
        self.config.validate()?;
        if max_rows_per_partition == 0 {
            return Err(Error::InvalidConfig("max_rows_per_partition must be > 0".into()));
        }
        Ok(())
    }

    fn search<D>(
        &self,
        dataset: &D,
        profile: &Profile,
        max_rows: u64,
        deadline: &Deadline,
    ) -> Result<SizingResult>
    where
        D: Dataset + Sync + ?Sized,
    {
        let column = profile.key_column.as_str();

        check_feasible(profile, max_rows)?;

        let first = lower_bound(profile, max_rows);
        let candidates = self.candidates(first)?;
        info!(
            column = %column,
            max_rows,
            lower_bound = first,
            candidates = candidates.len(),
            "Searching partition counts"
        );

        let table = profile
            .key_counts()
            .map(|counts| HashedKeyTable::build(&self.hasher, counts));
        let input = SimulationInput::for_profile(profile, table.as_ref(), dataset, column);
        let outcomes = self.simulate_window(&candidates, input, deadline)?;

        if let Some((count, histogram)) = outcomes.iter().find(|(_, h)| h.fits(max_rows)) {
            info!(
                column = %column,
                partition_count = count,
                max_rows_in_partition = histogram.max(),
                skew = histogram.skew(),
                "Minimum partition count found"
            );
            return Ok(SizingResult {
                minimum_partition_count: *count,
                per_partition_row_counts: histogram.clone(),
                key_column_used: column.to_string(),
                warnings: PartitionKeyValidator::new(column).check_coverage(profile),
            });
        }

        // An approximate profile holds exact counts for its heavy-hitter
        // candidates only. Before reporting exhaustion, rule out a key outside
        // them that alone breaks the ceiling.
        if profile.untracked_key_bound() > max_rows {
            info!(
                column = %column,
                untracked_key_bound = profile.untracked_key_bound(),
                "Counting keys exactly before reporting exhaustion"
            );
            let exact = DatasetProfiler::new(ProfileConfig {
                exact_counting: true,
                ..self.config.profile
            })
            .profile_until(dataset, column, deadline)?;
            check_feasible(&exact, max_rows)?;
        }

        let (best_count, best_histogram) = outcomes
            .iter()
            .min_by_key(|(n, h)| (h.max(), *n))
            .cloned()
            .ok_or_else(|| Error::Internal("empty candidate window".into()))?;
        warn!(
            column = %column,
            best_partition_count = best_count,
            best_max = best_histogram.max(),
            max_rows,
            "No candidate within the search window fits"
        );
        Err(Error::SearchExhausted(Box::new(SearchDiagnostics {
            key_column: column.to_string(),
            max_rows_per_partition: max_rows,
            first_candidate: first,
            last_candidate: candidates.last().copied().unwrap_or(first),
            candidates_evaluated: candidates.len() as u32,
            best_partition_count: best_count,
            best_histogram,
            skipped_rows: profile.skipped_rows,
        })))
    }

    /// `search_window` counts from `first`, `search_step` apart
    fn candidates(&self, first: u32) -> Result<Vec<u32>> {
        let candidates: Vec<u32> = (0..u64::from(self.config.search_window))
            .map(|i| u64::from(first) + i * u64::from(self.config.search_step))
            .take_while(|&n| n <= u64::from(MAX_PARTITION_COUNT))
            .map(|n| n as u32)
            .collect();
        if candidates.is_empty() {
            return Err(Error::InvalidPartitionCount(first));
        }
        Ok(candidates)
    }

    fn simulate_window<D>(
        &self,
        candidates: &[u32],
        input: SimulationInput<'_, D>,
        deadline: &Deadline,
    ) -> Result<Vec<(u32, Histogram)>>
    where
        D: Dataset + Sync + ?Sized,
    {
        let simulator = PartitionSimulator::new(&self.hasher);
        let run = || {
            candidates
                .par_iter()
                .map(|&n| -> Result<(u32, Histogram)> {
                    deadline.check()?;
                    let histogram = simulator.simulate(input, n)?;
                    debug!(
                        partition_count = n,
                        max = histogram.max(),
                        skew = histogram.skew(),
                        "Candidate simulated"
                    );
                    Ok((n, histogram))
                })
                .collect::<Result<Vec<_>>>()
        };

        match self.config.parallelism {
            Some(threads) => ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()
                .map_err(|e| Error::Internal(format!("failed to build thread pool: {}", e)))?
                .install(run),
            None => run(),
        }
    }
}
