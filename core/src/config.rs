//! Sizing configuration
//!
//! Plain values passed into the profiler and solver. Every field has a
//! default so partial JSON configs deserialize.

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::errors::{Error, Result};
use crate::sketch::DEFAULT_PRECISION;

/// Profiling options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileConfig {
    /// Exact per-key counting (default) or bounded-memory estimation
    #[serde(default = "default_exact_counting")]
    pub exact_counting: bool,
    /// HyperLogLog precision used when not counting exactly
    #[serde(default = "default_hll_precision")]
    pub hll_precision: u8,
    /// Misra–Gries counters used when not counting exactly
    #[serde(default = "default_heavy_hitter_capacity")]
    pub heavy_hitter_capacity: usize,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            exact_counting: default_exact_counting(),
            hll_precision: default_hll_precision(),
            heavy_hitter_capacity: default_heavy_hitter_capacity(),
        }
    }
}

/// Solver options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolverConfig {
    #[serde(flatten)]
    pub profile: ProfileConfig,
    /// Number of candidate partition counts tried (default: 10)
    #[serde(default = "default_search_window")]
    pub search_window: u32,
    /// Gap between consecutive candidates (default: 1)
    #[serde(default = "default_search_step")]
    pub search_step: u32,
    /// Overall solve deadline in milliseconds
    #[serde(default)]
    pub deadline_ms: Option<u64>,
    /// Worker threads for candidate simulation (default: available parallelism)
    #[serde(default)]
    pub parallelism: Option<usize>,
    /// Partition hash seed (default: 0)
    #[serde(default)]
    pub hash_seed: u64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            profile: ProfileConfig::default(),
            search_window: default_search_window(),
            search_step: default_search_step(),
            deadline_ms: None,
            parallelism: None,
            hash_seed: 0,
        }
    }
}

impl SolverConfig {
    pub fn validate(&self) -> Result<()> {
        if self.search_window == 0 {
            return Err(Error::InvalidConfig("search_window must be > 0".into()));
        }
        if self.search_step == 0 {
            return Err(Error::InvalidConfig("search_step must be > 0".into()));
        }
        if self.parallelism == Some(0) {
            return Err(Error::InvalidConfig("parallelism must be > 0".into()));
        }
        Ok(())
    }

    /// Start the deadline clock for one solve
    pub fn deadline(&self) -> Deadline {
        Deadline::after(self.deadline_ms)
    }
}

fn default_exact_counting() -> bool {
    true
}

fn default_hll_precision() -> u8 {
    DEFAULT_PRECISION
}

fn default_heavy_hitter_capacity() -> usize {
    1024
}

fn default_search_window() -> u32 {
    10
}

fn default_search_step() -> u32 {
    1
}

/// Cooperative deadline checked between units of work
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    limit: Option<(Instant, u64)>,
}

impl Deadline {
    pub fn none() -> Self {
        Self { limit: None }
    }

    pub fn after(deadline_ms: Option<u64>) -> Self {
        Self {
            limit: deadline_ms.map(|ms| (Instant::now() + Duration::from_millis(ms), ms)),
        }
    }

    /// Fails with `DeadlineExceeded` once the deadline has passed
    pub fn check(&self) -> Result<()> {
        match self.limit {
            Some((at, deadline_ms)) if Instant::now() >= at => {
                Err(Error::DeadlineExceeded { deadline_ms })
            }
            _ => Ok(()),
        }
    }
}
