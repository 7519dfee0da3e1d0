//! PartitionSizer Core Library
//!
//! Sizes hash partitions for bounded-size exports:
//! - Key hashing and partition schemes
//! - Dataset profiling (exact or sketch-based)
//! - Partition histogram simulation
//! - Minimum partition count search
//! - Partition key validation
//! - Error types

pub mod config;
pub mod dataset;
pub mod errors;
pub mod extractor;
pub mod hasher;
pub mod models;
pub mod partitioner;
pub mod profiler;
pub mod simulator;
pub mod sketch;
pub mod solver;
pub mod validator;

pub use config::{Deadline, ProfileConfig, SolverConfig};
pub use dataset::{Dataset, Row};
pub use errors::{Error, Result, SearchDiagnostics};
pub use extractor::KeyExtractor;
pub use hasher::{KeyHasher, XxHasher};
pub use models::*;
pub use partitioner::PartitionScheme;
pub use profiler::{DatasetProfiler, Profile};
pub use simulator::{HashedKeyTable, PartitionSimulator, SimulationInput};
pub use solver::{lower_bound, MinimumPartitionSolver};
pub use validator::PartitionKeyValidator;
