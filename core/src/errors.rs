//! Error types for PartitionSizer

use serde::Serialize;
use thiserror::Error;

use crate::models::Histogram;

/// Result type alias using PartitionSizer Error
pub type Result<T> = std::result::Result<T, Error>;

/// Diagnostics carried by [`Error::SearchExhausted`]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchDiagnostics {
    /// Partition key column the search ran against
    pub key_column: String,
    /// Row ceiling no candidate satisfied
    pub max_rows_per_partition: u64,
    /// First candidate partition count tried (the lower bound)
    pub first_candidate: u32,
    /// Last candidate partition count tried
    pub last_candidate: u32,
    /// Number of candidates simulated
    pub candidates_evaluated: u32,
    /// Candidate whose worst partition came closest to the ceiling
    pub best_partition_count: u32,
    /// Histogram of the best candidate
    pub best_histogram: Histogram,
    /// Rows that had no value in the key column
    pub skipped_rows: u64,
}

/// PartitionSizer error types
#[derive(Error, Debug)]
pub enum Error {
    /// Dataset has no rows
    #[error("Dataset is empty")]
    EmptyDataset,

    /// Key column is absent on every row
    #[error("No usable key: column '{column}' is absent on every row")]
    NoUsableKey { column: String },

    /// A single key alone exceeds the row ceiling
    #[error(
        "Infeasible: key {key} in column '{column}' holds {key_rows} rows, above the limit of {max_rows_per_partition}"
    )]
    Infeasible {
        column: String,
        key: String,
        key_rows: u64,
        max_rows_per_partition: u64,
    },

    /// Bounded search found no satisfying candidate
    #[error(
        "Search exhausted: no partition count in {}..={} keeps every partition within {} rows (best: {} partitions, max {})",
        .0.first_candidate,
        .0.last_candidate,
        .0.max_rows_per_partition,
        .0.best_partition_count,
        .0.best_histogram.max()
    )]
    SearchExhausted(Box<SearchDiagnostics>),

    /// Solve ran past its deadline
    #[error("Deadline of {deadline_ms}ms exceeded")]
    DeadlineExceeded { deadline_ms: u64 },

    /// Partition count of zero or above `MAX_PARTITION_COUNT`
    #[error("Invalid partition count: {0} (must be between 1 and {max})", max = crate::models::MAX_PARTITION_COUNT)]
    InvalidPartitionCount(u32),

    /// Partition index outside the scheme
    #[error("Invalid partition index {index} for {partition_count} partitions")]
    InvalidPartitionIndex { index: u32, partition_count: u32 },

    /// Configuration error
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// JSON Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Returns the stable error code for reports
    pub fn code(&self) -> &'static str {
        match self {
            Error::EmptyDataset => "empty_dataset",
            Error::NoUsableKey { .. } => "no_usable_key",
            Error::Infeasible { .. } => "infeasible",
            Error::SearchExhausted(_) => "search_exhausted",
            Error::DeadlineExceeded { .. } => "deadline_exceeded",
            Error::InvalidPartitionCount(_) => "invalid_partition_count",
            Error::InvalidPartitionIndex { .. } => "invalid_partition_index",
            Error::InvalidConfig(_) => "invalid_config",
            Error::Serialization(_) => "serialization_error",
            Error::Io(_) => "io_error",
            Error::Internal(_) => "internal_error",
        }
    }

    /// Returns the process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::EmptyDataset => 3,
            Error::NoUsableKey { .. } => 3,
            Error::Infeasible { .. } => 4,
            Error::SearchExhausted(_) => 5,
            Error::DeadlineExceeded { .. } => 6,
            Error::InvalidPartitionCount(_) => 2,
            Error::InvalidPartitionIndex { .. } => 2,
            Error::InvalidConfig(_) => 2,
            Error::Serialization(_) => 2,
            Error::Io(_) => 1,
            Error::Internal(_) => 1,
        }
    }

    /// Diagnostic payload a caller should surface alongside the message
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            Error::Infeasible {
                key,
                key_rows,
                max_rows_per_partition,
                ..
            } => Some(serde_json::json!({
                "key": key,
                "keyRows": key_rows,
                "maxRowsPerPartition": max_rows_per_partition,
            })),
            Error::SearchExhausted(diagnostics) => serde_json::to_value(diagnostics.as_ref()).ok(),
            Error::DeadlineExceeded { deadline_ms } => Some(serde_json::json!({
                "deadlineMs": deadline_ms,
            })),
            _ => None,
        }
    }
}
