//! JSON documents printed by the CLI

use chrono::{DateTime, Utc};
use partsizer_core::{Histogram, Profile, SizingResult, Warning};
use serde::{Deserialize, Serialize};

/// Output of `solve`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SizingReport {
    pub generated_at: DateTime<Utc>,
    pub profile: Profile,
    pub result: SizingResult,
}

impl SizingReport {
    pub fn new(profile: Profile, result: SizingResult) -> Self {
        Self {
            generated_at: Utc::now(),
            profile,
            result,
        }
    }
}

/// Output of `simulate`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationReport {
    pub key_column: String,
    pub partition_count: u32,
    pub per_partition_row_counts: Histogram,
    pub max_rows_in_partition: u64,
    pub heaviest_partition: Option<u32>,
    /// Fullest partition relative to the mean; 1.0 is perfectly even
    pub skew: f64,
}

impl SimulationReport {
    pub fn new(key_column: impl Into<String>, histogram: Histogram) -> Self {
        Self {
            key_column: key_column.into(),
            partition_count: histogram.partition_count(),
            max_rows_in_partition: histogram.max(),
            heaviest_partition: histogram.heaviest_partition().map(|(i, _)| i),
            skew: histogram.skew(),
            per_partition_row_counts: histogram,
        }
    }
}

/// Output of `validate`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub key_column: String,
    pub ok: bool,
    pub warnings: Vec<Warning>,
}

impl ValidationReport {
    pub fn new(key_column: impl Into<String>, warnings: Vec<Warning>) -> Self {
        Self {
            key_column: key_column.into(),
            ok: warnings.is_empty(),
            warnings,
        }
    }
}

/// Error document written to stderr
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}
