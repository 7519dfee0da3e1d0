//! Partition-key pre-checks
//!
//! A partition only keeps a logical group intact when the group is keyed
//! by the partition column. Grouping or joining on any other column after
//! export may split groups across partitions and under-count aggregates.

use tracing::warn;

use crate::models::Warning;
use crate::profiler::Profile;

/// Checks a proposed partition key against its downstream use
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionKeyValidator {
    column: String,
}

impl PartitionKeyValidator {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
        }
    }

    /// One warning per downstream grouping/join column that is not the
    /// partition key. Comparison is exact and case-sensitive.
    pub fn validate<I, S>(&self, downstream_columns: I) -> Vec<Warning>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut mismatched: Vec<String> = downstream_columns
            .into_iter()
            .filter(|c| c.as_ref() != self.column)
            .map(|c| c.as_ref().to_string())
            .collect();
        mismatched.sort();
        mismatched.dedup();

        mismatched
            .iter()
            .map(|grouping| {
                warn!(
                    partition_column = %self.column,
                    grouping_column = %grouping,
                    "Grouping column differs from partition key"
                );
                Warning::grouping_column_mismatch(&self.column, grouping)
            })
            .collect()
    }

    /// Warnings about how well the key covers a profiled dataset
    pub fn check_coverage(&self, profile: &Profile) -> Vec<Warning> {
        let mut warnings = Vec::new();
        if profile.skipped_rows > 0 {
            warnings.push(Warning::partial_key_coverage(
                &self.column,
                profile.skipped_rows,
                profile.total_rows,
            ));
        }
        if profile.distinct_keys_estimated {
            warnings.push(Warning::approximate_profile(
                &self.column,
                profile.distinct_keys_standard_error.unwrap_or_default(),
            ));
        }
        warnings
    }
}
