//! Subcommand handlers
//!
//! Input is loaded on the async runtime; the CPU-bound engine runs on the
//! blocking pool.

use partsizer_core::{
    DatasetProfiler, MinimumPartitionSolver, PartitionKeyValidator, PartitionScheme,
    PartitionSimulator, ProfileConfig, XxHasher,
};
use serde::Serialize;
use tracing::info;

use crate::args::Command;
use crate::error::CliError;
use crate::input::load_records;
use crate::report::{SimulationReport, SizingReport, ValidationReport};

/// What a command prints to stdout
#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    /// One pretty-printed JSON document
    Json(serde_json::Value),
    /// JSON Lines, one row per line
    Lines(Vec<String>),
}

pub async fn run(command: Command) -> Result<Output, CliError> {
    match command {
        Command::Profile {
            dataset,
            approximate,
        } => {
            info!(column = %dataset.column, input = %dataset.input.display(), "Processing profile request");
            let records = load_records(&dataset.input).await?;
            let config = ProfileConfig {
                exact_counting: !approximate,
                ..Default::default()
            };
            let profile = blocking(move || DatasetProfiler::new(config).profile(&records, &dataset.column)).await?;
            json(&profile)
        }

        Command::Simulate {
            dataset,
            partitions,
            hash_seed,
        } => {
            info!(column = %dataset.column, partitions, "Processing simulate request");
            let records = load_records(&dataset.input).await?;
            let report = blocking(move || {
                let hasher = XxHasher::with_seed(hash_seed);
                let histogram = PartitionSimulator::new(&hasher).simulate_rows(&records, &dataset.column, partitions)?;
                Ok(SimulationReport::new(dataset.column, histogram))
            })
            .await?;
            json(&report)
        }

        Command::Solve {
            dataset,
            max_rows,
            group_by,
            solver,
        } => {
            info!(column = %dataset.column, max_rows, "Processing solve request");
            let config = solver.resolve().await?;
            let records = load_records(&dataset.input).await?;
            let column = dataset.column;
            let report = blocking(move || {
                let deadline = config.deadline();
                let mut warnings = PartitionKeyValidator::new(column.as_str()).validate(&group_by);
                let profile = DatasetProfiler::new(config.profile).profile_until(&records, &column, &deadline)?;
                let mut result = MinimumPartitionSolver::new(config).solve_profiled_until(
                    &records,
                    &profile,
                    max_rows,
                    &deadline,
                )?;
                warnings.append(&mut result.warnings);
                result.warnings = warnings;
                Ok(SizingReport::new(profile, result))
            })
            .await?;
            info!(
                minimum_partition_count = report.result.minimum_partition_count,
                warnings = report.result.warnings.len(),
                "Solve complete"
            );
            json(&report)
        }

        Command::Validate { dataset, group_by } => {
            info!(column = %dataset.column, "Processing validate request");
            let records = load_records(&dataset.input).await?;
            let column = dataset.column;
            let report = blocking(move || {
                let validator = PartitionKeyValidator::new(column.as_str());
                let profile = DatasetProfiler::default().profile(&records, &column)?;
                let mut warnings = validator.validate(&group_by);
                warnings.extend(validator.check_coverage(&profile));
                Ok(ValidationReport::new(column, warnings))
            })
            .await?;
            json(&report)
        }

        Command::Slice {
            dataset,
            partitions,
            index,
            hash_seed,
        } => {
            info!(column = %dataset.column, partitions, index, "Processing slice request");
            let records = load_records(&dataset.input).await?;
            let lines = blocking(move || {
                let scheme = PartitionScheme::with_hasher(partitions, XxHasher::with_seed(hash_seed))?;
                let lines = scheme
                    .slice(&records, &dataset.column, index)?
                    .map(serde_json::to_string)
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(lines)
            })
            .await?;
            info!(rows = lines.len(), "Slice written");
            Ok(Output::Lines(lines))
        }
    }
}

/// Run an engine call on the blocking pool
async fn blocking<T, F>(f: F) -> Result<T, CliError>
where
    F: FnOnce() -> partsizer_core::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let value = tokio::task::spawn_blocking(f).await??;
    Ok(value)
}

fn json<T: Serialize>(value: &T) -> Result<Output, CliError> {
    let value = serde_json::to_value(value).map_err(partsizer_core::Error::from)?;
    Ok(Output::Json(value))
}
