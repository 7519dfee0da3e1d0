//! Command-line arguments
//!
//! Every option can also be set through a `PARTSIZER_*` environment
//! variable (a `.env` file is loaded first). Flags win over the
//! environment, which wins over a `--config` file.

use clap::{Args, Parser, Subcommand, ValueEnum};
use partsizer_core::SolverConfig;
use std::path::PathBuf;

use crate::error::CliError;

#[derive(Parser, Debug)]
#[command(name = "partsizer")]
#[command(about = "Size hash partitions so every export slice stays under a row limit", long_about = None)]
pub struct Cli {
    /// Log output format (logs go to stderr)
    #[arg(long, value_enum, global = true, default_value_t = LogFormat::Text, env = "PARTSIZER_LOG_FORMAT")]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Row, distinct-key and heaviest-key statistics for a key column
    Profile {
        #[command(flatten)]
        dataset: DatasetArgs,
        /// Estimate with bounded-memory sketches instead of exact counts
        #[arg(long)]
        approximate: bool,
    },
    /// Rows per partition for a fixed partition count
    Simulate {
        #[command(flatten)]
        dataset: DatasetArgs,
        #[arg(long)]
        partitions: u32,
        #[arg(long, env = "PARTSIZER_HASH_SEED", default_value_t = 0)]
        hash_seed: u64,
    },
    /// Smallest partition count keeping every partition within --max-rows
    Solve {
        #[command(flatten)]
        dataset: DatasetArgs,
        #[arg(long, env = "PARTSIZER_MAX_ROWS")]
        max_rows: u64,
        /// Downstream grouping/join column (repeatable)
        #[arg(long = "group-by")]
        group_by: Vec<String>,
        #[command(flatten)]
        solver: SolverArgs,
    },
    /// Check a partition key against downstream grouping columns
    Validate {
        #[command(flatten)]
        dataset: DatasetArgs,
        /// Downstream grouping/join column (repeatable)
        #[arg(long = "group-by")]
        group_by: Vec<String>,
    },
    /// Write the rows of one partition as JSON Lines
    Slice {
        #[command(flatten)]
        dataset: DatasetArgs,
        #[arg(long)]
        partitions: u32,
        #[arg(long)]
        index: u32,
        #[arg(long, env = "PARTSIZER_HASH_SEED", default_value_t = 0)]
        hash_seed: u64,
    },
}

#[derive(Args, Debug, Clone)]
pub struct DatasetArgs {
    /// JSON Lines dataset, one object per line ("-" reads stdin)
    #[arg(long, short, env = "PARTSIZER_INPUT", default_value = "-")]
    pub input: PathBuf,
    /// Partition key column
    #[arg(long, short, env = "PARTSIZER_COLUMN")]
    pub column: String,
}

#[derive(Args, Debug, Clone, Default)]
pub struct SolverArgs {
    /// JSON solver config; flags and environment override its fields
    #[arg(long, env = "PARTSIZER_CONFIG")]
    pub config: Option<PathBuf>,
    #[arg(long, env = "PARTSIZER_SEARCH_WINDOW")]
    pub search_window: Option<u32>,
    #[arg(long, env = "PARTSIZER_SEARCH_STEP")]
    pub search_step: Option<u32>,
    #[arg(long, env = "PARTSIZER_DEADLINE_MS")]
    pub deadline_ms: Option<u64>,
    #[arg(long, env = "PARTSIZER_PARALLELISM")]
    pub parallelism: Option<usize>,
    #[arg(long, env = "PARTSIZER_HASH_SEED")]
    pub hash_seed: Option<u64>,
    /// Estimate with bounded-memory sketches instead of exact counts
    #[arg(long)]
    pub approximate: bool,
}

impl SolverArgs {
    /// Defaults, then the config file, then flags/environment
    pub async fn resolve(&self) -> Result<SolverConfig, CliError> {
        let mut config = match &self.config {
            Some(path) => {
                let text = tokio::fs::read_to_string(path)
                    .await
                    .map_err(|source| CliError::Read {
                        path: path.clone(),
                        source,
                    })?;
                serde_json::from_str(&text).map_err(|source| CliError::Config {
                    path: path.clone(),
                    source,
                })?
            }
            None => SolverConfig::default(),
        };
        self.apply(&mut config);
        config.validate()?;
        Ok(config)
    }

    fn apply(&self, config: &mut SolverConfig) {
        if let Some(window) = self.search_window {
            config.search_window = window;
        }
        if let Some(step) = self.search_step {
            config.search_step = step;
        }
        if self.deadline_ms.is_some() {
            config.deadline_ms = self.deadline_ms;
        }
        if self.parallelism.is_some() {
            config.parallelism = self.parallelism;
        }
        if let Some(seed) = self.hash_seed {
            config.hash_seed = seed;
        }
        if self.approximate {
            config.profile.exact_counting = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_solve() {
        let cli = Cli::try_parse_from([
            "partsizer",
            "solve",
            "--input",
            "rows.jsonl",
            "--column",
            "DeviceId",
            "--max-rows",
            "20000",
            "--group-by",
            "FileName",
            "--group-by",
            "SHA256",
            "--search-window",
            "4",
        ])
        .unwrap();

        match cli.command {
            Command::Solve {
                dataset,
                max_rows,
                group_by,
                solver,
            } => {
                assert_eq!(dataset.column, "DeviceId");
                assert_eq!(dataset.input, PathBuf::from("rows.jsonl"));
                assert_eq!(max_rows, 20000);
                assert_eq!(group_by, vec!["FileName", "SHA256"]);
                assert_eq!(solver.search_window, Some(4));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_flags_override_config() {
        let args = SolverArgs {
            search_step: Some(2),
            approximate: true,
            ..Default::default()
        };
        let mut config = SolverConfig {
            search_window: 7,
            ..Default::default()
        };
        args.apply(&mut config);

        assert_eq!(config.search_window, 7);
        assert_eq!(config.search_step, 2);
        assert!(!config.profile.exact_counting);
    }
}
