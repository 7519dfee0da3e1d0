//! Error types for the partsizer CLI

use partsizer_core::Error as CoreError;
use std::path::PathBuf;
use thiserror::Error;

/// CLI error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Sizing engine error
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Input or config file could not be read
    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Input line is not a JSON object
    #[error("Invalid record on line {line}: {source}")]
    Record {
        line: usize,
        source: serde_json::Error,
    },

    /// Config file is not a valid solver config
    #[error("Invalid config file {}: {source}", .path.display())]
    Config {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// Blocking task failed
    #[error("Task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl CliError {
    /// Returns the error code for reports
    pub fn code(&self) -> &'static str {
        match self {
            CliError::Core(e) => e.code(),
            CliError::Read { .. } => "io_error",
            CliError::Record { .. } => "invalid_record",
            CliError::Config { .. } => "invalid_config",
            CliError::Task(_) => "internal_error",
        }
    }

    /// Returns the process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Core(e) => e.exit_code(),
            CliError::Read { .. } => 1,
            CliError::Record { .. } => 2,
            CliError::Config { .. } => 2,
            CliError::Task(_) => 1,
        }
    }

    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            CliError::Core(e) => e.details(),
            CliError::Record { line, .. } => Some(serde_json::json!({ "line": line })),
            _ => None,
        }
    }
}
