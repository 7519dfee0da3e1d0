//! PartitionSizer CLI
//!
//! Loads a JSON Lines snapshot and runs the sizing engine:
//! - `profile`: key statistics
//! - `simulate`: rows per partition for a fixed count
//! - `solve`: minimum partition count under a row limit
//! - `validate`: partition key pre-checks
//! - `slice`: rows of one partition, for export

pub mod args;
pub mod commands;
pub mod error;
pub mod input;
pub mod report;

pub use args::{Cli, Command, LogFormat};
pub use commands::{run, Output};
pub use error::CliError;
pub use report::{ErrorResponse, SimulationReport, SizingReport, ValidationReport};
