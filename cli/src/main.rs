//! partsizer binary
//!
//! Prints results to stdout and logs to stderr. Failures print an error
//! document to stderr and exit with a per-kind code.

use clap::Parser;
use partsizer_cli::{run, Cli, CliError, ErrorResponse, LogFormat, Output};
use tracing::error;
use tracing_subscriber::EnvFilter;

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Text => builder.without_time().init(),
        LogFormat::Json => builder.json().init(),
    }
}

fn print_output(output: Output) -> Result<(), CliError> {
    match output {
        Output::Json(value) => {
            let text = serde_json::to_string_pretty(&value).map_err(partsizer_core::Error::from)?;
            println!("{}", text);
        }
        Output::Lines(lines) => {
            for line in lines {
                println!("{}", line);
            }
        }
    }
    Ok(())
}

fn error_response(e: &CliError) -> String {
    error!(error = %e, "Request failed");
    let mut body = ErrorResponse::new(e.code(), e.to_string());
    if let Some(details) = e.details() {
        body = body.with_details(details);
    }
    serde_json::to_string(&body).unwrap_or_else(|_| e.to_string())
}

#[tokio::main]
async fn main() {
    // Missing .env is fine
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_tracing(cli.log_format);

    if let Err(e) = run(cli.command).await.and_then(print_output) {
        eprintln!("{}", error_response(&e));
        std::process::exit(e.exit_code());
    }
}
