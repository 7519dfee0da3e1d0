//! End-to-end tests through the CLI command layer

use clap::Parser;
use partsizer_cli::args::{DatasetArgs, SolverArgs};
use partsizer_cli::{run, Cli, Command, Output};
use partsizer_core::Record;
use partsizer_integration_tests::fixtures::{
    balanced_device_ids, device_id, skewed_rows, uniform_rows,
};
use pretty_assertions::assert_eq;
use std::io::Write;
use std::path::PathBuf;

fn write_snapshot(name: &str, rows: &[Record]) -> PathBuf {
    let path = std::env::temp_dir().join(format!("partsizer-it-{}-{}.jsonl", name, std::process::id()));
    let mut file = std::fs::File::create(&path).unwrap();
    for row in rows {
        writeln!(file, "{}", serde_json::to_string(row).unwrap()).unwrap();
    }
    path
}

/// Parse a `partsizer` command line the way the binary does
fn parse(args: &[&str]) -> Command {
    Cli::try_parse_from(std::iter::once("partsizer").chain(args.iter().copied()))
        .expect("valid command line")
        .command
}

fn solve(path: PathBuf, max_rows: u64) -> Command {
    Command::Solve {
        dataset: DatasetArgs {
            input: path,
            column: "DeviceId".into(),
        },
        max_rows,
        group_by: vec![],
        solver: SolverArgs::default(),
    }
}

#[tokio::test]
async fn test_solve_then_slice_snapshot() {
    let rows = uniform_rows(&balanced_device_ids(4, 25), 10);
    let path = write_snapshot("solve", &rows);

    let Output::Json(report) = run(solve(path.clone(), 250)).await.unwrap() else {
        panic!("expected JSON output");
    };
    assert_eq!(report["result"]["minimumPartitionCount"], 4);
    assert_eq!(report["profile"]["distinctKeys"], 100);
    assert!(report["generatedAt"].is_string());

    let mut exported = 0;
    for index in 0..4 {
        let Output::Lines(lines) = run(Command::Slice {
            dataset: DatasetArgs {
                input: path.clone(),
                column: "DeviceId".into(),
            },
            partitions: 4,
            index,
            hash_seed: 0,
        })
        .await
        .unwrap() else {
            panic!("expected JSON Lines output");
        };
        assert_eq!(lines.len(), 250);
        exported += lines.len();
    }
    assert_eq!(exported, rows.len());
    let _ = std::fs::remove_file(path);
}

#[tokio::test]
async fn test_infeasible_snapshot_exit_code() {
    let rows = skewed_rows(&balanced_device_ids(2, 5), 300, 400);
    let path = write_snapshot("infeasible", &rows);

    let err = run(solve(path.clone(), 200)).await.unwrap_err();
    assert_eq!(err.code(), "infeasible");
    assert_eq!(err.exit_code(), 4);
    assert_eq!(err.details().unwrap()["keyRows"], 300);
    let _ = std::fs::remove_file(path);
}

#[tokio::test]
async fn test_missing_snapshot() {
    let err = run(solve("/nonexistent/snapshot.jsonl".into(), 10)).await.unwrap_err();
    assert_eq!(err.code(), "io_error");
    assert_eq!(err.exit_code(), 1);
}

#[tokio::test]
async fn test_search_exhausted_reports_best_histogram() {
    // 20 keys of 10 rows under a ceiling of 10 fit only if all 20 land in
    // distinct partitions, which a single candidate of 20 will not do
    let devices: Vec<String> = (0..20).map(device_id).collect();
    let path = write_snapshot("exhausted", &uniform_rows(&devices, 10));
    let input = path.to_string_lossy().into_owned();

    let command = parse(&[
        "solve",
        "--input",
        &input,
        "--column",
        "DeviceId",
        "--max-rows",
        "10",
        "--search-window",
        "1",
    ]);
    let err = run(command).await.unwrap_err();

    assert_eq!(err.code(), "search_exhausted");
    assert_eq!(err.exit_code(), 5);
    let details = err.details().expect("search diagnostics");
    assert_eq!(details["keyColumn"], "DeviceId");
    assert_eq!(details["maxRowsPerPartition"], 10);
    assert_eq!(details["firstCandidate"], 20);
    assert_eq!(details["lastCandidate"], 20);
    assert_eq!(details["candidatesEvaluated"], 1);
    assert_eq!(details["bestPartitionCount"], 20);

    let histogram = details["bestHistogram"].as_object().expect("histogram map");
    assert_eq!(histogram.len(), 20);
    let total: u64 = histogram.values().map(|v| v.as_u64().unwrap()).sum();
    assert_eq!(total, 200);
    assert!(histogram.values().any(|v| v.as_u64().unwrap() > 10));
    let _ = std::fs::remove_file(path);
}

#[tokio::test]
async fn test_expired_deadline_exit_code() {
    let path = write_snapshot("deadline", &uniform_rows(&balanced_device_ids(2, 5), 10));
    let input = path.to_string_lossy().into_owned();

    let command = parse(&[
        "solve",
        "--input",
        &input,
        "--column",
        "DeviceId",
        "--max-rows",
        "100",
        "--deadline-ms",
        "0",
    ]);
    let err = run(command).await.unwrap_err();

    assert_eq!(err.code(), "deadline_exceeded");
    assert_eq!(err.exit_code(), 6);
    assert_eq!(err.details().expect("deadline details")["deadlineMs"], 0);
    let _ = std::fs::remove_file(path);
}

#[tokio::test]
async fn test_oversized_partition_count_is_an_error() {
    let path = write_snapshot("oversized", &uniform_rows(&balanced_device_ids(2, 2), 3));
    let input = path.to_string_lossy().into_owned();

    let command = parse(&[
        "simulate",
        "--input",
        &input,
        "--column",
        "DeviceId",
        "--partitions",
        "4000000000",
    ]);
    let err = run(command).await.unwrap_err();

    assert_eq!(err.code(), "invalid_partition_count");
    assert_eq!(err.exit_code(), 2);
    let _ = std::fs::remove_file(path);
}
