//! Integration tests for partition sizing
//!
//! Scenarios mirror how hunting-table exports are split: device-keyed
//! telemetry under an interface row limit, with skewed and mis-keyed
//! variants.

use partsizer_core::{
    lower_bound, DatasetProfiler, Error, MinimumPartitionSolver, PartitionKeyValidator,
    PartitionScheme, ProfileConfig, SolverConfig, WarningKind,
};
use partsizer_integration_tests::fixtures::{
    balanced_device_ids, device_id, skewed_rows, uniform_rows,
};
use pretty_assertions::assert_eq;

const LIMIT: u64 = 20_000;

// ============================================================================
// Scenario Tests
// ============================================================================

#[test]
fn test_even_devices_need_exactly_five_partitions() {
    // 500 devices x 200 rows = 100,000 rows
    let devices = balanced_device_ids(5, 100);
    let rows = uniform_rows(&devices, 200);
    assert_eq!(rows.len(), 100_000);

    let result = MinimumPartitionSolver::default()
        .solve(&rows, "DeviceId", LIMIT)
        .expect("solve should succeed");

    assert_eq!(result.minimum_partition_count, 5);
    assert_eq!(result.per_partition_row_counts.counts(), &[20_000; 5]);
    assert_eq!(result.key_column_used, "DeviceId");
    assert!(result.warnings.is_empty());
}

#[test]
fn test_one_device_over_the_limit_is_infeasible() {
    let devices = balanced_device_ids(5, 100);
    let rows = skewed_rows(&devices, 30_000, 100_000);

    let err = MinimumPartitionSolver::default()
        .solve(&rows, "DeviceId", LIMIT)
        .unwrap_err();

    match err {
        Error::Infeasible {
            column,
            key,
            key_rows,
            max_rows_per_partition,
        } => {
            assert_eq!(column, "DeviceId");
            assert_eq!(key, format!("\"{}\"", devices[0]));
            assert_eq!(key_rows, 30_000);
            assert_eq!(max_rows_per_partition, LIMIT);
        }
        other => panic!("expected Infeasible, got {:?}", other),
    }
}

#[test]
fn test_grouping_by_other_column_warns_but_solves() {
    let devices: Vec<String> = (0..50).map(device_id).collect();
    let rows = uniform_rows(&devices, 100);

    let warnings = PartitionKeyValidator::new("SHA256").validate(["FileName"]);
    assert_eq!(warnings.len(), 1);
    assert_eq!(
        warnings[0].kind,
        WarningKind::GroupingColumnMismatch {
            partition_column: "SHA256".into(),
            grouping_column: "FileName".into(),
        }
    );

    let result = MinimumPartitionSolver::default()
        .solve_checked(&rows, "SHA256", 2_500, ["FileName"])
        .expect("solve should succeed");
    assert!(result.per_partition_row_counts.fits(2_500));
    assert_eq!(result.warnings, warnings);
}

// ============================================================================
// Property Tests
// ============================================================================

#[test]
fn test_solve_is_deterministic() {
    let devices: Vec<String> = (0..300).map(device_id).collect();
    let rows = skewed_rows(&devices, 900, 30_000);

    let first = MinimumPartitionSolver::default().solve(&rows, "DeviceId", 4_000).unwrap();
    let second = MinimumPartitionSolver::new(SolverConfig {
        parallelism: Some(2),
        ..Default::default()
    })
    .solve(&rows, "DeviceId", 4_000)
    .unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_lower_bound_never_exceeds_solution() {
    let devices: Vec<String> = (0..200).map(device_id).collect();
    for heavy in [100, 1_000, 2_000] {
        let rows = skewed_rows(&devices, heavy, 20_000);
        let profile = DatasetProfiler::default().profile(&rows, "DeviceId").unwrap();
        let config = SolverConfig {
            search_window: 64,
            ..Default::default()
        };
        let result = MinimumPartitionSolver::new(config)
            .solve_profiled(&rows, &profile, 2_500)
            .unwrap();

        assert!(lower_bound(&profile, 2_500) <= result.minimum_partition_count);
    }
}

#[test]
fn test_single_key_dataset_is_infeasible_for_any_limit_below_its_size() {
    let rows = uniform_rows(&[device_id(0)], 1_000);
    for limit in [1, 10, 500, 999] {
        let result = MinimumPartitionSolver::default().solve(&rows, "DeviceId", limit);
        assert!(matches!(result, Err(Error::Infeasible { .. })), "limit {}", limit);
    }
    let result = MinimumPartitionSolver::default().solve(&rows, "DeviceId", 1_000).unwrap();
    assert_eq!(result.minimum_partition_count, 1);
}

#[test]
fn test_empty_snapshot() {
    let rows = uniform_rows(&[], 10);
    assert!(matches!(
        DatasetProfiler::default().profile(&rows, "DeviceId"),
        Err(Error::EmptyDataset)
    ));
    assert!(matches!(
        MinimumPartitionSolver::default().solve(&rows, "DeviceId", LIMIT),
        Err(Error::EmptyDataset)
    ));
}

#[test]
fn test_missing_column() {
    let rows = uniform_rows(&[device_id(1)], 10);
    let err = MinimumPartitionSolver::default().solve(&rows, "AccountSid", LIMIT).unwrap_err();
    assert_eq!(err.code(), "no_usable_key");
}

#[test]
fn test_approximate_mode_agrees_on_even_devices() {
    let devices = balanced_device_ids(5, 100);
    let rows = uniform_rows(&devices, 200);
    let config = SolverConfig {
        profile: ProfileConfig {
            exact_counting: false,
            ..Default::default()
        },
        ..Default::default()
    };

    let result = MinimumPartitionSolver::new(config).solve(&rows, "DeviceId", LIMIT).unwrap();
    assert_eq!(result.minimum_partition_count, 5);
    assert_eq!(result.per_partition_row_counts.counts(), &[20_000; 5]);
    assert!(matches!(
        result.warnings[0].kind,
        WarningKind::ApproximateProfile { .. }
    ));
}

// ============================================================================
// Export Tests
// ============================================================================

#[test]
fn test_export_slices_match_histogram() {
    let devices: Vec<String> = (0..120).map(device_id).collect();
    let rows = skewed_rows(&devices, 400, 12_000);
    let result = MinimumPartitionSolver::default().solve(&rows, "DeviceId", 1_500).unwrap();

    let scheme = PartitionScheme::new(result.minimum_partition_count).unwrap();
    for index in 0..scheme.partition_count() {
        let slice: Vec<_> = scheme.slice(&rows, "DeviceId", index).unwrap().collect();
        assert_eq!(
            Some(slice.len() as u64),
            result.per_partition_row_counts.get(index)
        );
        assert!(slice.len() as u64 <= 1_500);
    }
}

#[test]
fn test_result_json_shape() {
    let devices = balanced_device_ids(2, 3);
    let rows = uniform_rows(&devices, 10);
    let result = MinimumPartitionSolver::default().solve(&rows, "DeviceId", 30).unwrap();

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["minimumPartitionCount"], 2);
    assert_eq!(json["perPartitionRowCounts"], serde_json::json!({"0": 30, "1": 30}));
    assert_eq!(json["keyColumnUsed"], "DeviceId");
    assert!(json.get("warnings").is_none());
}
