//! PartitionSizer Integration Tests
//!
//! End-to-end sizing scenarios over synthetic hunting-table snapshots.
//!
//! Run with: cargo test --package partsizer-integration-tests

pub mod fixtures;

pub use fixtures::*;
