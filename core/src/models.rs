//! Domain models for PartitionSizer
//!
//! These types represent the core entities of a sizing request:
//! - Records: Opaque rows of typed fields
//! - Keys: The partition-key value extracted from a record
//! - Histograms: Rows per partition for one candidate partition count
//! - Warnings: Non-fatal findings returned next to a result
//! - Sizing results: The solver's output, consumed for export slicing

use serde::de::{self, Deserializer};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// A partition-key value
///
/// Keys compare by value. JSON `null` is never a key: a null field counts
/// as absent, the same as a missing one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    Bool(bool),
    Int(i64),
    /// Unsigned values that do not fit in `i64`
    UInt(u64),
    /// IEEE-754 bits, with `-0.0` folded into `0.0`
    Float(u64),
    Str(String),
    /// Canonical JSON text of an array or object
    Composite(String),
}

impl Key {
    /// Convert a JSON field value into a key, `None` for null
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Bool(b) => Some(Key::Bool(*b)),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(Key::Int(i))
                } else if let Some(u) = n.as_u64() {
                    Some(Key::UInt(u))
                } else {
                    n.as_f64().map(Key::float)
                }
            }
            Value::String(s) => Some(Key::Str(s.clone())),
            Value::Array(_) | Value::Object(_) => Some(Key::Composite(value.to_string())),
        }
    }

    /// Build a float key
    pub fn float(value: f64) -> Self {
        let value = if value == 0.0 { 0.0 } else { value };
        Key::Float(value.to_bits())
    }

    /// Run `f` over the key's stable byte encoding
    ///
    /// Strings hash as their UTF-8 bytes and numbers as little-endian
    /// fixed-width integers, so identical keys hash identically on every
    /// platform and in every process.
    pub fn with_canonical_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        match self {
            Key::Bool(b) => f(&[u8::from(*b)]),
            Key::Int(i) => f(&i.to_le_bytes()),
            Key::UInt(u) => f(&u.to_le_bytes()),
            Key::Float(bits) => f(&bits.to_le_bytes()),
            Key::Str(s) | Key::Composite(s) => f(s.as_bytes()),
        }
    }

    /// JSON form of the key
    pub fn to_json(&self) -> Value {
        match self {
            Key::Bool(b) => Value::Bool(*b),
            Key::Int(i) => Value::from(*i),
            Key::UInt(u) => Value::from(*u),
            Key::Float(bits) => Value::from(f64::from_bits(*bits)),
            Key::Str(s) => Value::String(s.clone()),
            Key::Composite(s) => serde_json::from_str(s).unwrap_or_else(|_| Value::String(s.clone())),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Composite(s) => f.write_str(s),
            other => write!(f, "{}", other.to_json()),
        }
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Key::Str(value.to_string())
    }
}

impl From<String> for Key {
    fn from(value: String) -> Self {
        Key::Str(value)
    }
}

impl From<i64> for Key {
    fn from(value: i64) -> Self {
        Key::Int(value)
    }
}

impl Serialize for Key {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Key {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Key::from_json(&value).ok_or_else(|| serde::de::Error::custom("null is not a partition key"))
    }
}

/// A row of typed fields, as loaded from a JSON object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: Map<String, Value>,
}

impl Record {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Builder-style field setter
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(column.into(), value.into());
        self
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.fields.get(column)
    }
}

/// Largest partition count a histogram or scheme may have
///
/// A histogram holds one `u64` per partition, so this caps it at 128 MiB.
pub const MAX_PARTITION_COUNT: u32 = 1 << 24;

/// Rows per partition for one candidate partition count
///
/// Every index in `0..partition_count` is present, empty partitions
/// included. Serializes as a map from partition index to row count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Histogram {
    counts: Vec<u64>,
}

impl Histogram {
    /// An all-zero histogram with `partition_count` partitions
    pub fn zeroed(partition_count: u32) -> Self {
        Self {
            counts: vec![0; partition_count as usize],
        }
    }

    pub fn from_counts(counts: Vec<u64>) -> Self {
        Self { counts }
    }

    pub(crate) fn add(&mut self, partition: u32, rows: u64) {
        self.counts[partition as usize] += rows;
    }

    pub fn partition_count(&self) -> u32 {
        self.counts.len() as u32
    }

    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    pub fn get(&self, partition: u32) -> Option<u64> {
        self.counts.get(partition as usize).copied()
    }

    /// Row count of the fullest partition
    pub fn max(&self) -> u64 {
        self.counts.iter().copied().max().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Fullest partition and its row count; lowest index wins ties
    pub fn heaviest_partition(&self) -> Option<(u32, u64)> {
        self.counts
            .iter()
            .enumerate()
            .fold(None, |best, (i, &c)| match best {
                Some((_, bc)) if bc >= c => best,
                _ => Some((i as u32, c)),
            })
    }

    /// Ratio of the fullest partition to the mean partition size
    ///
    /// 1.0 is a perfectly even spread. Empty histograms report 0.0.
    pub fn skew(&self) -> f64 {
        let total = self.total();
        if total == 0 || self.counts.is_empty() {
            return 0.0;
        }
        let mean = total as f64 / self.counts.len() as f64;
        self.max() as f64 / mean
    }

    /// Whether every partition holds at most `max_rows` rows
    pub fn fits(&self, max_rows: u64) -> bool {
        self.max() <= max_rows
    }

}

impl Serialize for Histogram {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.counts.len()))?;
        for (i, c) in self.counts.iter().enumerate() {
            map.serialize_entry(&(i as u32), c)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Histogram {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let map = BTreeMap::<u32, u64>::deserialize(deserializer)?;
        if let Some(&last) = map.keys().next_back() {
            if last >= MAX_PARTITION_COUNT {
                return Err(de::Error::custom(format!(
                    "partition index {} exceeds the maximum of {}",
                    last,
                    MAX_PARTITION_COUNT - 1
                )));
            }
        }
        let len = map.keys().next_back().map(|&i| i as usize + 1).unwrap_or(0);
        let mut counts = vec![0; len];
        for (i, c) in map {
            counts[i as usize] = c;
        }
        Ok(Self { counts })
    }
}

/// What a warning is about
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum WarningKind {
    /// A downstream grouping/join column differs from the partition key
    GroupingColumnMismatch {
        partition_column: String,
        grouping_column: String,
    },
    /// Some rows carry no value for the partition key
    PartialKeyCoverage {
        column: String,
        skipped_rows: u64,
        total_rows: u64,
    },
    /// The distinct-key figure is an estimate
    ApproximateProfile { column: String },
}

/// Non-fatal finding returned alongside a result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warning {
    #[serde(flatten)]
    pub kind: WarningKind,
    pub message: String,
}

impl Warning {
    pub fn grouping_column_mismatch(partition_column: &str, grouping_column: &str) -> Self {
        Self {
            message: format!(
                "rows grouped or joined by '{}' may be split across partitions keyed by '{}'; \
                 per-partition aggregates can under-count",
                grouping_column, partition_column
            ),
            kind: WarningKind::GroupingColumnMismatch {
                partition_column: partition_column.to_string(),
                grouping_column: grouping_column.to_string(),
            },
        }
    }

    pub fn partial_key_coverage(column: &str, skipped_rows: u64, total_rows: u64) -> Self {
        Self {
            message: format!(
                "{} of {} rows have no '{}' value and belong to no partition",
                skipped_rows, total_rows, column
            ),
            kind: WarningKind::PartialKeyCoverage {
                column: column.to_string(),
                skipped_rows,
                total_rows,
            },
        }
    }

    /// `standard_error` is the relative standard error of the distinct-key
    /// estimate
    pub fn approximate_profile(column: &str, standard_error: f64) -> Self {
        Self {
            message: format!(
                "'{}' was profiled approximately; the distinct-key count is an estimate \
                 (standard error {:.2}%)",
                column,
                standard_error * 100.0
            ),
            kind: WarningKind::ApproximateProfile {
                column: column.to_string(),
            },
        }
    }
}

/// Output of a successful solve
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SizingResult {
    /// Smallest partition count whose fullest partition fits the ceiling
    pub minimum_partition_count: u32,
    /// Rows per partition under that count
    pub per_partition_row_counts: Histogram,
    /// Partition key column
    pub key_column_used: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<Warning>,
}
