//! Read-only access to rows and datasets
//!
//! The engine never owns or mutates data. Anything that can hand out a
//! partition-key value per row and be iterated more than once can be sized.

use serde_json::Value;

use crate::models::{Key, Record};

/// A row that can produce a partition-key value for a named column
pub trait Row {
    /// Key in `column`, or `None` when the column is absent or null
    fn key(&self, column: &str) -> Option<Key>;
}

impl Row for Record {
    fn key(&self, column: &str) -> Option<Key> {
        self.get(column).and_then(Key::from_json)
    }
}

impl Row for Value {
    fn key(&self, column: &str) -> Option<Key> {
        self.get(column).and_then(Key::from_json)
    }
}

/// A finite, re-iterable collection of rows
///
/// Profiling and raw-row simulation each walk the rows once, so `rows`
/// may be called several times per solve.
pub trait Dataset {
    type Row: Row;
    type Rows<'a>: Iterator<Item = &'a Self::Row>
    where
        Self: 'a;

    fn rows(&self) -> Self::Rows<'_>;

    /// Exact row count if known without iterating
    fn len_hint(&self) -> Option<usize> {
        None
    }
}

impl<R: Row> Dataset for [R] {
    type Row = R;
    type Rows<'a> = std::slice::Iter<'a, R> where Self: 'a;

    fn rows(&self) -> Self::Rows<'_> {
        self.iter()
    }

    fn len_hint(&self) -> Option<usize> {
        Some(self.len())
    }
}

impl<R: Row> Dataset for Vec<R> {
    type Row = R;
    type Rows<'a> = std::slice::Iter<'a, R> where Self: 'a;

    fn rows(&self) -> Self::Rows<'_> {
        self.iter()
    }

    fn len_hint(&self) -> Option<usize> {
        Some(self.len())
    }
}
