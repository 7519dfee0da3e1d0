//! Resolving the partition-key column on rows

use crate::dataset::{Dataset, Row};
use crate::models::Key;

/// Pulls the partition key out of rows by column name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyExtractor {
    column: String,
}

impl KeyExtractor {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
        }
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    /// Key of one row; `None` means the column is absent (or null) there
    pub fn extract<R: Row + ?Sized>(&self, row: &R) -> Option<Key> {
        row.key(&self.column)
    }

    /// Lazily extract keys from every row, yielding `None` for rows
    /// without the column so callers can account for them
    pub fn extract_all<'a, D>(&'a self, dataset: &'a D) -> impl Iterator<Item = Option<Key>> + 'a
    where
        D: Dataset + ?Sized,
    {
        dataset.rows().map(move |row| self.extract(row))
    }
}
