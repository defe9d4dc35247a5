//! Rows and in-memory datasets.

use serde::{Deserialize, Serialize};

use crate::dataset::value::Value;
use crate::schema::Schema;

/// An ordered mapping from column name to value.
///
/// Rows keep insertion order: pipeline steps append their output columns,
/// and that order is identical at train and predict time.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Row {
    columns: Vec<(String, Value)>,
}

impl Row {
    /// Create a new empty row.
    pub fn new() -> Self {
        Row {
            columns: Vec::new(),
        }
    }

    /// Append a column value. Replaces the value if the column exists,
    /// keeping its original position.
    pub fn set<S: Into<String>>(&mut self, name: S, value: Value) {
        let name = name.into();
        match self.columns.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = value,
            None => self.columns.push((name, value)),
        }
    }

    /// Get a column value by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Check if the row has a column.
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|(n, _)| n == name)
    }

    /// Column names in order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(n, _)| n.as_str())
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Check if the row is empty.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Iterate over `(name, value)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns.iter().map(|(n, v)| (n.as_str(), v))
    }
}

impl FromIterator<(String, Value)> for Row {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        let mut row = Row::new();
        for (name, value) in iter {
            row.set(name, value);
        }
        row
    }
}

/// An ordered sequence of rows sharing a fixed schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    schema: Schema,
    rows: Vec<Row>,
}

impl Dataset {
    /// Create a dataset from pre-built rows.
    pub fn from_rows(schema: Schema, rows: Vec<Row>) -> Self {
        Dataset { schema, rows }
    }

    /// The schema the rows conform to.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// The rows in order.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the dataset has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// True if any row of the dataset contains the named column.
    ///
    /// Pipeline steps use this to resolve columns produced by earlier steps,
    /// which are present on rows but not in the declared schema.
    pub fn has_column(&self, name: &str) -> bool {
        self.schema.has_column(name) || self.rows.first().is_some_and(|r| r.has_column(name))
    }
}
