//! One-hot encoding of categorical columns.

use serde::{Deserialize, Serialize};

use crate::dataset::{Dataset, Row, Value};
use crate::error::{HarrierError, Result};

/// Declares one-hot encoding over a set of categorical columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OneHotEncode {
    /// Columns to encode, in order.
    pub columns: Vec<String>,
}

impl OneHotEncode {
    /// Create a new one-hot step over the given columns.
    pub fn new(columns: Vec<String>) -> Self {
        OneHotEncode { columns }
    }

    /// Step name used in error messages.
    pub fn name(&self) -> String {
        format!("OneHotEncode({})", self.columns.join(", "))
    }

    /// Scan the training dataset and build one vocabulary per column.
    ///
    /// Vocabulary order is first-seen order over the rows, so fitting is
    /// deterministic for a given dataset.
    pub fn fit(&self, dataset: &Dataset) -> Result<FittedOneHot> {
        let mut vocabularies = Vec::with_capacity(self.columns.len());

        for column in &self.columns {
            if !dataset.has_column(column) {
                return Err(HarrierError::unknown_column(self.name(), column));
            }

            let mut vocabulary: Vec<String> = Vec::new();
            for (index, row) in dataset.rows().iter().enumerate() {
                let value = row
                    .get(column)
                    .ok_or_else(|| HarrierError::unknown_column(self.name(), column))?;
                let key = value.category_key().ok_or_else(|| {
                    HarrierError::type_coercion(column, value.to_string(), index + 1, "categorical")
                })?;
                if !vocabulary.contains(&key) {
                    vocabulary.push(key);
                }
            }

            vocabularies.push(ColumnVocabulary {
                column: column.clone(),
                vocabulary,
            });
        }

        Ok(FittedOneHot { vocabularies })
    }
}

/// The fitted vocabulary for one encoded column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnVocabulary {
    /// The encoded column.
    pub column: String,
    /// Ordered set of distinct category values seen at fit time.
    pub vocabulary: Vec<String>,
}

/// One-hot encoding with fitted vocabularies.
///
/// Each encoded column is replaced in place by an indicator vector of the
/// vocabulary's length. Unseen categories map to an all-zero vector —
/// documented policy rather than an error, so test-time categories the
/// training data never contained do not abort prediction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FittedOneHot {
    vocabularies: Vec<ColumnVocabulary>,
}

impl FittedOneHot {
    /// Step name used in error messages.
    pub fn name(&self) -> String {
        let columns: Vec<&str> = self.columns().collect();
        format!("OneHotEncode({})", columns.join(", "))
    }

    /// The encoded column names, in declared order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.vocabularies.iter().map(|v| v.column.as_str())
    }

    /// The fitted vocabulary for a column, if it is encoded by this step.
    pub fn vocabulary(&self, column: &str) -> Option<&[String]> {
        self.vocabularies
            .iter()
            .find(|v| v.column == column)
            .map(|v| v.vocabulary.as_slice())
    }

    /// Replace each encoded column's value with its indicator vector.
    pub fn apply(&self, mut row: Row) -> Result<Row> {
        for entry in &self.vocabularies {
            let value = row
                .get(&entry.column)
                .ok_or_else(|| HarrierError::unknown_column(self.name(), &entry.column))?;
            let key = value.category_key().ok_or_else(|| {
                HarrierError::invalid_input(format!(
                    "column '{}' holds a {} value, expected a categorical scalar",
                    entry.column,
                    value.kind()
                ))
            })?;

            let mut indicator = vec![0.0; entry.vocabulary.len()];
            if let Some(position) = entry.vocabulary.iter().position(|v| *v == key) {
                indicator[position] = 1.0;
            }
            row.set(entry.column.clone(), Value::Vector(indicator));
        }
        Ok(row)
    }
}
