//! Column copy step, used to rename a label column.

use serde::{Deserialize, Serialize};

use crate::dataset::{Dataset, Row};
use crate::error::{HarrierError, Result};

/// Copies a column value under a new name.
///
/// Stateless: the fitted form is the definition itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnCopy {
    /// Column to read.
    pub source: String,
    /// Column to write.
    pub target: String,
}

impl ColumnCopy {
    /// Create a new column copy step.
    pub fn new<S: Into<String>, T: Into<String>>(source: S, target: T) -> Self {
        ColumnCopy {
            source: source.into(),
            target: target.into(),
        }
    }

    /// Step name used in error messages.
    pub fn name(&self) -> String {
        format!("ColumnCopy({})", self.target)
    }

    /// Validate the source column exists; no parameters are learned.
    pub fn fit(&self, dataset: &Dataset) -> Result<ColumnCopy> {
        if !dataset.has_column(&self.source) {
            return Err(HarrierError::unknown_column(self.name(), &self.source));
        }
        Ok(self.clone())
    }

    /// Copy the source value to the target column.
    pub fn apply(&self, mut row: Row) -> Result<Row> {
        let value = row
            .get(&self.source)
            .cloned()
            .ok_or_else(|| HarrierError::unknown_column(self.name(), &self.source))?;
        row.set(self.target.clone(), value);
        Ok(row)
    }
}
