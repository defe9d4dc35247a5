//! Concatenation of columns into a single feature vector.

use serde::{Deserialize, Serialize};

use crate::dataset::{Dataset, Row, Value};
use crate::error::{HarrierError, Result};

/// Concatenates named columns into one numeric feature vector.
///
/// Column order is significant: the output vector lays out each source
/// column's values in the declared order, so a pipeline fitted at training
/// time produces identically shaped vectors at prediction time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Concatenate {
    /// Output vector column.
    pub target: String,
    /// Source columns, in output order.
    pub columns: Vec<String>,
}

impl Concatenate {
    /// Create a new concatenation step.
    pub fn new<S: Into<String>>(target: S, columns: Vec<String>) -> Self {
        Concatenate {
            target: target.into(),
            columns,
        }
    }

    /// Step name used in error messages.
    pub fn name(&self) -> String {
        format!("Concatenate({})", self.target)
    }

    /// Validate all source columns exist; no parameters are learned.
    pub fn fit(&self, dataset: &Dataset) -> Result<FittedConcatenate> {
        for column in &self.columns {
            if !dataset.has_column(column) {
                return Err(HarrierError::unknown_column(self.name(), column));
            }
        }
        Ok(FittedConcatenate {
            target: self.target.clone(),
            columns: self.columns.clone(),
        })
    }
}

/// Fitted concatenation (identical to its definition; kept as a separate
/// type so the fitted pipeline owns its own state).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FittedConcatenate {
    /// Output vector column.
    pub target: String,
    /// Source columns, in output order.
    pub columns: Vec<String>,
}

impl FittedConcatenate {
    /// Step name used in error messages.
    pub fn name(&self) -> String {
        format!("Concatenate({})", self.target)
    }

    /// Build the feature vector and store it under the target column.
    ///
    /// Scalars contribute one element (booleans as 1.0/0.0), vectors are
    /// spliced in whole. Text is rejected: it must pass through
    /// `OneHotEncode` or `TextFeaturize` first.
    pub fn apply(&self, mut row: Row) -> Result<Row> {
        let mut features: Vec<f64> = Vec::new();

        for column in &self.columns {
            let value = row
                .get(column)
                .ok_or_else(|| HarrierError::unknown_column(self.name(), column))?;

            match value {
                Value::Vector(v) => features.extend_from_slice(v),
                scalar => match scalar.as_f64() {
                    Some(x) => features.push(x),
                    None => {
                        return Err(HarrierError::invalid_input(format!(
                            "column '{}' holds a {} value and cannot join a feature vector",
                            column,
                            scalar.kind()
                        )));
                    }
                },
            }
        }

        row.set(self.target.clone(), Value::Vector(features));
        Ok(row)
    }
}
