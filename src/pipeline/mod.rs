//! The feature pipeline: ordered, composable transform steps.
//!
//! A [`PipelineDefinition`] is pure configuration (loadable from JSON).
//! Fitting it against a training dataset produces a [`FittedPipeline`]
//! holding any learned parameters (one-hot vocabularies, token
//! vocabularies), which is then applied identically at training and
//! prediction time.
//!
//! Fitting order is the declared step order, and each step's fit sees the
//! dataset after all prior steps' apply have transformed it.

pub mod column_copy;
pub mod concatenate;
pub mod one_hot;
pub mod text_features;

use serde::{Deserialize, Serialize};

use crate::dataset::{Dataset, Row};
use crate::error::Result;

pub use column_copy::ColumnCopy;
pub use concatenate::{Concatenate, FittedConcatenate};
pub use one_hot::{FittedOneHot, OneHotEncode};
pub use text_features::{FittedTextFeaturize, TextFeaturize};

/// One transform step, as declared (before fitting).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum PipelineStep {
    /// Copy a column value under a new name (typically the label column).
    ColumnCopy(ColumnCopy),
    /// One-hot encode categorical columns against fitted vocabularies.
    OneHotEncode(OneHotEncode),
    /// Concatenate scalar and vector columns into one feature vector.
    Concatenate(Concatenate),
    /// Turn a text column into a term-frequency vector.
    TextFeaturize(TextFeaturize),
}

impl PipelineStep {
    /// Step name used in error messages, e.g. `Concatenate(Features)`.
    pub fn name(&self) -> String {
        match self {
            PipelineStep::ColumnCopy(s) => s.name(),
            PipelineStep::OneHotEncode(s) => s.name(),
            PipelineStep::Concatenate(s) => s.name(),
            PipelineStep::TextFeaturize(s) => s.name(),
        }
    }

    /// Fit this step against the (already transformed) training dataset.
    pub fn fit(&self, dataset: &Dataset) -> Result<FittedStep> {
        match self {
            PipelineStep::ColumnCopy(s) => s.fit(dataset).map(FittedStep::ColumnCopy),
            PipelineStep::OneHotEncode(s) => s.fit(dataset).map(FittedStep::OneHotEncode),
            PipelineStep::Concatenate(s) => s.fit(dataset).map(FittedStep::Concatenate),
            PipelineStep::TextFeaturize(s) => s.fit(dataset).map(FittedStep::TextFeaturize),
        }
    }
}

/// One transform step together with its learned parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FittedStep {
    ColumnCopy(ColumnCopy),
    OneHotEncode(FittedOneHot),
    Concatenate(FittedConcatenate),
    TextFeaturize(FittedTextFeaturize),
}

impl FittedStep {
    /// Step name used in error messages.
    pub fn name(&self) -> String {
        match self {
            FittedStep::ColumnCopy(s) => s.name(),
            FittedStep::OneHotEncode(s) => s.name(),
            FittedStep::Concatenate(s) => s.name(),
            FittedStep::TextFeaturize(s) => s.name(),
        }
    }

    /// Apply this step to one row, producing the transformed row.
    pub fn apply(&self, row: Row) -> Result<Row> {
        match self {
            FittedStep::ColumnCopy(s) => s.apply(row),
            FittedStep::OneHotEncode(s) => s.apply(row),
            FittedStep::Concatenate(s) => s.apply(row),
            FittedStep::TextFeaturize(s) => s.apply(row),
        }
    }

    /// Input columns this step requires to be present on a row.
    pub fn required_columns(&self) -> Vec<&str> {
        match self {
            FittedStep::ColumnCopy(s) => vec![s.source.as_str()],
            FittedStep::OneHotEncode(s) => s.columns().collect(),
            FittedStep::Concatenate(s) => s.columns.iter().map(|c| c.as_str()).collect(),
            FittedStep::TextFeaturize(s) => vec![s.column.as_str()],
        }
    }
}

/// An ordered sequence of steps, as declared.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineDefinition {
    steps: Vec<PipelineStep>,
}

impl PipelineDefinition {
    /// Create an empty pipeline definition.
    pub fn new() -> Self {
        PipelineDefinition { steps: Vec::new() }
    }

    /// Load a pipeline definition from a JSON file.
    pub fn from_json_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Append a step.
    pub fn add(mut self, step: PipelineStep) -> Self {
        self.steps.push(step);
        self
    }

    /// The declared steps in order.
    pub fn steps(&self) -> &[PipelineStep] {
        &self.steps
    }

    /// Fit the pipeline against a training dataset.
    pub fn fit(&self, dataset: &Dataset) -> Result<FittedPipeline> {
        self.fit_transform(dataset).map(|(fitted, _)| fitted)
    }

    /// Fit the pipeline and return the transformed training dataset along
    /// with it, so the trainer does not re-apply the steps.
    pub fn fit_transform(&self, dataset: &Dataset) -> Result<(FittedPipeline, Dataset)> {
        let mut current = dataset.clone();
        let mut fitted_steps = Vec::with_capacity(self.steps.len());

        for step in &self.steps {
            let fitted = step.fit(&current)?;
            let rows = current
                .rows()
                .iter()
                .map(|row| fitted.apply(row.clone()))
                .collect::<Result<Vec<_>>>()?;
            current = Dataset::from_rows(current.schema().clone(), rows);
            fitted_steps.push(fitted);
        }

        Ok((
            FittedPipeline {
                steps: fitted_steps,
            },
            current,
        ))
    }
}

/// An ordered sequence of fitted steps. Immutable once created; reused
/// identically at prediction time and embedded in the saved artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedPipeline {
    steps: Vec<FittedStep>,
}

impl FittedPipeline {
    /// The fitted steps in order.
    pub fn steps(&self) -> &[FittedStep] {
        &self.steps
    }

    /// Apply every step in order to one row.
    pub fn apply(&self, row: Row) -> Result<Row> {
        let mut row = row;
        for step in &self.steps {
            row = step.apply(row)?;
        }
        Ok(row)
    }

    /// Raw input columns required before the first step runs.
    ///
    /// Columns produced by an earlier step are not required as input; the
    /// prediction service uses this set to validate incoming requests.
    pub fn required_input_columns(&self) -> Vec<&str> {
        let mut produced: Vec<&str> = Vec::new();
        let mut required: Vec<&str> = Vec::new();

        for step in &self.steps {
            for column in step.required_columns() {
                if !produced.contains(&column) && !required.contains(&column) {
                    required.push(column);
                }
            }
            match step {
                FittedStep::ColumnCopy(s) => produced.push(&s.target),
                FittedStep::OneHotEncode(_) => {}
                FittedStep::Concatenate(s) => produced.push(&s.target),
                FittedStep::TextFeaturize(s) => produced.push(&s.target),
            }
        }

        required
    }
}
