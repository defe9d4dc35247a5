//! Training orchestration: loader output → fitted pipeline → backend train.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::backend::{Hyperparameters, ModelBackend, TrainedModel};
use crate::dataset::{Dataset, Row};
use crate::error::{HarrierError, Result};
use crate::pipeline::{FittedPipeline, PipelineDefinition};

/// The kind of task a model was trained for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// Binary classification; scores above 0.5 are the positive class.
    BinaryClassification,
    /// Scalar regression.
    Regression,
}

/// Trainer configuration: which transformed columns hold the features and
/// the label, and what task the model solves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainerConfig {
    /// Column holding the assembled feature vector.
    pub features_column: String,
    /// Column holding the numeric (or boolean) label.
    pub label_column: String,
    /// Task kind, recorded in the artifact for serving.
    pub task: TaskKind,
}

impl TrainerConfig {
    /// Conventional configuration for a task: features in `Features`,
    /// label in `Label`.
    pub fn for_task(task: TaskKind) -> Self {
        TrainerConfig {
            features_column: "Features".to_string(),
            label_column: "Label".to_string(),
            task,
        }
    }

    /// Pull the feature vector out of a transformed row.
    pub fn extract_features(&self, row: &Row) -> Result<Vec<f64>> {
        let value = row
            .get(&self.features_column)
            .ok_or_else(|| HarrierError::unknown_column("Trainer", &self.features_column))?;
        value.as_vector().map(|v| v.to_vec()).ok_or_else(|| {
            HarrierError::invalid_input(format!(
                "column '{}' holds a {} value, expected a feature vector",
                self.features_column,
                value.kind()
            ))
        })
    }

    /// Pull the numeric label out of a transformed row. Boolean labels map
    /// to 1.0/0.0.
    pub fn extract_label(&self, row: &Row) -> Result<f64> {
        let value = row
            .get(&self.label_column)
            .ok_or_else(|| HarrierError::unknown_column("Trainer", &self.label_column))?;
        value.as_f64().ok_or_else(|| {
            HarrierError::invalid_input(format!(
                "label column '{}' holds a {} value, expected a numeric scalar",
                self.label_column,
                value.kind()
            ))
        })
    }
}

/// Orchestrates pipeline fitting and backend training.
///
/// Fails fast: any loader, pipeline, or backend error aborts the run and is
/// surfaced unchanged — no partial model is ever produced.
#[derive(Debug, Clone)]
pub struct Trainer {
    config: TrainerConfig,
}

impl Trainer {
    /// Create a trainer with the given configuration.
    pub fn new(config: TrainerConfig) -> Self {
        Trainer { config }
    }

    /// The trainer's configuration.
    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// Fit the pipeline on the training dataset, extract feature vectors
    /// and labels, and train the backend.
    pub fn train(
        &self,
        backend: &dyn ModelBackend,
        dataset: &Dataset,
        pipeline: &PipelineDefinition,
        params: &Hyperparameters,
    ) -> Result<(TrainedModel, FittedPipeline)> {
        info!(
            rows = dataset.len(),
            steps = pipeline.steps().len(),
            backend = backend.name(),
            "fitting pipeline and training model"
        );

        let (fitted, transformed) = pipeline.fit_transform(dataset)?;

        let mut features = Vec::with_capacity(transformed.len());
        let mut labels = Vec::with_capacity(transformed.len());
        for row in transformed.rows() {
            features.push(self.extract_features(row)?);
            labels.push(self.extract_label(row)?);
        }

        let model = backend.train(&features, &labels, params)?;
        info!(backend = backend.name(), "training complete");

        Ok((model, fitted))
    }

    /// Pull the feature vector out of a transformed row.
    pub fn extract_features(&self, row: &Row) -> Result<Vec<f64>> {
        self.config.extract_features(row)
    }

    /// Pull the numeric label out of a transformed row.
    pub fn extract_label(&self, row: &Row) -> Result<f64> {
        self.config.extract_label(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::LinearBackend;
    use crate::dataset::Value;
    use crate::pipeline::{ColumnCopy, Concatenate, PipelineStep, TextFeaturize};
    use crate::schema::Schema;

    fn sentiment_dataset() -> Dataset {
        let schema = Schema::builder()
            .boolean("Sentiment")
            .unwrap()
            .text("SentimentText")
            .unwrap()
            .build()
            .unwrap();

        let rows = [(true, "great product"), (false, "terrible")]
            .iter()
            .map(|(label, text)| {
                let mut row = Row::new();
                row.set("Sentiment", Value::Boolean(*label));
                row.set("SentimentText", Value::Text(text.to_string()));
                row
            })
            .collect();

        Dataset::from_rows(schema, rows)
    }

    fn sentiment_pipeline() -> PipelineDefinition {
        PipelineDefinition::new()
            .add(PipelineStep::ColumnCopy(ColumnCopy::new(
                "Sentiment",
                "Label",
            )))
            .add(PipelineStep::TextFeaturize(TextFeaturize::new(
                "Features",
                "SentimentText",
            )))
    }

    #[test]
    fn test_train_produces_model_and_fitted_pipeline() {
        let trainer = Trainer::new(TrainerConfig::for_task(TaskKind::BinaryClassification));
        let backend = LinearBackend::new();

        let (model, fitted) = trainer
            .train(
                &backend,
                &sentiment_dataset(),
                &sentiment_pipeline(),
                &Hyperparameters::default(),
            )
            .unwrap();

        assert_eq!(model.backend, "linear");
        assert_eq!(fitted.steps().len(), 2);
    }

    #[test]
    fn test_bag_of_words_scenario_predicts_sentiment() {
        let trainer = Trainer::new(TrainerConfig::for_task(TaskKind::BinaryClassification));
        let backend = LinearBackend::new();
        let params = Hyperparameters {
            iterations: 2000,
            ..Hyperparameters::default()
        };

        let (model, fitted) = trainer
            .train(&backend, &sentiment_dataset(), &sentiment_pipeline(), &params)
            .unwrap();

        let score = |text: &str| {
            let mut row = Row::new();
            row.set("SentimentText", Value::Text(text.to_string()));
            let transformed = fitted.apply(row).unwrap();
            let features = trainer.extract_features(&transformed).unwrap();
            backend.predict(&model, &features).unwrap()
        };

        assert!(score("great") > 0.5);
        assert!(score("terrible") < 0.5);
    }

    #[test]
    fn test_missing_features_column_fails_fast() {
        // Pipeline never produces "Features".
        let pipeline = PipelineDefinition::new().add(PipelineStep::ColumnCopy(ColumnCopy::new(
            "Sentiment",
            "Label",
        )));

        let trainer = Trainer::new(TrainerConfig::for_task(TaskKind::BinaryClassification));
        let err = trainer
            .train(
                &LinearBackend::new(),
                &sentiment_dataset(),
                &pipeline,
                &Hyperparameters::default(),
            )
            .unwrap_err();

        match err {
            HarrierError::UnknownColumn { column, .. } => assert_eq!(column, "Features"),
            other => panic!("expected UnknownColumn, got {other}"),
        }
    }
}
