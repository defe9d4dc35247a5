//! The prediction service: a cached artifact serving concurrent requests.
//!
//! The artifact is loaded lazily, at most once, even under concurrent
//! first requests: `tokio::sync::OnceCell::get_or_try_init` makes late
//! arrivals await the in-flight load instead of starting a second one.
//! After initialization reads are cheap (a brief read lock taken only so
//! [`PredictionService::refresh`] can swap in a newly loaded artifact).
//! Per-request errors never evict the cache or affect other requests.

pub mod http;

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::RwLock;
use tokio::sync::OnceCell;
use tracing::info;

use crate::backend::ModelBackend;
use crate::dataset::{Row, Value};
use crate::error::{HarrierError, Result};
use crate::pipeline::FittedStep;
use crate::schema::ColumnType;
use crate::store::Artifact;
use crate::trainer::TaskKind;

/// The outcome of one prediction request.
#[derive(Debug, Clone, PartialEq)]
pub enum Prediction {
    /// Classification outcome: the decided class and the raw score.
    Label { positive: bool, score: f64 },
    /// Regression outcome.
    Scalar(f64),
}

impl std::fmt::Display for Prediction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Prediction::Label { positive: true, .. } => f.write_str("Positive"),
            Prediction::Label {
                positive: false, ..
            } => f.write_str("Negative"),
            Prediction::Scalar(value) => write!(f, "{value:.2}"),
        }
    }
}

/// A long-lived, concurrency-safe prediction endpoint over one artifact.
pub struct PredictionService {
    artifact_path: PathBuf,
    backend: Arc<dyn ModelBackend>,
    cache: OnceCell<RwLock<Arc<Artifact>>>,
    loads: AtomicUsize,
}

impl PredictionService {
    /// Create a service for an artifact file. Nothing is loaded until the
    /// first request (or an explicit [`Self::refresh`]).
    pub fn new<P: Into<PathBuf>>(artifact_path: P, backend: Arc<dyn ModelBackend>) -> Self {
        PredictionService {
            artifact_path: artifact_path.into(),
            backend,
            cache: OnceCell::new(),
            loads: AtomicUsize::new(0),
        }
    }

    /// Number of times the artifact file has been loaded. Observable so
    /// operators (and tests) can confirm the cache is doing its job.
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    /// The cached artifact, loading it on first use.
    pub async fn artifact(&self) -> Result<Arc<Artifact>> {
        let lock = self
            .cache
            .get_or_try_init(|| async {
                Ok::<_, HarrierError>(RwLock::new(Arc::new(self.load_artifact()?)))
            })
            .await?;
        Ok(lock.read().clone())
    }

    /// Re-read the artifact from disk, replacing the cached copy.
    ///
    /// In-flight requests keep the artifact they already resolved; new
    /// requests see the fresh one.
    pub async fn refresh(&self) -> Result<()> {
        match self.cache.get() {
            Some(lock) => {
                let artifact = Arc::new(self.load_artifact()?);
                *lock.write() = artifact;
                Ok(())
            }
            None => self.artifact().await.map(|_| ()),
        }
    }

    fn load_artifact(&self) -> Result<Artifact> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        let artifact = Artifact::load(&self.artifact_path)?;

        if artifact.model.backend != self.backend.name() {
            return Err(HarrierError::corrupt_artifact(
                &self.artifact_path,
                format!(
                    "artifact was trained by backend '{}', service uses '{}'",
                    artifact.model.backend,
                    self.backend.name()
                ),
            ));
        }

        info!(path = %self.artifact_path.display(), "prediction service loaded artifact");
        Ok(artifact)
    }

    /// Predict from a raw input row.
    ///
    /// Missing label-source columns are filled with type defaults (a
    /// request has no label); any other missing pipeline-required column is
    /// an `InvalidInput` error.
    pub async fn predict(&self, input: &Row) -> Result<Prediction> {
        let artifact = self.artifact().await?;
        let row = complete_input(&artifact, input)?;

        let transformed = artifact.pipeline.apply(row)?;
        let features = artifact.trainer.extract_features(&transformed)?;
        let score = self.backend.predict(&artifact.model, &features)?;

        Ok(match artifact.trainer.task {
            TaskKind::BinaryClassification => Prediction::Label {
                positive: score > crate::evaluate::DECISION_THRESHOLD,
                score,
            },
            TaskKind::Regression => Prediction::Scalar(score),
        })
    }
}

/// Validate a request row against the artifact and fill label defaults.
fn complete_input(artifact: &Artifact, input: &Row) -> Result<Row> {
    let label_sources: Vec<&str> = artifact
        .pipeline
        .steps()
        .iter()
        .filter_map(|step| match step {
            FittedStep::ColumnCopy(copy) if copy.target == artifact.trainer.label_column => {
                Some(copy.source.as_str())
            }
            _ => None,
        })
        .collect();

    let mut row = input.clone();
    let mut missing: Vec<&str> = Vec::new();

    for column in artifact.pipeline.required_input_columns() {
        if row.has_column(column) {
            continue;
        }
        if label_sources.contains(&column) {
            let column_type = artifact
                .schema
                .get_column(column)
                .map(|c| c.column_type)
                .unwrap_or(ColumnType::Float);
            row.set(column.to_string(), default_value(column_type));
        } else {
            missing.push(column);
        }
    }

    if !missing.is_empty() {
        return Err(HarrierError::invalid_input(format!(
            "missing required field(s): {}",
            missing.join(", ")
        )));
    }

    Ok(row)
}

fn default_value(column_type: ColumnType) -> Value {
    match column_type {
        ColumnType::Text => Value::Text(String::new()),
        ColumnType::Integer => Value::Integer(0),
        ColumnType::Float => Value::Float(0.0),
        ColumnType::Boolean => Value::Boolean(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Hyperparameters, LinearBackend};
    use crate::dataset::Dataset;
    use crate::pipeline::{ColumnCopy, PipelineDefinition, PipelineStep, TextFeaturize};
    use crate::schema::Schema;
    use crate::store::ArtifactMetadata;
    use crate::trainer::{Trainer, TrainerConfig};
    use chrono::Utc;

    fn sentiment_artifact(dir: &std::path::Path) -> PathBuf {
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
        let dataset = Dataset::from_rows(schema.clone(), rows);

        let pipeline = PipelineDefinition::new()
            .add(PipelineStep::ColumnCopy(ColumnCopy::new(
                "Sentiment",
                "Label",
            )))
            .add(PipelineStep::TextFeaturize(TextFeaturize::new(
                "Features",
                "SentimentText",
            )));

        let config = TrainerConfig::for_task(TaskKind::BinaryClassification);
        let trainer = Trainer::new(config.clone());
        let params = Hyperparameters {
            iterations: 2000,
            ..Hyperparameters::default()
        };
        let (model, fitted) = trainer
            .train(&LinearBackend::new(), &dataset, &pipeline, &params)
            .unwrap();

        let artifact = Artifact {
            metadata: ArtifactMetadata {
                backend: model.backend.clone(),
                created_at: Utc::now(),
                training_rows: dataset.len(),
            },
            schema,
            trainer: config,
            pipeline: fitted,
            model,
        };

        let path = dir.join("sentiment.harrier");
        artifact.save(&path).unwrap();
        path
    }

    #[tokio::test]
    async fn test_predict_classifies_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = sentiment_artifact(dir.path());
        let service = PredictionService::new(path, Arc::new(LinearBackend::new()));

        let mut input = Row::new();
        input.set("SentimentText", Value::Text("great".to_string()));
        let prediction = service.predict(&input).await.unwrap();
        assert_eq!(prediction.to_string(), "Positive");

        let mut input = Row::new();
        input.set("SentimentText", Value::Text("terrible".to_string()));
        let prediction = service.predict(&input).await.unwrap();
        assert_eq!(prediction.to_string(), "Negative");
    }

    #[tokio::test]
    async fn test_missing_required_field_is_invalid_input() {
        let dir = tempfile::tempdir().unwrap();
        let path = sentiment_artifact(dir.path());
        let service = PredictionService::new(path, Arc::new(LinearBackend::new()));

        let err = service.predict(&Row::new()).await.unwrap_err();
        match err {
            HarrierError::InvalidInput(message) => {
                assert!(message.contains("SentimentText"));
            }
            other => panic!("expected InvalidInput, got {other}"),
        }
    }

    #[tokio::test]
    async fn test_concurrent_first_requests_load_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = sentiment_artifact(dir.path());
        let service = Arc::new(PredictionService::new(
            path,
            Arc::new(LinearBackend::new()),
        ));

        let mut handles = Vec::new();
        for _ in 0..10 {
            let service = service.clone();
            handles.push(tokio::spawn(async move {
                let mut input = Row::new();
                input.set("SentimentText", Value::Text("great".to_string()));
                service.predict(&input).await
            }));
        }

        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(service.load_count(), 1);
    }

    #[tokio::test]
    async fn test_refresh_reloads_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let path = sentiment_artifact(dir.path());
        let service = PredictionService::new(path, Arc::new(LinearBackend::new()));

        let mut input = Row::new();
        input.set("SentimentText", Value::Text("great".to_string()));
        service.predict(&input).await.unwrap();
        assert_eq!(service.load_count(), 1);

        service.refresh().await.unwrap();
        assert_eq!(service.load_count(), 2);

        service.predict(&input).await.unwrap();
        assert_eq!(service.load_count(), 2);
    }

    #[tokio::test]
    async fn test_request_error_does_not_evict_cache() {
        let dir = tempfile::tempdir().unwrap();
        let path = sentiment_artifact(dir.path());
        let service = PredictionService::new(path, Arc::new(LinearBackend::new()));

        let mut good = Row::new();
        good.set("SentimentText", Value::Text("great".to_string()));
        service.predict(&good).await.unwrap();

        assert!(service.predict(&Row::new()).await.is_err());

        service.predict(&good).await.unwrap();
        assert_eq!(service.load_count(), 1);
    }
}
