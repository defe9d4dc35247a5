//! Command implementations for the Harrier CLI.

use std::fs::File;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tokio::runtime::Runtime;

use crate::backend::{Hyperparameters, LinearBackend, ModelBackend};
use crate::cli::args::*;
use crate::cli::output::*;
use crate::dataset::loader::coerce;
use crate::dataset::{Dataset, Row, Value};
use crate::error::{HarrierError, Result};
use crate::evaluate::Evaluator;
use crate::pipeline::PipelineDefinition;
use crate::schema::{ColumnType, Schema};
use crate::serve::{self, Prediction, PredictionService};
use crate::store::{Artifact, ArtifactMetadata};
use crate::trainer::{TaskKind, Trainer, TrainerConfig};

/// Execute a CLI command.
pub fn execute_command(args: HarrierArgs) -> Result<()> {
    match &args.command {
        Command::Train(train_args) => train(train_args.clone(), &args),
        Command::Evaluate(evaluate_args) => evaluate(evaluate_args.clone(), &args),
        Command::Predict(predict_args) => predict(predict_args.clone(), &args),
        Command::Serve(serve_args) => run_server(serve_args.clone(), &args),
    }
}

/// Look up a backend by name.
fn resolve_backend(name: &str) -> Result<Arc<dyn ModelBackend>> {
    match name {
        "linear" => Ok(Arc::new(LinearBackend::new())),
        other => Err(HarrierError::invalid_input(format!(
            "unknown backend '{other}'"
        ))),
    }
}

/// Train a model and save the artifact.
fn train(args: TrainArgs, cli_args: &HarrierArgs) -> Result<()> {
    if cli_args.verbosity() > 1 {
        println!("Loading training data from: {}", args.data.display());
    }

    let schema = Schema::from_json_file(&args.schema)?;
    let pipeline = PipelineDefinition::from_json_file(&args.pipeline)?;
    let dataset = Dataset::load(&args.data, &schema, args.data_format.load_options())?;
    let params = load_hyperparameters(&args)?;
    let backend = resolve_backend(&args.backend)?;

    let config = TrainerConfig::for_task(args.task.into());
    let trainer = Trainer::new(config.clone());

    let start = Instant::now();
    let (model, fitted) = trainer.train(backend.as_ref(), &dataset, &pipeline, &params)?;
    let duration = start.elapsed();

    let artifact = Artifact {
        metadata: ArtifactMetadata {
            backend: model.backend.clone(),
            created_at: Utc::now(),
            training_rows: dataset.len(),
        },
        schema,
        trainer: config.clone(),
        pipeline: fitted,
        model,
    };
    artifact.save(&args.output)?;

    let (metrics, sample_predictions) = match &args.test_data {
        Some(test_path) => {
            let test = Dataset::load(test_path, &artifact.schema, args.data_format.load_options())?;
            let metrics = Evaluator::new(config).evaluate(
                backend.as_ref(),
                &artifact.model,
                &artifact.pipeline,
                &test,
            )?;
            let samples = sample_predictions(backend.as_ref(), &artifact, &test, 3)?;
            (Some(metrics.to_map()), Some(samples))
        }
        None => (None, None),
    };

    output_result(
        "Training complete",
        &TrainingReport {
            artifact: args.output.to_string_lossy().to_string(),
            backend: artifact.metadata.backend.clone(),
            training_rows: artifact.metadata.training_rows,
            duration_ms: duration.as_millis() as u64,
            metrics,
            sample_predictions,
        },
        cli_args,
    )
}

/// Score the first few dataset rows for the training report.
fn sample_predictions(
    backend: &dyn ModelBackend,
    artifact: &Artifact,
    dataset: &Dataset,
    limit: usize,
) -> Result<Vec<SamplePrediction>> {
    let mut samples = Vec::new();

    for row in dataset.rows().iter().take(limit) {
        let transformed = artifact.pipeline.apply(row.clone())?;
        let features = artifact.trainer.extract_features(&transformed)?;
        let actual = artifact.trainer.extract_label(&transformed)?;
        let score = backend.predict(&artifact.model, &features)?;

        let prediction = match artifact.trainer.task {
            TaskKind::BinaryClassification => Prediction::Label {
                positive: score > crate::evaluate::DECISION_THRESHOLD,
                score,
            },
            TaskKind::Regression => Prediction::Scalar(score),
        };

        let input = row
            .iter()
            .filter(|(_, value)| value.as_vector().is_none())
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join(", ");

        samples.push(SamplePrediction {
            input,
            predicted: prediction.to_string(),
            actual,
        });
    }

    Ok(samples)
}

/// Hyperparameters from the optional file, with flag overrides applied.
fn load_hyperparameters(args: &TrainArgs) -> Result<Hyperparameters> {
    let mut params = match &args.params {
        Some(path) => serde_json::from_reader(File::open(path)?)?,
        None => Hyperparameters::default(),
    };

    if let Some(iterations) = args.iterations {
        params.iterations = iterations;
    }
    if let Some(learning_rate) = args.learning_rate {
        params.learning_rate = learning_rate;
    }
    if let Some(seed) = args.seed {
        params.seed = seed;
    }

    Ok(params)
}

/// Evaluate a saved artifact against a held-out dataset.
fn evaluate(args: EvaluateArgs, cli_args: &HarrierArgs) -> Result<()> {
    let artifact = Artifact::load(&args.model)?;
    let backend = resolve_backend(&args.backend)?;
    let dataset = Dataset::load(&args.data, &artifact.schema, args.data_format.load_options())?;

    let metrics = Evaluator::new(artifact.trainer.clone()).evaluate(
        backend.as_ref(),
        &artifact.model,
        &artifact.pipeline,
        &dataset,
    )?;

    output_result(
        "Evaluation complete",
        &EvaluationReport {
            artifact: args.model.to_string_lossy().to_string(),
            rows: dataset.len(),
            metrics: metrics.to_map(),
        },
        cli_args,
    )
}

/// Predict once from a saved artifact.
fn predict(args: PredictArgs, cli_args: &HarrierArgs) -> Result<()> {
    let backend = resolve_backend(&args.backend)?;
    let service = PredictionService::new(&args.model, backend);

    let runtime = Runtime::new()?;
    let artifact = runtime.block_on(service.artifact())?;

    let input = match (&args.input, &args.text) {
        (Some(json), None) => row_from_json(&artifact.schema, json)?,
        (None, Some(text)) => {
            let column = serve::http::text_input_column(&artifact)?;
            let mut row = Row::new();
            row.set(column, Value::Text(text.clone()));
            row
        }
        _ => {
            return Err(HarrierError::invalid_input(
                "pass exactly one of --input or --text",
            ));
        }
    };

    let prediction = runtime.block_on(service.predict(&input))?;
    let score = match prediction {
        Prediction::Label { score, .. } => score,
        Prediction::Scalar(value) => value,
    };

    output_result(
        "Prediction",
        &PredictionReport {
            prediction: prediction.to_string(),
            score,
        },
        cli_args,
    )
}

/// Build a typed row from a JSON object keyed by schema column names.
fn row_from_json(schema: &Schema, json: &str) -> Result<Row> {
    let parsed: serde_json::Value = serde_json::from_str(json)?;
    let object = parsed.as_object().ok_or_else(|| {
        HarrierError::invalid_input("--input must be a JSON object keyed by column names")
    })?;

    let mut row = Row::new();
    for (key, value) in object {
        let column = schema
            .get_column(key)
            .ok_or_else(|| HarrierError::invalid_input(format!("unknown column '{key}'")))?;
        let typed = json_to_value(value, column.column_type).ok_or_else(|| {
            HarrierError::invalid_input(format!(
                "column '{key}' value {value} is not a valid {}",
                column.column_type
            ))
        })?;
        row.set(key.clone(), typed);
    }
    Ok(row)
}

fn json_to_value(value: &serde_json::Value, column_type: ColumnType) -> Option<Value> {
    match (value, column_type) {
        (serde_json::Value::String(s), _) => coerce(s, column_type),
        (serde_json::Value::Number(n), ColumnType::Integer) => n.as_i64().map(Value::Integer),
        (serde_json::Value::Number(n), ColumnType::Float) => n.as_f64().map(Value::Float),
        (serde_json::Value::Bool(b), ColumnType::Boolean) => Some(Value::Boolean(*b)),
        _ => None,
    }
}

/// Serve predictions over HTTP until interrupted.
fn run_server(args: ServeArgs, cli_args: &HarrierArgs) -> Result<()> {
    let backend = resolve_backend(&args.backend)?;
    let service = Arc::new(PredictionService::new(&args.model, backend));

    if cli_args.verbosity() > 0 {
        println!("Serving {} on http://{}", args.model.display(), args.addr);
    }

    let runtime = Runtime::new()?;
    runtime.block_on(async {
        if args.preload {
            service.artifact().await?;
        }
        serve::http::bind_and_serve(service, &args.addr).await
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    fn sentiment_schema() -> Schema {
        Schema::builder()
            .boolean("Sentiment")
            .unwrap()
            .text("SentimentText")
            .unwrap()
            .build()
            .unwrap()
    }

    #[test]
    fn test_resolve_backend() {
        assert_eq!(resolve_backend("linear").unwrap().name(), "linear");
        assert!(matches!(
            resolve_backend("forest"),
            Err(HarrierError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_row_from_json_coerces_types() {
        let schema = Schema::builder()
            .text("VendorId")
            .unwrap()
            .float("TripDistance")
            .unwrap()
            .build()
            .unwrap();

        let row = row_from_json(&schema, r#"{"VendorId":"VTS","TripDistance":10.33}"#).unwrap();
        assert_eq!(row.get("VendorId").unwrap().as_text(), Some("VTS"));
        assert_eq!(row.get("TripDistance").unwrap().as_f64(), Some(10.33));
    }

    #[test]
    fn test_row_from_json_rejects_unknown_column() {
        let err = row_from_json(&sentiment_schema(), r#"{"Bogus":1}"#).unwrap_err();
        assert!(matches!(err, HarrierError::InvalidInput(_)));
    }

    #[test]
    fn test_row_from_json_rejects_type_mismatch() {
        let err = row_from_json(&sentiment_schema(), r#"{"Sentiment":3.5}"#).unwrap_err();
        assert!(matches!(err, HarrierError::InvalidInput(_)));
    }

    #[test]
    fn test_load_hyperparameter_overrides() {
        let args = TrainArgs {
            data: "data.tsv".into(),
            schema: "schema.json".into(),
            pipeline: "pipeline.json".into(),
            output: "model.harrier".into(),
            task: TaskArg::Classification,
            data_format: DataFormat::Tsv,
            backend: "linear".to_string(),
            params: None,
            iterations: Some(500),
            learning_rate: Some(0.05),
            seed: None,
            test_data: None,
        };

        let params = load_hyperparameters(&args).unwrap();
        assert_eq!(params.iterations, 500);
        assert_eq!(params.learning_rate, 0.05);
        assert_eq!(params.seed, Hyperparameters::default().seed);
    }

    #[test]
    fn test_data_format_flag_drives_loader() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.tsv");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "1\tgreat").unwrap();
        writeln!(file, "0\tawful").unwrap();

        let dataset = Dataset::load(
            &path,
            &sentiment_schema(),
            DataFormat::Tsv.load_options(),
        )
        .unwrap();
        assert_eq!(dataset.len(), 2);
    }
}
