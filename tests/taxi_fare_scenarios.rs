//! End-to-end regression scenarios over a taxi-fare shaped CSV dataset:
//! categorical one-hot encoding, feature concatenation, and serving-time
//! prediction without a fare column.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use harrier::backend::{Hyperparameters, LinearBackend};
use harrier::dataset::{Dataset, LoadOptions, Row, Value};
use harrier::evaluate::{Evaluator, Metrics};
use harrier::pipeline::PipelineDefinition;
use harrier::schema::Schema;
use harrier::serve::{Prediction, PredictionService};
use harrier::store::{Artifact, ArtifactMetadata};
use harrier::trainer::{TaskKind, Trainer, TrainerConfig};

fn fare(vendor: &str, distance: f64) -> f64 {
    let base = if vendor == "VTS" { 3.0 } else { 2.5 };
    base + 3.0 * distance
}

fn write_config_files(dir: &Path) -> (PathBuf, PathBuf, PathBuf) {
    let schema_path = dir.join("schema.json");
    fs::write(
        &schema_path,
        r#"{
  "columns": [
    { "name": "VendorId", "type": "Text" },
    { "name": "RateCode", "type": "Text" },
    { "name": "PassengerCount", "type": "Float" },
    { "name": "TripDistance", "type": "Float" },
    { "name": "PaymentType", "type": "Text" },
    { "name": "FareAmount", "type": "Float" }
  ]
}"#,
    )
    .unwrap();

    let pipeline_path = dir.join("pipeline.json");
    fs::write(
        &pipeline_path,
        r#"{
  "steps": [
    { "step": "column_copy", "source": "FareAmount", "target": "Label" },
    { "step": "one_hot_encode", "columns": ["VendorId", "RateCode", "PaymentType"] },
    {
      "step": "concatenate",
      "target": "Features",
      "columns": ["VendorId", "RateCode", "PassengerCount", "TripDistance", "PaymentType"]
    }
  ]
}"#,
    )
    .unwrap();

    let data_path = dir.join("train.csv");
    let mut csv = String::from(
        "vendor_id,rate_code,passenger_count,trip_distance,payment_type,fare_amount\n",
    );
    for i in 0..40 {
        let vendor = if i % 2 == 0 { "VTS" } else { "CMT" };
        let payment = if i % 3 == 0 { "CSH" } else { "CRD" };
        let distance = 0.5 + (i as f64) * 0.25;
        let passengers = 1.0 + (i % 4) as f64;
        csv.push_str(&format!(
            "{vendor},1,{passengers},{distance},{payment},{}\n",
            fare(vendor, distance)
        ));
    }
    fs::write(&data_path, csv).unwrap();

    (schema_path, pipeline_path, data_path)
}

fn train_artifact(dir: &Path) -> PathBuf {
    let (schema_path, pipeline_path, data_path) = write_config_files(dir);

    let schema = Schema::from_json_file(&schema_path).unwrap();
    let pipeline = PipelineDefinition::from_json_file(&pipeline_path).unwrap();
    let dataset = Dataset::load(&data_path, &schema, LoadOptions::csv_with_header()).unwrap();

    let config = TrainerConfig::for_task(TaskKind::Regression);
    let trainer = Trainer::new(config.clone());
    let params = Hyperparameters {
        iterations: 5000,
        ..Hyperparameters::default()
    };
    let (model, fitted) = trainer
        .train(&LinearBackend::new(), &dataset, &pipeline, &params)
        .unwrap();

    let artifact = Artifact {
        metadata: ArtifactMetadata {
            backend: model.backend.clone(),
            created_at: chrono::Utc::now(),
            training_rows: dataset.len(),
        },
        schema,
        trainer: config,
        pipeline: fitted,
        model,
    };

    let path = dir.join("taxi.harrier");
    artifact.save(&path).unwrap();
    path
}

#[test]
fn test_regression_metrics_on_learnable_data() {
    let dir = tempfile::tempdir().unwrap();
    let path = train_artifact(dir.path());
    let artifact = Artifact::load(&path).unwrap();

    let (schema_path, _, data_path) = write_config_files(dir.path());
    let schema = Schema::from_json_file(&schema_path).unwrap();
    let dataset = Dataset::load(&data_path, &schema, LoadOptions::csv_with_header()).unwrap();

    let metrics = Evaluator::new(artifact.trainer.clone())
        .evaluate(
            &LinearBackend::new(),
            &artifact.model,
            &artifact.pipeline,
            &dataset,
        )
        .unwrap();

    match metrics {
        Metrics::Regression(m) => {
            assert!(m.r_squared > 0.95, "r_squared too low: {}", m.r_squared);
            assert!(m.rms < 2.0, "rms too high: {}", m.rms);
        }
        other => panic!("expected regression metrics, got {other:?}"),
    }
}

fn trip_request(vendor: &str, distance: f64) -> Row {
    let mut row = Row::new();
    row.set("VendorId", Value::Text(vendor.to_string()));
    row.set("RateCode", Value::Text("1".to_string()));
    row.set("PassengerCount", Value::Float(1.0));
    row.set("TripDistance", Value::Float(distance));
    row.set("PaymentType", Value::Text("CRD".to_string()));
    row
}

#[tokio::test]
async fn test_predict_without_fare_column() {
    let dir = tempfile::tempdir().unwrap();
    let path = train_artifact(dir.path());
    let service = PredictionService::new(path, Arc::new(LinearBackend::new()));

    // The request carries no FareAmount; the label source is defaulted.
    let prediction = service.predict(&trip_request("VTS", 4.0)).await.unwrap();
    match prediction {
        Prediction::Scalar(value) => {
            let expected = fare("VTS", 4.0);
            assert!(
                (value - expected).abs() < 2.0,
                "prediction {value} too far from {expected}"
            );
        }
        other => panic!("expected a scalar prediction, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unseen_category_still_predicts() {
    let dir = tempfile::tempdir().unwrap();
    let path = train_artifact(dir.path());
    let service = PredictionService::new(path, Arc::new(LinearBackend::new()));

    // "DDS" was never seen at fit time; it encodes to all zeros rather
    // than failing the request.
    let prediction = service.predict(&trip_request("DDS", 2.0)).await.unwrap();
    assert!(matches!(prediction, Prediction::Scalar(_)));
}

#[test]
fn test_fitted_pipeline_requires_raw_inputs_only() {
    let dir = tempfile::tempdir().unwrap();
    let path = train_artifact(dir.path());
    let artifact = Artifact::load(&path).unwrap();

    let required = artifact.pipeline.required_input_columns();
    assert_eq!(
        required,
        vec![
            "FareAmount",
            "VendorId",
            "RateCode",
            "PaymentType",
            "PassengerCount",
            "TripDistance",
        ]
    );
}
