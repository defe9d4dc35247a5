//! Output formatting for CLI commands.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::cli::args::{HarrierArgs, OutputFormat};
use crate::error::Result;

/// Result structure for training runs.
#[derive(Debug, Serialize, Deserialize)]
pub struct TrainingReport {
    pub artifact: String,
    pub backend: String,
    pub training_rows: usize,
    pub duration_ms: u64,
    /// Held-out metrics, present when `--test-data` was given.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<BTreeMap<String, f64>>,
    /// A handful of held-out rows scored by the fresh model.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_predictions: Option<Vec<SamplePrediction>>,
}

/// One scored example row, for eyeballing a fresh model.
#[derive(Debug, Serialize, Deserialize)]
pub struct SamplePrediction {
    /// The raw input columns, as `name=value` pairs.
    pub input: String,
    /// Display form of the prediction.
    pub predicted: String,
    /// The true label from the dataset.
    pub actual: f64,
}

/// Result structure for evaluation runs.
#[derive(Debug, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub artifact: String,
    pub rows: usize,
    pub metrics: BTreeMap<String, f64>,
}

/// Result structure for one-off predictions.
#[derive(Debug, Serialize, Deserialize)]
pub struct PredictionReport {
    /// Display form: `Positive`, `Negative`, or a decimal.
    pub prediction: String,
    /// Raw backend score.
    pub score: f64,
}

/// Output a result in the selected format.
pub fn output_result<T: Serialize>(message: &str, result: &T, args: &HarrierArgs) -> Result<()> {
    match args.output_format {
        OutputFormat::Human => output_human(message, result, args),
        OutputFormat::Json => output_json(result, args),
    }
}

/// Human-readable output: the message followed by `key: value` lines.
fn output_human<T: Serialize>(message: &str, result: &T, args: &HarrierArgs) -> Result<()> {
    if args.verbosity() > 0 {
        println!("{message}");
    }

    let value = serde_json::to_value(result)?;
    print_value("", &value);
    Ok(())
}

fn print_value(indent: &str, value: &serde_json::Value) {
    match value {
        serde_json::Value::Object(map) => {
            for (key, inner) in map {
                match inner {
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        println!("{indent}{key}:");
                        print_value(&format!("{indent}  "), inner);
                    }
                    serde_json::Value::Null => {}
                    _ => println!("{indent}{key}: {}", scalar(inner)),
                }
            }
        }
        serde_json::Value::Array(items) => {
            for item in items {
                match item {
                    serde_json::Value::Object(_) => {
                        println!("{indent}-");
                        print_value(&format!("{indent}  "), item);
                    }
                    _ => println!("{indent}- {}", scalar(item)),
                }
            }
        }
        other => println!("{indent}{}", scalar(other)),
    }
}

fn scalar(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

/// JSON output, optionally pretty-printed.
fn output_json<T: Serialize>(result: &T, args: &HarrierArgs) -> Result<()> {
    let json = if args.pretty {
        serde_json::to_string_pretty(result)?
    } else {
        serde_json::to_string(result)?
    };
    println!("{json}");
    Ok(())
}
