//! Command line argument parsing for the Harrier CLI using clap.

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::dataset::LoadOptions;
use crate::trainer::TaskKind;

/// Harrier - train, evaluate and serve small tabular/text models
#[derive(Parser, Debug, Clone)]
#[command(name = "harrier")]
#[command(about = "Train, evaluate and serve models over delimited text datasets")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct HarrierArgs {
    /// Verbosity level (0=quiet, 1=normal, 2=verbose, 3=debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "human")]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

impl HarrierArgs {
    /// Get the effective verbosity level
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            match self.verbose {
                0 => 1, // Default to normal
                n => n,
            }
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Train a model and save the artifact
    Train(TrainArgs),

    /// Evaluate a saved artifact against a dataset
    Evaluate(EvaluateArgs),

    /// Predict from a saved artifact
    Predict(PredictArgs),

    /// Serve predictions over HTTP
    Serve(ServeArgs),
}

/// Output formats supported by the CLI.
#[derive(ValueEnum, Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}

/// On-disk shape of a delimited dataset.
#[derive(ValueEnum, Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataFormat {
    /// Tab-separated, no header row
    Tsv,
    /// Comma-separated with a header row
    Csv,
}

impl DataFormat {
    /// The loader options this format implies.
    pub fn load_options(self) -> LoadOptions {
        match self {
            DataFormat::Tsv => LoadOptions::tsv(),
            DataFormat::Csv => LoadOptions::csv_with_header(),
        }
    }
}

/// Task selector for training.
#[derive(ValueEnum, Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskArg {
    /// Binary classification (Positive/Negative)
    Classification,
    /// Scalar regression
    Regression,
}

impl From<TaskArg> for TaskKind {
    fn from(task: TaskArg) -> TaskKind {
        match task {
            TaskArg::Classification => TaskKind::BinaryClassification,
            TaskArg::Regression => TaskKind::Regression,
        }
    }
}

/// Arguments for training
#[derive(Parser, Debug, Clone)]
pub struct TrainArgs {
    /// Training data file (delimited text)
    #[arg(value_name = "DATA_FILE")]
    pub data: PathBuf,

    /// Schema definition file (JSON)
    #[arg(short, long, value_name = "SCHEMA_FILE")]
    pub schema: PathBuf,

    /// Pipeline definition file (JSON)
    #[arg(short, long, value_name = "PIPELINE_FILE")]
    pub pipeline: PathBuf,

    /// Where to write the trained artifact
    #[arg(short, long, value_name = "ARTIFACT_FILE")]
    pub output: PathBuf,

    /// Task kind
    #[arg(short, long)]
    pub task: TaskArg,

    /// Dataset format
    #[arg(long, default_value = "tsv")]
    pub data_format: DataFormat,

    /// Backend to train with
    #[arg(short, long, default_value = "linear")]
    pub backend: String,

    /// Hyperparameter file (JSON); missing keys take their defaults
    #[arg(long, value_name = "PARAMS_FILE")]
    pub params: Option<PathBuf>,

    /// Override the number of training iterations
    #[arg(long)]
    pub iterations: Option<usize>,

    /// Override the learning rate
    #[arg(long)]
    pub learning_rate: Option<f64>,

    /// Override the random seed
    #[arg(long)]
    pub seed: Option<u64>,

    /// Held-out dataset to evaluate against after training
    #[arg(long, value_name = "TEST_FILE")]
    pub test_data: Option<PathBuf>,
}

/// Arguments for evaluation
#[derive(Parser, Debug, Clone)]
pub struct EvaluateArgs {
    /// Trained artifact file
    #[arg(value_name = "ARTIFACT_FILE")]
    pub model: PathBuf,

    /// Held-out data file (delimited text)
    #[arg(value_name = "DATA_FILE")]
    pub data: PathBuf,

    /// Dataset format
    #[arg(long, default_value = "tsv")]
    pub data_format: DataFormat,

    /// Backend the artifact was trained with
    #[arg(short, long, default_value = "linear")]
    pub backend: String,
}

/// Arguments for one-off prediction
#[derive(Parser, Debug, Clone)]
pub struct PredictArgs {
    /// Trained artifact file
    #[arg(value_name = "ARTIFACT_FILE")]
    pub model: PathBuf,

    /// Input row as a JSON object keyed by schema column names
    #[arg(short, long, conflicts_with = "text")]
    pub input: Option<String>,

    /// Shorthand for text models: the text to classify
    #[arg(long)]
    pub text: Option<String>,

    /// Backend the artifact was trained with
    #[arg(short, long, default_value = "linear")]
    pub backend: String,
}

/// Arguments for serving
#[derive(Parser, Debug, Clone)]
pub struct ServeArgs {
    /// Trained artifact file
    #[arg(value_name = "ARTIFACT_FILE")]
    pub model: PathBuf,

    /// Address to listen on
    #[arg(short, long, default_value = "127.0.0.1:8080", env = "HARRIER_ADDR")]
    pub addr: String,

    /// Backend the artifact was trained with
    #[arg(short, long, default_value = "linear")]
    pub backend: String,

    /// Load the artifact eagerly instead of on the first request
    #[arg(long)]
    pub preload: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_levels() {
        let args =
            HarrierArgs::try_parse_from(["harrier", "predict", "model.bin", "--text", "hi"])
                .unwrap();
        assert_eq!(args.verbosity(), 1);

        let args =
            HarrierArgs::try_parse_from(["harrier", "-vv", "predict", "model.bin", "--text", "hi"])
                .unwrap();
        assert_eq!(args.verbosity(), 2);

        let args = HarrierArgs::try_parse_from([
            "harrier", "--quiet", "predict", "model.bin", "--text", "hi",
        ])
        .unwrap();
        assert_eq!(args.verbosity(), 0);
    }

    #[test]
    fn test_output_format() {
        let args = HarrierArgs::try_parse_from([
            "harrier", "--format", "json", "predict", "model.bin", "--text", "hi",
        ])
        .unwrap();
        assert!(matches!(args.output_format, OutputFormat::Json));
    }

    #[test]
    fn test_train_args() {
        let args = HarrierArgs::try_parse_from([
            "harrier",
            "train",
            "data.tsv",
            "--schema",
            "schema.json",
            "--pipeline",
            "pipeline.json",
            "--output",
            "model.bin",
            "--task",
            "classification",
            "--iterations",
            "500",
        ])
        .unwrap();

        match args.command {
            Command::Train(train) => {
                assert!(matches!(train.task, TaskArg::Classification));
                assert!(matches!(train.data_format, DataFormat::Tsv));
                assert_eq!(train.iterations, Some(500));
                assert_eq!(train.backend, "linear");
            }
            other => panic!("expected Train command, got {other:?}"),
        }
    }

    #[test]
    fn test_predict_input_conflicts_with_text() {
        let result = HarrierArgs::try_parse_from([
            "harrier", "predict", "model.bin", "--input", "{}", "--text", "hi",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_data_format_load_options() {
        let tsv = DataFormat::Tsv.load_options();
        assert_eq!(tsv.delimiter, '\t');
        assert!(!tsv.has_header);

        let csv = DataFormat::Csv.load_options();
        assert_eq!(csv.delimiter, ',');
        assert!(csv.has_header);
    }
}
