//! Evaluation of trained models over held-out datasets.
//!
//! The evaluator applies the fitted pipeline apply-only (never re-fitting),
//! predicts per row, and aggregates metrics. Metrics are produced once per
//! run and never mutated; re-running on the same model and dataset yields
//! identical values.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::backend::{ModelBackend, TrainedModel};
use crate::dataset::Dataset;
use crate::error::Result;
use crate::pipeline::FittedPipeline;
use crate::trainer::{TaskKind, TrainerConfig};

/// Classification threshold applied to raw backend scores.
pub const DECISION_THRESHOLD: f64 = 0.5;

/// Aggregate metrics from one evaluator run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Metrics {
    Classification(ClassificationMetrics),
    Regression(RegressionMetrics),
}

impl Metrics {
    /// Metric name → value, for uniform printing and JSON output.
    pub fn to_map(&self) -> BTreeMap<String, f64> {
        match self {
            Metrics::Classification(m) => m.to_map(),
            Metrics::Regression(m) => m.to_map(),
        }
    }
}

/// Binary classification metrics from a 2×2 confusion count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    /// Rank-based AUC (Mann-Whitney); 0.5 when only one class is present.
    pub auc: f64,
    pub true_positives: usize,
    pub true_negatives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
}

impl ClassificationMetrics {
    /// Metric name → value.
    pub fn to_map(&self) -> BTreeMap<String, f64> {
        BTreeMap::from([
            ("accuracy".to_string(), self.accuracy),
            ("precision".to_string(), self.precision),
            ("recall".to_string(), self.recall),
            ("f1".to_string(), self.f1),
            ("auc".to_string(), self.auc),
        ])
    }
}

/// Regression metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionMetrics {
    /// Root of the mean squared residual.
    pub rms: f64,
    /// 1 − SSR/SST; defined as 0 when the labels have zero variance.
    pub r_squared: f64,
}

impl RegressionMetrics {
    /// Metric name → value.
    pub fn to_map(&self) -> BTreeMap<String, f64> {
        BTreeMap::from([
            ("rms".to_string(), self.rms),
            ("r_squared".to_string(), self.r_squared),
        ])
    }
}

/// Runs a trained model over a held-out dataset and aggregates metrics.
#[derive(Debug, Clone)]
pub struct Evaluator {
    config: TrainerConfig,
}

impl Evaluator {
    /// Create an evaluator sharing the trainer's column configuration.
    pub fn new(config: TrainerConfig) -> Self {
        Evaluator { config }
    }

    /// Evaluate a model against a held-out dataset.
    pub fn evaluate(
        &self,
        backend: &dyn ModelBackend,
        model: &TrainedModel,
        pipeline: &FittedPipeline,
        dataset: &Dataset,
    ) -> Result<Metrics> {
        let mut scores = Vec::with_capacity(dataset.len());
        let mut labels = Vec::with_capacity(dataset.len());

        for row in dataset.rows() {
            let transformed = pipeline.apply(row.clone())?;
            let features = self.config.extract_features(&transformed)?;
            scores.push(backend.predict(model, &features)?);
            labels.push(self.config.extract_label(&transformed)?);
        }

        info!(rows = dataset.len(), task = ?self.config.task, "evaluation complete");

        Ok(match self.config.task {
            TaskKind::BinaryClassification => {
                Metrics::Classification(classification_metrics(&scores, &labels))
            }
            TaskKind::Regression => Metrics::Regression(regression_metrics(&scores, &labels)),
        })
    }
}

/// Compute classification metrics from raw scores and 0/1 labels.
fn classification_metrics(scores: &[f64], labels: &[f64]) -> ClassificationMetrics {
    let mut tp = 0usize;
    let mut tn = 0usize;
    let mut fp = 0usize;
    let mut fn_ = 0usize;

    for (score, label) in scores.iter().zip(labels) {
        let predicted = *score > DECISION_THRESHOLD;
        let actual = *label > DECISION_THRESHOLD;
        match (predicted, actual) {
            (true, true) => tp += 1,
            (false, false) => tn += 1,
            (true, false) => fp += 1,
            (false, true) => fn_ += 1,
        }
    }

    let total = scores.len();
    let accuracy = if total == 0 {
        0.0
    } else {
        (tp + tn) as f64 / total as f64
    };
    let precision = ratio(tp, tp + fp);
    let recall = ratio(tp, tp + fn_);
    let f1 = if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    };

    ClassificationMetrics {
        accuracy,
        precision,
        recall,
        f1,
        auc: rank_auc(scores, labels),
        true_positives: tp,
        true_negatives: tn,
        false_positives: fp,
        false_negatives: fn_,
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Rank-based AUC: the Mann-Whitney statistic over predicted scores, with
/// tied scores receiving averaged ranks. No parametric assumption.
fn rank_auc(scores: &[f64], labels: &[f64]) -> f64 {
    let positives = labels.iter().filter(|l| **l > DECISION_THRESHOLD).count();
    let negatives = labels.len() - positives;
    if positives == 0 || negatives == 0 {
        return 0.5;
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|a, b| scores[*a].total_cmp(&scores[*b]));

    // Average ranks across runs of tied scores.
    let mut ranks = vec![0.0; scores.len()];
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && scores[order[j + 1]] == scores[order[i]] {
            j += 1;
        }
        let average_rank = (i + j) as f64 / 2.0 + 1.0;
        for k in i..=j {
            ranks[order[k]] = average_rank;
        }
        i = j + 1;
    }

    let positive_rank_sum: f64 = labels
        .iter()
        .zip(&ranks)
        .filter(|(l, _)| **l > DECISION_THRESHOLD)
        .map(|(_, r)| *r)
        .sum();

    let p = positives as f64;
    let n = negatives as f64;
    (positive_rank_sum - p * (p + 1.0) / 2.0) / (p * n)
}

/// Compute regression metrics from predictions and true values.
fn regression_metrics(predictions: &[f64], labels: &[f64]) -> RegressionMetrics {
    let n = labels.len() as f64;
    if labels.is_empty() {
        return RegressionMetrics {
            rms: 0.0,
            r_squared: 0.0,
        };
    }

    let residual_sum_of_squares: f64 = predictions
        .iter()
        .zip(labels)
        .map(|(p, l)| (p - l).powi(2))
        .sum();
    let rms = (residual_sum_of_squares / n).sqrt();

    let mean = labels.iter().sum::<f64>() / n;
    let total_sum_of_squares: f64 = labels.iter().map(|l| (l - mean).powi(2)).sum();
    let r_squared = if total_sum_of_squares == 0.0 {
        0.0
    } else {
        1.0 - residual_sum_of_squares / total_sum_of_squares
    };

    RegressionMetrics { rms, r_squared }
}
