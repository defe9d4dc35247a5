//! The model backend adapter.
//!
//! The concrete learning algorithm is an external collaborator behind the
//! [`ModelBackend`] capability set: `train` produces an opaque
//! [`TrainedModel`] and `predict` scores a feature vector against it. Any
//! boosting or regression library can sit behind this trait; the crate ships
//! [`linear::LinearBackend`] as a deterministic reference implementation.

pub mod linear;

use serde::{Deserialize, Serialize};

use crate::error::{HarrierError, Result};

pub use linear::LinearBackend;

/// Hyperparameters recognized by backends.
///
/// Tree ensembles read `num_trees`, `num_leaves` and
/// `min_documents_in_leaf`; gradient methods read `learning_rate` and
/// `iterations`. `seed` fixes all randomized initialization, making
/// training deterministic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Hyperparameters {
    /// Number of trees in an ensemble.
    pub num_trees: usize,
    /// Maximum leaves per tree.
    pub num_leaves: usize,
    /// Minimum samples per leaf; controls overfitting.
    pub min_documents_in_leaf: usize,
    /// Step size for gradient methods.
    pub learning_rate: f64,
    /// Iteration count for gradient methods.
    pub iterations: usize,
    /// Random seed.
    pub seed: u64,
}

impl Default for Hyperparameters {
    fn default() -> Self {
        Hyperparameters {
            num_trees: 25,
            num_leaves: 25,
            min_documents_in_leaf: 10,
            learning_rate: 0.1,
            iterations: 1000,
            seed: 42,
        }
    }
}

/// An opaque backend-trained model artifact.
///
/// The blob layout is owned by the backend that produced it; the rest of
/// the harness only moves it around and persists it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedModel {
    /// Name of the backend that trained this model.
    pub backend: String,
    /// Backend-defined serialized parameters.
    pub blob: Vec<u8>,
}

/// Capability set for model backends.
///
/// Implementations must be deterministic given a fixed seed, and `predict`
/// must never mutate the model; `&self`/`&TrainedModel` receivers plus
/// `Send + Sync` make concurrent prediction safe by construction.
pub trait ModelBackend: Send + Sync {
    /// Backend name, recorded inside every model it trains.
    fn name(&self) -> &'static str;

    /// Train a model from feature vectors and numeric labels.
    fn train(
        &self,
        features: &[Vec<f64>],
        labels: &[f64],
        params: &Hyperparameters,
    ) -> Result<TrainedModel>;

    /// Score one feature vector against a trained model.
    fn predict(&self, model: &TrainedModel, features: &[f64]) -> Result<f64>;
}

/// Reject a model trained by a different backend.
pub(crate) fn check_backend(expected: &str, model: &TrainedModel) -> Result<()> {
    if model.backend != expected {
        return Err(HarrierError::backend(format!(
            "model was trained by backend '{}', not '{expected}'",
            model.backend
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hyperparameters_defaults() {
        let params = Hyperparameters::default();
        assert_eq!(params.num_trees, 25);
        assert_eq!(params.num_leaves, 25);
        assert_eq!(params.min_documents_in_leaf, 10);
        assert_eq!(params.seed, 42);
    }

    #[test]
    fn test_hyperparameters_partial_json() {
        let params: Hyperparameters = serde_json::from_str(r#"{"num_trees": 5}"#).unwrap();
        assert_eq!(params.num_trees, 5);
        assert_eq!(params.num_leaves, 25);
    }

    #[test]
    fn test_backend_mismatch_rejected() {
        let model = TrainedModel {
            backend: "other".to_string(),
            blob: Vec::new(),
        };
        assert!(check_backend("linear", &model).is_err());
    }
}
