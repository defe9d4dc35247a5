//! Reference linear backend: seeded least-squares by batch gradient descent.
//!
//! Deliberately simple — it exists so the harness trains and serves
//! end-to-end without an external library. Features are standardized
//! internally, so the default learning rate converges on unscaled inputs
//! like trip distances or raw term counts.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::backend::{Hyperparameters, ModelBackend, TrainedModel, check_backend};
use crate::error::{HarrierError, Result};

const BACKEND_NAME: &str = "linear";

/// Fitted parameters carried in the model blob.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct LinearParams {
    /// Per-feature means used for standardization.
    means: Vec<f64>,
    /// Per-feature standard deviations (1.0 where the feature is constant).
    stds: Vec<f64>,
    /// Weights over standardized features.
    weights: Vec<f64>,
    bias: f64,
}

/// A linear model backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearBackend;

impl LinearBackend {
    /// Create a new linear backend.
    pub fn new() -> Self {
        LinearBackend
    }
}

impl ModelBackend for LinearBackend {
    fn name(&self) -> &'static str {
        BACKEND_NAME
    }

    fn train(
        &self,
        features: &[Vec<f64>],
        labels: &[f64],
        params: &Hyperparameters,
    ) -> Result<TrainedModel> {
        if features.is_empty() {
            return Err(HarrierError::backend("training set is empty"));
        }
        if features.len() != labels.len() {
            return Err(HarrierError::backend(format!(
                "{} feature vectors but {} labels",
                features.len(),
                labels.len()
            )));
        }

        let width = features[0].len();
        if let Some(bad) = features.iter().find(|f| f.len() != width) {
            return Err(HarrierError::backend(format!(
                "inconsistent feature vector width: expected {width}, found {}",
                bad.len()
            )));
        }
        if width == 0 {
            return Err(HarrierError::backend("feature vectors are empty"));
        }

        let n = features.len() as f64;

        let mut means = vec![0.0; width];
        for row in features {
            for (m, x) in means.iter_mut().zip(row) {
                *m += x / n;
            }
        }
        let mut stds = vec![0.0; width];
        for row in features {
            for ((s, m), x) in stds.iter_mut().zip(&means).zip(row) {
                *s += (x - m).powi(2) / n;
            }
        }
        for s in &mut stds {
            *s = s.sqrt();
            if *s == 0.0 {
                *s = 1.0;
            }
        }

        let standardized: Vec<Vec<f64>> = features
            .iter()
            .map(|row| {
                row.iter()
                    .zip(means.iter().zip(&stds))
                    .map(|(x, (m, s))| (x - m) / s)
                    .collect()
            })
            .collect();

        // Small seeded init keeps runs reproducible for a fixed seed.
        let mut rng = StdRng::seed_from_u64(params.seed);
        let mut weights: Vec<f64> = (0..width).map(|_| rng.random_range(-0.01..0.01)).collect();
        let mut bias = labels.iter().sum::<f64>() / n;

        for _ in 0..params.iterations {
            let mut weight_grads = vec![0.0; width];
            let mut bias_grad = 0.0;

            for (row, label) in standardized.iter().zip(labels) {
                let predicted =
                    bias + weights.iter().zip(row).map(|(w, x)| w * x).sum::<f64>();
                let residual = predicted - label;
                for (g, x) in weight_grads.iter_mut().zip(row) {
                    *g += residual * x / n;
                }
                bias_grad += residual / n;
            }

            for (w, g) in weights.iter_mut().zip(&weight_grads) {
                *w -= params.learning_rate * g;
            }
            bias -= params.learning_rate * bias_grad;
        }

        let fitted = LinearParams {
            means,
            stds,
            weights,
            bias,
        };
        let blob = bincode::serialize(&fitted)
            .map_err(|e| HarrierError::backend(format!("failed to serialize model: {e}")))?;

        Ok(TrainedModel {
            backend: BACKEND_NAME.to_string(),
            blob,
        })
    }

    fn predict(&self, model: &TrainedModel, features: &[f64]) -> Result<f64> {
        check_backend(BACKEND_NAME, model)?;

        let fitted: LinearParams = bincode::deserialize(&model.blob)
            .map_err(|e| HarrierError::backend(format!("failed to deserialize model: {e}")))?;

        if features.len() != fitted.weights.len() {
            return Err(HarrierError::invalid_input(format!(
                "feature vector has {} elements, model expects {}",
                features.len(),
                fitted.weights.len()
            )));
        }

        let score = fitted.bias
            + fitted
                .weights
                .iter()
                .zip(features.iter().zip(fitted.means.iter().zip(&fitted.stds)))
                .map(|(w, (x, (m, s)))| w * (x - m) / s)
                .sum::<f64>();

        Ok(score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> Hyperparameters {
        Hyperparameters {
            iterations: 2000,
            learning_rate: 0.1,
            ..Hyperparameters::default()
        }
    }

    #[test]
    fn test_fits_simple_linear_relation() {
        // y = 2x + 1
        let features: Vec<Vec<f64>> = (0..20).map(|i| vec![i as f64]).collect();
        let labels: Vec<f64> = (0..20).map(|i| 2.0 * i as f64 + 1.0).collect();

        let backend = LinearBackend::new();
        let model = backend.train(&features, &labels, &params()).unwrap();

        let prediction = backend.predict(&model, &[10.0]).unwrap();
        assert!((prediction - 21.0).abs() < 0.5, "got {prediction}");
    }

    #[test]
    fn test_training_is_deterministic_for_fixed_seed() {
        let features: Vec<Vec<f64>> = (0..10).map(|i| vec![i as f64, (i * i) as f64]).collect();
        let labels: Vec<f64> = (0..10).map(|i| i as f64).collect();

        let backend = LinearBackend::new();
        let a = backend.train(&features, &labels, &params()).unwrap();
        let b = backend.train(&features, &labels, &params()).unwrap();

        assert_eq!(a.blob, b.blob);
    }

    #[test]
    fn test_predict_does_not_mutate_model() {
        let features = vec![vec![0.0], vec![1.0]];
        let labels = vec![0.0, 1.0];

        let backend = LinearBackend::new();
        let model = backend.train(&features, &labels, &params()).unwrap();
        let blob_before = model.blob.clone();

        backend.predict(&model, &[0.5]).unwrap();
        assert_eq!(model.blob, blob_before);
    }

    #[test]
    fn test_rejects_empty_training_set() {
        let backend = LinearBackend::new();
        let err = backend.train(&[], &[], &params()).unwrap_err();
        assert!(matches!(err, HarrierError::BackendTraining(_)));
    }

    #[test]
    fn test_rejects_wrong_feature_width_at_predict() {
        let backend = LinearBackend::new();
        let model = backend
            .train(&[vec![0.0, 1.0], vec![1.0, 0.0]], &[0.0, 1.0], &params())
            .unwrap();

        assert!(matches!(
            backend.predict(&model, &[1.0]),
            Err(HarrierError::InvalidInput(_))
        ));
    }
}
