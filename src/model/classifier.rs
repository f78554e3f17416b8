//! Binary winrate classifier and its on-disk artifact.

use super::features::{Encoding, RowView};
use crate::error::AppError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const MODEL_FORMAT_VERSION: u32 = 1;

/// Logistic regression over standardised features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegression {
    weights: Vec<f64>,
    bias: f64,
    means: Vec<f64>,
    scales: Vec<f64>,
}

/// Gradient descent hyperparameters.
#[derive(Debug, Clone)]
pub struct TrainConfig {
    pub learning_rate: f64,
    pub max_epochs: usize,
    pub l2_lambda: f64,
    pub convergence_eps: f64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        TrainConfig {
            learning_rate: 0.1,
            max_epochs: 1000,
            l2_lambda: 1e-4,
            convergence_eps: 1e-6,
        }
    }
}

/// Numerically stable sigmoid.
fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let ez = z.exp();
        ez / (1.0 + ez)
    }
}

impl LogisticRegression {
    pub fn new(num_features: usize) -> Self {
        LogisticRegression {
            weights: vec![0.0; num_features],
            bias: 0.0,
            means: vec![0.0; num_features],
            scales: vec![1.0; num_features],
        }
    }

    pub fn num_features(&self) -> usize {
        self.weights.len()
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn bias(&self) -> f64 {
        self.bias
    }

    fn is_consistent(&self) -> bool {
        let n = self.weights.len();
        self.means.len() == n
            && self.scales.len() == n
            && self.scales.iter().all(|s| s.is_finite() && *s > 0.0)
            && self.weights.iter().all(|w| w.is_finite())
            && self.bias.is_finite()
    }

    fn logit(&self, features: &[f64]) -> f64 {
        self.weights
            .iter()
            .zip(features)
            .zip(self.means.iter().zip(&self.scales))
            .map(|((w, x), (m, s))| w * (x - m) / s)
            .sum::<f64>()
            + self.bias
    }

    /// Probability of the positive class (ally win), always within [0, 1].
    pub fn predict_proba(&self, features: &[f64]) -> f64 {
        debug_assert_eq!(features.len(), self.weights.len());
        let p = sigmoid(self.logit(features));
        if p.is_nan() {
            0.5
        } else {
            p.clamp(0.0, 1.0)
        }
    }

    pub fn predict(&self, features: &[f64]) -> bool {
        self.predict_proba(features) >= 0.5
    }

    /// Full-batch gradient descent with L2 regularisation.
    pub fn fit<'a>(
        features: impl Into<RowView<'a>>,
        labels: &[f64],
        cfg: &TrainConfig,
    ) -> Result<Self, AppError> {
        let features = features.into();
        let rows = features.rows();
        if rows == 0 {
            return Err(AppError::InvalidInput(
                "cannot fit a model on zero samples".to_string(),
            ));
        }
        if labels.len() != rows {
            return Err(AppError::InvalidInput(format!(
                "{} feature rows but {} labels",
                rows,
                labels.len()
            )));
        }

        let k = features.cols();
        let n = rows as f64;
        let mut model = LogisticRegression::new(k);

        for row in features.iter_rows() {
            for (m, x) in model.means.iter_mut().zip(row) {
                *m += x / n;
            }
        }
        let mut variances = vec![0.0; k];
        for row in features.iter_rows() {
            for ((v, x), m) in variances.iter_mut().zip(row).zip(&model.means) {
                *v += (x - m) * (x - m) / n;
            }
        }
        // Constant columns keep scale 1 so they contribute nothing.
        for (s, v) in model.scales.iter_mut().zip(&variances) {
            let sd = v.sqrt();
            *s = if sd > 1e-12 { sd } else { 1.0 };
        }

        let mut prev_loss = f64::MAX;
        let mut grad_w = vec![0.0; k];
        let mut standardised = vec![0.0; k];

        for epoch in 0..cfg.max_epochs {
            grad_w.iter_mut().for_each(|g| *g = 0.0);
            let mut grad_b = 0.0;
            let mut loss = 0.0;

            for (row, label) in features.iter_rows().zip(labels) {
                for (((z, x), m), s) in standardised
                    .iter_mut()
                    .zip(row)
                    .zip(&model.means)
                    .zip(&model.scales)
                {
                    *z = (x - m) / s;
                }
                let z: f64 = model
                    .weights
                    .iter()
                    .zip(&standardised)
                    .map(|(w, x)| w * x)
                    .sum::<f64>()
                    + model.bias;
                let pred = sigmoid(z);
                let err = pred - label;
                let eps = 1e-15;
                loss -= label * (pred + eps).ln() + (1.0 - label) * (1.0 - pred + eps).ln();
                for (gw, x) in grad_w.iter_mut().zip(&standardised) {
                    *gw += err * x;
                }
                grad_b += err;
            }

            loss /= n;
            for (w, gw) in model.weights.iter_mut().zip(&grad_w) {
                *w -= cfg.learning_rate * (*gw / n + cfg.l2_lambda * *w);
            }
            model.bias -= cfg.learning_rate * grad_b / n;

            if (prev_loss - loss).abs() < cfg.convergence_eps {
                tracing::debug!("Converged after {} epochs (loss {:.6})", epoch + 1, loss);
                break;
            }
            prev_loss = loss;
        }

        Ok(model)
    }

    /// Share of rows whose thresholded prediction matches the label.
    pub fn accuracy<'a>(&self, features: impl Into<RowView<'a>>, labels: &[f64]) -> f64 {
        let features = features.into();
        if labels.is_empty() {
            return 0.0;
        }
        let correct = features
            .iter_rows()
            .zip(labels)
            .filter(|(row, label)| self.predict(row) == (**label >= 0.5))
            .count();
        correct as f64 / labels.len() as f64
    }
}

/// Everything needed to answer predictions: the fitted model and the
/// encoding it expects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format_version: u32,
    pub encoding: Encoding,
    pub model: LogisticRegression,
    pub trained_at: DateTime<Utc>,
    pub samples: usize,
}

impl ModelArtifact {
    pub fn new(encoding: Encoding, model: LogisticRegression, samples: usize) -> Self {
        ModelArtifact {
            format_version: MODEL_FORMAT_VERSION,
            encoding,
            model,
            trained_at: Utc::now(),
            samples,
        }
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.format_version != MODEL_FORMAT_VERSION {
            return Err(AppError::ModelUnavailable(format!(
                "unsupported model format version {} (expected {})",
                self.format_version, MODEL_FORMAT_VERSION
            )));
        }
        if self.model.num_features() != self.encoding.len() {
            return Err(AppError::ModelUnavailable(format!(
                "model has {} weights but {} encoding produces {} features",
                self.model.num_features(),
                self.encoding.name(),
                self.encoding.len()
            )));
        }
        if !self.model.is_consistent() {
            return Err(AppError::ModelUnavailable(
                "model parameters are malformed".to_string(),
            ));
        }
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, AppError> {
        let content = fs::read_to_string(path).map_err(|e| {
            AppError::ModelUnavailable(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let artifact: ModelArtifact = serde_json::from_str(&content).map_err(|e| {
            AppError::ModelUnavailable(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        artifact.validate()?;
        Ok(artifact)
    }

    pub fn save(&self, path: &Path) -> Result<(), AppError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|e| {
            AppError::JsonError(format!("Failed to serialize model: {}", e))
        })?;
        fs::write(path, json)?;
        Ok(())
    }
}
