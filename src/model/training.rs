//! Fitting a winrate model on a raw match table.

use super::classifier::{LogisticRegression, ModelArtifact, TrainConfig};
use super::features::{Encoding, RowView};
use crate::data::table::MatchTable;
use crate::error::AppError;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;

#[derive(Debug, Clone)]
pub struct TrainingOptions {
    pub encoding: Encoding,
    pub test_size: f64,
    pub seed: u64,
    pub train: TrainConfig,
}

impl Default for TrainingOptions {
    fn default() -> Self {
        TrainingOptions {
            encoding: Encoding::Padded,
            test_size: 0.2,
            seed: 42,
            train: TrainConfig::default(),
        }
    }
}

/// Outcome counts on held-out rows; "positive" means the ally side won.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConfusionMatrix {
    pub tp: usize,
    pub tn: usize,
    pub fp: usize,
    pub fn_: usize,
}

impl ConfusionMatrix {
    pub fn record(&mut self, actual_win: bool, predicted_win: bool) {
        match (actual_win, predicted_win) {
            (true, true) => self.tp += 1,
            (false, false) => self.tn += 1,
            (false, true) => self.fp += 1,
            (true, false) => self.fn_ += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.tp + self.tn + self.fp + self.fn_
    }

    /// Precision/recall/F1 for the loss (0) and win (1) classes.
    pub fn class_metrics(&self) -> [ClassMetrics; 2] {
        [
            ClassMetrics::from_counts("loss", self.tn, self.fn_, self.fp),
            ClassMetrics::from_counts("win", self.tp, self.fp, self.fn_),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassMetrics {
    pub label: &'static str,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

impl ClassMetrics {
    fn from_counts(label: &'static str, hits: usize, false_alarms: usize, misses: usize) -> Self {
        let ratio = |num: usize, den: usize| if den == 0 { 0.0 } else { num as f64 / den as f64 };
        let precision = ratio(hits, hits + false_alarms);
        let recall = ratio(hits, hits + misses);
        let f1 = if precision + recall == 0.0 {
            0.0
        } else {
            2.0 * precision * recall / (precision + recall)
        };
        ClassMetrics {
            label,
            precision,
            recall,
            f1,
            support: hits + misses,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TrainingReport {
    pub encoding: &'static str,
    pub samples: usize,
    pub features: usize,
    pub skipped_rows: usize,
    pub train_samples: usize,
    pub test_samples: usize,
    pub train_accuracy: f64,
    pub test_accuracy: f64,
    pub confusion: ConfusionMatrix,
}

/// Splits row indices so both outcomes keep their share in the test set.
fn stratified_split(labels: &[f64], test_size: f64, seed: u64) -> Result<(Vec<usize>, Vec<usize>), AppError> {
    if !(0.0..1.0).contains(&test_size) {
        return Err(AppError::InvalidInput(format!(
            "test size must be in [0, 1), got {}",
            test_size
        )));
    }

    let (mut wins, mut losses): (Vec<usize>, Vec<usize>) =
        (0..labels.len()).partition(|&i| labels[i] >= 0.5);
    if wins.is_empty() || losses.is_empty() {
        return Err(AppError::InvalidInput(
            "training data needs both won and lost matches".to_string(),
        ));
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::with_capacity(labels.len());
    let mut test = Vec::new();
    for class in [&mut losses, &mut wins] {
        class.shuffle(&mut rng);
        let n_test = (class.len() as f64 * test_size).round() as usize;
        let (held_out, kept) = class.split_at(n_test.min(class.len() - 1));
        test.extend_from_slice(held_out);
        train.extend_from_slice(kept);
    }
    train.sort_unstable();
    test.sort_unstable();
    Ok((train, test))
}

fn select_labels(labels: &[f64], indices: &[usize]) -> Vec<f64> {
    indices.iter().map(|&i| labels[i]).collect()
}

pub fn train(table: &MatchTable, options: &TrainingOptions) -> Result<(ModelArtifact, TrainingReport), AppError> {
    let encoded = options.encoding.encode_table(table)?;
    let samples = encoded.labels.len();
    if samples == 0 {
        return Err(AppError::InvalidInput(
            "no usable matches to train on".to_string(),
        ));
    }
    tracing::info!(
        "Training on {} samples with {} {} features",
        samples,
        encoded.features.cols(),
        options.encoding.name()
    );

    let (train_idx, test_idx) = stratified_split(&encoded.labels, options.test_size, options.seed)?;
    let x_train = encoded.features.view_rows(&train_idx);
    let y_train = select_labels(&encoded.labels, &train_idx);
    let x_test = encoded.features.view_rows(&test_idx);
    let y_test = select_labels(&encoded.labels, &test_idx);

    let model = LogisticRegression::fit(x_train, &y_train, &options.train)?;
    let confusion = confusion_matrix(&model, x_test, &y_test);

    let report = TrainingReport {
        encoding: options.encoding.name(),
        samples,
        features: encoded.features.cols(),
        skipped_rows: encoded.skipped,
        train_samples: train_idx.len(),
        test_samples: test_idx.len(),
        train_accuracy: model.accuracy(x_train, &y_train),
        test_accuracy: model.accuracy(x_test, &y_test),
        confusion,
    };
    tracing::info!(
        "Accuracy train {:.3}, test {:.3}",
        report.train_accuracy,
        report.test_accuracy
    );

    Ok((ModelArtifact::new(options.encoding, model, samples), report))
}

fn confusion_matrix(model: &LogisticRegression, features: RowView<'_>, labels: &[f64]) -> ConfusionMatrix {
    let mut matrix = ConfusionMatrix::default();
    for (row, label) in features.iter_rows().zip(labels) {
        matrix.record(*label >= 0.5, model.predict(row));
    }
    matrix
}
