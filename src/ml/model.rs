use serde::Serialize;
use tracing::{debug, info};

use super::features::{FeatureBuilder, FeatureVector, TrainingSet};
use super::forest::{ForestConfig, RandomForest};
use crate::config::ModelSettings;
use crate::error::{Result, SignalError};
use crate::indicators::{IndicatorRow, IndicatorTable};
use crate::labeling::LabeledRow;
use crate::types::Signal;

const NUM_CLASSES: usize = 3;

/// Training report after model fit
#[derive(Debug, Clone, Serialize)]
pub struct TrainingReport {
    pub samples: usize,
    pub dropped: usize,
    pub train_rows: usize,
    pub test_rows: usize,
    /// Accuracy on the held-out tail.
    pub accuracy: f64,
    /// Label counts over all complete rows, in `Signal::ALL` order.
    pub class_counts: [usize; NUM_CLASSES],
    pub feature_importances: Vec<(&'static str, f64)>,
    pub seed: u64,
}

impl TrainingReport {
    pub fn count(&self, signal: Signal) -> usize {
        self.class_counts[signal.class_index()]
    }

    /// Importances sorted from most to least influential.
    pub fn ranked_importances(&self) -> Vec<(&'static str, f64)> {
        let mut ranked = self.feature_importances.clone();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked
    }
}

/// Trained once at bootstrap and reused for every prediction.
#[derive(Debug, Clone)]
pub struct TrainedModel {
    forest: RandomForest,
    features: FeatureBuilder,
}

impl TrainedModel {
    pub fn predict(&self, row: &IndicatorRow) -> Result<Signal> {
        let features = self.features.extract(row)?;
        Ok(self.predict_features(&features))
    }

    /// Predicts on the most recent row of the table only.
    pub fn predict_latest(&self, table: &IndicatorTable) -> Result<Signal> {
        let row = table.last().ok_or(SignalError::InsufficientData {
            available: 0,
            required: 1,
        })?;
        self.predict(row)
    }

    pub fn predict_features(&self, features: &FeatureVector) -> Signal {
        let sample = ndarray::Array1::from(features.to_array().to_vec());
        Signal::from_class_index(self.forest.predict(sample.view()))
    }
}

/// Splits `n` rows into (train, test) sizes, test being the rounded-up
/// `ratio` share taken from the tail.
pub fn split_sizes(n: usize, ratio: f64) -> (usize, usize) {
    let test = ((n as f64) * ratio).ceil() as usize;
    let test = test.min(n);
    (n - test, test)
}

/// Smallest row count whose split leaves `min_rows` on both sides.
pub fn required_rows(ratio: f64, min_rows: usize) -> usize {
    let floor = min_rows.saturating_mul(2).max(1);
    let cap = floor.saturating_mul(1000);
    (floor..=cap)
        .find(|&n| {
            let (train, test) = split_sizes(n, ratio);
            train >= min_rows && test >= min_rows
        })
        .unwrap_or(cap)
}

/// Ensemble classifier with a temporal train/test split.
#[derive(Debug, Clone)]
pub struct SignalClassifier {
    settings: ModelSettings,
    features: FeatureBuilder,
}

impl SignalClassifier {
    pub fn new(settings: ModelSettings) -> Self {
        Self {
            settings,
            features: FeatureBuilder::new(),
        }
    }

    pub fn required_rows(&self) -> usize {
        required_rows(self.settings.test_ratio, self.settings.min_split_rows)
    }

    /// Drops unlabeled or incomplete rows, then trains on what remains.
    pub fn train(&self, rows: &[LabeledRow]) -> Result<(TrainedModel, TrainingReport)> {
        let set = self.features.training_set(rows);
        self.train_on(&set)
    }

    /// Fits on the earliest rows and scores on the most recent ones. Rows
    /// are never shuffled.
    pub fn train_on(&self, set: &TrainingSet) -> Result<(TrainedModel, TrainingReport)> {
        let n = set.len();
        let (n_train, n_test) = split_sizes(n, self.settings.test_ratio);
        if n_train < self.settings.min_split_rows || n_test < self.settings.min_split_rows {
            return Err(SignalError::InsufficientData {
                available: n,
                required: self.required_rows(),
            });
        }

        let seed = self.settings.seed.unwrap_or_else(rand::random);
        let config = ForestConfig {
            n_trees: self.settings.n_trees,
            max_depth: self.settings.max_depth,
            min_samples_split: self.settings.min_samples_split,
            min_samples_leaf: self.settings.min_samples_leaf,
            max_features: self.settings.max_features,
            bootstrap: self.settings.bootstrap,
            seed,
        };

        let classes: Vec<usize> = set.labels.iter().map(|s| s.class_index()).collect();
        let train_x = set.features.slice(ndarray::s![..n_train, ..]).to_owned();
        let test_x = set.features.slice(ndarray::s![n_train.., ..]).to_owned();

        debug!(
            "Fitting {} trees on {} rows (seed {}), scoring on {}",
            config.n_trees, n_train, seed, n_test
        );
        let forest = RandomForest::fit(config, &train_x, &classes[..n_train], NUM_CLASSES);

        let predictions = forest.predict_batch(&test_x);
        let correct = predictions
            .iter()
            .zip(&classes[n_train..])
            .filter(|(p, y)| p == y)
            .count();
        let accuracy = correct as f64 / n_test as f64;

        let mut class_counts = [0usize; NUM_CLASSES];
        for &class in &classes {
            class_counts[class] += 1;
        }

        let feature_importances = FeatureVector::NAMES
            .iter()
            .copied()
            .zip(forest.feature_importances().iter().copied())
            .collect();

        let report = TrainingReport {
            samples: n,
            dropped: set.dropped,
            train_rows: n_train,
            test_rows: n_test,
            accuracy,
            class_counts,
            feature_importances,
            seed,
        };

        info!(
            "Signal model trained: {} rows ({} train / {} test), {:.1}% test accuracy, sell/hold/buy = {}/{}/{}",
            n,
            n_train,
            n_test,
            accuracy * 100.0,
            report.count(Signal::Sell),
            report.count(Signal::Hold),
            report.count(Signal::Buy)
        );

        Ok((
            TrainedModel {
                forest,
                features: self.features.clone(),
            },
            report,
        ))
    }
}
