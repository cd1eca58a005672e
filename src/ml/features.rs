use ndarray::Array2;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, SignalError};
use crate::indicators::IndicatorRow;
use crate::labeling::LabeledRow;
use crate::types::Signal;

/// Fixed-order classifier input. The same order is used for training and
/// inference.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub close: f64,
    pub sma: f64,
    pub ema: f64,
    pub macd: f64,
    pub macd_signal: f64,
    pub rsi: f64,
    pub bollinger_upper: f64,
    pub bollinger_lower: f64,
}

impl FeatureVector {
    pub const NUM_FEATURES: usize = 8;

    pub const NAMES: [&'static str; Self::NUM_FEATURES] = [
        "close",
        "sma",
        "ema",
        "macd",
        "macd_signal",
        "rsi",
        "bollinger_upper",
        "bollinger_lower",
    ];

    pub fn to_array(&self) -> [f64; Self::NUM_FEATURES] {
        [
            self.close,
            self.sma,
            self.ema,
            self.macd,
            self.macd_signal,
            self.rsi,
            self.bollinger_upper,
            self.bollinger_lower,
        ]
    }
}

/// Projects indicator rows onto [`FeatureVector`]s. No scaling is applied.
#[derive(Debug, Clone, Default)]
pub struct FeatureBuilder;

impl FeatureBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Fails with `SchemaMismatch` naming the first undefined field.
    pub fn extract(&self, row: &IndicatorRow) -> Result<FeatureVector> {
        Ok(FeatureVector {
            close: to_feature(Some(row.bar.close), "close")?,
            sma: to_feature(row.sma, "sma")?,
            ema: to_feature(Some(row.ema), "ema")?,
            macd: to_feature(Some(row.macd), "macd")?,
            macd_signal: to_feature(Some(row.macd_signal), "macd_signal")?,
            rsi: to_feature(row.rsi, "rsi")?,
            bollinger_upper: to_feature(row.bollinger_upper, "bollinger_upper")?,
            bollinger_lower: to_feature(row.bollinger_lower, "bollinger_lower")?,
        })
    }

    /// Keeps only rows that carry a label and a complete feature vector.
    pub fn training_set(&self, rows: &[LabeledRow]) -> TrainingSet {
        let samples: Vec<(FeatureVector, Signal)> = rows
            .iter()
            .filter_map(|labeled| {
                let signal = labeled.signal?;
                self.extract(&labeled.row).ok().map(|features| (features, signal))
            })
            .collect();

        let dropped = rows.len() - samples.len();
        if dropped > 0 {
            debug!("Dropped {} of {} rows with undefined indicators", dropped, rows.len());
        }

        let mut set = TrainingSet::from_samples(&samples);
        set.dropped = dropped;
        set
    }
}

fn to_feature(value: Option<Decimal>, field: &'static str) -> Result<f64> {
    value
        .and_then(|v| f64::try_from(v).ok())
        .filter(|v| v.is_finite())
        .ok_or(SignalError::SchemaMismatch { field })
}

/// Feature matrix (rows in time order) and aligned labels.
#[derive(Debug, Clone)]
pub struct TrainingSet {
    pub features: Array2<f64>,
    pub labels: Vec<Signal>,
    pub dropped: usize,
}

impl TrainingSet {
    pub fn from_samples(samples: &[(FeatureVector, Signal)]) -> Self {
        let n = samples.len();
        let mut features = Array2::<f64>::zeros((n, FeatureVector::NUM_FEATURES));
        let mut labels = Vec::with_capacity(n);

        for (i, (feat, signal)) in samples.iter().enumerate() {
            for (j, &val) in feat.to_array().iter().enumerate() {
                features[[i, j]] = val;
            }
            labels.push(*signal);
        }

        Self {
            features,
            labels,
            dropped: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::IndicatorEngine;
    use crate::labeling::LabelGenerator;
    use crate::types::PriceSeries;
    use rust_decimal_macros::dec;

    fn complete_row() -> IndicatorRow {
        let closes: Vec<Decimal> = (0..40).map(|i| Decimal::from(100 + (i * 7) % 11)).collect();
        let table = IndicatorEngine::new().compute(&PriceSeries::from_closes("TEST", &closes));
        *table.last().unwrap()
    }

    #[test]
    fn test_extract_preserves_field_order() {
        let row = complete_row();
        let features = FeatureBuilder::new().extract(&row).unwrap();
        let arr = features.to_array();

        assert_eq!(arr[0], f64::try_from(row.bar.close).unwrap());
        assert_eq!(arr[1], f64::try_from(row.sma.unwrap()).unwrap());
        assert_eq!(arr[5], f64::try_from(row.rsi.unwrap()).unwrap());
        assert_eq!(arr[7], f64::try_from(row.bollinger_lower.unwrap()).unwrap());
        assert_eq!(FeatureVector::NAMES[5], "rsi");
    }

    #[test]
    fn test_undefined_rsi_is_schema_mismatch() {
        let mut row = complete_row();
        row.rsi = None;
        let err = FeatureBuilder::new().extract(&row).unwrap_err();
        assert!(matches!(err, SignalError::SchemaMismatch { field: "rsi" }));
    }

    #[test]
    fn test_first_missing_field_is_reported() {
        let mut row = complete_row();
        row.sma = None;
        row.bollinger_upper = None;
        let err = FeatureBuilder::new().extract(&row).unwrap_err();
        assert!(matches!(err, SignalError::SchemaMismatch { field: "sma" }));
    }

    #[test]
    fn test_training_set_drops_incomplete_rows() {
        let closes: Vec<Decimal> = (0..50).map(|i| dec!(100) + Decimal::from((i * 3) % 7)).collect();
        let table = IndicatorEngine::new().compute(&PriceSeries::from_closes("TEST", &closes));
        let labeled = LabelGenerator::new().label(&table);
        let set = FeatureBuilder::new().training_set(&labeled);

        // the first 19 rows lack SMA and Bollinger values
        assert_eq!(set.len(), 31);
        assert_eq!(set.dropped, 19);
        assert_eq!(set.features.dim(), (31, FeatureVector::NUM_FEATURES));
        assert!(set.features.iter().all(|v| v.is_finite()));
    }
}
