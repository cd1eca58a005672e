use serde::{Deserialize, Serialize};

use crate::types::{Interval, Period};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub market: MarketSettings,
    pub schedule: ScheduleSettings,
    pub model: ModelSettings,
    pub charts: ChartSettings,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.market.symbol.trim().is_empty() {
            errors.push("market.symbol must not be empty".to_string());
        }

        if self.schedule.poll_interval_secs == 0 {
            errors.push("schedule.poll_interval_secs must be > 0".to_string());
        }
        if self.schedule.fetch_timeout_secs == 0 {
            errors.push("schedule.fetch_timeout_secs must be > 0".to_string());
        }

        if self.model.n_trees == 0 {
            errors.push("model.n_trees must be > 0".to_string());
        }
        if self.model.max_depth == 0 {
            errors.push("model.max_depth must be > 0".to_string());
        }
        if self.model.min_samples_split < 2 {
            errors.push("model.min_samples_split must be >= 2".to_string());
        }
        if self.model.min_samples_leaf == 0 {
            errors.push("model.min_samples_leaf must be > 0".to_string());
        }
        if self.model.max_features == Some(0) {
            errors.push("model.max_features must be > 0 when set".to_string());
        }
        if !(self.model.test_ratio > 0.0 && self.model.test_ratio < 1.0) {
            errors.push("model.test_ratio must be between 0 and 1 (exclusive)".to_string());
        }
        if self.model.min_split_rows == 0 {
            errors.push("model.min_split_rows must be > 0".to_string());
        }

        if self.charts.width < 2 {
            errors.push("charts.width must be >= 2".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketSettings {
    pub symbol: String,
    pub period: Period,
    pub interval: Interval,
}

impl Default for MarketSettings {
    fn default() -> Self {
        Self {
            symbol: "MIATK.IS".to_string(),
            period: Period::Mo1,
            interval: Interval::M5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleSettings {
    pub poll_interval_secs: u64,
    pub fetch_timeout_secs: u64,
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        Self {
            poll_interval_secs: 300,
            fetch_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    pub n_trees: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub max_features: Option<usize>,
    pub bootstrap: bool,
    /// Unset draws a fresh seed per training run.
    pub seed: Option<u64>,
    /// Share of the most recent rows held out for evaluation.
    pub test_ratio: f64,
    /// Minimum rows on each side of the train/test split.
    pub min_split_rows: usize,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: 12,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            bootstrap: true,
            seed: None,
            test_ratio: 0.2,
            min_split_rows: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartSettings {
    pub enabled: bool,
    /// Number of most recent bars drawn per panel.
    pub width: usize,
}

impl Default for ChartSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            width: 60,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.market.symbol, "MIATK.IS");
        assert_eq!(config.market.interval, Interval::M5);
        assert_eq!(config.schedule.poll_interval_secs, 300);
        assert_eq!(config.model.test_ratio, 0.2);
    }

    #[test]
    fn test_validate_collects_all_errors() {
        let mut config = AppConfig::default();
        config.market.symbol = " ".to_string();
        config.model.test_ratio = 1.0;
        config.model.n_trees = 0;

        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors.iter().any(|e| e.contains("test_ratio")));
    }
}
