use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::SignalError;
use crate::ml::TrainingReport;
use crate::types::Signal;

/// Outcome of one polling iteration.
#[derive(Debug, Clone, Serialize)]
pub struct Prediction {
    pub symbol: String,
    /// Classifier output for the latest bar.
    pub action: Signal,
    /// What the labeling rules say about the same bar, when defined.
    pub rule_signal: Option<Signal>,
    pub timestamp: DateTime<Utc>,
    pub close: Decimal,
}

/// Sink for everything the loop tells the user.
pub trait Reporter: Send + Sync {
    /// Called once, after the bootstrap training run.
    fn training_complete(&self, report: &TrainingReport);

    fn prediction(&self, prediction: &Prediction);

    /// A polling iteration ended without an action.
    fn skipped(&self, error: &SignalError);
}

#[derive(Debug, Clone, Default)]
pub struct ConsoleReporter;

impl ConsoleReporter {
    pub fn new() -> Self {
        Self
    }
}

impl Reporter for ConsoleReporter {
    fn training_complete(&self, report: &TrainingReport) {
        println!("\n=== Model Trained ===");
        println!(
            "Rows: {} ({} train / {} test, {} dropped)",
            report.samples, report.train_rows, report.test_rows, report.dropped
        );
        println!("Test accuracy: {:.2}", report.accuracy);
        println!(
            "Labels: sell {} | hold {} | buy {}",
            report.count(Signal::Sell),
            report.count(Signal::Hold),
            report.count(Signal::Buy)
        );
        let top: Vec<String> = report
            .ranked_importances()
            .iter()
            .take(3)
            .map(|(name, imp)| format!("{} {:.2}", name, imp))
            .collect();
        println!("Top features: {}", top.join(", "));
    }

    fn prediction(&self, prediction: &Prediction) {
        let rule = prediction
            .rule_signal
            .map(|s| s.action())
            .unwrap_or("undefined");
        println!(
            "[{}] {} close {:.2}: {} (rules: {})",
            prediction.timestamp.format("%Y-%m-%d %H:%M"),
            prediction.symbol,
            prediction.close,
            prediction.action.action().to_uppercase(),
            rule
        );
        info!(
            "{} predicted action: {} for bar {}",
            prediction.symbol, prediction.action, prediction.timestamp
        );
    }

    fn skipped(&self, error: &SignalError) {
        warn!("No action this cycle: {}", error);
    }
}
