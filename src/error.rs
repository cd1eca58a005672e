use thiserror::Error;

/// Failure modes of the signal pipeline.
#[derive(Error, Debug)]
pub enum SignalError {
    #[error("data fetch failed for {symbol}: {reason}")]
    DataFetch { symbol: String, reason: String },

    #[error("insufficient data: {available} complete rows, need at least {required}")]
    InsufficientData { available: usize, required: usize },

    #[error("schema mismatch: latest row has no value for {field}")]
    SchemaMismatch { field: &'static str },

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl SignalError {
    pub fn fetch(symbol: &str, reason: impl Into<String>) -> Self {
        SignalError::DataFetch {
            symbol: symbol.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SignalError>;
