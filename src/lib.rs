pub mod charts;
pub mod config;
pub mod engine;
pub mod error;
pub mod indicators;
pub mod labeling;
pub mod market;
pub mod ml;
pub mod types;

pub use error::{Result, SignalError};
