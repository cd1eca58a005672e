use serde::{Deserialize, Serialize};
use std::fmt;

/// Discrete trading label assigned per bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Signal {
    Sell,
    Hold,
    Buy,
}

impl Signal {
    /// Class order used by the classifier.
    pub const ALL: [Signal; 3] = [Signal::Sell, Signal::Hold, Signal::Buy];

    pub fn value(&self) -> i8 {
        match self {
            Signal::Sell => -1,
            Signal::Hold => 0,
            Signal::Buy => 1,
        }
    }

    /// Anything other than +1 / -1 maps to hold.
    pub fn from_value(value: i8) -> Self {
        match value {
            1 => Signal::Buy,
            -1 => Signal::Sell,
            _ => Signal::Hold,
        }
    }

    pub fn class_index(&self) -> usize {
        match self {
            Signal::Sell => 0,
            Signal::Hold => 1,
            Signal::Buy => 2,
        }
    }

    pub fn from_class_index(index: usize) -> Self {
        Signal::ALL.get(index).copied().unwrap_or(Signal::Hold)
    }

    /// Human-facing action label.
    pub fn action(&self) -> &'static str {
        match self {
            Signal::Buy => "buy",
            Signal::Sell => "sell",
            Signal::Hold => "hold",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.action())
    }
}

/// Bar size requested from the data provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Interval {
    #[serde(rename = "1m")]
    M1,
    #[serde(rename = "5m")]
    M5,
    #[serde(rename = "15m")]
    M15,
    #[serde(rename = "30m")]
    M30,
    #[serde(rename = "1h")]
    H1,
    #[serde(rename = "1d")]
    D1,
}

impl Interval {
    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::M1 => "1m",
            Interval::M5 => "5m",
            Interval::M15 => "15m",
            Interval::M30 => "30m",
            Interval::H1 => "1h",
            Interval::D1 => "1d",
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Trailing window of history requested from the data provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Period {
    #[serde(rename = "1d")]
    D1,
    #[serde(rename = "5d")]
    D5,
    #[serde(rename = "1mo")]
    Mo1,
    #[serde(rename = "3mo")]
    Mo3,
}

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::D1 => "1d",
            Period::D5 => "5d",
            Period::Mo1 => "1mo",
            Period::Mo3 => "3mo",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_value_mapping() {
        for signal in Signal::ALL {
            assert_eq!(Signal::from_value(signal.value()), signal);
            assert_eq!(Signal::from_class_index(signal.class_index()), signal);
        }
        assert_eq!(Signal::from_value(7), Signal::Hold);
        assert_eq!(Signal::from_class_index(9), Signal::Hold);
    }

    #[test]
    fn test_action_labels() {
        assert_eq!(Signal::Buy.action(), "buy");
        assert_eq!(Signal::Sell.action(), "sell");
        assert_eq!(Signal::Hold.to_string(), "hold");
    }

    #[test]
    fn test_interval_and_period_strings() {
        assert_eq!(Interval::M5.as_str(), "5m");
        assert_eq!(Period::Mo1.to_string(), "1mo");
    }
}
