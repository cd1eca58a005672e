use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One OHLCV observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub timestamp: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
}

impl PriceBar {
    /// Checks non-negativity and that high/low enclose open and close.
    pub fn check(&self) -> Result<(), String> {
        let fields = [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
            ("volume", self.volume),
        ];
        if let Some((name, _)) = fields.iter().find(|(_, v)| v.is_sign_negative() && !v.is_zero()) {
            return Err(format!("negative {} at {}", name, self.timestamp));
        }
        if self.high < self.low {
            return Err(format!("high below low at {}", self.timestamp));
        }
        if self.high < self.open.max(self.close) || self.low > self.open.min(self.close) {
            return Err(format!("open/close outside high-low range at {}", self.timestamp));
        }
        Ok(())
    }
}

/// Ordered, timestamp-indexed bars for a single instrument.
#[derive(Debug, Clone, Default)]
pub struct PriceSeries {
    pub symbol: String,
    pub bars: Vec<PriceBar>,
}

impl PriceSeries {
    pub fn new(symbol: impl Into<String>, bars: Vec<PriceBar>) -> Self {
        Self {
            symbol: symbol.into(),
            bars,
        }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn last(&self) -> Option<&PriceBar> {
        self.bars.last()
    }

    pub fn closes(&self) -> Vec<Decimal> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn volumes(&self) -> Vec<Decimal> {
        self.bars.iter().map(|b| b.volume).collect()
    }

    /// Rejects empty series, out-of-order or duplicate timestamps and
    /// inconsistent bars.
    pub fn validate(&self) -> Result<(), String> {
        if self.bars.is_empty() {
            return Err("empty series".to_string());
        }
        for bar in &self.bars {
            bar.check()?;
        }
        if let Some(pair) = self
            .bars
            .windows(2)
            .find(|w| w[1].timestamp <= w[0].timestamp)
        {
            return Err(format!(
                "timestamps not strictly ascending: {} then {}",
                pair[0].timestamp, pair[1].timestamp
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
impl PriceSeries {
    /// Five-minute bars with open = close, a 1-unit wick either side and
    /// constant volume.
    pub fn from_closes(symbol: &str, closes: &[Decimal]) -> Self {
        use chrono::{Duration, TimeZone};
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| PriceBar {
                timestamp: start + Duration::minutes(5 * i as i64),
                open: close,
                high: close + Decimal::ONE,
                low: (close - Decimal::ONE).max(Decimal::ZERO),
                close,
                volume: Decimal::from(1000),
            })
            .collect();
        Self::new(symbol, bars)
    }
}
