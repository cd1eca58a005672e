use rust_decimal::Decimal;
use super::{ema::EMA, Indicator};

/// MACD line, its signal EMA and the histogram. Every component is
/// defined from the first update because the EMAs seed on their first input.
#[derive(Debug, Clone)]
pub struct MACD {
    fast_ema: EMA,
    slow_ema: EMA,
    signal_ema: EMA,
    last: Option<MACDOutput>,
}

impl MACD {
    pub fn new(fast_period: usize, slow_period: usize, signal_period: usize) -> Self {
        Self {
            fast_ema: EMA::new(fast_period),
            slow_ema: EMA::new(slow_period),
            signal_ema: EMA::new(signal_period),
            last: None,
        }
    }

    pub fn default_params() -> Self {
        Self::new(12, 26, 9)
    }

    pub fn update(&mut self, price: Decimal) -> MACDOutput {
        let fast = self.fast_ema.update(price);
        let slow = self.slow_ema.update(price);
        let macd_line = fast - slow;
        let signal_line = self.signal_ema.update(macd_line);

        let output = MACDOutput {
            macd_line,
            signal_line,
            histogram: macd_line - signal_line,
        };
        self.last = Some(output);
        output
    }

    pub fn last(&self) -> Option<MACDOutput> {
        self.last
    }
}

impl Indicator for MACD {
    fn name(&self) -> &'static str {
        "MACD"
    }

    fn is_ready(&self) -> bool {
        self.last.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MACDOutput {
    pub macd_line: Decimal,
    pub signal_line: Decimal,
    pub histogram: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_macd_starts_at_zero() {
        let mut macd = MACD::default_params();
        let first = macd.update(dec!(250));
        assert_eq!(first.macd_line, Decimal::ZERO);
        assert_eq!(first.signal_line, Decimal::ZERO);
        assert_eq!(first.histogram, Decimal::ZERO);
        assert!(macd.is_ready());
    }

    #[test]
    fn test_macd_positive_in_uptrend() {
        let mut macd = MACD::default_params();
        let mut out = macd.update(dec!(100));
        for i in 1..60 {
            out = macd.update(Decimal::from(100 + i));
        }
        assert!(out.macd_line > Decimal::ZERO);
        // the signal line lags the rising MACD line
        assert!(out.histogram > Decimal::ZERO);
        assert_eq!(macd.last(), Some(out));
    }
}
