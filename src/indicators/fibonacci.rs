use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

/// Static retracement levels over a whole series' close range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FibonacciLevels {
    pub high: Decimal,
    pub low: Decimal,
    pub level_236: Decimal,
    pub level_382: Decimal,
    pub level_618: Decimal,
}

impl FibonacciLevels {
    pub fn from_closes(closes: &[Decimal]) -> Option<Self> {
        let high = closes.iter().max().copied()?;
        let low = closes.iter().min().copied()?;
        let range = high - low;

        Some(Self {
            high,
            low,
            level_236: high - dec!(0.236) * range,
            level_382: high - dec!(0.382) * range,
            level_618: high - dec!(0.618) * range,
        })
    }

    pub fn levels(&self) -> [(&'static str, Decimal); 3] {
        [
            ("23.6%", self.level_236),
            ("38.2%", self.level_382),
            ("61.8%", self.level_618),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levels_over_close_range() {
        let levels = FibonacciLevels::from_closes(&[dec!(150), dec!(100), dec!(200), dec!(180)]).unwrap();
        assert_eq!(levels.high, dec!(200));
        assert_eq!(levels.low, dec!(100));
        assert_eq!(levels.level_236, dec!(176.4));
        assert_eq!(levels.level_382, dec!(161.8));
        assert_eq!(levels.level_618, dec!(138.2));
    }

    #[test]
    fn test_empty_series_has_no_levels() {
        assert!(FibonacciLevels::from_closes(&[]).is_none());
    }
}
