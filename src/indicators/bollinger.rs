use rust_decimal::Decimal;
use super::{sample_stddev, sma, Indicator};

/// Bollinger envelope: trailing SMA plus/minus a multiple of the trailing
/// sample standard deviation.
#[derive(Debug, Clone)]
pub struct BollingerBands {
    period: usize,
    std_dev_multiplier: Decimal,
    prices: Vec<Decimal>,
    last: Option<BollingerOutput>,
}

impl BollingerBands {
    pub fn new(period: usize, std_dev_multiplier: Decimal) -> Self {
        Self {
            period,
            std_dev_multiplier,
            prices: Vec::with_capacity(period + 1),
            last: None,
        }
    }

    pub fn default_params() -> Self {
        Self::new(20, Decimal::from(2))
    }

    pub fn update(&mut self, price: Decimal) -> Option<BollingerOutput> {
        self.prices.push(price);
        if self.prices.len() > self.period {
            self.prices.remove(0);
        }

        if self.prices.len() < self.period {
            return None;
        }

        let middle = sma(&self.prices, self.period)?;
        let std_dev = sample_stddev(&self.prices, self.period)?;

        let deviation = std_dev * self.std_dev_multiplier;
        let output = BollingerOutput {
            upper: middle + deviation,
            middle,
            lower: middle - deviation,
        };
        self.last = Some(output);
        Some(output)
    }

    pub fn last(&self) -> Option<BollingerOutput> {
        self.last
    }
}

impl Indicator for BollingerBands {
    fn name(&self) -> &'static str {
        "BollingerBands"
    }

    fn is_ready(&self) -> bool {
        self.last.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BollingerOutput {
    pub upper: Decimal,
    pub middle: Decimal,
    pub lower: Decimal,
}

impl BollingerOutput {
    pub fn width(&self) -> Decimal {
        self.upper - self.lower
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_bands_undefined_until_window_full() {
        let mut bb = BollingerBands::new(3, dec!(2));
        assert!(bb.update(dec!(1)).is_none());
        assert!(bb.update(dec!(2)).is_none());
        assert!(!bb.is_ready());
        let out = bb.update(dec!(3)).unwrap();
        // sample std of [1, 2, 3] is exactly 1
        assert_eq!(out.middle, dec!(2));
        assert!((out.upper - dec!(4)).abs() < dec!(0.000000001));
        assert!((out.lower - dec!(0)).abs() < dec!(0.000000001));
    }

    #[test]
    fn test_bands_collapse_on_constant_prices() {
        let mut bb = BollingerBands::default_params();
        let mut out = None;
        for _ in 0..25 {
            out = bb.update(dec!(50));
        }
        let out = out.unwrap();
        assert_eq!(out.upper, dec!(50));
        assert_eq!(out.lower, dec!(50));
        assert_eq!(out.width(), Decimal::ZERO);
    }
}
