use rust_decimal::Decimal;
use std::collections::VecDeque;
use super::Indicator;

/// Rolling arithmetic mean over a fixed window.
#[derive(Debug, Clone)]
pub struct SMA {
    period: usize,
    window: VecDeque<Decimal>,
    sum: Decimal,
    value: Option<Decimal>,
}

impl SMA {
    pub fn new(period: usize) -> Self {
        Self {
            period,
            window: VecDeque::with_capacity(period + 1),
            sum: Decimal::ZERO,
            value: None,
        }
    }

    pub fn update(&mut self, value: Decimal) -> Option<Decimal> {
        self.window.push_back(value);
        self.sum += value;
        if self.window.len() > self.period {
            if let Some(old) = self.window.pop_front() {
                self.sum -= old;
            }
        }

        if self.period > 0 && self.window.len() == self.period {
            self.value = Some(self.sum / Decimal::from(self.period as u32));
        }
        self.value
    }
}

impl Indicator for SMA {
    fn name(&self) -> &'static str {
        "SMA"
    }

    fn is_ready(&self) -> bool {
        self.value.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_sma_undefined_until_window_full() {
        let mut sma = SMA::new(3);
        assert_eq!(sma.update(dec!(1)), None);
        assert_eq!(sma.update(dec!(2)), None);
        assert!(!sma.is_ready());
        assert_eq!(sma.update(dec!(3)), Some(dec!(2)));
        assert_eq!(sma.update(dec!(7)), Some(dec!(4)));
        assert!(sma.is_ready());
    }
}
