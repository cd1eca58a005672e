use rust_decimal::Decimal;
use super::Indicator;

/// Exponential moving average seeded with the first observation, so it is
/// defined from the very first update.
#[derive(Debug, Clone)]
pub struct EMA {
    multiplier: Decimal,
    value: Option<Decimal>,
}

impl EMA {
    pub fn new(period: usize) -> Self {
        let multiplier = Decimal::from(2) / Decimal::from(period as u32 + 1);
        Self {
            multiplier,
            value: None,
        }
    }

    pub fn update(&mut self, price: Decimal) -> Decimal {
        let next = match self.value {
            Some(prev_ema) => (price - prev_ema) * self.multiplier + prev_ema,
            None => price,
        };
        self.value = Some(next);
        next
    }
}

impl Indicator for EMA {
    fn name(&self) -> &'static str {
        "EMA"
    }

    fn is_ready(&self) -> bool {
        self.value.is_some()
    }
}

pub fn calculate_ema_series(prices: &[Decimal], period: usize) -> Vec<Decimal> {
    let mut ema = EMA::new(period);
    prices.iter().map(|p| ema.update(*p)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_ema_seeded_with_first_value() {
        let mut ema = EMA::new(20);
        assert!(!ema.is_ready());
        assert_eq!(ema.update(dec!(100)), dec!(100));
        assert!(ema.is_ready());
    }

    #[test]
    fn test_ema_recursion() {
        // alpha = 2 / (3 + 1) = 0.5
        let series = calculate_ema_series(&[dec!(10), dec!(20), dec!(30)], 3);
        assert_eq!(series, vec![dec!(10), dec!(15), dec!(22.5)]);
    }

    #[test]
    fn test_ema_constant_input_is_constant() {
        let series = calculate_ema_series(&[dec!(42); 50], 20);
        assert!(series.iter().all(|v| *v == dec!(42)));
    }
}
