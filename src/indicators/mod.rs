pub mod sma;
pub mod ema;
pub mod rsi;
pub mod macd;
pub mod bollinger;
pub mod volume;
pub mod fibonacci;
pub mod engine;

pub use sma::*;
pub use ema::*;
pub use rsi::*;
pub use macd::*;
pub use bollinger::*;
pub use volume::*;
pub use fibonacci::*;
pub use engine::*;

use rust_decimal::Decimal;

pub trait Indicator {
    fn name(&self) -> &'static str;
    fn is_ready(&self) -> bool;
}

/// Mean of the trailing `period` values.
pub fn sma(values: &[Decimal], period: usize) -> Option<Decimal> {
    if period == 0 || values.len() < period {
        return None;
    }
    let sum: Decimal = values.iter().rev().take(period).sum();
    Some(sum / Decimal::from(period as u32))
}

/// Sample standard deviation (divisor `period - 1`) of the trailing
/// `period` values.
pub fn sample_stddev(values: &[Decimal], period: usize) -> Option<Decimal> {
    if period < 2 || values.len() < period {
        return None;
    }
    let mean = sma(values, period)?;
    let variance: Decimal = values
        .iter()
        .rev()
        .take(period)
        .map(|v| {
            let diff = *v - mean;
            diff * diff
        })
        .sum::<Decimal>()
        / Decimal::from(period as u32 - 1);

    Some(sqrt_decimal(variance))
}

fn sqrt_decimal(value: Decimal) -> Decimal {
    if value.is_zero() || value.is_sign_negative() {
        return Decimal::ZERO;
    }

    let mut guess = if value > Decimal::ONE {
        value / Decimal::from(2)
    } else {
        Decimal::ONE
    };
    let epsilon = Decimal::new(1, 12);

    for _ in 0..100 {
        let new_guess = (guess + value / guess) / Decimal::from(2);
        if (new_guess - guess).abs() < epsilon {
            return new_guess;
        }
        guess = new_guess;
    }
    guess
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_sma_uses_trailing_window() {
        let values = [dec!(1), dec!(2), dec!(3), dec!(4)];
        assert_eq!(sma(&values, 2), Some(dec!(3.5)));
        assert_eq!(sma(&values, 4), Some(dec!(2.5)));
        assert_eq!(sma(&values, 5), None);
    }

    #[test]
    fn test_sample_stddev() {
        // mean 5, squared deviations sum to 32, / (8 - 1)
        let values = [dec!(2), dec!(4), dec!(4), dec!(4), dec!(5), dec!(5), dec!(7), dec!(9)];
        let std = sample_stddev(&values, 8).unwrap();
        let expected = (32.0f64 / 7.0).sqrt();
        let actual = f64::try_from(std).unwrap();
        assert!((actual - expected).abs() < 1e-9);
        assert_eq!(sample_stddev(&values, 1), None);
    }

    #[test]
    fn test_sqrt_decimal() {
        assert_eq!(sqrt_decimal(Decimal::ZERO), Decimal::ZERO);
        assert!((sqrt_decimal(dec!(16)) - dec!(4)).abs() < dec!(0.000000001));
        assert!((sqrt_decimal(dec!(0.25)) - dec!(0.5)).abs() < dec!(0.000000001));
    }
}
