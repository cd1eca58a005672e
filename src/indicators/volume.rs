use rust_decimal::Decimal;
use super::{sma::SMA, Indicator};

/// Trailing average of bar volume.
#[derive(Debug, Clone)]
pub struct VolumeProfile {
    average: SMA,
}

impl VolumeProfile {
    pub fn new(period: usize) -> Self {
        Self {
            average: SMA::new(period),
        }
    }

    pub fn update(&mut self, volume: Decimal) -> Option<Decimal> {
        self.average.update(volume)
    }
}

impl Indicator for VolumeProfile {
    fn name(&self) -> &'static str {
        "VolumeMA"
    }

    fn is_ready(&self) -> bool {
        self.average.is_ready()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_volume_average() {
        let mut profile = VolumeProfile::new(2);
        assert_eq!(profile.update(dec!(100)), None);
        assert!(!profile.is_ready());
        assert_eq!(profile.update(dec!(300)), Some(dec!(200)));
        assert!(profile.is_ready());
    }
}
