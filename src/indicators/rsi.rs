use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::VecDeque;
use super::Indicator;

/// Relative strength index over trailing simple means of gains and losses.
///
/// The first update has no previous close and contributes a zero delta, so
/// the value becomes defined on the `period`-th update. A window without
/// losses is resolved deterministically instead of dividing by zero: 100
/// when there were gains, 50 when the window is completely flat.
#[derive(Debug, Clone)]
pub struct RSI {
    period: usize,
    prev_price: Option<Decimal>,
    gains: VecDeque<Decimal>,
    losses: VecDeque<Decimal>,
    value: Option<Decimal>,
}

impl RSI {
    pub fn new(period: usize) -> Self {
        Self {
            period,
            prev_price: None,
            gains: VecDeque::with_capacity(period + 1),
            losses: VecDeque::with_capacity(period + 1),
            value: None,
        }
    }

    pub fn update(&mut self, price: Decimal) -> Option<Decimal> {
        let change = self.prev_price.map(|prev| price - prev).unwrap_or(Decimal::ZERO);
        let gain = if change > Decimal::ZERO { change } else { Decimal::ZERO };
        let loss = if change < Decimal::ZERO { change.abs() } else { Decimal::ZERO };

        self.gains.push_back(gain);
        self.losses.push_back(loss);
        if self.gains.len() > self.period {
            self.gains.pop_front();
            self.losses.pop_front();
        }

        if self.period > 0 && self.gains.len() == self.period {
            let period_dec = Decimal::from(self.period as u32);
            let avg_gain = self.gains.iter().sum::<Decimal>() / period_dec;
            let avg_loss = self.losses.iter().sum::<Decimal>() / period_dec;
            self.value = Some(calculate_rsi(avg_gain, avg_loss));
        }

        self.prev_price = Some(price);
        self.value
    }
}

impl Indicator for RSI {
    fn name(&self) -> &'static str {
        "RSI"
    }

    fn is_ready(&self) -> bool {
        self.value.is_some()
    }
}

pub fn calculate_rsi(avg_gain: Decimal, avg_loss: Decimal) -> Decimal {
    if avg_loss.is_zero() {
        if avg_gain.is_zero() {
            return Decimal::from(50);
        }
        return Decimal::from(100);
    }
    let rs = avg_gain / avg_loss;
    Decimal::from(100) - (Decimal::from(100) / (Decimal::ONE + rs))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RSIZone {
    Oversold,
    Neutral,
    Overbought,
}

impl RSIZone {
    pub const OVERSOLD: Decimal = dec!(30);
    pub const OVERBOUGHT: Decimal = dec!(70);

    pub fn of(value: Decimal) -> Self {
        if value > Self::OVERBOUGHT {
            RSIZone::Overbought
        } else if value < Self::OVERSOLD {
            RSIZone::Oversold
        } else {
            RSIZone::Neutral
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RSIZone::Oversold => "oversold",
            RSIZone::Neutral => "neutral",
            RSIZone::Overbought => "overbought",
        }
    }
}
