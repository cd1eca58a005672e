use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use tracing::debug;

use super::{BollingerBands, FibonacciLevels, Indicator, SMA, EMA, MACD, RSI, VolumeProfile};
use crate::types::{PriceBar, PriceSeries};

/// Window sizes for every derived column. Fixed at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IndicatorWindows {
    pub sma: usize,
    pub ema: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub rsi: usize,
    pub bollinger: usize,
    pub bollinger_multiplier: Decimal,
    pub volume_ma: usize,
}

impl IndicatorWindows {
    pub const STANDARD: IndicatorWindows = IndicatorWindows {
        sma: 20,
        ema: 20,
        macd_fast: 12,
        macd_slow: 26,
        macd_signal: 9,
        rsi: 14,
        bollinger: 20,
        bollinger_multiplier: dec!(2),
        volume_ma: 20,
    };
}

/// A bar plus its derived indicator values. Windowed fields are `None`
/// until their window has filled; the EMA family is defined from bar 0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IndicatorRow {
    pub bar: PriceBar,
    pub sma: Option<Decimal>,
    pub ema: Decimal,
    pub macd: Decimal,
    pub macd_signal: Decimal,
    pub rsi: Option<Decimal>,
    pub bollinger_upper: Option<Decimal>,
    pub bollinger_lower: Option<Decimal>,
    pub volume_ma: Option<Decimal>,
}

impl IndicatorRow {
    pub fn close(&self) -> Decimal {
        self.bar.close
    }
}

#[derive(Debug, Clone, Default)]
pub struct IndicatorTable {
    pub symbol: String,
    pub rows: Vec<IndicatorRow>,
    pub fibonacci: Option<FibonacciLevels>,
}

impl IndicatorTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn last(&self) -> Option<&IndicatorRow> {
        self.rows.last()
    }
}

/// Pure, deterministic computation of the indicator columns.
#[derive(Debug, Clone)]
pub struct IndicatorEngine {
    windows: IndicatorWindows,
}

impl IndicatorEngine {
    pub fn new() -> Self {
        Self {
            windows: IndicatorWindows::STANDARD,
        }
    }

    pub fn compute(&self, series: &PriceSeries) -> IndicatorTable {
        let w = &self.windows;
        let mut sma = SMA::new(w.sma);
        let mut ema = EMA::new(w.ema);
        let mut macd = MACD::new(w.macd_fast, w.macd_slow, w.macd_signal);
        let mut rsi = RSI::new(w.rsi);
        let mut bollinger = BollingerBands::new(w.bollinger, w.bollinger_multiplier);
        let mut volume = VolumeProfile::new(w.volume_ma);

        let rows: Vec<IndicatorRow> = series
            .bars
            .iter()
            .map(|bar| {
                let macd_out = macd.update(bar.close);
                let bands = bollinger.update(bar.close);
                IndicatorRow {
                    bar: *bar,
                    sma: sma.update(bar.close),
                    ema: ema.update(bar.close),
                    macd: macd_out.macd_line,
                    macd_signal: macd_out.signal_line,
                    rsi: rsi.update(bar.close),
                    bollinger_upper: bands.map(|b| b.upper),
                    bollinger_lower: bands.map(|b| b.lower),
                    volume_ma: volume.update(bar.volume),
                }
            })
            .collect();

        let not_ready: Vec<&str> = [
            (sma.name(), sma.is_ready()),
            (rsi.name(), rsi.is_ready()),
            (bollinger.name(), bollinger.is_ready()),
            (volume.name(), volume.is_ready()),
        ]
        .iter()
        .filter(|(_, ready)| !ready)
        .map(|(name, _)| *name)
        .collect();
        if !not_ready.is_empty() {
            debug!(
                "{}: {} bars too short for {:?}",
                series.symbol,
                series.len(),
                not_ready
            );
        }

        IndicatorTable {
            symbol: series.symbol.clone(),
            rows,
            fibonacci: FibonacciLevels::from_closes(&series.closes()),
        }
    }
}

impl Default for IndicatorEngine {
    fn default() -> Self {
        Self::new()
    }
}
