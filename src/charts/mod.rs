use std::fmt::Write;

use anyhow::{bail, Result};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::config::ChartSettings;
use crate::indicators::{IndicatorRow, IndicatorTable, RSIZone};

const BLOCKS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Renders an indicator table. Called once per polling iteration; errors
/// are logged by the caller and never stop the loop.
pub trait Visualizer: Send + Sync {
    fn render(&self, table: &IndicatorTable) -> Result<()>;
}

/// Unicode sparkline panels printed to stdout.
#[derive(Debug, Clone)]
pub struct TerminalCharts {
    width: usize,
}

impl TerminalCharts {
    pub fn new(settings: &ChartSettings) -> Self {
        Self {
            width: settings.width.max(2),
        }
    }

    /// Builds the four panels over the last `width` rows.
    pub fn draw(&self, table: &IndicatorTable) -> Result<String> {
        if table.is_empty() {
            bail!("no rows to chart for {}", table.symbol);
        }
        let start = table.len().saturating_sub(self.width);
        let rows = &table.rows[start..];
        let mut out = String::new();

        writeln!(out, "=== {} ({} bars) ===", table.symbol, rows.len())?;

        let close = column(rows, |r| Some(r.close()));
        let sma = column(rows, |r| r.sma);
        let ema = column(rows, |r| Some(r.ema));
        writeln!(out, "\n--- Price / SMA / EMA ---")?;
        draw_shared(&mut out, &[("close", &close), ("sma", &sma), ("ema", &ema)])?;
        if let Some(fib) = table.fibonacci {
            write!(out, "fib  high {:.2}", fib.high)?;
            for (label, level) in fib.levels() {
                write!(out, " | {} {:.2}", label, level)?;
            }
            writeln!(out, " | low {:.2}", fib.low)?;
        }

        let macd = column(rows, |r| Some(r.macd));
        let signal = column(rows, |r| Some(r.macd_signal));
        writeln!(out, "\n--- MACD / Signal ---")?;
        draw_shared(&mut out, &[("macd", &macd), ("signal", &signal)])?;

        let rsi = column(rows, |r| r.rsi);
        writeln!(out, "\n--- RSI (30/70) ---")?;
        writeln!(out, "{:<8}{}", "rsi", sparkline(&rsi, 0.0, 100.0))?;
        writeln!(out, "{:<8}{}", "zone", zone_marks(rows))?;
        match rows.last().and_then(|r| r.rsi) {
            Some(last) => writeln!(out, "latest  {:.1} ({})", last, RSIZone::of(last).as_str())?,
            None => writeln!(out, "latest  undefined")?,
        }

        let upper = column(rows, |r| r.bollinger_upper);
        let lower = column(rows, |r| r.bollinger_lower);
        writeln!(out, "\n--- Price / Bollinger Bands ---")?;
        draw_shared(&mut out, &[("upper", &upper), ("close", &close), ("lower", &lower)])?;

        Ok(out)
    }
}

impl Visualizer for TerminalCharts {
    fn render(&self, table: &IndicatorTable) -> Result<()> {
        let chart = self.draw(table)?;
        println!("{}", chart);
        Ok(())
    }
}

fn column(rows: &[IndicatorRow], pick: impl Fn(&IndicatorRow) -> Option<Decimal>) -> Vec<Option<f64>> {
    rows.iter().map(|r| pick(r).and_then(|d| d.to_f64())).collect()
}

/// Draws several series against one common scale so they can be compared.
fn draw_shared(out: &mut String, series: &[(&str, &Vec<Option<f64>>)]) -> std::fmt::Result {
    let defined = series.iter().flat_map(|(_, values)| values.iter().flatten());
    let (lo, hi) = defined.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
        (lo.min(v), hi.max(v))
    });

    for (label, values) in series {
        writeln!(out, "{:<8}{}", label, sparkline(values, lo, hi))?;
    }
    if lo.is_finite() {
        writeln!(out, "{:<8}{:.2} .. {:.2}", "range", lo, hi)?;
    }
    Ok(())
}

/// One block per value, scaled into `[lo, hi]`. Undefined values are blank.
pub fn sparkline(values: &[Option<f64>], lo: f64, hi: f64) -> String {
    let span = hi - lo;
    values
        .iter()
        .map(|value| match value {
            None => ' ',
            Some(_) if !(span > 0.0) => BLOCKS[BLOCKS.len() / 2],
            Some(v) => {
                let scaled = ((v - lo) / span * (BLOCKS.len() - 1) as f64).round();
                BLOCKS[scaled.clamp(0.0, (BLOCKS.len() - 1) as f64) as usize]
            }
        })
        .collect()
}

/// `^` above 70, `v` below 30, `-` in between.
fn zone_marks(rows: &[IndicatorRow]) -> String {
    rows.iter()
        .map(|r| match r.rsi.map(RSIZone::of) {
            Some(RSIZone::Overbought) => '^',
            Some(RSIZone::Oversold) => 'v',
            Some(RSIZone::Neutral) => '-',
            None => ' ',
        })
        .collect()
}
