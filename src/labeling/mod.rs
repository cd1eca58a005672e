use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

use crate::indicators::{IndicatorRow, IndicatorTable};
use crate::types::Signal;

/// Values a labeling rule may inspect. Only built for rows where all of
/// them are defined.
#[derive(Debug, Clone, Copy)]
pub struct RuleInputs {
    pub close: Decimal,
    pub sma: Decimal,
    pub ema: Decimal,
    pub rsi: Decimal,
}

impl RuleInputs {
    pub fn from_row(row: &IndicatorRow) -> Option<Self> {
        Some(Self {
            close: row.close(),
            sma: row.sma?,
            ema: row.ema,
            rsi: row.rsi?,
        })
    }
}

/// A predicate and the label it assigns when it holds.
#[derive(Debug, Clone, Copy)]
pub struct LabelRule {
    pub name: &'static str,
    pub predicate: fn(&RuleInputs) -> bool,
    pub signal: Signal,
}

fn rsi_overbought(i: &RuleInputs) -> bool {
    i.rsi > dec!(70)
}

fn rsi_oversold(i: &RuleInputs) -> bool {
    i.rsi < dec!(30)
}

fn close_above_ema(i: &RuleInputs) -> bool {
    i.close > i.ema
}

fn close_below_sma(i: &RuleInputs) -> bool {
    i.close < i.sma
}

/// Rules in evaluation order. Later matches overwrite earlier ones, so a
/// close below the SMA is a sell even when it is also above the EMA.
pub const LABEL_RULES: [LabelRule; 4] = [
    LabelRule { name: "rsi_overbought", predicate: rsi_overbought, signal: Signal::Sell },
    LabelRule { name: "rsi_oversold", predicate: rsi_oversold, signal: Signal::Buy },
    LabelRule { name: "close_above_ema", predicate: close_above_ema, signal: Signal::Buy },
    LabelRule { name: "close_below_sma", predicate: close_below_sma, signal: Signal::Sell },
];

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LabeledRow {
    pub row: IndicatorRow,
    /// `None` when RSI or SMA is still undefined for this bar.
    pub signal: Option<Signal>,
}

#[derive(Debug, Clone)]
pub struct LabelGenerator {
    rules: Vec<LabelRule>,
}

impl LabelGenerator {
    pub fn new() -> Self {
        Self {
            rules: LABEL_RULES.to_vec(),
        }
    }

    pub fn rules(&self) -> &[LabelRule] {
        &self.rules
    }

    /// Folds the rule list starting from hold; last match wins.
    pub fn label_inputs(&self, inputs: &RuleInputs) -> Signal {
        self.rules.iter().fold(Signal::Hold, |current, rule| {
            if (rule.predicate)(inputs) {
                rule.signal
            } else {
                current
            }
        })
    }

    pub fn label_row(&self, row: &IndicatorRow) -> Option<Signal> {
        RuleInputs::from_row(row).map(|inputs| self.label_inputs(&inputs))
    }

    pub fn label(&self, table: &IndicatorTable) -> Vec<LabeledRow> {
        table
            .rows
            .iter()
            .map(|row| LabeledRow {
                row: *row,
                signal: self.label_row(row),
            })
            .collect()
    }
}

impl Default for LabelGenerator {
    fn default() -> Self {
        Self::new()
    }
}
