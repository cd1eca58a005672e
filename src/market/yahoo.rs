use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use reqwest::Client;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::debug;

use super::MarketDataSource;
use crate::error::{Result, SignalError};
use crate::types::{Interval, Period, PriceBar, PriceSeries};

const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";
const PRICE_DP: u32 = 6;

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    timestamp: Option<Vec<i64>>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    quote: Vec<ChartQuote>,
}

#[derive(Debug, Default, Deserialize)]
struct ChartQuote {
    open: Option<Vec<Option<f64>>>,
    high: Option<Vec<Option<f64>>>,
    low: Option<Vec<Option<f64>>>,
    close: Option<Vec<Option<f64>>>,
    volume: Option<Vec<Option<f64>>>,
}

fn column(values: &Option<Vec<Option<f64>>>, i: usize) -> Option<Decimal> {
    values
        .as_ref()
        .and_then(|v| v.get(i).copied().flatten())
        .and_then(Decimal::from_f64)
        .map(|d| d.round_dp(PRICE_DP))
}

/// Turns a chart API body into a validated series. Bars without a close
/// are skipped; missing open/high/low fall back to the close.
pub fn parse_chart(symbol: &str, body: &str) -> Result<PriceSeries> {
    let data: ChartResponse = serde_json::from_str(body)
        .map_err(|e| SignalError::fetch(symbol, format!("parse error: {}", e)))?;

    if let Some(error) = data.chart.error {
        return Err(SignalError::fetch(
            symbol,
            format!("Yahoo API error: {} - {}", error.code, error.description),
        ));
    }

    let result = data
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| SignalError::fetch(symbol, "no results in response"))?;

    let timestamps = result.timestamp.unwrap_or_default();
    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();

    let mut bars = Vec::with_capacity(timestamps.len());
    let mut skipped = 0usize;
    for (i, &ts) in timestamps.iter().enumerate() {
        let close = match column(&quote.close, i) {
            Some(close) => close,
            None => {
                skipped += 1;
                continue;
            }
        };
        let Some(timestamp) = Utc.timestamp_opt(ts, 0).single() else {
            skipped += 1;
            continue;
        };

        let open = column(&quote.open, i).unwrap_or(close);
        let bar = PriceBar {
            timestamp,
            open,
            high: column(&quote.high, i).unwrap_or_else(|| open.max(close)),
            low: column(&quote.low, i).unwrap_or_else(|| open.min(close)),
            close,
            volume: column(&quote.volume, i).unwrap_or(Decimal::ZERO),
        };

        if let Err(reason) = bar.check() {
            debug!("{}: skipping bar: {}", symbol, reason);
            skipped += 1;
            continue;
        }
        bars.push(bar);
    }

    if skipped > 0 {
        debug!("{}: skipped {} of {} bars", symbol, skipped, timestamps.len());
    }

    let series = PriceSeries::new(symbol, bars);
    series
        .validate()
        .map_err(|reason| SignalError::fetch(symbol, reason))?;
    Ok(series)
}

/// Client for the public Yahoo Finance chart endpoint.
pub struct YahooFinanceClient {
    client: Client,
    base_url: String,
}

impl YahooFinanceClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent("Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36")
            .build()
            .map_err(|e| SignalError::Config(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn chart_url(&self, symbol: &str, period: Period, interval: Interval) -> String {
        format!(
            "{}/v8/finance/chart/{}?range={}&interval={}&includePrePost=false",
            self.base_url.trim_end_matches('/'),
            symbol.trim().to_uppercase(),
            period.as_str(),
            interval.as_str()
        )
    }
}

#[async_trait]
impl MarketDataSource for YahooFinanceClient {
    async fn fetch(&self, symbol: &str, period: Period, interval: Interval) -> Result<PriceSeries> {
        let url = self.chart_url(symbol, period, interval);
        debug!("Fetching Yahoo Finance data: {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| SignalError::fetch(symbol, format!("request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SignalError::fetch(symbol, format!("reading body: {}", e)))?;

        // Yahoo reports unknown symbols as 404 with a chart.error body
        if !status.is_success() && !body.contains("\"chart\"") {
            return Err(SignalError::fetch(symbol, format!("HTTP {}", status)));
        }

        let series = parse_chart(symbol, &body)?;
        debug!("{}: received {} bars", symbol, series.len());
        Ok(series)
    }

    fn name(&self) -> &str {
        "yahoo"
    }
}
