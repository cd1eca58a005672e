use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::report::{Prediction, Reporter};
use crate::charts::Visualizer;
use crate::config::AppConfig;
use crate::error::{Result, SignalError};
use crate::indicators::{IndicatorEngine, IndicatorTable};
use crate::labeling::LabelGenerator;
use crate::market::MarketDataSource;
use crate::ml::{SignalClassifier, TrainedModel, TrainingReport};
use crate::types::PriceSeries;

/// Source of the wait between polling iterations.
#[async_trait]
pub trait Clock: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

#[derive(Debug, Clone, Default)]
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

enum LoopState {
    Bootstrapping,
    Polling(TrainedModel),
}

/// Fetch, train once, then fetch and predict on a fixed cadence forever.
///
/// Iterations run strictly one after another: the clock sleep is the only
/// suspension point between reporting and the next fetch.
pub struct RealTimeLoop {
    config: AppConfig,
    source: Arc<dyn MarketDataSource>,
    reporter: Arc<dyn Reporter>,
    clock: Arc<dyn Clock>,
    visualizer: Option<Arc<dyn Visualizer>>,
    indicators: IndicatorEngine,
    labels: LabelGenerator,
    classifier: SignalClassifier,
}

impl RealTimeLoop {
    pub fn new(
        config: AppConfig,
        source: Arc<dyn MarketDataSource>,
        reporter: Arc<dyn Reporter>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let classifier = SignalClassifier::new(config.model.clone());
        Self {
            config,
            source,
            reporter,
            clock,
            visualizer: None,
            indicators: IndicatorEngine::new(),
            labels: LabelGenerator::new(),
            classifier,
        }
    }

    pub fn with_visualizer(mut self, visualizer: Arc<dyn Visualizer>) -> Self {
        self.visualizer = Some(visualizer);
        self
    }

    pub fn symbol(&self) -> &str {
        &self.config.market.symbol
    }

    fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.config.schedule.poll_interval_secs)
    }

    /// Only returns when bootstrapping fails.
    pub async fn run(&self) -> Result<()> {
        info!(
            "Starting real-time loop for {} ({} bars over {}, every {}s)",
            self.symbol(),
            self.config.market.interval,
            self.config.market.period,
            self.config.schedule.poll_interval_secs
        );

        let mut state = LoopState::Bootstrapping;
        loop {
            state = match state {
                LoopState::Bootstrapping => {
                    let (model, _) = self.bootstrap().await?;
                    LoopState::Polling(model)
                }
                LoopState::Polling(model) => {
                    if let Err(e) = self.poll_once(&model).await {
                        self.reporter.skipped(&e);
                    }
                    debug!("Sleeping {:?} until next poll", self.poll_interval());
                    self.clock.sleep(self.poll_interval()).await;
                    LoopState::Polling(model)
                }
            };
        }
    }

    /// Fetches history, trains the classifier and reports the result.
    pub async fn bootstrap(&self) -> Result<(TrainedModel, TrainingReport)> {
        let series = self.fetch().await?;
        let table = self.indicators.compute(&series);
        let labeled = self.labels.label(&table);
        let (model, report) = self.classifier.train(&labeled)?;
        self.reporter.training_complete(&report);
        Ok((model, report))
    }

    /// One polling iteration with an already trained model.
    pub async fn poll_once(&self, model: &TrainedModel) -> Result<Prediction> {
        let series = self.fetch().await?;
        let table = self.indicators.compute(&series);
        self.render(&table);

        let latest = table.last().ok_or(SignalError::InsufficientData {
            available: 0,
            required: 1,
        })?;
        let rule_signal = self.labels.label_row(latest);
        let action = model.predict(latest)?;

        let prediction = Prediction {
            symbol: table.symbol.clone(),
            action,
            rule_signal,
            timestamp: latest.bar.timestamp,
            close: latest.close(),
        };
        self.reporter.prediction(&prediction);
        Ok(prediction)
    }

    async fn fetch(&self) -> Result<PriceSeries> {
        let market = &self.config.market;
        let limit = Duration::from_secs(self.config.schedule.fetch_timeout_secs);

        let series = tokio::time::timeout(
            limit,
            self.source.fetch(&market.symbol, market.period, market.interval),
        )
        .await
        .map_err(|_| {
            SignalError::fetch(
                &market.symbol,
                format!("{} did not answer within {:?}", self.source.name(), limit),
            )
        })??;

        // Any source may hand back unordered or inconsistent bars
        series
            .validate()
            .map_err(|reason| SignalError::fetch(&market.symbol, reason))?;
        debug!("{}: fetched {} bars from {}", market.symbol, series.len(), self.source.name());
        Ok(series)
    }

    fn render(&self, table: &IndicatorTable) {
        if let Some(visualizer) = &self.visualizer {
            if let Err(e) = visualizer.render(table) {
                warn!("Chart rendering failed: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Interval, Period, Signal};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    type EventLog = Arc<Mutex<Vec<String>>>;

    fn ramp(len: usize) -> PriceSeries {
        let closes: Vec<Decimal> = (0..len)
            .map(|i| dec!(100) + Decimal::from(i as u64 * 100) / dec!(99))
            .collect();
        PriceSeries::from_closes("RAMP", &closes)
    }

    struct ScriptedSource {
        script: Mutex<VecDeque<Result<PriceSeries>>>,
        fallback: PriceSeries,
        log: EventLog,
    }

    impl ScriptedSource {
        fn new(script: Vec<Result<PriceSeries>>, log: &EventLog) -> Self {
            Self {
                script: Mutex::new(script.into()),
                fallback: ramp(100),
                log: log.clone(),
            }
        }
    }

    #[async_trait]
    impl MarketDataSource for ScriptedSource {
        async fn fetch(&self, _symbol: &str, _period: Period, _interval: Interval) -> Result<PriceSeries> {
            self.log.lock().unwrap().push("fetch".to_string());
            let next = self.script.lock().unwrap().pop_front();
            next.unwrap_or_else(|| Ok(self.fallback.clone()))
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    struct HangingSource;

    #[async_trait]
    impl MarketDataSource for HangingSource {
        async fn fetch(&self, _symbol: &str, _period: Period, _interval: Interval) -> Result<PriceSeries> {
            std::future::pending().await
        }

        fn name(&self) -> &str {
            "hanging"
        }
    }

    struct RecordingReporter {
        log: EventLog,
    }

    impl Reporter for RecordingReporter {
        fn training_complete(&self, _report: &TrainingReport) {
            self.log.lock().unwrap().push("trained".to_string());
        }

        fn prediction(&self, prediction: &Prediction) {
            self.log.lock().unwrap().push(format!("predict:{}", prediction.action));
        }

        fn skipped(&self, error: &SignalError) {
            let kind = match error {
                SignalError::DataFetch { .. } => "fetch",
                SignalError::InsufficientData { .. } => "insufficient",
                SignalError::SchemaMismatch { .. } => "schema",
                SignalError::Config(_) => "config",
            };
            self.log.lock().unwrap().push(format!("skip:{}", kind));
        }
    }

    /// Returns immediately for the first `limit` sleeps, then never again.
    struct CountingClock {
        log: EventLog,
        calls: AtomicUsize,
        limit: usize,
    }

    #[async_trait]
    impl Clock for CountingClock {
        async fn sleep(&self, duration: Duration) {
            assert_eq!(duration, Duration::from_secs(300));
            self.log.lock().unwrap().push("sleep".to_string());
            if self.calls.fetch_add(1, Ordering::SeqCst) + 1 > self.limit {
                std::future::pending::<()>().await;
            }
        }
    }

    struct BrokenVisualizer;

    impl Visualizer for BrokenVisualizer {
        fn render(&self, _table: &IndicatorTable) -> anyhow::Result<()> {
            anyhow::bail!("no terminal")
        }
    }

    fn test_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.model.n_trees = 5;
        config.model.seed = Some(1);
        config.schedule.fetch_timeout_secs = 1;
        config
    }

    fn build(source: Arc<dyn MarketDataSource>, log: &EventLog, sleeps: usize) -> RealTimeLoop {
        RealTimeLoop::new(
            test_config(),
            source,
            Arc::new(RecordingReporter { log: log.clone() }),
            Arc::new(CountingClock {
                log: log.clone(),
                calls: AtomicUsize::new(0),
                limit: sleeps,
            }),
        )
    }

    fn events(log: &EventLog) -> Vec<String> {
        log.lock().unwrap().clone()
    }

    async fn run_until_parked(rt: &RealTimeLoop) {
        let outcome = tokio::time::timeout(Duration::from_secs(2), rt.run()).await;
        assert!(outcome.is_err(), "loop should still be running");
    }

    #[tokio::test]
    async fn test_iterations_never_interleave() {
        let log = EventLog::default();
        let rt = build(Arc::new(ScriptedSource::new(vec![], &log)), &log, 2);
        run_until_parked(&rt).await;

        assert_eq!(
            events(&log),
            vec![
                "fetch", "trained",
                "fetch", "predict:buy", "sleep",
                "fetch", "predict:buy", "sleep",
                "fetch", "predict:buy", "sleep",
            ]
        );
    }

    #[tokio::test]
    async fn test_polling_fetch_failure_is_skipped_and_model_kept() {
        let log = EventLog::default();
        let script = vec![
            Ok(ramp(100)),
            Err(SignalError::fetch("RAMP", "connection reset")),
        ];
        let rt = build(Arc::new(ScriptedSource::new(script, &log)), &log, 1);
        run_until_parked(&rt).await;

        assert_eq!(
            events(&log),
            vec![
                "fetch", "trained",
                "fetch", "skip:fetch", "sleep",
                "fetch", "predict:buy", "sleep",
            ]
        );
    }

    #[tokio::test]
    async fn test_incomplete_latest_row_is_skipped() {
        let log = EventLog::default();
        // ten bars: SMA(20) is undefined on the latest row
        let rt = build(
            Arc::new(ScriptedSource::new(vec![Ok(ramp(100)), Ok(ramp(10))], &log)),
            &log,
            1,
        );
        run_until_parked(&rt).await;

        let log = events(&log);
        assert_eq!(log[3], "skip:schema");
        assert_eq!(log[6], "predict:buy");
    }

    #[tokio::test]
    async fn test_bootstrap_fetch_failure_is_fatal() {
        let log = EventLog::default();
        let script = vec![Err(SignalError::fetch("RAMP", "unreachable"))];
        let rt = build(Arc::new(ScriptedSource::new(script, &log)), &log, 5);

        let err = rt.run().await.unwrap_err();
        assert!(matches!(err, SignalError::DataFetch { .. }));
        assert_eq!(events(&log), vec!["fetch"]);
    }

    #[tokio::test]
    async fn test_bootstrap_with_too_little_history_is_fatal() {
        let log = EventLog::default();
        let rt = build(Arc::new(ScriptedSource::new(vec![Ok(ramp(22))], &log)), &log, 5);

        let err = rt.run().await.unwrap_err();
        assert!(matches!(err, SignalError::InsufficientData { available: 3, .. }));
    }

    #[tokio::test]
    async fn test_empty_series_is_data_fetch_error() {
        let log = EventLog::default();
        let empty = PriceSeries::new("RAMP", Vec::new());
        let rt = build(Arc::new(ScriptedSource::new(vec![Ok(empty)], &log)), &log, 5);

        assert!(matches!(rt.bootstrap().await, Err(SignalError::DataFetch { .. })));
    }

    #[tokio::test]
    async fn test_descending_timestamps_fail_bootstrap() {
        let log = EventLog::default();
        let mut reversed = ramp(100);
        reversed.bars.reverse();
        let rt = build(Arc::new(ScriptedSource::new(vec![Ok(reversed)], &log)), &log, 5);

        match rt.bootstrap().await {
            Err(SignalError::DataFetch { reason, .. }) => assert!(reason.contains("ascending")),
            other => panic!("expected DataFetch, got {:?}", other.map(|(_, r)| r.samples)),
        }
        assert!(!events(&log).contains(&"trained".to_string()));
    }

    #[tokio::test]
    async fn test_malformed_series_while_polling_is_skipped() {
        let log = EventLog::default();
        let mut reversed = ramp(100);
        reversed.bars.reverse();
        let mut duplicated = ramp(100);
        let last = duplicated.bars[99];
        duplicated.bars.push(last);

        let script = vec![Ok(ramp(100)), Ok(reversed), Ok(duplicated)];
        let rt = build(Arc::new(ScriptedSource::new(script, &log)), &log, 2);
        run_until_parked(&rt).await;

        assert_eq!(
            events(&log),
            vec![
                "fetch", "trained",
                "fetch", "skip:fetch", "sleep",
                "fetch", "skip:fetch", "sleep",
                "fetch", "predict:buy", "sleep",
            ]
        );
    }

    #[tokio::test]
    async fn test_inconsistent_bar_is_data_fetch_error() {
        let log = EventLog::default();
        let mut broken = ramp(100);
        broken.bars[50].high = broken.bars[50].low - dec!(1);
        let rt = build(Arc::new(ScriptedSource::new(vec![Ok(broken)], &log)), &log, 5);

        assert!(matches!(rt.bootstrap().await, Err(SignalError::DataFetch { .. })));
    }

    #[tokio::test]
    async fn test_hanging_fetch_times_out() {
        let log = EventLog::default();
        let rt = build(Arc::new(HangingSource), &log, 5);

        match rt.bootstrap().await {
            Err(SignalError::DataFetch { reason, .. }) => assert!(reason.contains("hanging")),
            other => panic!("expected timeout, got {:?}", other.map(|(_, r)| r.samples)),
        }
    }

    #[tokio::test]
    async fn test_visualizer_failure_does_not_stop_prediction() {
        let log = EventLog::default();
        let rt = build(Arc::new(ScriptedSource::new(vec![], &log)), &log, 5)
            .with_visualizer(Arc::new(BrokenVisualizer));

        let (model, report) = rt.bootstrap().await.unwrap();
        assert_eq!(report.samples, 81);

        let prediction = rt.poll_once(&model).await.unwrap();
        assert_eq!(prediction.action, Signal::Buy);
        assert_eq!(prediction.rule_signal, Some(Signal::Buy));
        assert_eq!(prediction.close, dec!(200));
        assert_eq!(prediction.symbol, "RAMP");
    }
}
