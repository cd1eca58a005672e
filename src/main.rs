use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use signal_bot::charts::{TerminalCharts, Visualizer};
use signal_bot::config::{load_config, to_toml, AppConfig, DEFAULT_CONFIG_PATH};
use signal_bot::engine::{ConsoleReporter, Prediction, RealTimeLoop, Reporter, TokioClock};
use signal_bot::indicators::IndicatorEngine;
use signal_bot::labeling::LabelGenerator;
use signal_bot::market::{MarketDataSource, YahooFinanceClient};
use signal_bot::ml::SignalClassifier;

#[derive(Parser)]
#[command(name = "signal-bot")]
#[command(version = "0.1.0")]
#[command(about = "Indicator-labelled buy/sell/hold signals from a random forest, refreshed every few minutes", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Train once, then predict on fresh bars every poll interval
    Run {
        /// Instrument symbol (e.g. MIATK.IS)
        #[arg(short, long)]
        symbol: Option<String>,
    },
    /// Fetch, train and predict once, with charts
    Analyze {
        /// Instrument symbol (e.g. MIATK.IS)
        #[arg(short, long)]
        symbol: Option<String>,
    },
    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging; RUST_LOG takes precedence over --verbose
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = load_config(&cli.config)?;

    match cli.command {
        Commands::Run { symbol } => {
            override_symbol(&mut config, symbol);
            run_loop(config).await?;
        }
        Commands::Analyze { symbol } => {
            override_symbol(&mut config, symbol);
            analyze(config).await?;
        }
        Commands::Config => {
            println!("{}", to_toml(&config)?);
        }
    }

    Ok(())
}

fn override_symbol(config: &mut AppConfig, symbol: Option<String>) {
    if let Some(symbol) = symbol {
        config.market.symbol = symbol;
    }
}

fn market_source(config: &AppConfig) -> Result<YahooFinanceClient> {
    let timeout = Duration::from_secs(config.schedule.fetch_timeout_secs);
    Ok(YahooFinanceClient::new(timeout)?)
}

async fn run_loop(config: AppConfig) -> Result<()> {
    info!("Signal Bot v0.1.0: {}", config.market.symbol);

    let source = Arc::new(market_source(&config)?);
    let charts = config.charts.enabled.then(|| TerminalCharts::new(&config.charts));

    let mut realtime = RealTimeLoop::new(
        config,
        source,
        Arc::new(ConsoleReporter::new()),
        Arc::new(TokioClock),
    );
    if let Some(charts) = charts {
        realtime = realtime.with_visualizer(Arc::new(charts));
    }

    realtime
        .run()
        .await
        .map_err(|e| anyhow!("Cannot start: {}", e))
}

async fn analyze(config: AppConfig) -> Result<()> {
    let market = &config.market;
    let source = market_source(&config)?;

    let series = source.fetch(&market.symbol, market.period, market.interval).await?;
    info!("Fetched {} bars of {} from {}", series.len(), market.symbol, source.name());

    let table = IndicatorEngine::new().compute(&series);
    let labels = LabelGenerator::new();
    let labeled = labels.label(&table);

    let reporter = ConsoleReporter::new();
    let (model, report) = SignalClassifier::new(config.model.clone()).train(&labeled)?;
    reporter.training_complete(&report);

    if let Some(fib) = table.fibonacci {
        println!("\n=== Fibonacci Levels ===");
        println!("High: {:.2}", fib.high);
        for (label, level) in fib.levels() {
            println!("{}: {:.2}", label, level);
        }
        println!("Low: {:.2}", fib.low);
    }

    if config.charts.enabled {
        if let Err(e) = TerminalCharts::new(&config.charts).render(&table) {
            warn!("Chart rendering failed: {}", e);
        }
    }

    let latest = table
        .last()
        .ok_or_else(|| anyhow!("No bars returned for {}", market.symbol))?;
    let prediction = Prediction {
        symbol: table.symbol.clone(),
        action: model.predict(latest)?,
        rule_signal: labels.label_row(latest),
        timestamp: latest.bar.timestamp,
        close: latest.close(),
    };
    reporter.prediction(&prediction);

    Ok(())
}
