use ::config::{Config, Environment, File, FileFormat};
use tracing::{debug, info};

use super::runtime::AppConfig;
use crate::error::{Result, SignalError};

pub const DEFAULT_CONFIG_PATH: &str = "signal_bot.toml";
pub const ENV_PREFIX: &str = "SIGNAL_BOT";

/// Layers the optional TOML file under `SIGNAL_BOT__SECTION__KEY`
/// environment overrides (after loading `.env`), then validates.
pub fn load_config(path: &str) -> Result<AppConfig> {
    if let Ok(env_path) = dotenvy::dotenv() {
        debug!("Loaded environment from {}", env_path.display());
    }

    let settings = Config::builder()
        .add_source(File::new(path, FileFormat::Toml).required(false))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .map_err(|e| SignalError::Config(e.to_string()))?;

    let config: AppConfig = settings
        .try_deserialize()
        .map_err(|e| SignalError::Config(e.to_string()))?;

    config
        .validate()
        .map_err(|errors| SignalError::Config(errors.join(", ")))?;

    info!(
        "Configuration loaded: symbol={}, period={}, interval={}, poll every {}s",
        config.market.symbol,
        config.market.period,
        config.market.interval,
        config.schedule.poll_interval_secs
    );
    Ok(config)
}

pub fn to_toml(config: &AppConfig) -> Result<String> {
    toml::to_string_pretty(config).map_err(|e| SignalError::Config(e.to_string()))
}
