//! Configuration and tracing setup for gridmodel components.
//!
//! Configuration lives in a single TOML file; every section and field has a
//! serde default, so an empty or missing file yields [`ModelConfig::default`].

use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use crate::error::{ModelError, ModelResult};

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ModelConfig {
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level or filter directive: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Colourise terminal output
    #[serde(default = "default_ansi")]
    pub ansi: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            ansi: default_ansi(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_ansi() -> bool {
    true
}

/// Load configuration from `path`, falling back to defaults when the file
/// does not exist.
pub fn load_config(path: impl AsRef<Path>) -> ModelResult<ModelConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Ok(ModelConfig::default());
    }

    let contents = std::fs::read_to_string(path)?;
    let config: ModelConfig = toml::from_str(&contents)?;
    Ok(config)
}

/// Save configuration to `path`, creating parent directories as needed.
pub fn save_config(path: impl AsRef<Path>, config: &ModelConfig) -> ModelResult<()> {
    let path = path.as_ref();
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

/// Install a global fmt subscriber writing to stderr.
///
/// `RUST_LOG` takes precedence over `config.level`. Fails with
/// [`ModelError::Config`] when the level is not a valid filter or a global
/// subscriber is already installed.
pub fn init_tracing(config: &LoggingConfig) -> ModelResult<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level).map_err(|e| {
            ModelError::Config(format!("invalid log level '{}': {}", config.level, e))
        })?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(config.ansi)
        .with_writer(io::stderr)
        .try_init()
        .map_err(|e| ModelError::Config(format!("tracing already initialized: {}", e)))
}
