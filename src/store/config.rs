use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::assist::GeminiConfig;

/// Settings read from `~/.leadboard/rc`
#[derive(Debug, Clone)]
pub struct Config {
    pub data_location: PathBuf,
    pub ai: GeminiConfig,
    pub checkout_delay_ms: u64,
    pub currency_symbol: String,
}

impl Config {
    /// Home directory (honours $HOME on Unix)
    pub fn home_dir() -> Result<PathBuf> {
        dirs::home_dir().context("Could not determine home directory")
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::home_dir()?.join(".leadboard").join("rc"))
    }

    /// Get the default board file path
    pub fn default_board_path() -> Result<PathBuf> {
        Ok(Self::home_dir()?.join(".leadboard").join("board.json"))
    }

    /// Load configuration from the rc file, or defaults when it does not exist
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        let defaults = Self::defaults(Self::default_board_path()?);

        if !config_path.exists() {
            return Ok(defaults);
        }

        let content = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;
        let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));
        Self::parse(&content, base_dir, defaults)
            .with_context(|| format!("Invalid config file: {}", config_path.display()))
    }

    fn defaults(data_location: PathBuf) -> Self {
        Self {
            data_location,
            ai: GeminiConfig::default(),
            checkout_delay_ms: 1500,
            currency_symbol: "$".to_string(),
        }
    }

    /// Parse `key=value` lines over `defaults`.
    /// Relative `data.location` paths resolve against `base_dir`.
    pub fn parse(content: &str, base_dir: &Path, defaults: Config) -> Result<Self> {
        let mut config = defaults;

        for (lineno, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                anyhow::bail!("line {}: expected key=value, got '{}'", lineno + 1, line);
            };
            let key = key.trim();
            let value = value.trim();

            match key {
                "data.location" => {
                    let path = PathBuf::from(value);
                    config.data_location = if path.is_relative() {
                        base_dir.join(path)
                    } else {
                        path
                    };
                }
                "ai.model" => config.ai.model = value.to_string(),
                "ai.endpoint" => config.ai.endpoint = value.to_string(),
                "ai.api_key_env" => config.ai.api_key_env = value.to_string(),
                "ai.temperature" => {
                    config.ai.temperature = value
                        .parse()
                        .with_context(|| format!("Invalid value for ai.temperature: '{}'", value))?;
                }
                "ai.timeout_secs" => {
                    config.ai.timeout_secs = value
                        .parse()
                        .with_context(|| format!("Invalid value for ai.timeout_secs: '{}'", value))?;
                }
                "checkout.delay_ms" => {
                    config.checkout_delay_ms = value
                        .parse()
                        .with_context(|| format!("Invalid value for checkout.delay_ms: '{}'", value))?;
                }
                "currency.symbol" => config.currency_symbol = value.to_string(),
                other => log::warn!("ignoring unknown config key '{}'", other),
            }
        }

        Ok(config)
    }
}
