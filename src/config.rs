//! Client configuration.
//!
//! Values are layered: built-in defaults, then an optional TOML file, then
//! `INVENTORY_*` environment variables, then command-line flags.

use crate::api::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};
use crate::render::OutputFormat;
use anyhow::{bail, Context, Result};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const ENV_BASE_URL: &str = "INVENTORY_API_URL";
pub const ENV_TIMEOUT: &str = "INVENTORY_TIMEOUT_SECS";
pub const ENV_OUTPUT: &str = "INVENTORY_OUTPUT";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Service root, e.g. `http://localhost:8080`
    pub base_url: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    pub output: OutputFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            output: OutputFormat::Table,
        }
    }
}

/// Values given on the command line; `None` leaves the lower layers alone.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub config_path: Option<PathBuf>,
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub output: Option<OutputFormat>,
}

/// `<config_dir>/inventory-cli/config.toml`, if the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("inventory-cli").join("config.toml"))
}

impl Config {
    /// Resolve the effective configuration from every layer.
    pub fn load(overrides: &Overrides) -> Result<Self> {
        let mut config = match &overrides.config_path {
            Some(path) => Self::from_file(path)?,
            None => match default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.apply_overrides(overrides);
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = toml::from_str(&text)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        tracing::debug!(path = %path.display(), "loaded config file");
        Ok(config)
    }

    /// Apply environment values through `lookup` so tests need not touch
    /// the process environment.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_BASE_URL) {
            self.base_url = url;
        }
        if let Some(raw) = lookup(ENV_TIMEOUT) {
            self.timeout_secs = raw
                .trim()
                .parse()
                .with_context(|| format!("{ENV_TIMEOUT} must be a whole number of seconds"))?;
        }
        if let Some(raw) = lookup(ENV_OUTPUT) {
            self.output = raw
                .parse()
                .map_err(anyhow::Error::msg)
                .with_context(|| format!("Invalid {ENV_OUTPUT}"))?;
        }
        Ok(())
    }

    pub fn apply_overrides(&mut self, overrides: &Overrides) {
        if let Some(url) = &overrides.base_url {
            self.base_url = url.clone();
        }
        if let Some(timeout) = overrides.timeout_secs {
            self.timeout_secs = timeout;
        }
        if let Some(output) = overrides.output {
            self.output = output;
        }
    }

    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.base_url)
            .with_context(|| format!("Invalid base url {:?}", self.base_url))?;
        if !matches!(url.scheme(), "http" | "https") {
            bail!("Base url must use http or https, got {:?}", url.scheme());
        }
        if self.timeout_secs == 0 {
            bail!("Timeout must be greater than zero");
        }
        Ok(())
    }
}
