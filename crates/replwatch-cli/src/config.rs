use anyhow::{Context, Result, bail};
use replwatch_core::{CheckRequest, ConnectOptions, DEFAULT_PROBE_KEY, Endpoint, Thresholds};
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::cli::Cli;

/// Optional tuning read from `config.toml`; thresholds and the replica
/// address always come from the command line.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Key written on the primary and polled on the replica
    pub probe_key: String,
    pub poll_interval_ms: u64,
    pub connect_timeout_ms: u64,
    pub io_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            probe_key: DEFAULT_PROBE_KEY.to_string(),
            poll_interval_ms: 50,
            connect_timeout_ms: 5_000,
            io_timeout_ms: 5_000,
        }
    }
}

impl Config {
    /// Load from `path`, or the default location; a missing file means defaults
    pub fn load(path: Option<&str>) -> Result<Self> {
        let config_path = match path {
            Some(p) => PathBuf::from(p),
            None => Self::default_path(),
        };

        if config_path.exists() {
            let content = fs::read_to_string(&config_path)
                .with_context(|| format!("reading {}", config_path.display()))?;
            let config: Config = toml::from_str(&content)
                .with_context(|| format!("parsing {}", config_path.display()))?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("replwatch")
            .join("config.toml")
    }

    pub fn validate(&self) -> Result<()> {
        if self.probe_key.is_empty() {
            bail!("probe_key must not be empty");
        }
        if self.poll_interval_ms == 0 {
            bail!("poll_interval_ms must be at least 1");
        }
        if self.connect_timeout_ms == 0 || self.io_timeout_ms == 0 {
            bail!("connect_timeout_ms and io_timeout_ms must be at least 1");
        }
        Ok(())
    }

    pub fn connect_options(&self) -> ConnectOptions {
        ConnectOptions {
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            io_timeout: Duration::from_millis(self.io_timeout_ms),
        }
    }

    /// Merge command-line arguments with this configuration
    pub fn check_request(&self, cli: &Cli) -> CheckRequest {
        let thresholds = Thresholds::new(cli.warning, cli.critical);
        CheckRequest::new(Endpoint::new(cli.host.clone(), cli.port), thresholds)
            .with_probe_key(self.probe_key.clone())
            .with_poll_interval(Duration::from_millis(self.poll_interval_ms))
    }
}
