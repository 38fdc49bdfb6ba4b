//! Deployer settings file

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::DeployError;
use crate::logs::{LogLevel, LogOptions};

/// Deployer settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Emit logs as JSON
    #[serde(default)]
    pub json_logs: bool,

    /// Also write logs to this file
    #[serde(default)]
    pub log_file: Option<PathBuf>,

    /// Ceiling for a whole deployment, in seconds
    #[serde(default = "default_stack_timeout_secs")]
    pub stack_timeout_secs: u64,

    /// Delay between two event fetches of a stack, in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Delay between two progress renderings, in milliseconds
    #[serde(default = "default_refresh_interval_ms")]
    pub refresh_interval_ms: u64,
}

fn default_stack_timeout_secs() -> u64 {
    90 * 60
}

fn default_poll_interval_ms() -> u64 {
    3000
}

fn default_refresh_interval_ms() -> u64 {
    125
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            json_logs: false,
            log_file: None,
            stack_timeout_secs: default_stack_timeout_secs(),
            poll_interval_ms: default_poll_interval_ms(),
            refresh_interval_ms: default_refresh_interval_ms(),
        }
    }
}

impl Settings {
    /// Read settings from a JSON file
    pub async fn load(path: &Path) -> Result<Self, DeployError> {
        debug!("Loading settings from {}", path.display());
        let contents = tokio::fs::read_to_string(path).await?;
        let settings: Settings = serde_json::from_str(&contents)?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), DeployError> {
        if self.stack_timeout_secs == 0 {
            return Err(DeployError::ConfigError(
                "stack_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.poll_interval_ms == 0 || self.refresh_interval_ms == 0 {
            return Err(DeployError::ConfigError(
                "poll and refresh intervals must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn stack_timeout(&self) -> Duration {
        Duration::from_secs(self.stack_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }

    pub fn log_options(&self) -> LogOptions {
        LogOptions {
            log_level: self.log_level,
            json_format: self.json_logs,
            log_file: self.log_file.clone(),
            ..Default::default()
        }
    }
}
