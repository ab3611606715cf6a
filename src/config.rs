use serde::{Deserialize, Deserializer};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::elements::DEFAULT_DECAY_LIMIT_MINUTES;

/// About two simulated years per wall-clock minute.
pub const MAX_TIME_SCALE: f64 = 1.0e6;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub propagation: PropagationConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    pub path: PathBuf,
    #[serde(default = "default_reload_interval", deserialize_with = "human_duration")]
    pub reload_interval: Duration,
}

fn default_reload_interval() -> Duration {
    Duration::from_secs(30 * 60)
}

#[derive(Debug, Clone, Deserialize)]
pub struct PropagationConfig {
    /// Element sets older than this are treated as decayed.
    #[serde(default = "default_max_element_age", deserialize_with = "human_duration")]
    pub max_element_age: Duration,
}

impl Default for PropagationConfig {
    fn default() -> Self {
        Self {
            max_element_age: default_max_element_age(),
        }
    }
}

impl PropagationConfig {
    pub fn decay_limit_minutes(&self) -> f64 {
        self.max_element_age.as_secs_f64() / 60.0
    }
}

fn default_max_element_age() -> Duration {
    Duration::from_secs_f64(DEFAULT_DECAY_LIMIT_MINUTES * 60.0)
}

#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_tick_interval", deserialize_with = "human_duration")]
    pub tick_interval: Duration,
    #[serde(default = "default_time_scale")]
    pub time_scale: f64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval: default_tick_interval(),
            time_scale: default_time_scale(),
        }
    }
}

fn default_tick_interval() -> Duration {
    Duration::from_secs(1)
}

fn default_time_scale() -> f64 {
    1.0
}

fn human_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let text = String::deserialize(deserializer)?;
    humantime::parse_duration(text.trim()).map_err(serde::de::Error::custom)
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    pub fn from_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.scheduler.tick_interval.is_zero() {
            return Err(ConfigError::Invalid("scheduler.tick_interval must be > 0".into()));
        }
        if self.catalog.reload_interval.is_zero() {
            return Err(ConfigError::Invalid("catalog.reload_interval must be > 0".into()));
        }
        let scale = self.scheduler.time_scale;
        if !scale.is_finite() || !(0.0..=MAX_TIME_SCALE).contains(&scale) {
            return Err(ConfigError::Invalid(format!(
                "scheduler.time_scale must be between 0 and {MAX_TIME_SCALE}, got {scale}"
            )));
        }
        Ok(())
    }
}
