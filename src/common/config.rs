//! Configuration for chanmap coordinators

use crate::common::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default config file looked up by [`Config::load`]
pub const CONFIG_FILE: &str = "chanmap.toml";

/// Prefix for environment overrides, e.g. `CHANMAP__COORDINATOR__REQUEST_BUFFER=4`
pub const ENV_PREFIX: &str = "CHANMAP";

/// Global configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Logging level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Coordinator channel sizing
    #[serde(default)]
    pub coordinator: CoordinatorConfig,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            coordinator: CoordinatorConfig::default(),
        }
    }
}

/// Coordinator configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    /// Capacity of the shared inbound queue of the uniform-message coordinator
    #[serde(default = "default_request_buffer")]
    pub request_buffer: usize,

    /// Capacity of each per-kind queue of the request-typed coordinator
    #[serde(default = "default_kind_buffer")]
    pub kind_buffer: usize,
}

fn default_request_buffer() -> usize {
    1
}
fn default_kind_buffer() -> usize {
    1
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            request_buffer: default_request_buffer(),
            kind_buffer: default_kind_buffer(),
        }
    }
}

impl CoordinatorConfig {
    /// Channel capacities must be non-zero (tokio rejects empty bounded channels)
    pub fn validate(&self) -> Result<()> {
        if self.request_buffer == 0 {
            return Err(Error::InvalidConfig(
                "coordinator.request_buffer must be at least 1".into(),
            ));
        }
        if self.kind_buffer == 0 {
            return Err(Error::InvalidConfig(
                "coordinator.kind_buffer must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

impl Config {
    /// Load from `chanmap.toml` (if present) then `CHANMAP__*` environment variables.
    pub fn load() -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(CONFIG_FILE).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        Self::finish(settings)
    }

    /// Load from an explicit TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path.as_ref()).required(true))
            .build()?;
        Self::finish(settings)
    }

    fn finish(settings: config::Config) -> Result<Self> {
        let config: Config = settings.try_deserialize()?;
        config.coordinator.validate()?;
        Ok(config)
    }
}
