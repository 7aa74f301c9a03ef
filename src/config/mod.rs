//! Configuration management for the watch server.
//!
//! Provides hierarchical configuration loading and validation with:
//! - Default values as code base
//! - Configuration file support
//! - Environment variable overrides
//! - Component-wise validation

mod monitoring;
mod server;
mod tls;
mod watch;

pub use monitoring::*;
pub use server::*;
pub use tls::*;
pub use watch::*;


use std::env;

use config::Config;
use config::Environment;
use config::File;
use serde::Deserialize;
use serde::Serialize;

use crate::Result;

/// Prefix of environment overrides, e.g. `LOCALNET__SERVER__LISTEN_ADDRESS`.
pub const ENV_PREFIX: &str = "LOCALNET";

/// Main configuration container.
///
/// Sources are merged in the following order (later sources override earlier):
/// 1. Type defaults
/// 2. Configuration file named by `CONFIG_PATH`
/// 3. Environment variables with the `LOCALNET__` prefix
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Settings {
    /// gRPC listener and transport tuning
    #[serde(default)]
    pub server: ServerConfig,
    /// Watch session parameters
    #[serde(default)]
    pub watch: WatchConfig,
    /// Metrics exporter
    #[serde(default)]
    pub monitoring: MonitoringConfig,
    /// TLS/SSL security configuration
    #[serde(default)]
    pub tls: TlsConfig,
}

impl Settings {
    /// Loads configuration from hierarchical sources without validation.
    ///
    /// Callers must call [`Settings::validate`] once all overrides are applied.
    ///
    /// # Examples
    /// ```ignore
    /// std::env::set_var("CONFIG_PATH", "config/watch.toml");
    /// let settings = Settings::new()?.validate()?;
    /// ```
    pub fn new() -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);
        if let Ok(config_path) = env::var("CONFIG_PATH") {
            builder = builder.add_source(File::with_name(&config_path).required(true));
        }
        builder = builder.add_source(env_source());

        let config: Self = builder.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Applies overrides from `path` on top of the current values.
    ///
    /// Environment variables are applied again last so they keep the
    /// highest priority.
    pub fn with_override_config(
        &self,
        path: &str,
    ) -> Result<Self> {
        let config: Self = Config::builder()
            .add_source(Config::try_from(self)?)
            .add_source(File::with_name(path))
            .add_source(env_source())
            .build()?
            .try_deserialize()?;
        Ok(config)
    }

    /// Validates every section and returns the validated instance.
    pub fn validate(self) -> Result<Self> {
        self.server.validate()?;
        self.watch.validate()?;
        self.monitoring.validate()?;
        self.tls.validate()?;
        Ok(self)
    }
}

fn env_source() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .separator("__")
        .ignore_empty(true)
        .try_parsing(true)
}
