//! Configuration for the delay queue CLI.
//!
//! Sources are applied in order, later sources overriding earlier ones:
//!  1. Built-in defaults
//!  2. `./config/delay-queue.{yaml,toml,json}` when present
//!  3. The file given by `--config` / `DELAY_QUEUE_CONFIG`
//!  4. Environment variables prefixed `DQ__` with `__` as separator,
//!     e.g. `DQ__SERVER__URL=http://queue:9277`
//!  5. Command-line flags (`--server`, `--timeout`)

use delay_queue_client::{ClientConfig, HandlerName, HandlerRegistry, ValidationError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration-related errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Invalid handler in configuration: {0}")]
    Handler(#[from] ValidationError),
}

/// CLI configuration structure
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct CliConfig {
    /// Delay queue server settings
    pub server: ServerConfig,

    /// Handler identifiers that `push` accepts
    pub handlers: Vec<String>,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Delay queue server settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub url: String,
    pub timeout_seconds: u64,
    pub user_agent: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        let client = ClientConfig::default();
        Self {
            url: client.server_url,
            timeout_seconds: client.timeout.as_secs(),
            user_agent: None,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            json_format: false,
        }
    }
}

impl CliConfig {
    /// Load configuration from the layered sources.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::FileNotFound` if `path` is given but does not
    /// exist, and `ConfigError::Load` if a source is malformed.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder()
            .add_source(config::File::with_name("config/delay-queue").required(false));

        if let Some(path) = path {
            if !path.exists() {
                return Err(ConfigError::FileNotFound {
                    path: path.to_path_buf(),
                });
            }
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let config = builder
            .add_source(
                config::Environment::with_prefix("DQ")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("handlers"),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Apply command-line overrides.
    pub fn with_overrides(mut self, server: Option<String>, timeout_seconds: Option<u64>) -> Self {
        if let Some(server) = server {
            self.server.url = server;
        }
        if let Some(timeout_seconds) = timeout_seconds {
            self.server.timeout_seconds = timeout_seconds;
        }
        self
    }

    /// Check the configuration for values the client cannot use.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.url.trim().is_empty() {
            return Err(ConfigError::Invalid {
                message: "server.url must not be empty".to_string(),
            });
        }

        if self.server.timeout_seconds == 0 {
            return Err(ConfigError::Invalid {
                message: "server.timeout_seconds must be greater than zero".to_string(),
            });
        }

        for handler in &self.handlers {
            HandlerName::new(handler.as_str())?;
        }

        Ok(())
    }

    /// Client settings derived from this configuration.
    pub fn client_config(&self) -> ClientConfig {
        let mut config = ClientConfig::default()
            .with_server_url(self.server.url.clone())
            .with_timeout(Duration::from_secs(self.server.timeout_seconds));
        if let Some(user_agent) = &self.server.user_agent {
            config = config.with_user_agent(user_agent.clone());
        }
        config
    }

    /// Registry holding every configured handler name.
    pub fn handler_registry(&self) -> Result<HandlerRegistry, ConfigError> {
        let mut registry = HandlerRegistry::new();
        for handler in &self.handlers {
            registry.register_name(HandlerName::new(handler.as_str())?);
        }
        Ok(registry)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
