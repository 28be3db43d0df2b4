//! Configuration loading: TOML file with environment variable overrides.
//!
//! Looks for `rfhub.toml` in the working directory, or the file named by
//! `RFHUB_CONFIG`. Every daemon field has a default so the file is optional.
//! Integration sections are kept raw and deserialized on their own, so a
//! broken `[rf433]` table disables that integration instead of the daemon.

use std::path::Path;

use serde::Deserialize;

use rfhub_adapter_rf433::Rf433Config;

const DEFAULT_PATH: &str = "rfhub.toml";

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Event bus settings.
    pub events: EventsConfig,
    /// Raw `[rf433]` section.
    pub rf433: Option<toml::Value>,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

/// In-process event bus configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct EventsConfig {
    /// Events buffered per subscriber before the slowest one lags.
    pub capacity: usize,
}

impl Config {
    /// Load configuration from `RFHUB_CONFIG` or `rfhub.toml` (if present)
    /// then apply environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but is malformed, or if
    /// `RFHUB_CONFIG` names a file that cannot be read.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::env::var("RFHUB_CONFIG") {
            Ok(path) => Self::from_file(&path, true)?,
            Err(_) => Self::from_file(DEFAULT_PATH, false)?,
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: impl AsRef<Path>, required: bool) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::parse(&content),
            Err(err) if !required && err.kind() == std::io::ErrorKind::NotFound => {
                Ok(Self::default())
            }
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    /// Parse a configuration document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] on malformed TOML.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::Parse)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("RFHUB_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.events.capacity == 0 {
            return Err(ConfigError::Validation(
                "events.capacity must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// The `[rf433]` section, if present.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Section`] when the section does not match the
    /// integration's schema.
    pub fn rf433(&self) -> Result<Option<Rf433Config>, ConfigError> {
        self.rf433
            .clone()
            .map(|value| {
                value.try_into::<Rf433Config>().map_err(|source| ConfigError::Section {
                    section: "rf433",
                    source,
                })
            })
            .transpose()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "rfhubd=info,rfhub_app=info,rfhub_adapter_rf433=info".to_string(),
        }
    }
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self { capacity: 256 }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[source] toml::de::Error),
    /// An integration section does not match its schema.
    #[error("invalid [{section}] section")]
    Section {
        section: &'static str,
        #[source]
        source: toml::de::Error,
    },
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}
