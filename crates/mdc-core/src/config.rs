//! Catalog configuration
//!
//! Loaded from TOML; every key is optional and falls back to its default.
//!
//! ```toml
//! default_project = "analytics"
//! page_size = 20
//!
//! [cache]
//! capacity = 5000
//! ttl_secs = 300
//!
//! [logging]
//! filter = "mdc_core=debug,info"
//! json = true
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML could not be parsed into a configuration
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range
    #[error("invalid configuration: {0}")]
    Invalid(String),

    /// Tracing subscriber could not be installed
    #[error("failed to install tracing subscriber: {0}")]
    Subscriber(String),
}

/// Catalog configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Project used when a save names none
    pub default_project: String,

    /// Page size of model listings
    pub page_size: usize,

    /// Derived-result cache settings
    pub cache: CacheConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

impl CatalogConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from TOML and validate
    ///
    /// # Errors
    /// [`ConfigError::Parse`] on malformed input, [`ConfigError::Invalid`]
    /// on out-of-range values.
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] for a zero page size or a blank
    /// default project.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.page_size == 0 {
            return Err(ConfigError::Invalid("page_size must be positive".to_string()));
        }
        if self.default_project.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "default_project must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// With default project
    #[inline]
    #[must_use]
    pub fn with_default_project(mut self, project: impl Into<String>) -> Self {
        self.default_project = project.into();
        self
    }

    /// With page size
    #[inline]
    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// With cache settings
    #[inline]
    #[must_use]
    pub fn with_cache(mut self, cache: CacheConfig) -> Self {
        self.cache = cache;
        self
    }

    /// With logging settings
    #[inline]
    #[must_use]
    pub fn with_logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = logging;
        self
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            default_project: "default".to_string(),
            page_size: 10,
            cache: CacheConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Derived-result cache settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of entries
    pub capacity: u64,

    /// Entry time-to-live in seconds; no expiry when absent
    pub ttl_secs: Option<u64>,
}

impl CacheConfig {
    /// Time-to-live as a duration
    #[inline]
    #[must_use]
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl_secs.map(Duration::from_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: 10_000,
            ttl_secs: None,
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default `EnvFilter` directive; `RUST_LOG` takes precedence
    pub filter: String,

    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            json: false,
        }
    }
}
