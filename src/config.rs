//! Engine configuration.
//!
//! Loaded from TOML (every section optional) or picked from one of the
//! built-in profiles:
//!
//! ```toml
//! [cache]
//! max_bytes = 104857600
//! cleanup_threshold = 0.8
//!
//! [resolve]
//! entry_files = ["index.ts", "index.tsx", "index.js", "index.jsx", "index.vue"]
//! ```

use crate::error::{EntityError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Environment variable selecting the built-in profile
pub const PROFILE_ENV: &str = "ENTITY_RESOLVER_ENV";

const MB: u64 = 1024 * 1024;

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct EngineConfig {
    /// Source/extraction cache settings
    #[serde(default)]
    pub cache: CacheConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Lookup and classification settings
    #[serde(default)]
    pub resolve: ResolveConfig,
}

/// Cache configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheConfig {
    /// Disable to bypass the extraction cache entirely
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Ceiling for the estimated extraction cache footprint
    #[serde(default = "default_max_bytes")]
    pub max_bytes: u64,

    /// Fraction of `max_bytes` at which the oldest half is evicted
    #[serde(default = "default_cleanup_threshold")]
    pub cleanup_threshold: f64,

    /// Footprint estimate per cached parsed file
    #[serde(default = "default_parsed_file_bytes")]
    pub parsed_file_bytes: u64,

    /// Footprint estimate per cached entity
    #[serde(default = "default_entity_bytes")]
    pub entity_bytes: u64,
}

fn default_true() -> bool {
    true
}

fn default_max_bytes() -> u64 {
    100 * MB
}

fn default_cleanup_threshold() -> f64 {
    0.8
}

fn default_parsed_file_bytes() -> u64 {
    50 * 1024
}

fn default_entity_bytes() -> u64 {
    1024
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            max_bytes: default_max_bytes(),
            cleanup_threshold: default_cleanup_threshold(),
            parsed_file_bytes: default_parsed_file_bytes(),
            entity_bytes: default_entity_bytes(),
        }
    }
}

impl CacheConfig {
    /// Footprint above which `set_extraction` triggers a cleanup
    pub fn cleanup_trigger_bytes(&self) -> u64 {
        (self.max_bytes as f64 * self.cleanup_threshold) as u64
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug)
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Lookup and classification configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResolveConfig {
    /// Entry filenames tried, in order, when a directory is imported
    #[serde(default = "default_entry_files")]
    pub entry_files: Vec<String>,

    /// Substrings that make a capitalized name read as a UI component
    #[serde(default = "default_ui_keywords")]
    pub ui_keywords: Vec<String>,
}

fn default_entry_files() -> Vec<String> {
    ["index.ts", "index.tsx", "index.js", "index.jsx", "index.vue"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_ui_keywords() -> Vec<String> {
    [
        "Component", "Button", "Card", "Modal", "Icon", "Form", "Input", "Dialog", "Panel",
        "Header", "Footer",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Default for ResolveConfig {
    fn default() -> Self {
        Self {
            entry_files: default_entry_files(),
            ui_keywords: default_ui_keywords(),
        }
    }
}

impl EngineConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).map_err(|e| EntityError::Config {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Built-in profile by name; unknown names get the defaults
    pub fn for_profile(name: &str) -> Self {
        let mut config = Self::default();
        match name {
            "development" => {
                config.cache.max_bytes = 50 * MB;
                config.logging.level = "debug".to_string();
            }
            "production" => {
                config.cache.max_bytes = 200 * MB;
                config.logging.level = "warn".to_string();
            }
            "test" => {
                config.cache.max_bytes = 20 * MB;
                config.logging.level = "warn".to_string();
            }
            _ => {}
        }
        config
    }

    /// Profile selected by `ENTITY_RESOLVER_ENV` (default `development`)
    pub fn from_env() -> Self {
        let profile = std::env::var(PROFILE_ENV).unwrap_or_else(|_| "development".to_string());
        Self::for_profile(&profile)
    }

    fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.cache.cleanup_threshold) {
            return Err(EntityError::Config {
                message: format!(
                    "cache.cleanup_threshold must be within 0..=1, got {}",
                    self.cache.cleanup_threshold
                ),
            });
        }
        if self.resolve.entry_files.is_empty() {
            return Err(EntityError::Config {
                message: "resolve.entry_files must not be empty".to_string(),
            });
        }
        Ok(())
    }
}
