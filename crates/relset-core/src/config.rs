//! relset Configuration Management
//!
//! Handles configuration from environment variables and TOML files
//! with defaults matching the conventional `labeled_data/` -> `parsed/`
//! layout.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Annotation input
    pub input: InputConfig,

    /// Output location and naming
    pub output: OutputConfig,

    /// Dataset split ratios
    pub split: SplitConfig,

    /// Document-level holdout routing
    pub holdout: HoldoutConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(pattern) = std::env::var("RELSET_INPUT") {
            config.input.pattern = pattern;
        }
        if let Ok(dir) = std::env::var("RELSET_OUTPUT_DIR") {
            config.output.dir = PathBuf::from(dir);
        }
        if let Ok(ratio) = std::env::var("RELSET_TRAIN_RATIO") {
            config.split.train_ratio = parse_ratio("RELSET_TRAIN_RATIO", ratio)?;
        }
        if let Ok(ratio) = std::env::var("RELSET_TEST_RATIO") {
            config.split.test_ratio = parse_ratio("RELSET_TEST_RATIO", ratio)?;
        }

        // Comma-separated, e.g. "austria,germany"
        if let Ok(keywords) = std::env::var("RELSET_HOLDOUT_KEYWORDS") {
            config.holdout.keywords = keywords
                .split(',')
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect();
        }

        if let Ok(level) = std::env::var("LOG_LEVEL") {
            config.logging.level = level;
        }

        Ok(config)
    }

    /// Load from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileReadError {
            path: path.clone(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path,
            message: e.to_string(),
        })
    }

    /// Merge with environment variables (env takes precedence)
    pub fn with_env_override(mut self) -> Result<Self, ConfigError> {
        let env_config = Self::from_env()?;
        let defaults = Self::default();

        // Only override if env values differ from defaults
        if env_config.input.pattern != defaults.input.pattern {
            self.input.pattern = env_config.input.pattern;
        }
        if env_config.output.dir != defaults.output.dir {
            self.output.dir = env_config.output.dir;
        }
        if env_config.split.train_ratio != defaults.split.train_ratio {
            self.split.train_ratio = env_config.split.train_ratio;
        }
        if env_config.split.test_ratio != defaults.split.test_ratio {
            self.split.test_ratio = env_config.split.test_ratio;
        }
        if env_config.holdout.keywords != defaults.holdout.keywords {
            self.holdout.keywords = env_config.holdout.keywords;
        }
        if env_config.logging.level != defaults.logging.level {
            self.logging.level = env_config.logging.level;
        }

        Ok(self)
    }

    /// Check value ranges that serde cannot express
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_ratio("split.train_ratio", self.split.train_ratio)?;
        check_ratio("split.test_ratio", self.split.test_ratio)?;
        Ok(())
    }
}

fn parse_ratio(key: &str, value: String) -> Result<f64, ConfigError> {
    let ratio: f64 = value.parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.clone(),
    })?;
    check_ratio(key, ratio)?;
    Ok(ratio)
}

fn check_ratio(key: &str, ratio: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&ratio) {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: ratio.to_string(),
        })
    }
}

/// Annotation input configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Glob pattern matching annotation export files
    pub pattern: String,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            pattern: "labeled_data/*.json".to_string(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory receiving all output files
    pub dir: PathBuf,

    /// File name prefix for record files (`{prefix}_{split}.json`)
    pub prefix: String,

    /// Relation registry file name
    pub registry_file: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("parsed"),
            prefix: "triples".to_string(),
            registry_file: "rel2id.json".to_string(),
        }
    }
}

/// Split ratios
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    /// Share of the training pool kept as train (rest is validation)
    pub train_ratio: f64,

    /// Share kept out of test when no holdout documents exist
    pub test_ratio: f64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            train_ratio: 0.8,
            test_ratio: 0.8,
        }
    }
}

/// Holdout routing: documents mentioning a keyword near the top go to test
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HoldoutConfig {
    /// Lowercase keywords
    pub keywords: Vec<String>,

    /// Number of leading characters searched
    pub window: usize,
}

impl Default for HoldoutConfig {
    fn default() -> Self {
        Self {
            keywords: vec!["austria".to_string(), "germany".to_string()],
            window: 100,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// JSON format for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

impl From<ConfigError> for crate::RelsetError {
    fn from(e: ConfigError) -> Self {
        crate::RelsetError::Config(e.to_string())
    }
}
