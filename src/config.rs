//! Runtime configuration: where the durable state lives and how the gate is
//! tuned.
//!
//! Sources, lowest precedence first: built-in defaults, a YAML file, then
//! environment variables.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::contemplation::ContemplationConfig;
use crate::utilities::errors::ConfigError;
use crate::utilities::paths::{self, DATA_DIR_ENV};

/// Environment variable overriding the default decay rate of new thoughts.
pub const DECAY_RATE_ENV: &str = "AEGIS_DECAY_RATE";

/// Configuration for an [`crate::Aegis`] instance.
///
/// ```yaml
/// data_dir: /var/lib/aegis
/// contemplation:
///   default_decay_rate: 0.05
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AegisConfig {
    /// Root directory for the identity, queue and experience files.
    pub data_dir: PathBuf,
    pub identity_file: String,
    pub queue_file: String,
    /// Subdirectory of `data_dir` holding `experiences.jsonl`.
    pub experiences_dir: String,
    pub contemplation: ContemplationConfig,
}

impl Default for AegisConfig {
    fn default() -> Self {
        Self {
            data_dir: paths::data_dir(),
            identity_file: "identity.json".to_string(),
            queue_file: "contemplation_queue.json".to_string(),
            experiences_dir: "experiences".to_string(),
            contemplation: ContemplationConfig::default(),
        }
    }
}

impl AegisConfig {
    /// Defaults rooted at `data_dir`.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    /// Defaults with environment overrides applied.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().apply_overrides(|key| std::env::var(key).ok())
    }

    /// Read a YAML file; missing keys take their defaults. Environment
    /// overrides are applied on top.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml(&content)?;
        log::info!("Loaded configuration from {}", path.display());
        config.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Parse YAML text without consulting the environment.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    fn apply_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup(DATA_DIR_ENV).filter(|d| !d.trim().is_empty()) {
            self.data_dir = PathBuf::from(dir);
        }

        if let Some(raw) = lookup(DECAY_RATE_ENV) {
            let rate = raw
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|r| r.is_finite() && *r > 0.0 && *r <= 1.0)
                .ok_or(ConfigError::InvalidValue {
                    key: DECAY_RATE_ENV,
                    value: raw.clone(),
                })?;
            self.contemplation.default_decay_rate = rate;
        }

        Ok(self)
    }

    pub fn identity_path(&self) -> PathBuf {
        self.data_dir.join(&self.identity_file)
    }

    pub fn queue_path(&self) -> PathBuf {
        self.data_dir.join(&self.queue_file)
    }

    pub fn experiences_path(&self) -> PathBuf {
        self.data_dir.join(&self.experiences_dir)
    }
}
