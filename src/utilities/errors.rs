//! Error types shared by the identity store, the contemplation gate and the
//! experience pipeline.
//!
//! Out-of-range numbers are never an error here: every bounded field is
//! clamped on write instead.

use std::path::PathBuf;

use thiserror::Error;

/// I/O failure while reading or writing one of the durable resources.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// Reading or writing the file failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The in-memory state could not be encoded as JSON.
    #[error("Failed to serialize {what}: {source}")]
    Serialization {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl PersistenceError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn serialization(what: &'static str, source: serde_json::Error) -> Self {
        Self::Serialization { what, source }
    }
}

/// Errors from a strict identity load.
///
/// [`crate::identity::IdentityCore::load`] recovers from both variants by
/// falling back to the default identity.
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    /// The document exists but is malformed, misses a field, or carries an
    /// unknown enum value.
    #[error("Malformed identity document {path}: {source}")]
    Deserialization {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// A string did not name any variant of a closed category.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown {kind} category: '{value}'")]
pub struct UnknownCategory {
    /// Which enum was being parsed (e.g. "noting").
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

impl UnknownCategory {
    pub fn new(kind: &'static str, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }
}

/// Errors while building an [`crate::AegisConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// YAML parsing failed.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The config file could not be read.
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An environment variable held a value of the wrong shape.
    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue { key: &'static str, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_category_message() {
        let err = UnknownCategory::new("noting", "bored");
        assert_eq!(err.to_string(), "Unknown noting category: 'bored'");
    }

    #[test]
    fn test_persistence_error_names_path() {
        let err = PersistenceError::io(
            "/tmp/identity.json",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(err.to_string().contains("/tmp/identity.json"));
    }

    #[test]
    fn test_invalid_config_value_message() {
        let err = ConfigError::InvalidValue {
            key: "AEGIS_DECAY_RATE",
            value: "fast".into(),
        };
        assert_eq!(err.to_string(), "Invalid value for AEGIS_DECAY_RATE: 'fast'");
    }
}
