//! Error types for the config registry.
//!
//! Every failure the registry can report maps onto one of the coarse
//! [`ErrorKind`]s, so hosts can branch on the kind without matching on
//! every variant.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for karasu-config.
#[derive(Debug, Error)]
pub enum ConfigError {
    // Descriptor errors
    #[error("Config metadata missing for {type_name}: {reason}")]
    MetadataMissing { type_name: String, reason: String },

    #[error("Failed to create default value for {type_name}: {message}")]
    InstantiationFailure { type_name: String, message: String },

    // File system errors
    #[error("IO error at {path:?}: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    // Serialization errors
    #[error("Failed to parse config: {message}")]
    Parse {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    #[error("Failed to serialize config: {message}")]
    Serialize {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    // Registry errors
    #[error("Config {file_name} is a {actual}, not a {expected}")]
    TypeMismatch {
        file_name: String,
        expected: String,
        actual: String,
    },

    #[error("Config {file_name} is not registered")]
    NotRegistered { file_name: String },

    #[error("Lock poisoned: {0}")]
    LockPoisoned(String),
}

/// Result type alias for registry operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Coarse classification of a [`ConfigError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    MetadataMissing,
    InstantiationFailure,
    IoFailure,
    ParseFailure,
    TypeMismatch,
    NotRegistered,
    Internal,
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io {
            message: err.to_string(),
            path: None,
            source: Some(err),
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl ConfigError {
    /// Create an IO error with path context.
    pub fn io_with_path(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        ConfigError::Io {
            message: err.to_string(),
            path: Some(path.into()),
            source: Some(err),
        }
    }

    /// Create a metadata error for the given type.
    pub fn metadata_missing(type_name: &str, reason: impl Into<String>) -> Self {
        ConfigError::MetadataMissing {
            type_name: type_name.to_string(),
            reason: reason.into(),
        }
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ConfigError::MetadataMissing { .. } => ErrorKind::MetadataMissing,
            ConfigError::InstantiationFailure { .. } => ErrorKind::InstantiationFailure,
            ConfigError::Io { .. } | ConfigError::FileNotFound(_) => ErrorKind::IoFailure,
            ConfigError::Parse { .. } | ConfigError::Serialize { .. } => ErrorKind::ParseFailure,
            ConfigError::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            ConfigError::NotRegistered { .. } => ErrorKind::NotRegistered,
            ConfigError::LockPoisoned(_) => ErrorKind::Internal,
        }
    }
}
