//! Custom error types for key-press-replay.
//!
//! This module provides structured error types using `thiserror` for better
//! error handling and more informative error messages.

use std::io;
use thiserror::Error;

/// Main error type for key-press-replay operations.
#[derive(Error, Debug)]
pub enum KprError {
    /// A key name or expression token did not resolve to a key code.
    /// Fatal to the current run: a wrong key code could trigger unintended
    /// input, so the run aborts without sending anything further.
    #[error("unknown key '{key}': check your config file")]
    KeyResolution { key: String },

    /// Configuration validation error.
    #[error("configuration error: {0}")]
    ConfigValidation(String),

    /// Error reading or parsing a configuration file.
    #[error("failed to load config from '{path}': {reason}")]
    ConfigLoad { path: String, reason: String },

    /// Error writing a configuration file.
    #[error("failed to save config to '{path}': {reason}")]
    ConfigSave { path: String, reason: String },

    /// Platform-specific operation is not supported.
    #[error("operation not supported on this platform: {0}")]
    UnsupportedPlatform(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for key-press-replay operations.
pub type Result<T> = std::result::Result<T, KprError>;

impl KprError {
    /// Create a new KeyResolution error carrying the offending key text verbatim.
    pub fn key_resolution(key: impl Into<String>) -> Self {
        Self::KeyResolution { key: key.into() }
    }

    /// Create a new ConfigValidation error.
    pub fn config_validation(message: impl Into<String>) -> Self {
        Self::ConfigValidation(message.into())
    }

    /// Create a new ConfigLoad error.
    pub fn config_load(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConfigLoad {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a new ConfigSave error.
    pub fn config_save(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConfigSave {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a new UnsupportedPlatform error.
    pub fn unsupported_platform(message: impl Into<String>) -> Self {
        Self::UnsupportedPlatform(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = KprError::key_resolution("unknown_key_zzz");
        assert_eq!(
            err.to_string(),
            "unknown key 'unknown_key_zzz': check your config file"
        );

        let err = KprError::config_validation("action 3 has an empty key");
        assert_eq!(
            err.to_string(),
            "configuration error: action 3 has an empty key"
        );

        let err = KprError::config_load("missing.json", "file not found");
        assert_eq!(
            err.to_string(),
            "failed to load config from 'missing.json': file not found"
        );
    }

    #[test]
    fn test_error_from_io() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let kpr_err: KprError = io_err.into();
        assert!(matches!(kpr_err, KprError::Io(_)));
    }
}
