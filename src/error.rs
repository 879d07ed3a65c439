// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Error types for insights-web.
//!
//! Strongly-typed errors for each area of the SDK, using `thiserror` for the
//! definitions and `anyhow` for application-level propagation.
//!
//! Nothing here is fatal to a request: enrichment failures are isolated by
//! the client and reported as diagnostics, never surfaced to request code.

use thiserror::Error;

/// Errors raised while enriching or processing telemetry.
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Telemetry initializer {initializer} failed: {message}")]
    InitializerFailed {
        initializer: String,
        message: String,
    },

    #[error("Host name lookup failed: {0}")]
    HostLookup(String),

    #[error("Invalid telemetry processor: {0}")]
    InvalidProcessor(String),

    #[error("Telemetry module {module} failed to initialize: {message}")]
    ModuleFailed { module: String, message: String },
}

impl TelemetryError {
    /// Create an initializer failure.
    pub fn initializer(initializer: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InitializerFailed {
            initializer: initializer.into(),
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for TelemetryError {
    fn from(err: std::io::Error) -> Self {
        Self::HostLookup(err.to_string())
    }
}

/// Errors that can occur during configuration loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("IO error reading config: {0}")]
    IoError(String),

    #[error("YAML parsing error: {0}")]
    YamlError(String),

    #[error("JSON parsing error: {0}")]
    JsonError(String),
}

impl ConfigError {
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(err.to_string()),
            _ => Self::IoError(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        Self::JsonError(err.to_string())
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::YamlError(err.to_string())
    }
}

/// Result type alias using anyhow for flexible error handling.
pub type Result<T> = anyhow::Result<T>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initializer_error_display() {
        let err = TelemetryError::initializer("WebUser", "boom");
        let display = err.to_string();
        assert!(display.contains("WebUser"));
        assert!(display.contains("boom"));
    }

    #[test]
    fn test_config_error_from_io_not_found() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: ConfigError = io_err.into();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_config_error_from_json() {
        let result: std::result::Result<serde_json::Value, _> = serde_json::from_str("invalid json");
        let err: ConfigError = result.unwrap_err().into();
        assert!(matches!(err, ConfigError::JsonError(_)));
    }

    #[test]
    fn test_config_error_from_yaml() {
        let result: std::result::Result<serde_yaml::Value, _> = serde_yaml::from_str("a: [b");
        let err: ConfigError = result.unwrap_err().into();
        assert!(matches!(err, ConfigError::YamlError(_)));
    }

    #[test]
    fn test_host_lookup_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::Other, "no hostname");
        let err: TelemetryError = io_err.into();
        assert!(matches!(err, TelemetryError::HostLookup(_)));
    }
}
