// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Subscriber initialization.

use std::io;
use std::sync::Arc;

use tracing::Level;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

use crate::client::TelemetryClient;

use super::layer::TelemetryLayer;

/// Configuration for log output.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Default log level if RUST_LOG is not set.
    pub default_level: Level,

    /// Whether to include span events (enter/exit).
    pub include_span_events: bool,

    /// Whether to include file/line information.
    pub include_file_line: bool,

    pub include_target: bool,

    pub ansi_colors: bool,

    pub compact: bool,

    /// Custom filter directive (overrides default_level).
    pub filter_directive: Option<String>,

    /// Lowest level forwarded to telemetry when a client is attached.
    pub telemetry_level: Level,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            default_level: Level::INFO,
            include_span_events: false,
            include_file_line: false,
            include_target: true,
            ansi_colors: true,
            compact: true,
            filter_directive: None,
            telemetry_level: Level::INFO,
        }
    }
}

impl LogConfig {
    /// Verbose output for local work.
    pub fn development() -> Self {
        Self {
            default_level: Level::DEBUG,
            include_span_events: true,
            include_file_line: true,
            include_target: true,
            ansi_colors: true,
            compact: false,
            filter_directive: None,
            telemetry_level: Level::DEBUG,
        }
    }

    /// Warnings and errors only.
    pub fn production() -> Self {
        Self {
            default_level: Level::WARN,
            include_span_events: false,
            include_file_line: false,
            include_target: false,
            ansi_colors: false,
            compact: true,
            filter_directive: None,
            telemetry_level: Level::INFO,
        }
    }

    pub fn testing() -> Self {
        Self {
            default_level: Level::TRACE,
            include_span_events: true,
            include_file_line: true,
            include_target: true,
            ansi_colors: false,
            compact: false,
            filter_directive: Some("insights_web=trace".to_string()),
            telemetry_level: Level::TRACE,
        }
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.default_level = level;
        self
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter_directive = Some(filter.into());
        self
    }

    pub fn with_ansi(mut self, ansi: bool) -> Self {
        self.ansi_colors = ansi;
        self
    }

    pub fn with_telemetry_level(mut self, level: Level) -> Self {
        self.telemetry_level = level;
        self
    }

    fn env_filter(&self) -> EnvFilter {
        // RUST_LOG wins unless a directive was given explicitly.
        match &self.filter_directive {
            Some(directive) => EnvFilter::try_new(directive)
                .unwrap_or_else(|_| EnvFilter::new(self.default_level.to_string())),
            None => EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(self.default_level.to_string())),
        }
    }

    fn span_events(&self) -> FmtSpan {
        if self.include_span_events {
            FmtSpan::ENTER | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        }
    }
}

/// Keeps logging alive; flushes the attached client on drop.
///
/// Keep this guard alive for the duration of your program.
pub struct LogGuard {
    client: Option<Arc<TelemetryClient>>,
}

impl Drop for LogGuard {
    fn drop(&mut self) {
        if let Some(client) = self.client.take() {
            client.flush();
        }
    }
}

fn install_error(e: impl ToString) -> io::Error {
    io::Error::new(io::ErrorKind::Other, e.to_string())
}

/// Install the global subscriber. Call once at startup.
///
/// ```rust,ignore
/// use insights_web::logging::{init_logging, LogConfig};
///
/// let _guard = init_logging(&LogConfig::default())?;
/// ```
pub fn init_logging(config: &LogConfig) -> io::Result<LogGuard> {
    let fmt_layer = fmt::layer()
        .with_ansi(config.ansi_colors)
        .with_target(config.include_target)
        .with_file(config.include_file_line)
        .with_line_number(config.include_file_line)
        .with_span_events(config.span_events());

    if config.compact {
        tracing_subscriber::registry()
            .with(config.env_filter())
            .with(fmt_layer.compact())
            .try_init()
            .map_err(install_error)?;
    } else {
        tracing_subscriber::registry()
            .with(config.env_filter())
            .with(fmt_layer)
            .try_init()
            .map_err(install_error)?;
    }

    Ok(LogGuard { client: None })
}

/// Install the global subscriber with log events also forwarded to
/// `client` through a [`TelemetryLayer`].
pub fn init_logging_with_client(
    config: &LogConfig,
    client: Arc<TelemetryClient>,
) -> io::Result<LogGuard> {
    let telemetry = TelemetryLayer::with_min_level(client.clone(), config.telemetry_level);
    let fmt_layer = fmt::layer()
        .with_ansi(config.ansi_colors)
        .with_target(config.include_target)
        .with_file(config.include_file_line)
        .with_line_number(config.include_file_line)
        .with_span_events(config.span_events())
        .with_filter(config.env_filter());

    // The console filter must not hide events from telemetry, so it is
    // attached per layer here.
    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(telemetry)
        .try_init()
        .map_err(install_error)?;

    Ok(LogGuard {
        client: Some(client),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_config_default() {
        let config = LogConfig::default();
        assert_eq!(config.default_level, Level::INFO);
        assert_eq!(config.telemetry_level, Level::INFO);
        assert!(config.ansi_colors);
        assert!(config.compact);
    }

    #[test]
    fn test_log_config_development() {
        let config = LogConfig::development();
        assert_eq!(config.default_level, Level::DEBUG);
        assert!(config.include_span_events);
    }

    #[test]
    fn test_log_config_production() {
        let config = LogConfig::production();
        assert_eq!(config.default_level, Level::WARN);
        assert!(!config.include_span_events);
        assert!(!config.ansi_colors);
    }

    #[test]
    fn test_log_config_testing() {
        let config = LogConfig::testing();
        assert_eq!(config.filter_directive.as_deref(), Some("insights_web=trace"));
    }

    #[test]
    fn test_log_config_builder() {
        let config = LogConfig::default()
            .with_level(Level::DEBUG)
            .with_filter("insights_web=debug")
            .with_ansi(false)
            .with_telemetry_level(Level::WARN);

        assert_eq!(config.default_level, Level::DEBUG);
        assert_eq!(config.filter_directive, Some("insights_web=debug".to_string()));
        assert!(!config.ansi_colors);
        assert_eq!(config.telemetry_level, Level::WARN);
    }
}
