// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! insights-web - telemetry enrichment for web request pipelines.
//!
//! Every telemetry item produced while a request is being served is
//! stamped with request-scoped context: operation id and name, session and
//! user from cookies, client IP, user agent, synthetic-traffic markers, plus
//! process-wide context such as the role instance and SDK version.
//!
//! # Architecture
//!
//! - [`types`] - Telemetry items (request, dependency, exception, trace, event)
//! - [`context`] - The context attached to every item
//! - [`error`] - Error types and result aliases
//! - [`config`] - Settings files, environment and options, merged by precedence
//! - [`configuration`] - The assembled pipeline configuration
//! - [`initializers`] - Context and telemetry initializers
//! - [`http`] - Request model and the ambient request accessor
//! - [`diagnostics`] - Diagnostic listeners and SDK self-diagnostics
//! - [`processors`] - Processor chain and built-in processors
//! - [`channel`] - Telemetry channels
//! - [`client`] - The telemetry client
//! - [`modules`] - Telemetry modules
//! - [`services`] - Service registration and the built provider
//! - [`hosting`] - Request lifecycle hooks
//! - [`logging`] - Subscriber setup and the log forwarding layer
//!
//! # Example
//!
//! ```rust,ignore
//! use insights_web::{HttpRequest, InsightsOptions, RequestTracker, TelemetryServices};
//!
//! let mut services = TelemetryServices::new();
//! services.add_application_insights_telemetry(InsightsOptions::default());
//! let provider = services.build()?;
//!
//! let tracker = RequestTracker::new(provider.client().clone());
//! let operation = tracker.begin(HttpRequest::new("GET", "/orders"));
//! provider.client().track_event("orders-listed");
//! operation.complete(200);
//! ```

pub mod channel;
pub mod client;
pub mod config;
pub mod configuration;
pub mod context;
pub mod diagnostics;
pub mod error;
pub mod hosting;
pub mod http;
pub mod initializers;
pub mod logging;
pub mod modules;
pub mod processors;
pub mod services;
pub mod types;

// Re-export commonly used types at crate root
pub use channel::{InMemoryChannel, TelemetryChannel};
pub use client::TelemetryClient;
pub use config::{InsightsOptions, ResolvedSettings};
pub use configuration::TelemetryConfiguration;
pub use context::TelemetryContext;
pub use error::{ConfigError, Result, TelemetryError};
pub use hosting::{RequestOperation, RequestTracker};
pub use http::{HttpContext, HttpContextAccessor, HttpRequest, ThreadLocalHttpContextAccessor};
pub use initializers::{ContextInitializer, TelemetryInitializer, WebTelemetryInitializer};
pub use services::{TelemetryServiceProvider, TelemetryServices};
pub use types::{
    DependencyTelemetry, EventTelemetry, ExceptionTelemetry, HandledAt, RequestTelemetry,
    SeverityLevel, TelemetryItem, TelemetryKind, TraceTelemetry,
};

/// SDK version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_public_exports() {
        let _config = TelemetryConfiguration::create_default();
        let _request = HttpRequest::new("GET", "/");
        let _services = TelemetryServices::new().with_env_lookup(|_| None);
    }
}
