// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Context and telemetry initializers.
//!
//! This module defines the enrichment abstractions:
//! - [`ContextInitializer`] seeds a client-level context once
//! - [`TelemetryInitializer`] enriches every item right before it is sent
//! - [`WebTelemetryInitializer`] is the request-aware flavor; wrap it in
//!   [`RequestScoped`] to get a [`TelemetryInitializer`] that resolves the
//!   ambient request and no-ops when there is none
//!
//! Every initializer only writes fields that are still unset, so the chain
//! can run in any registration order and re-running it is a no-op.

mod azure_web_app;
mod client_ip;
mod component_version;
mod domain_name;
mod operation;
mod sdk_version;
mod synthetic;
mod user_agent;
mod web_session;
mod web_user;

pub use azure_web_app::{AzureWebAppRoleEnvironmentInitializer, WEBSITE_HOSTNAME_VAR};
pub use client_ip::ClientIpHeaderInitializer;
pub use component_version::ComponentVersionInitializer;
pub use domain_name::{DomainNameRoleInstanceInitializer, HostInfo, SystemHostInfo};
pub use operation::{OperationIdInitializer, OperationNameInitializer};
pub use sdk_version::{sdk_version, SdkVersionInitializer};
pub use synthetic::{SyntheticInitializer, SYNTHETIC_SOURCE_NAME};
pub use user_agent::UserAgentInitializer;
pub use web_session::{WebSessionInitializer, WEB_SESSION_COOKIE};
pub use web_user::{parse_acquisition_date, WebUserInitializer, WEB_USER_COOKIE};

use std::sync::Arc;

use crate::context::TelemetryContext;
use crate::diagnostics::{EventSource, SdkEvent};
use crate::error::TelemetryError;
use crate::http::{HttpContextAccessor, HttpRequest};
use crate::types::{RequestTelemetry, TelemetryItem};

/// Seeds context-level defaults once per client context.
pub trait ContextInitializer: Send + Sync {
    /// Implementation name, used for registration and diagnostics.
    fn name(&self) -> &'static str;

    fn initialize(&self, context: &mut TelemetryContext) -> Result<(), TelemetryError>;
}

/// Enriches a single telemetry item before it is sent.
///
/// # Example
///
/// ```rust,ignore
/// use insights_web::initializers::TelemetryInitializer;
///
/// struct TenantInitializer;
///
/// impl TelemetryInitializer for TenantInitializer {
///     fn name(&self) -> &'static str {
///         "Tenant"
///     }
///
///     fn initialize(&self, item: &mut TelemetryItem) -> Result<(), TelemetryError> {
///         item.context_mut()
///             .properties
///             .entry("tenant".into())
///             .or_insert_with(|| "contoso".into());
///         Ok(())
///     }
/// }
/// ```
pub trait TelemetryInitializer: Send + Sync {
    /// Implementation name, used for registration and diagnostics.
    fn name(&self) -> &'static str;

    fn initialize(&self, item: &mut TelemetryItem) -> Result<(), TelemetryError>;
}

/// An initializer that needs the ambient request to do its work.
pub trait WebTelemetryInitializer: Send + Sync {
    fn name(&self) -> &'static str;

    /// Enrich `item` from the request and its request telemetry.
    ///
    /// `request_telemetry` may be updated to cache values parsed from the
    /// request so later items of the same request reuse them.
    fn on_initialize_telemetry(
        &self,
        request: &HttpRequest,
        request_telemetry: &mut RequestTelemetry,
        item: &mut TelemetryItem,
    ) -> Result<(), TelemetryError>;
}

/// Adapts a [`WebTelemetryInitializer`] to the plain [`TelemetryInitializer`]
/// contract by resolving the ambient request.
///
/// Without an ambient request, or when the request carries no request
/// telemetry, a diagnostic is emitted and the item is left untouched.
pub struct RequestScoped<T> {
    inner: T,
    accessor: Arc<dyn HttpContextAccessor>,
    events: EventSource,
}

impl<T: WebTelemetryInitializer> RequestScoped<T> {
    pub fn new(inner: T, accessor: Arc<dyn HttpContextAccessor>, events: EventSource) -> Self {
        Self {
            inner,
            accessor,
            events,
        }
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }
}

impl<T: WebTelemetryInitializer> TelemetryInitializer for RequestScoped<T> {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn initialize(&self, item: &mut TelemetryItem) -> Result<(), TelemetryError> {
        let Some(http) = self.accessor.http_context() else {
            self.events.emit(SdkEvent::HttpContextMissing {
                initializer: self.inner.name().to_string(),
            });
            return Ok(());
        };

        let outcome = http.with_request_telemetry_mut(|request_telemetry| {
            self.inner
                .on_initialize_telemetry(http.request(), request_telemetry, item)
        });

        match outcome {
            Some(result) => result,
            None => {
                self.events.emit(SdkEvent::RequestTelemetryMissing {
                    initializer: self.inner.name().to_string(),
                });
                Ok(())
            }
        }
    }
}

/// The request-aware initializers registered by default, in order.
pub fn default_web_initializers(
    accessor: Arc<dyn HttpContextAccessor>,
    events: &EventSource,
) -> Vec<Arc<dyn TelemetryInitializer>> {
    vec![
        Arc::new(RequestScoped::new(
            ClientIpHeaderInitializer::new(events.clone()),
            accessor.clone(),
            events.clone(),
        )),
        Arc::new(RequestScoped::new(
            OperationNameInitializer,
            accessor.clone(),
            events.clone(),
        )),
        Arc::new(RequestScoped::new(
            OperationIdInitializer,
            accessor.clone(),
            events.clone(),
        )),
        Arc::new(RequestScoped::new(
            SyntheticInitializer::new(events.clone()),
            accessor.clone(),
            events.clone(),
        )),
        Arc::new(RequestScoped::new(
            UserAgentInitializer,
            accessor.clone(),
            events.clone(),
        )),
        Arc::new(RequestScoped::new(
            WebSessionInitializer::new(events.clone()),
            accessor.clone(),
            events.clone(),
        )),
        Arc::new(RequestScoped::new(
            WebUserInitializer::new(events.clone()),
            accessor,
            events.clone(),
        )),
    ]
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{FixedHttpContextAccessor, HttpContext};
    use crate::types::TraceTelemetry;
    use crate::types::SeverityLevel;

    struct Marker;

    impl WebTelemetryInitializer for Marker {
        fn name(&self) -> &'static str {
            "Marker"
        }

        fn on_initialize_telemetry(
            &self,
            _request: &HttpRequest,
            _request_telemetry: &mut RequestTelemetry,
            item: &mut TelemetryItem,
        ) -> Result<(), TelemetryError> {
            item.context_mut()
                .properties
                .insert("marked".to_string(), "yes".to_string());
            Ok(())
        }
    }

    fn trace() -> TelemetryItem {
        TraceTelemetry::new("hello", SeverityLevel::Information).into()
    }

    #[test]
    fn test_no_http_context_is_noop_with_diagnostic() {
        let events = EventSource::recording();
        let initializer = RequestScoped::new(
            Marker,
            Arc::new(FixedHttpContextAccessor::empty()),
            events.clone(),
        );
        let mut item = trace();
        let before = item.clone();

        initializer.initialize(&mut item).unwrap();

        assert_eq!(item, before);
        assert!(events.has_event(2));
    }

    #[test]
    fn test_no_request_telemetry_is_noop_with_diagnostic() {
        let events = EventSource::recording();
        let context = Arc::new(HttpContext::new(HttpRequest::new("GET", "/")));
        let initializer = RequestScoped::new(
            Marker,
            Arc::new(FixedHttpContextAccessor::new(context)),
            events.clone(),
        );
        let mut item = trace();
        let before = item.clone();

        initializer.initialize(&mut item).unwrap();

        assert_eq!(item, before);
        assert!(events.has_event(3));
    }

    #[test]
    fn test_delegates_when_request_is_ambient() {
        let (initializer, _context) = test_support::scoped_with_request(
            Marker,
            HttpRequest::new("GET", "/"),
            RequestTelemetry::new(),
        );
        let mut item = trace();

        initializer.initialize(&mut item).unwrap();

        assert_eq!(item.context().properties["marked"], "yes");
        assert_eq!(initializer.name(), "Marker");
    }

    #[test]
    fn test_default_web_initializers_order() {
        let accessor: Arc<dyn HttpContextAccessor> = Arc::new(FixedHttpContextAccessor::empty());
        let names: Vec<_> = default_web_initializers(accessor, &EventSource::new())
            .iter()
            .map(|i| i.name())
            .collect();
        assert_eq!(
            names,
            vec![
                "ClientIpHeader",
                "OperationName",
                "OperationId",
                "Synthetic",
                "UserAgent",
                "WebSession",
                "WebUser"
            ]
        );
    }
}
