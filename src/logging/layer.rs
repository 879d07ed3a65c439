// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! A `tracing` layer that forwards log events to a [`TelemetryClient`].

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

use crate::client::TelemetryClient;
use crate::context::set_if_empty;
use crate::initializers::sdk_version;
use crate::types::{ExceptionTelemetry, HandledAt, SeverityLevel, TraceTelemetry};

/// Property holding the event target.
pub const CATEGORY_NAME_PROPERTY: &str = "CategoryName";
/// Property holding the text of an `error` field.
pub const EXCEPTION_PROPERTY: &str = "Exception";

const OWN_TARGET: &str = "insights_web";

type LogFilter = dyn Fn(&str, &Level) -> bool + Send + Sync;

/// Turns `tracing` events into trace and exception telemetry.
///
/// Events carrying an `error` field become exceptions; everything else
/// becomes a trace. Events emitted by this crate are never forwarded.
pub struct TelemetryLayer {
    client: Arc<TelemetryClient>,
    filter: Arc<LogFilter>,
}

impl TelemetryLayer {
    /// Forward events at `INFO` and above.
    pub fn new(client: Arc<TelemetryClient>) -> Self {
        Self::with_min_level(client, Level::INFO)
    }

    /// Forward events at `level` and above.
    pub fn with_min_level(client: Arc<TelemetryClient>, level: Level) -> Self {
        Self::with_filter(client, move |_, event_level| *event_level <= level)
    }

    /// Forward events accepted by `filter(target, level)`.
    pub fn with_filter<F>(client: Arc<TelemetryClient>, filter: F) -> Self
    where
        F: Fn(&str, &Level) -> bool + Send + Sync + 'static,
    {
        Self {
            client,
            filter: Arc::new(filter),
        }
    }

    fn is_enabled(&self, target: &str, level: &Level) -> bool {
        !target.starts_with(OWN_TARGET) && self.client.is_enabled() && (self.filter)(target, level)
    }
}

impl fmt::Debug for TelemetryLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelemetryLayer")
            .field("client", &self.client)
            .finish_non_exhaustive()
    }
}

impl<S: Subscriber> Layer<S> for TelemetryLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if !self.is_enabled(metadata.target(), metadata.level()) {
            return;
        }

        let mut fields = FieldCollector::default();
        event.record(&mut fields);

        let severity = SeverityLevel::from_level(metadata.level());
        let mut properties = fields.properties;
        properties.insert(CATEGORY_NAME_PROPERTY.to_string(), metadata.target().to_string());

        match fields.error {
            Some(error) => {
                properties.insert(EXCEPTION_PROPERTY.to_string(), error);
                let mut exception = ExceptionTelemetry::new(fields.message, HandledAt::User);
                exception.severity_level = Some(severity);
                exception.context.properties = properties;
                set_if_empty(&mut exception.context.internal.sdk_version, sdk_version());
                self.client.track_exception(exception);
            }
            None => {
                let mut trace = TraceTelemetry::new(fields.message, severity);
                trace.context.properties = properties;
                set_if_empty(&mut trace.context.internal.sdk_version, sdk_version());
                self.client.track(trace.into());
            }
        }
    }
}

#[derive(Default)]
struct FieldCollector {
    message: String,
    error: Option<String>,
    properties: BTreeMap<String, String>,
}

impl FieldCollector {
    fn store(&mut self, field: &Field, value: String) {
        match field.name() {
            "message" => self.message = value,
            "error" => self.error = Some(value),
            name => {
                self.properties.insert(name.to_string(), value);
            }
        }
    }
}

impl Visit for FieldCollector {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.store(field, value.to_string());
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.store(field, value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.store(field, format!("{:?}", value));
    }
}
