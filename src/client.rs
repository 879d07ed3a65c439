// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! The telemetry client.
//!
//! [`TelemetryClient::track`] runs the full pipeline for one item:
//!
//! 1. merge the client context (seeded once by the context initializers)
//! 2. stamp the instrumentation key
//! 3. run every telemetry initializer, isolating failures
//! 4. run the processor chain
//! 5. hand the item to the channel

use std::sync::Arc;

use once_cell::sync::OnceCell;
use tracing::{instrument, trace};

use crate::context::{set_if_empty, TelemetryContext};
use crate::configuration::TelemetryConfiguration;
use crate::diagnostics::{EventSource, SdkEvent};
use crate::processors::run_chain;
use crate::types::{
    DependencyTelemetry, EventTelemetry, ExceptionTelemetry, HandledAt, RequestTelemetry,
    SeverityLevel, TelemetryItem, TraceTelemetry,
};

/// Sends telemetry through a configuration's pipeline.
pub struct TelemetryClient {
    configuration: Arc<TelemetryConfiguration>,
    context: OnceCell<TelemetryContext>,
}

impl TelemetryClient {
    pub fn new(configuration: Arc<TelemetryConfiguration>) -> Self {
        Self {
            configuration,
            context: OnceCell::new(),
        }
    }

    pub fn configuration(&self) -> &Arc<TelemetryConfiguration> {
        &self.configuration
    }

    pub fn events(&self) -> &EventSource {
        &self.configuration.events
    }

    /// False when the configuration disables telemetry.
    pub fn is_enabled(&self) -> bool {
        !self.configuration.disable_telemetry
    }

    /// The client-level context, seeded on first use by the configured
    /// context initializers. A failing context initializer is reported and
    /// skipped.
    pub fn context(&self) -> &TelemetryContext {
        self.context.get_or_init(|| {
            let mut context = TelemetryContext::new();
            for initializer in &self.configuration.context_initializers {
                if let Err(err) = initializer.initialize(&mut context) {
                    self.events().emit(SdkEvent::InitializerFailed {
                        initializer: initializer.name().to_string(),
                        message: err.to_string(),
                    });
                }
            }
            context
        })
    }

    /// Run the pipeline for `item` and send it.
    #[instrument(level = "trace", skip_all, fields(kind = ?item.kind()))]
    pub fn track(&self, mut item: TelemetryItem) {
        if !self.is_enabled() {
            trace!("Telemetry disabled, dropping item");
            return;
        }

        item.context_mut().merge_from(self.context());
        if let Some(ref key) = self.configuration.instrumentation_key {
            set_if_empty(&mut item.context_mut().instrumentation_key, key.as_str());
        }

        self.initialize(&mut item);

        let Some(item) = run_chain(&self.configuration.telemetry_processors, item) else {
            trace!("Item dropped by a processor");
            return;
        };

        self.configuration.channel.send(item);
    }

    /// Run every telemetry initializer on `item`. An initializer error is
    /// reported and the remaining initializers still run.
    pub fn initialize(&self, item: &mut TelemetryItem) {
        for initializer in &self.configuration.telemetry_initializers {
            if let Err(err) = initializer.initialize(item) {
                self.events().emit(SdkEvent::InitializerFailed {
                    initializer: initializer.name().to_string(),
                    message: err.to_string(),
                });
            }
        }
    }

    pub fn track_request(&self, request: RequestTelemetry) {
        self.track(request.into());
    }

    pub fn track_dependency(&self, dependency: DependencyTelemetry) {
        self.track(dependency.into());
    }

    pub fn track_exception(&self, exception: ExceptionTelemetry) {
        self.track(exception.into());
    }

    /// Track an error value as a user-handled exception.
    pub fn track_error(&self, err: &(dyn std::error::Error + 'static)) {
        self.track_exception(ExceptionTelemetry::from_error(err, HandledAt::User));
    }

    pub fn track_trace(&self, message: impl Into<String>, severity: SeverityLevel) {
        self.track(TraceTelemetry::new(message, severity).into());
    }

    pub fn track_event(&self, name: impl Into<String>) {
        self.track(EventTelemetry::new(name).into());
    }

    pub fn flush(&self) {
        self.configuration.channel.flush();
    }
}

impl std::fmt::Debug for TelemetryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelemetryClient")
            .field("configuration", &self.configuration)
            .finish()
    }
}
