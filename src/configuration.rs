// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! The assembled telemetry configuration.
//!
//! A [`TelemetryConfiguration`] is built once at startup, then shared behind
//! an `Arc` and only read. A process-wide "active" configuration exists but
//! is only set when a caller asks for it.

use std::sync::{Arc, PoisonError, RwLock};

use once_cell::sync::Lazy;
use serde::Serialize;

use crate::channel::{InMemoryChannel, TelemetryChannel};
use crate::config::ResolvedSettings;
use crate::diagnostics::EventSource;
use crate::initializers::{ContextInitializer, SdkVersionInitializer, TelemetryInitializer};
use crate::processors::TelemetryProcessor;

/// Optional features resolved from settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureFlags {
    pub adaptive_sampling: bool,
    pub quick_pulse: bool,
    pub heartbeat: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            adaptive_sampling: true,
            quick_pulse: true,
            heartbeat: true,
        }
    }
}

impl From<&ResolvedSettings> for FeatureFlags {
    fn from(settings: &ResolvedSettings) -> Self {
        Self {
            adaptive_sampling: settings.enable_adaptive_sampling,
            quick_pulse: settings.enable_quick_pulse_metric_stream,
            heartbeat: settings.enable_heartbeat,
        }
    }
}

/// Everything a [`TelemetryClient`](crate::client::TelemetryClient) needs to
/// run the pipeline.
pub struct TelemetryConfiguration {
    pub instrumentation_key: Option<String>,
    pub channel: Arc<dyn TelemetryChannel>,
    /// Run on every item, in order.
    pub telemetry_initializers: Vec<Arc<dyn TelemetryInitializer>>,
    /// Run on every item after the initializers, in order.
    pub telemetry_processors: Vec<Arc<dyn TelemetryProcessor>>,
    /// Run once per client context.
    pub context_initializers: Vec<Arc<dyn ContextInitializer>>,
    /// When set, clients drop every item.
    pub disable_telemetry: bool,
    pub features: FeatureFlags,
    /// Where SDK diagnostics are reported.
    pub events: EventSource,
}

impl TelemetryConfiguration {
    /// The default configuration: an [`InMemoryChannel`] and a single
    /// [`SdkVersionInitializer`].
    pub fn create_default() -> Self {
        Self::with_channel(Arc::new(InMemoryChannel::new()))
    }

    /// The default configuration around an existing channel.
    pub fn with_channel(channel: Arc<dyn TelemetryChannel>) -> Self {
        Self {
            instrumentation_key: None,
            channel,
            telemetry_initializers: vec![Arc::new(SdkVersionInitializer)],
            telemetry_processors: Vec::new(),
            context_initializers: Vec::new(),
            disable_telemetry: false,
            features: FeatureFlags::default(),
            events: EventSource::new(),
        }
    }

    /// Apply resolved settings. Channel settings are only applied when
    /// configured, so a channel's own values survive otherwise.
    pub fn apply_settings(&mut self, settings: &ResolvedSettings) {
        if settings.instrumentation_key.is_some() {
            self.instrumentation_key = settings.instrumentation_key.clone();
        }
        if let Some(developer_mode) = settings.developer_mode {
            self.channel.set_developer_mode(developer_mode);
        }
        if let Some(ref endpoint) = settings.endpoint_address {
            self.channel.set_endpoint_address(endpoint.clone());
        }
        self.features = FeatureFlags::from(settings);
    }

    /// Whether an initializer with `name` is registered.
    pub fn has_initializer(&self, name: &str) -> bool {
        self.telemetry_initializers.iter().any(|i| i.name() == name)
    }

    /// Whether a processor with `name` is registered.
    pub fn has_processor(&self, name: &str) -> bool {
        self.telemetry_processors.iter().any(|p| p.name() == name)
    }

    /// Let every processor see the finished configuration.
    pub fn initialize_processors(&self) {
        for processor in &self.telemetry_processors {
            processor.initialize(self);
        }
    }
}

impl Default for TelemetryConfiguration {
    fn default() -> Self {
        Self::create_default()
    }
}

impl std::fmt::Debug for TelemetryConfiguration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names = |it: &mut dyn Iterator<Item = &'static str>| it.collect::<Vec<_>>();
        f.debug_struct("TelemetryConfiguration")
            .field("instrumentation_key", &self.instrumentation_key)
            .field("channel", &self.channel.name())
            .field(
                "telemetry_initializers",
                &names(&mut self.telemetry_initializers.iter().map(|i| i.name())),
            )
            .field(
                "telemetry_processors",
                &names(&mut self.telemetry_processors.iter().map(|p| p.name())),
            )
            .field(
                "context_initializers",
                &names(&mut self.context_initializers.iter().map(|c| c.name())),
            )
            .field("disable_telemetry", &self.disable_telemetry)
            .field("features", &self.features)
            .finish()
    }
}

// ============================================================================
// Active Configuration
// ============================================================================

static ACTIVE: Lazy<RwLock<Option<Arc<TelemetryConfiguration>>>> = Lazy::new(|| RwLock::new(None));

/// The process-wide configuration, if one was published.
pub fn active() -> Option<Arc<TelemetryConfiguration>> {
    ACTIVE.read().unwrap_or_else(PoisonError::into_inner).clone()
}

/// Publish `configuration` as the process-wide configuration.
pub fn set_active(configuration: Arc<TelemetryConfiguration>) {
    *ACTIVE.write().unwrap_or_else(PoisonError::into_inner) = Some(configuration);
}

/// Clear the process-wide configuration.
pub fn clear_active() {
    *ACTIVE.write().unwrap_or_else(PoisonError::into_inner) = None;
}
