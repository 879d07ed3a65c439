// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Telemetry modules: components initialized once against the finished
//! configuration.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use once_cell::sync::OnceCell;
use tracing::{debug, info};

use crate::client::TelemetryClient;
use crate::configuration::TelemetryConfiguration;
use crate::diagnostics::{DiagnosticSourceHub, EntityFrameworkDiagnosticListener};
use crate::error::TelemetryError;
use crate::initializers::sdk_version;
use crate::types::EventTelemetry;

/// A component that hooks into the pipeline once the configuration is built.
pub trait TelemetryModule: Send + Sync {
    /// Implementation name, used for registration and diagnostics.
    fn name(&self) -> &'static str;

    fn initialize(&self, configuration: &TelemetryConfiguration) -> Result<(), TelemetryError>;
}

/// Subscribes the framework diagnostic listeners to the hub.
///
/// Initializing more than once subscribes only once.
pub struct DiagnosticsTelemetryModule {
    hub: Arc<DiagnosticSourceHub>,
    client: Arc<TelemetryClient>,
    subscribed: AtomicBool,
}

impl DiagnosticsTelemetryModule {
    pub fn new(hub: Arc<DiagnosticSourceHub>, client: Arc<TelemetryClient>) -> Self {
        Self {
            hub,
            client,
            subscribed: AtomicBool::new(false),
        }
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscribed.load(Ordering::Acquire)
    }
}

impl TelemetryModule for DiagnosticsTelemetryModule {
    fn name(&self) -> &'static str {
        "Diagnostics"
    }

    fn initialize(&self, _configuration: &TelemetryConfiguration) -> Result<(), TelemetryError> {
        if self.subscribed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        self.hub.subscribe(Arc::new(EntityFrameworkDiagnosticListener::new(
            self.client.clone(),
        )));
        debug!(listeners = self.hub.listener_count(), "Subscribed diagnostic listeners");
        Ok(())
    }
}

/// Name of the heartbeat event.
pub const HEARTBEAT_EVENT_NAME: &str = "HeartbeatState";

/// Periodic liveness signal carrying host properties.
///
/// The host drives the schedule by calling [`HeartbeatModule::beat`]; the
/// module decides whether a heartbeat is sent.
#[derive(Debug, Default)]
pub struct HeartbeatModule {
    enabled: AtomicBool,
    sequence: AtomicU64,
    properties: OnceCell<BTreeMap<String, String>>,
}

impl HeartbeatModule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Properties sent with every heartbeat.
    pub fn properties(&self) -> Option<&BTreeMap<String, String>> {
        self.properties.get()
    }

    /// Send one heartbeat through `client` if enabled. Returns whether one
    /// was sent.
    pub fn beat(&self, client: &TelemetryClient) -> bool {
        if !self.is_enabled() {
            return false;
        }
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        let mut event = EventTelemetry::new(HEARTBEAT_EVENT_NAME);
        if let Some(properties) = self.properties() {
            event.context.properties.extend(properties.clone());
        }
        event
            .context
            .properties
            .insert("sequence".to_string(), sequence.to_string());
        client.track(event.into());
        true
    }
}

impl TelemetryModule for HeartbeatModule {
    fn name(&self) -> &'static str {
        "Heartbeat"
    }

    fn initialize(&self, configuration: &TelemetryConfiguration) -> Result<(), TelemetryError> {
        let enabled = configuration.features.heartbeat;
        self.enabled.store(enabled, Ordering::Release);
        self.properties.get_or_init(|| {
            let mut properties = BTreeMap::new();
            properties.insert("sdkVersion".to_string(), sdk_version());
            properties.insert("osType".to_string(), std::env::consts::OS.to_string());
            properties.insert("processId".to_string(), std::process::id().to_string());
            properties
        });
        info!(enabled, "Heartbeat module initialized");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::InMemoryChannel;
    use crate::types::TelemetryItem;

    fn client() -> (Arc<TelemetryClient>, Arc<InMemoryChannel>, Arc<TelemetryConfiguration>) {
        let channel = Arc::new(InMemoryChannel::new());
        let config = Arc::new(TelemetryConfiguration::with_channel(channel.clone()));
        (Arc::new(TelemetryClient::new(config.clone())), channel, config)
    }

    #[test]
    fn test_diagnostics_module_subscribes_once() {
        let (client, _, config) = client();
        let hub = Arc::new(DiagnosticSourceHub::new());
        let module = DiagnosticsTelemetryModule::new(hub.clone(), client);

        module.initialize(&config).unwrap();
        module.initialize(&config).unwrap();

        assert!(module.is_subscribed());
        assert_eq!(hub.listener_count(), 1);
    }

    #[test]
    fn test_heartbeat_sends_when_enabled() {
        let (client, channel, config) = client();
        let module = HeartbeatModule::new();
        module.initialize(&config).unwrap();

        assert!(module.beat(&client));
        assert!(module.beat(&client));

        let items = channel.drain();
        assert_eq!(items.len(), 2);
        match &items[1] {
            TelemetryItem::Event(e) => {
                assert_eq!(e.name, HEARTBEAT_EVENT_NAME);
                assert_eq!(e.context.properties["sequence"], "1");
                assert!(e.context.properties.contains_key("sdkVersion"));
            }
            other => panic!("unexpected item {:?}", other),
        }
    }

    #[test]
    fn test_heartbeat_disabled_by_configuration() {
        let channel = Arc::new(InMemoryChannel::new());
        let mut config = TelemetryConfiguration::with_channel(channel.clone());
        config.features.heartbeat = false;
        let config = Arc::new(config);
        let client = TelemetryClient::new(config.clone());
        let module = HeartbeatModule::new();

        module.initialize(&config).unwrap();

        assert!(!module.is_enabled());
        assert!(!module.beat(&client));
        assert!(channel.drain().is_empty());
    }
}
