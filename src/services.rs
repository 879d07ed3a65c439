// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Service registration and configuration assembly.
//!
//! [`TelemetryServices`] collects what the host registers (channel,
//! initializers, processor factories, modules) and what
//! [`add_application_insights_telemetry`](TelemetryServices::add_application_insights_telemetry)
//! adds by default. [`build`](TelemetryServices::build) resolves settings and
//! assembles the single [`TelemetryConfiguration`] of the application, in
//! increasing precedence:
//!
//! 1. SDK defaults
//! 2. container-registered instances
//! 3. settings files
//! 4. environment variables
//! 5. explicit options
//!
//! Every registration is idempotent: adding the same service twice keeps one.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::channel::{InMemoryChannel, TelemetryChannel};
use crate::client::TelemetryClient;
use crate::config::{self, InsightsOptions, ResolvedSettings, SettingsSources};
use crate::configuration::{self as active_configuration, TelemetryConfiguration};
use crate::diagnostics::{DiagnosticSourceHub, EventSource, SdkEvent};
use crate::error::{Result, TelemetryError};
use crate::http::{HttpContextAccessor, ThreadLocalHttpContextAccessor};
use crate::initializers::{
    default_web_initializers, AzureWebAppRoleEnvironmentInitializer, ComponentVersionInitializer,
    ContextInitializer, DomainNameRoleInstanceInitializer, TelemetryInitializer,
};
use crate::modules::{DiagnosticsTelemetryModule, HeartbeatModule, TelemetryModule};
use crate::processors::{
    instantiate, AdaptiveSamplingProcessor, FnProcessorFactory, QuickPulseProcessor,
    TelemetryProcessor, TelemetryProcessorFactory,
};

// ============================================================================
// Descriptors
// ============================================================================

/// How long a registered service lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceLifetime {
    /// One instance per provider.
    Singleton,
    /// Produced fresh on each resolution.
    Transient,
}

/// The contract a registration satisfies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceKind {
    Configuration,
    Client,
    HttpContextAccessor,
    DiagnosticSourceHub,
    TelemetryChannel,
    TelemetryInitializer,
    ContextInitializer,
    TelemetryProcessorFactory,
    TelemetryModule,
    DiagnosticListener,
}

/// One registration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServiceDescriptor {
    pub kind: ServiceKind,
    pub implementation: String,
    pub lifetime: ServiceLifetime,
}

impl ServiceDescriptor {
    pub fn singleton(kind: ServiceKind, implementation: impl Into<String>) -> Self {
        Self {
            kind,
            implementation: implementation.into(),
            lifetime: ServiceLifetime::Singleton,
        }
    }
}

// ============================================================================
// Services
// ============================================================================

type EnvLookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// The service collection of the telemetry pipeline.
pub struct TelemetryServices {
    descriptors: Vec<ServiceDescriptor>,
    channel: Option<Arc<dyn TelemetryChannel>>,
    accessor: Option<Arc<dyn HttpContextAccessor>>,
    initializers: Vec<Arc<dyn TelemetryInitializer>>,
    context_initializers: Vec<Arc<dyn ContextInitializer>>,
    processor_factories: Vec<Arc<dyn TelemetryProcessorFactory>>,
    modules: Vec<Arc<dyn TelemetryModule>>,
    telemetry_added: bool,
    options: InsightsOptions,
    content_root: Option<PathBuf>,
    environment: Option<String>,
    env: EnvLookup,
    events: EventSource,
    update_active: bool,
}

impl Default for TelemetryServices {
    fn default() -> Self {
        Self::new()
    }
}

impl TelemetryServices {
    /// An empty collection that reads the process environment.
    pub fn new() -> Self {
        Self {
            descriptors: Vec::new(),
            channel: None,
            accessor: None,
            initializers: Vec::new(),
            context_initializers: Vec::new(),
            processor_factories: Vec::new(),
            modules: Vec::new(),
            telemetry_added: false,
            options: InsightsOptions::default(),
            content_root: None,
            environment: None,
            env: Arc::new(|name| std::env::var(name).ok()),
            events: EventSource::new(),
            update_active: false,
        }
    }

    /// Read environment variables through `lookup` instead of the process
    /// environment.
    pub fn with_env_lookup(
        mut self,
        lookup: impl Fn(&str) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        self.env = Arc::new(lookup);
        self
    }

    /// Read settings files from `content_root`, with the optional
    /// `appsettings.<environment>.json` overlay.
    pub fn with_content_root(
        mut self,
        content_root: impl Into<PathBuf>,
        environment: Option<String>,
    ) -> Self {
        self.content_root = Some(content_root.into());
        self.environment = environment;
        self
    }

    /// Report SDK diagnostics to `events`.
    pub fn with_event_source(mut self, events: EventSource) -> Self {
        self.events = events;
        self
    }

    pub fn descriptors(&self) -> &[ServiceDescriptor] {
        &self.descriptors
    }

    /// Whether a service of `kind` implemented by `implementation` is
    /// registered.
    pub fn contains(&self, kind: ServiceKind, implementation: &str) -> bool {
        self.descriptors
            .iter()
            .any(|d| d.kind == kind && d.implementation == implementation)
    }

    fn try_add(&mut self, descriptor: ServiceDescriptor) -> bool {
        if self.contains(descriptor.kind, &descriptor.implementation) {
            return false;
        }
        self.descriptors.push(descriptor);
        true
    }

    /// Register the telemetry pipeline with `options`.
    ///
    /// Calling this again replaces the options but registers nothing twice.
    pub fn add_application_insights_telemetry(&mut self, options: InsightsOptions) -> &mut Self {
        self.options = options;
        if self.telemetry_added {
            debug!("Telemetry services already registered");
            return self;
        }
        self.telemetry_added = true;

        self.try_add(ServiceDescriptor::singleton(
            ServiceKind::Configuration,
            "TelemetryConfiguration",
        ));
        self.try_add(ServiceDescriptor::singleton(ServiceKind::Client, "TelemetryClient"));
        self.try_add(ServiceDescriptor::singleton(
            ServiceKind::DiagnosticSourceHub,
            "DiagnosticSourceHub",
        ));
        if self.accessor.is_none() {
            self.try_add(ServiceDescriptor::singleton(
                ServiceKind::HttpContextAccessor,
                "ThreadLocalHttpContextAccessor",
            ));
        }
        self.try_add(ServiceDescriptor::singleton(
            ServiceKind::DiagnosticListener,
            crate::diagnostics::ENTITY_FRAMEWORK_LISTENER_NAME,
        ));

        for name in [
            "AzureWebAppRoleEnvironment",
            "ComponentVersion",
            "ClientIpHeader",
            "OperationName",
            "OperationId",
            "Synthetic",
            "UserAgent",
            "WebSession",
            "WebUser",
        ] {
            self.try_add(ServiceDescriptor::singleton(ServiceKind::TelemetryInitializer, name));
        }
        self.try_add(ServiceDescriptor::singleton(
            ServiceKind::ContextInitializer,
            "DomainNameRoleInstance",
        ));
        for name in ["Diagnostics", "Heartbeat"] {
            self.try_add(ServiceDescriptor::singleton(ServiceKind::TelemetryModule, name));
        }

        info!(services = self.descriptors.len(), "Registered telemetry services");
        self
    }

    /// Register the channel. The first registration wins.
    pub fn add_telemetry_channel(&mut self, channel: Arc<dyn TelemetryChannel>) -> &mut Self {
        if self.channel.is_some() {
            debug!(channel = channel.name(), "Telemetry channel already registered, ignoring");
            return self;
        }
        self.try_add(ServiceDescriptor::singleton(
            ServiceKind::TelemetryChannel,
            channel.name(),
        ));
        self.channel = Some(channel);
        self
    }

    /// Register the accessor initializers use to find the ambient request.
    pub fn add_http_context_accessor(
        &mut self,
        accessor: Arc<dyn HttpContextAccessor>,
    ) -> &mut Self {
        self.descriptors
            .retain(|d| d.kind != ServiceKind::HttpContextAccessor);
        self.descriptors.push(ServiceDescriptor::singleton(
            ServiceKind::HttpContextAccessor,
            "HostHttpContextAccessor",
        ));
        self.accessor = Some(accessor);
        self
    }

    /// Register a telemetry initializer, once per implementation name.
    pub fn add_telemetry_initializer(
        &mut self,
        initializer: Arc<dyn TelemetryInitializer>,
    ) -> &mut Self {
        if self.try_add(ServiceDescriptor::singleton(
            ServiceKind::TelemetryInitializer,
            initializer.name(),
        )) {
            self.initializers.push(initializer);
        }
        self
    }

    /// Register a context initializer, once per implementation name.
    pub fn add_context_initializer(
        &mut self,
        initializer: Arc<dyn ContextInitializer>,
    ) -> &mut Self {
        if self.try_add(ServiceDescriptor::singleton(
            ServiceKind::ContextInitializer,
            initializer.name(),
        )) {
            self.context_initializers.push(initializer);
        }
        self
    }

    /// Register a processor factory. The factory is instantiated at build.
    pub fn add_telemetry_processor_factory(
        &mut self,
        factory: Arc<dyn TelemetryProcessorFactory>,
    ) -> std::result::Result<&mut Self, TelemetryError> {
        if factory.name().trim().is_empty() {
            return Err(TelemetryError::InvalidProcessor(
                "processor factory name must not be empty".to_string(),
            ));
        }
        if self.try_add(ServiceDescriptor {
            kind: ServiceKind::TelemetryProcessorFactory,
            implementation: factory.name().to_string(),
            lifetime: ServiceLifetime::Transient,
        }) {
            self.processor_factories.push(factory);
        }
        Ok(self)
    }

    /// Register a processor type built with `Default`.
    pub fn add_telemetry_processor<P>(&mut self) -> std::result::Result<&mut Self, TelemetryError>
    where
        P: TelemetryProcessor + Default + 'static,
    {
        let name = P::default().name();
        let factory = FnProcessorFactory::new(name, || {
            Ok(Arc::new(P::default()) as Arc<dyn TelemetryProcessor>)
        })?;
        self.add_telemetry_processor_factory(Arc::new(factory))
    }

    /// Register a telemetry module instance, once per implementation name.
    pub fn add_telemetry_module(&mut self, module: Arc<dyn TelemetryModule>) -> &mut Self {
        if self.try_add(ServiceDescriptor::singleton(
            ServiceKind::TelemetryModule,
            module.name(),
        )) {
            self.modules.push(module);
        }
        self
    }

    /// Publish the built configuration as the process-wide active one.
    pub fn update_active_configuration(&mut self, enabled: bool) -> &mut Self {
        self.update_active = enabled;
        self
    }

    /// Resolve settings and assemble the configuration, client and modules.
    #[instrument(skip_all)]
    pub fn build(&self) -> Result<TelemetryServiceProvider> {
        let settings = config::load_settings(&SettingsSources {
            content_root: self.content_root.as_deref(),
            environment: self.environment.as_deref(),
            env: &*self.env,
            options: self.options.clone(),
        })?;

        let accessor: Arc<dyn HttpContextAccessor> = self
            .accessor
            .clone()
            .unwrap_or_else(|| Arc::new(ThreadLocalHttpContextAccessor::new()));

        let host_channel = self.channel.is_some();
        let channel = self
            .channel
            .clone()
            .unwrap_or_else(|| Arc::new(InMemoryChannel::new()));

        let mut configuration = TelemetryConfiguration::with_channel(channel);
        configuration.events = self.events.clone();

        if self.telemetry_added {
            let mut builtin: Vec<Arc<dyn TelemetryInitializer>> = vec![
                Arc::new(AzureWebAppRoleEnvironmentInitializer::from_lookup(|name| {
                    (self.env)(name)
                })),
                Arc::new(ComponentVersionInitializer::new(
                    settings.application_version.clone(),
                    &self.events,
                )),
            ];
            builtin.extend(default_web_initializers(accessor.clone(), &self.events));

            // Host registrations with the same name replace the built-in one.
            let registered: Vec<&str> = self.initializers.iter().map(|i| i.name()).collect();
            configuration.telemetry_initializers.extend(
                builtin
                    .into_iter()
                    .filter(|i| !registered.contains(&i.name())),
            );
            if !self
                .context_initializers
                .iter()
                .any(|c| c.name() == "DomainNameRoleInstance")
            {
                configuration
                    .context_initializers
                    .push(Arc::new(DomainNameRoleInstanceInitializer::new()));
            }
        }
        configuration
            .telemetry_initializers
            .extend(self.initializers.iter().cloned());
        configuration
            .context_initializers
            .extend(self.context_initializers.iter().cloned());

        for factory in &self.processor_factories {
            configuration.telemetry_processors.push(instantiate(factory.as_ref())?);
        }

        configuration.apply_settings(&settings);

        let quick_pulse = (self.telemetry_added && !host_channel && configuration.features.quick_pulse)
            .then(|| Arc::new(QuickPulseProcessor::new()));
        if let Some(ref qp) = quick_pulse {
            configuration.telemetry_processors.push(qp.clone());
        }
        if self.telemetry_added && !host_channel && configuration.features.adaptive_sampling {
            configuration
                .telemetry_processors
                .push(Arc::new(AdaptiveSamplingProcessor::default()));
        }

        configuration.initialize_processors();

        let configuration = Arc::new(configuration);
        let client = Arc::new(TelemetryClient::new(configuration.clone()));
        let hub = Arc::new(DiagnosticSourceHub::new());

        let mut modules = self.modules.clone();
        let mut heartbeat = None;
        if self.telemetry_added {
            modules.push(Arc::new(DiagnosticsTelemetryModule::new(
                hub.clone(),
                client.clone(),
            )));
            let module = Arc::new(HeartbeatModule::new());
            heartbeat = Some(module.clone());
            modules.push(module);
        }

        for module in &modules {
            if let Err(err) = module.initialize(&configuration) {
                self.events.emit(SdkEvent::ModuleFailed {
                    module: module.name().to_string(),
                    message: err.to_string(),
                });
            }
        }

        if self.update_active {
            active_configuration::set_active(configuration.clone());
        }

        info!(
            initializers = configuration.telemetry_initializers.len(),
            processors = configuration.telemetry_processors.len(),
            modules = modules.len(),
            "Telemetry configuration built"
        );

        Ok(TelemetryServiceProvider {
            configuration,
            client,
            accessor,
            hub,
            modules,
            heartbeat,
            quick_pulse,
            settings,
            descriptors: self.descriptors.clone(),
        })
    }
}

impl std::fmt::Debug for TelemetryServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelemetryServices")
            .field("descriptors", &self.descriptors)
            .field("options", &self.options)
            .field("content_root", &self.content_root)
            .finish()
    }
}

// ============================================================================
// Provider
// ============================================================================

/// The built services.
pub struct TelemetryServiceProvider {
    configuration: Arc<TelemetryConfiguration>,
    client: Arc<TelemetryClient>,
    accessor: Arc<dyn HttpContextAccessor>,
    hub: Arc<DiagnosticSourceHub>,
    modules: Vec<Arc<dyn TelemetryModule>>,
    heartbeat: Option<Arc<HeartbeatModule>>,
    quick_pulse: Option<Arc<QuickPulseProcessor>>,
    settings: ResolvedSettings,
    descriptors: Vec<ServiceDescriptor>,
}

impl TelemetryServiceProvider {
    pub fn configuration(&self) -> &Arc<TelemetryConfiguration> {
        &self.configuration
    }

    pub fn client(&self) -> &Arc<TelemetryClient> {
        &self.client
    }

    pub fn http_context_accessor(&self) -> &Arc<dyn HttpContextAccessor> {
        &self.accessor
    }

    pub fn diagnostic_hub(&self) -> &Arc<DiagnosticSourceHub> {
        &self.hub
    }

    pub fn modules(&self) -> &[Arc<dyn TelemetryModule>] {
        &self.modules
    }

    pub fn module_names(&self) -> Vec<&'static str> {
        self.modules.iter().map(|m| m.name()).collect()
    }

    pub fn heartbeat(&self) -> Option<&Arc<HeartbeatModule>> {
        self.heartbeat.as_ref()
    }

    pub fn quick_pulse(&self) -> Option<&Arc<QuickPulseProcessor>> {
        self.quick_pulse.as_ref()
    }

    /// The settings the configuration was built from.
    pub fn settings(&self) -> &ResolvedSettings {
        &self.settings
    }

    pub fn descriptors(&self) -> &[ServiceDescriptor] {
        &self.descriptors
    }
}

impl std::fmt::Debug for TelemetryServiceProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelemetryServiceProvider")
            .field("configuration", &self.configuration)
            .field("modules", &self.module_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_KEY: &str = "11111111-2222-3333-4444-555555555555";

    fn services() -> TelemetryServices {
        TelemetryServices::new().with_env_lookup(|_| None)
    }

    fn count(services: &TelemetryServices, kind: ServiceKind, name: &str) -> usize {
        services
            .descriptors()
            .iter()
            .filter(|d| d.kind == kind && d.implementation == name)
            .count()
    }

    #[test]
    fn test_registers_expected_services() {
        let mut services = services();
        services.add_application_insights_telemetry(InsightsOptions::default());

        assert!(services.contains(ServiceKind::Configuration, "TelemetryConfiguration"));
        assert!(services.contains(ServiceKind::Client, "TelemetryClient"));
        assert!(services.contains(
            ServiceKind::HttpContextAccessor,
            "ThreadLocalHttpContextAccessor"
        ));
        assert!(services.contains(ServiceKind::TelemetryInitializer, "WebSession"));
        assert!(services.contains(ServiceKind::ContextInitializer, "DomainNameRoleInstance"));
        assert!(services.contains(ServiceKind::TelemetryModule, "Heartbeat"));
    }

    #[test]
    fn test_registering_twice_registers_once() {
        let mut services = services();
        services.add_application_insights_telemetry(InsightsOptions::default());
        services.add_application_insights_telemetry(InsightsOptions::default());

        for d in services.descriptors() {
            assert_eq!(count(&services, d.kind, &d.implementation), 1, "{:?}", d);
        }

        let provider = services.build().unwrap();
        let names: Vec<_> = provider
            .configuration()
            .telemetry_initializers
            .iter()
            .map(|i| i.name())
            .collect();
        let mut deduped = names.clone();
        deduped.sort();
        deduped.dedup();
        assert_eq!(names.len(), deduped.len());
        assert_eq!(provider.module_names(), vec!["Diagnostics", "Heartbeat"]);
    }

    #[test]
    fn test_does_not_fail_without_instrumentation_key() {
        let mut services = services();
        services.add_application_insights_telemetry(InsightsOptions::default());
        let provider = services.build().unwrap();
        assert!(provider.configuration().instrumentation_key.is_none());
    }

    #[test]
    fn test_reads_settings_from_environment() {
        let mut services = services().with_env_lookup(|name| match name {
            "APPINSIGHTS_INSTRUMENTATIONKEY" => Some(TEST_KEY.to_string()),
            "APPINSIGHTS_DEVELOPER_MODE" => Some("true".to_string()),
            "APPINSIGHTS_ENDPOINTADDRESS" => Some("http://localhost:1234/v2/track/".to_string()),
            _ => None,
        });
        services.add_application_insights_telemetry(InsightsOptions::default());

        let provider = services.build().unwrap();
        let config = provider.configuration();
        assert_eq!(config.instrumentation_key.as_deref(), Some(TEST_KEY));
        assert!(config.channel.developer_mode());
        assert_eq!(config.channel.endpoint_address(), "http://localhost:1234/v2/track/");
    }

    #[test]
    fn test_host_channel_is_kept() {
        let channel = Arc::new(InMemoryChannel::with_capacity(7));
        let mut services = services();
        services.add_telemetry_channel(channel.clone());
        services.add_application_insights_telemetry(InsightsOptions {
            endpoint_address: Some("http://localhost:1234/v2/track/".to_string()),
            ..Default::default()
        });

        let provider = services.build().unwrap();
        let config = provider.configuration();
        assert!(Arc::ptr_eq(
            &config.channel,
            &(channel.clone() as Arc<dyn TelemetryChannel>)
        ));
        assert_eq!(channel.endpoint_address(), "http://localhost:1234/v2/track/");
        assert!(!config.has_processor("QuickPulse"));
        assert!(!config.has_processor("AdaptiveSampling"));
    }

    #[test]
    fn test_second_channel_is_ignored() {
        let channel = Arc::new(InMemoryChannel::new());
        let mut other = crate::channel::MockTelemetryChannel::new();
        other.expect_name().return_const("MockChannel");

        let mut services = services();
        services
            .add_telemetry_channel(channel.clone())
            .add_telemetry_channel(Arc::new(other));

        let channels = services
            .descriptors()
            .iter()
            .filter(|d| d.kind == ServiceKind::TelemetryChannel)
            .count();
        assert_eq!(channels, 1);
        assert!(services.contains(ServiceKind::TelemetryChannel, "InMemoryChannel"));
        assert!(!services.contains(ServiceKind::TelemetryChannel, "MockChannel"));

        services.add_application_insights_telemetry(InsightsOptions::default());
        let provider = services.build().unwrap();
        assert!(Arc::ptr_eq(
            &provider.configuration().channel,
            &(channel as Arc<dyn TelemetryChannel>)
        ));
    }

    #[test]
    fn test_default_channel_gets_builtin_processors() {
        let mut services = services();
        services.add_application_insights_telemetry(InsightsOptions::default());
        let provider = services.build().unwrap();
        let config = provider.configuration();

        assert_eq!(config.channel.name(), "InMemoryChannel");
        assert!(config.has_processor("QuickPulse"));
        assert!(config.has_processor("AdaptiveSampling"));
        assert!(provider.quick_pulse().is_some());
    }

    #[test]
    fn test_options_disable_builtin_processors_and_heartbeat() {
        let mut services = services();
        services.add_application_insights_telemetry(InsightsOptions {
            enable_quick_pulse_metric_stream: Some(false),
            enable_adaptive_sampling: Some(false),
            enable_heartbeat: Some(false),
            ..Default::default()
        });
        let provider = services.build().unwrap();
        let config = provider.configuration();

        assert!(!config.has_processor("QuickPulse"));
        assert!(!config.has_processor("AdaptiveSampling"));
        assert!(!provider.heartbeat().unwrap().is_enabled());
    }

    #[test]
    fn test_processor_type_is_instantiated_once() {
        let mut services = services();
        services.add_telemetry_processor::<QuickPulseProcessor>().unwrap();
        services.add_telemetry_processor::<QuickPulseProcessor>().unwrap();

        let provider = services.build().unwrap();
        let count = provider
            .configuration()
            .telemetry_processors
            .iter()
            .filter(|p| p.name() == "QuickPulse")
            .count();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_blank_processor_factory_rejected() {
        struct Blank;

        impl TelemetryProcessorFactory for Blank {
            fn name(&self) -> &str {
                ""
            }

            fn create(&self) -> std::result::Result<Arc<dyn TelemetryProcessor>, TelemetryError> {
                Ok(Arc::new(QuickPulseProcessor::new()))
            }
        }

        let mut services = services();
        assert!(matches!(
            services.add_telemetry_processor_factory(Arc::new(Blank)),
            Err(TelemetryError::InvalidProcessor(_))
        ));
    }

    #[test]
    fn test_minimal_services_build_default_configuration() {
        let provider = services().build().unwrap();
        let config = provider.configuration();
        assert_eq!(config.telemetry_initializers.len(), 1);
        assert!(config.has_initializer("SdkVersion"));
        assert!(provider.modules().is_empty());
    }

    #[test]
    fn test_active_configuration_is_opt_in() {
        let mut services = services();
        services.add_application_insights_telemetry(InsightsOptions {
            instrumentation_key: Some("opt-in".to_string()),
            ..Default::default()
        });
        let provider = services.build().unwrap();
        let published = active_configuration::active()
            .map(|c| Arc::ptr_eq(&c, provider.configuration()))
            .unwrap_or(false);
        assert!(!published);

        services.update_active_configuration(true);
        let provider = services.build().unwrap();
        let active = active_configuration::active().unwrap();
        assert!(Arc::ptr_eq(&active, provider.configuration()));
        active_configuration::clear_active();
    }

    #[test]
    fn test_diagnostics_module_subscribes_listener() {
        let mut services = services();
        services.add_application_insights_telemetry(InsightsOptions::default());
        let provider = services.build().unwrap();
        assert_eq!(provider.diagnostic_hub().listener_count(), 1);
    }
}
