// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Configuration types.

use serde::{Deserialize, Serialize};

/// Root of a settings file. Only the `ApplicationInsights` section is read;
/// every other key is ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SettingsFile {
    #[serde(
        rename = "ApplicationInsights",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub application_insights: Option<InsightsSettings>,
}

/// A partial set of settings from one source (file or environment).
///
/// Unset fields leave lower-precedence values in place.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct InsightsSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instrumentation_key: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub developer_mode: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint_address: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_adaptive_sampling: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_quick_pulse_metric_stream: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_heartbeat: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub application_version: Option<String>,

    /// Channel-specific overrides; take precedence over the top-level
    /// `DeveloperMode` / `EndpointAddress` of the same source.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telemetry_channel: Option<ChannelSettings>,
}

/// The nested `TelemetryChannel` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct ChannelSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub developer_mode: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint_address: Option<String>,
}

/// Options supplied in code. The highest-precedence source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InsightsOptions {
    pub instrumentation_key: Option<String>,
    pub developer_mode: Option<bool>,
    pub endpoint_address: Option<String>,
    pub enable_adaptive_sampling: Option<bool>,
    pub enable_quick_pulse_metric_stream: Option<bool>,
    pub enable_heartbeat: Option<bool>,
    pub application_version: Option<String>,
}

/// Fully resolved settings after all sources are merged.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedSettings {
    pub instrumentation_key: Option<String>,

    /// `None` leaves the channel's own developer mode untouched.
    pub developer_mode: Option<bool>,

    /// `None` leaves the channel's own endpoint untouched.
    pub endpoint_address: Option<String>,

    pub enable_adaptive_sampling: bool,
    pub enable_quick_pulse_metric_stream: bool,
    pub enable_heartbeat: bool,
    pub application_version: Option<String>,
}

impl Default for ResolvedSettings {
    fn default() -> Self {
        Self {
            instrumentation_key: None,
            developer_mode: None,
            endpoint_address: None,
            enable_adaptive_sampling: true,
            enable_quick_pulse_metric_stream: true,
            enable_heartbeat: true,
            application_version: None,
        }
    }
}
