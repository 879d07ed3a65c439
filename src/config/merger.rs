// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Settings merging.
//!
//! Handles merging settings from different sources with proper precedence.

use super::types::{InsightsOptions, InsightsSettings, ResolvedSettings};

/// Default settings values.
pub fn default_settings() -> ResolvedSettings {
    ResolvedSettings::default()
}

/// Merge settings sources with precedence.
///
/// Precedence (highest to lowest):
/// 1. Explicit options
/// 2. Environment variables
/// 3. Settings files, later files over earlier ones
/// 4. Default values
///
/// Each value resolves independently: a source that sets only the
/// instrumentation key leaves every other value to lower sources.
pub fn merge_settings(
    files: &[InsightsSettings],
    env: &InsightsSettings,
    options: &InsightsOptions,
) -> ResolvedSettings {
    let mut result = default_settings();

    for file in files {
        apply_settings(&mut result, file);
    }

    apply_settings(&mut result, env);

    apply_options(&mut result, options);

    result
}

fn apply_settings(result: &mut ResolvedSettings, settings: &InsightsSettings) {
    if settings.instrumentation_key.is_some() {
        result.instrumentation_key = settings.instrumentation_key.clone();
    }

    if settings.developer_mode.is_some() {
        result.developer_mode = settings.developer_mode;
    }

    if settings.endpoint_address.is_some() {
        result.endpoint_address = settings.endpoint_address.clone();
    }

    if let Some(ref channel) = settings.telemetry_channel {
        if channel.developer_mode.is_some() {
            result.developer_mode = channel.developer_mode;
        }
        if channel.endpoint_address.is_some() {
            result.endpoint_address = channel.endpoint_address.clone();
        }
    }

    if let Some(enabled) = settings.enable_adaptive_sampling {
        result.enable_adaptive_sampling = enabled;
    }

    if let Some(enabled) = settings.enable_quick_pulse_metric_stream {
        result.enable_quick_pulse_metric_stream = enabled;
    }

    if let Some(enabled) = settings.enable_heartbeat {
        result.enable_heartbeat = enabled;
    }

    if settings.application_version.is_some() {
        result.application_version = settings.application_version.clone();
    }
}

fn apply_options(result: &mut ResolvedSettings, options: &InsightsOptions) {
    if options.instrumentation_key.is_some() {
        result.instrumentation_key = options.instrumentation_key.clone();
    }

    if options.developer_mode.is_some() {
        result.developer_mode = options.developer_mode;
    }

    if options.endpoint_address.is_some() {
        result.endpoint_address = options.endpoint_address.clone();
    }

    if let Some(enabled) = options.enable_adaptive_sampling {
        result.enable_adaptive_sampling = enabled;
    }

    if let Some(enabled) = options.enable_quick_pulse_metric_stream {
        result.enable_quick_pulse_metric_stream = enabled;
    }

    if let Some(enabled) = options.enable_heartbeat {
        result.enable_heartbeat = enabled;
    }

    if options.application_version.is_some() {
        result.application_version = options.application_version.clone();
    }
}
