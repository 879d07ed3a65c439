// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Settings for the telemetry pipeline.
//!
//! Handles loading and merging settings from multiple sources:
//! - Settings file: `appsettings.json` (or `.yaml`/`.yml`) in the content root
//! - Environment overlay: `appsettings.<environment>.json`
//! - Environment variables: `APPINSIGHTS_*`
//! - Explicit options: [`InsightsOptions`] supplied in code
//!
//! Settings are merged with precedence (options > environment > files > defaults).

mod loader;
mod merger;
mod types;

pub use loader::{
    find_content_root, get_example_settings, init_settings, load_content_root_settings,
    load_settings_file, parse_flag, save_settings_file, settings_from_env,
    settings_from_process_env, ENV_DEVELOPER_MODE, ENV_ENABLE_ADAPTIVE_SAMPLING,
    ENV_ENABLE_HEARTBEAT, ENV_ENABLE_QUICKPULSE, ENV_ENDPOINT_ADDRESS, ENV_INSTRUMENTATION_KEY,
    SECTION_NAME, SETTINGS_FILES,
};

pub use merger::{default_settings, merge_settings};

pub use types::{ChannelSettings, InsightsOptions, InsightsSettings, ResolvedSettings, SettingsFile};

use crate::error::ConfigError;
use std::path::Path;

fn no_env(_: &str) -> Option<String> {
    None
}

/// Where settings come from.
///
/// Environment variables are read through `env`, so callers (and tests)
/// decide whether the process environment is consulted.
pub struct SettingsSources<'a> {
    pub content_root: Option<&'a Path>,
    pub environment: Option<&'a str>,
    pub env: &'a dyn Fn(&str) -> Option<String>,
    pub options: InsightsOptions,
}

impl<'a> SettingsSources<'a> {
    /// No files, no environment, no options.
    pub fn none() -> Self {
        Self {
            content_root: None,
            environment: None,
            env: &no_env,
            options: InsightsOptions::default(),
        }
    }
}

impl Default for SettingsSources<'_> {
    fn default() -> Self {
        Self::none()
    }
}

/// Load and merge all settings sources.
///
/// This is the main entry point for settings resolution.
pub fn load_settings(sources: &SettingsSources<'_>) -> Result<ResolvedSettings, ConfigError> {
    let files = match sources.content_root {
        Some(root) => load_content_root_settings(root, sources.environment)?,
        None => Vec::new(),
    };
    let env = settings_from_env(sources.env);

    Ok(merge_settings(&files, &env, &sources.options))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_settings_with_no_sources() {
        let settings = load_settings(&SettingsSources::none()).unwrap();
        assert_eq!(settings, ResolvedSettings::default());
    }

    #[test]
    fn test_load_settings_precedence() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("appsettings.json"),
            r#"{"ApplicationInsights": {
                "InstrumentationKey": "file",
                "EndpointAddress": "http://file/",
                "DeveloperMode": false
            }}"#,
        )
        .unwrap();

        let env = |name: &str| match name {
            ENV_INSTRUMENTATION_KEY => Some("env".to_string()),
            ENV_DEVELOPER_MODE => Some("true".to_string()),
            _ => None,
        };
        let sources = SettingsSources {
            content_root: Some(temp.path()),
            environment: None,
            env: &env,
            options: InsightsOptions {
                instrumentation_key: Some("options".to_string()),
                ..Default::default()
            },
        };

        let settings = load_settings(&sources).unwrap();
        assert_eq!(settings.instrumentation_key.as_deref(), Some("options"));
        assert_eq!(settings.developer_mode, Some(true));
        assert_eq!(settings.endpoint_address.as_deref(), Some("http://file/"));
    }

    #[test]
    fn test_load_settings_bad_file_is_error() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("appsettings.json"), "[").unwrap();

        let sources = SettingsSources {
            content_root: Some(temp.path()),
            ..SettingsSources::none()
        };
        assert!(load_settings(&sources).is_err());
    }
}
