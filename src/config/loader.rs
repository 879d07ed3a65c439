// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Settings loading from files and the environment.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::ConfigError;

use super::types::{ChannelSettings, InsightsSettings, SettingsFile};

/// Settings file names to search for in the content root (in order).
pub const SETTINGS_FILES: &[&str] = &["appsettings.json", "appsettings.yaml", "appsettings.yml"];

/// Name of the settings section read from a file.
pub const SECTION_NAME: &str = "ApplicationInsights";

pub const ENV_INSTRUMENTATION_KEY: &str = "APPINSIGHTS_INSTRUMENTATIONKEY";
pub const ENV_DEVELOPER_MODE: &str = "APPINSIGHTS_DEVELOPER_MODE";
pub const ENV_ENDPOINT_ADDRESS: &str = "APPINSIGHTS_ENDPOINTADDRESS";
pub const ENV_ENABLE_ADAPTIVE_SAMPLING: &str = "APPINSIGHTS_ENABLE_ADAPTIVE_SAMPLING";
pub const ENV_ENABLE_QUICKPULSE: &str = "APPINSIGHTS_ENABLE_QUICKPULSE";
pub const ENV_ENABLE_HEARTBEAT: &str = "APPINSIGHTS_ENABLE_HEARTBEAT";

/// Load the `ApplicationInsights` section of a settings file (JSON or YAML).
///
/// A file without the section yields empty settings.
pub fn load_settings_file(path: &Path) -> Result<InsightsSettings, ConfigError> {
    let content = std::fs::read_to_string(path)?;

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("");

    let file: SettingsFile = match extension.to_lowercase().as_str() {
        "yaml" | "yml" => serde_yaml::from_str(&content)?,
        _ => serde_json::from_str(&content)?,
    };

    debug!(path = %path.display(), found = file.application_insights.is_some(), "Loaded settings file");
    Ok(file.application_insights.unwrap_or_default())
}

/// Load the settings files of a content root, base file first.
///
/// The base file is the first of [`SETTINGS_FILES`] that exists. When
/// `environment` is given, `appsettings.<environment>.json` is appended as
/// an overlay if present.
pub fn load_content_root_settings(
    content_root: &Path,
    environment: Option<&str>,
) -> Result<Vec<InsightsSettings>, ConfigError> {
    let mut layers = Vec::new();

    if let Some(path) = SETTINGS_FILES
        .iter()
        .map(|name| content_root.join(name))
        .find(|path| path.exists())
    {
        layers.push(load_settings_file(&path)?);
    }

    if let Some(environment) = environment.filter(|e| !e.is_empty()) {
        let overlay = content_root.join(format!("appsettings.{environment}.json"));
        if overlay.exists() {
            layers.push(load_settings_file(&overlay)?);
        }
    }

    Ok(layers)
}

/// Parse a boolean flag the way configuration values are written
/// (`true`/`false`, case-insensitive, surrounding whitespace ignored).
pub fn parse_flag(field: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(ConfigError::invalid_value(
            field,
            format!("expected true or false, got {other:?}"),
        )),
    }
}

/// Read settings from environment variables through `lookup`.
///
/// Empty values are treated as unset. Malformed flags are logged and
/// ignored.
pub fn settings_from_env(lookup: impl Fn(&str) -> Option<String>) -> InsightsSettings {
    let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
    let flag = |name: &str| {
        get(name).and_then(|value| match parse_flag(name, &value) {
            Ok(flag) => Some(flag),
            Err(err) => {
                warn!(error = %err, "Ignoring environment variable");
                None
            }
        })
    };

    InsightsSettings {
        instrumentation_key: get(ENV_INSTRUMENTATION_KEY),
        developer_mode: flag(ENV_DEVELOPER_MODE),
        endpoint_address: get(ENV_ENDPOINT_ADDRESS),
        enable_adaptive_sampling: flag(ENV_ENABLE_ADAPTIVE_SAMPLING),
        enable_quick_pulse_metric_stream: flag(ENV_ENABLE_QUICKPULSE),
        enable_heartbeat: flag(ENV_ENABLE_HEARTBEAT),
        application_version: None,
        telemetry_channel: None,
    }
}

/// Read settings from the process environment.
pub fn settings_from_process_env() -> InsightsSettings {
    settings_from_env(|name| std::env::var(name).ok())
}

/// Write `settings` as the `ApplicationInsights` section of
/// `appsettings.json` in `content_root`.
pub fn save_settings_file(
    content_root: &Path,
    settings: &InsightsSettings,
) -> Result<PathBuf, ConfigError> {
    let path = content_root.join(SETTINGS_FILES[0]);
    let file = SettingsFile {
        application_insights: Some(settings.clone()),
    };

    let content = serde_json::to_string_pretty(&file)?;
    std::fs::write(&path, content)?;

    Ok(path)
}

/// Initialize a new settings file with example values.
pub fn init_settings(content_root: &Path) -> Result<PathBuf, ConfigError> {
    save_settings_file(content_root, &get_example_settings())
}

/// Find the content root by searching upward from `start` for a settings
/// file.
pub fn find_content_root(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();

    loop {
        if SETTINGS_FILES.iter().any(|name| current.join(name).exists()) {
            return Some(current);
        }

        match current.parent() {
            Some(parent) => current = parent.to_path_buf(),
            None => return None,
        }
    }
}

/// Get an example settings section.
pub fn get_example_settings() -> InsightsSettings {
    InsightsSettings {
        instrumentation_key: Some("11111111-2222-3333-4444-555555555555".to_string()),
        developer_mode: Some(false),
        application_version: Some("1.0.0".to_string()),
        telemetry_channel: Some(ChannelSettings {
            developer_mode: None,
            endpoint_address: Some("https://dc.services.visualstudio.com/v2/track".to_string()),
        }),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_settings_files_order() {
        assert_eq!(SETTINGS_FILES.len(), 3);
        assert_eq!(SETTINGS_FILES[0], "appsettings.json");
    }

    #[test]
    fn test_load_json_settings() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("appsettings.json");
        std::fs::write(
            &path,
            r#"{"ApplicationInsights": {"InstrumentationKey": "abc", "DeveloperMode": true}}"#,
        )
        .unwrap();

        let settings = load_settings_file(&path).unwrap();
        assert_eq!(settings.instrumentation_key.as_deref(), Some("abc"));
        assert_eq!(settings.developer_mode, Some(true));
    }

    #[test]
    fn test_load_yaml_settings() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("appsettings.yaml");
        std::fs::write(
            &path,
            "ApplicationInsights:\n  EndpointAddress: http://localhost:1234/v2/track/\n",
        )
        .unwrap();

        let settings = load_settings_file(&path).unwrap();
        assert_eq!(
            settings.endpoint_address.as_deref(),
            Some("http://localhost:1234/v2/track/")
        );
    }

    #[test]
    fn test_load_invalid_json() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("appsettings.json");
        std::fs::write(&path, "{not json").unwrap();

        assert!(matches!(
            load_settings_file(&path),
            Err(ConfigError::JsonError(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let temp = TempDir::new().unwrap();
        assert!(matches!(
            load_settings_file(&temp.path().join("nope.json")),
            Err(ConfigError::NotFound(_))
        ));
    }

    #[test]
    fn test_content_root_with_environment_overlay() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("appsettings.json"),
            r#"{"ApplicationInsights": {"InstrumentationKey": "base"}}"#,
        )
        .unwrap();
        std::fs::write(
            temp.path().join("appsettings.Staging.json"),
            r#"{"ApplicationInsights": {"InstrumentationKey": "staging"}}"#,
        )
        .unwrap();

        let layers = load_content_root_settings(temp.path(), Some("Staging")).unwrap();
        assert_eq!(layers.len(), 2);
        assert_eq!(layers[1].instrumentation_key.as_deref(), Some("staging"));

        let layers = load_content_root_settings(temp.path(), None).unwrap();
        assert_eq!(layers.len(), 1);
    }

    #[test]
    fn test_content_root_without_files() {
        let temp = TempDir::new().unwrap();
        let layers = load_content_root_settings(temp.path(), Some("Production")).unwrap();
        assert!(layers.is_empty());
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("x", " TRUE ").unwrap());
        assert!(!parse_flag("x", "false").unwrap());
        assert!(matches!(
            parse_flag("x", "yes"),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_settings_from_env() {
        let settings = settings_from_env(env(&[
            (ENV_INSTRUMENTATION_KEY, "11111111-2222-3333-4444-555555555555"),
            (ENV_DEVELOPER_MODE, "true"),
            (ENV_ENDPOINT_ADDRESS, "http://localhost:1234/v2/track/"),
            (ENV_ENABLE_HEARTBEAT, "not-a-bool"),
        ]));

        assert_eq!(
            settings.instrumentation_key.as_deref(),
            Some("11111111-2222-3333-4444-555555555555")
        );
        assert_eq!(settings.developer_mode, Some(true));
        assert_eq!(
            settings.endpoint_address.as_deref(),
            Some("http://localhost:1234/v2/track/")
        );
        assert!(settings.enable_heartbeat.is_none());
    }

    #[test]
    fn test_empty_env_values_are_unset() {
        let settings = settings_from_env(env(&[(ENV_INSTRUMENTATION_KEY, "  ")]));
        assert!(settings.instrumentation_key.is_none());
    }

    #[test]
    fn test_init_settings_round_trips() {
        let temp = TempDir::new().unwrap();
        let path = init_settings(temp.path()).unwrap();
        assert_eq!(path.file_name().unwrap(), "appsettings.json");

        let loaded = load_settings_file(&path).unwrap();
        assert_eq!(loaded, get_example_settings());
    }

    #[test]
    fn test_find_content_root() {
        let temp = TempDir::new().unwrap();
        let subdir = temp.path().join("a").join("b");
        std::fs::create_dir_all(&subdir).unwrap();
        std::fs::write(temp.path().join("appsettings.json"), "{}").unwrap();

        assert_eq!(find_content_root(&subdir).unwrap(), temp.path());
    }
}
