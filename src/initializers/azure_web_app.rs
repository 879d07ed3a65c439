// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Cloud role name for applications hosted on App Service.

use crate::context::set_if_empty;
use crate::error::TelemetryError;
use crate::types::TelemetryItem;

use super::TelemetryInitializer;

/// Environment variable App Service sets to the site's host name.
pub const WEBSITE_HOSTNAME_VAR: &str = "WEBSITE_HOSTNAME";

const APP_SERVICE_SUFFIX: &str = ".azurewebsites.net";

/// Sets `cloud.role_name` from `WEBSITE_HOSTNAME`, minus the
/// `.azurewebsites.net` suffix. No-op outside App Service.
#[derive(Debug, Clone, Default)]
pub struct AzureWebAppRoleEnvironmentInitializer {
    role_name: Option<String>,
}

impl AzureWebAppRoleEnvironmentInitializer {
    /// Read the host name from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the host name through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let role_name = lookup(WEBSITE_HOSTNAME_VAR).and_then(|host| {
            let host = host.trim();
            let lower = host.to_ascii_lowercase();
            let name = if lower.ends_with(APP_SERVICE_SUFFIX) {
                &host[..host.len() - APP_SERVICE_SUFFIX.len()]
            } else {
                host
            };
            (!name.is_empty()).then(|| name.to_string())
        });
        Self { role_name }
    }

    pub fn role_name(&self) -> Option<&str> {
        self.role_name.as_deref()
    }
}

impl TelemetryInitializer for AzureWebAppRoleEnvironmentInitializer {
    fn name(&self) -> &'static str {
        "AzureWebAppRoleEnvironment"
    }

    fn initialize(&self, item: &mut TelemetryItem) -> Result<(), TelemetryError> {
        if let Some(role_name) = &self.role_name {
            set_if_empty(&mut item.context_mut().cloud.role_name, role_name.as_str());
        }
        Ok(())
    }
}
