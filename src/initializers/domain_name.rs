// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Role instance derived from the machine's host and domain names.

use std::io;
use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::context::{is_set, TelemetryContext};
use crate::error::TelemetryError;
use crate::types::TelemetryItem;

use super::{ContextInitializer, TelemetryInitializer};

/// Source of the local host and domain names.
pub trait HostInfo: Send + Sync {
    fn host_name(&self) -> io::Result<String>;

    /// The machine's domain name; empty when the machine has none.
    fn domain_name(&self) -> io::Result<String>;
}

/// Host information from the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemHostInfo;

impl HostInfo for SystemHostInfo {
    fn host_name(&self) -> io::Result<String> {
        hostname::get()?
            .into_string()
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "host name is not valid UTF-8"))
    }

    #[cfg(target_os = "linux")]
    fn domain_name(&self) -> io::Result<String> {
        match std::fs::read_to_string("/proc/sys/kernel/domainname") {
            Ok(raw) => {
                let domain = raw.trim();
                if domain == "(none)" {
                    Ok(String::new())
                } else {
                    Ok(domain.to_string())
                }
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(String::new()),
            Err(err) => Err(err),
        }
    }

    #[cfg(not(target_os = "linux"))]
    fn domain_name(&self) -> io::Result<String> {
        Ok(String::new())
    }
}

/// `host` when it already ends with `domain` (ASCII case-insensitive),
/// otherwise `host.domain`.
fn qualified_name(host: &str, domain: &str) -> String {
    if host
        .to_ascii_lowercase()
        .ends_with(&domain.to_ascii_lowercase())
    {
        host.to_string()
    } else {
        format!("{host}.{domain}")
    }
}

/// Populates `device.role_instance` with the fully qualified machine name.
///
/// The name is computed once per initializer, on first use; concurrent first
/// callers block until it is available. Lookup failures are returned to the
/// caller and retried on the next call.
pub struct DomainNameRoleInstanceInitializer {
    host: Arc<dyn HostInfo>,
    role_instance: OnceCell<String>,
}

impl DomainNameRoleInstanceInitializer {
    pub fn new() -> Self {
        Self::with_host_info(Arc::new(SystemHostInfo))
    }

    pub fn with_host_info(host: Arc<dyn HostInfo>) -> Self {
        Self {
            host,
            role_instance: OnceCell::new(),
        }
    }

    /// The computed role instance name.
    pub fn role_instance(&self) -> Result<&str, TelemetryError> {
        self.role_instance
            .get_or_try_init(|| {
                let host = self.host.host_name()?;
                let domain = self.host.domain_name()?;
                Ok::<_, TelemetryError>(qualified_name(&host, &domain))
            })
            .map(String::as_str)
    }

    fn apply(&self, context: &mut TelemetryContext) -> Result<(), TelemetryError> {
        if is_set(&context.device.role_instance) {
            return Ok(());
        }
        let name = self.role_instance()?;
        context.device.role_instance = Some(name.to_string());
        Ok(())
    }
}

impl Default for DomainNameRoleInstanceInitializer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DomainNameRoleInstanceInitializer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DomainNameRoleInstanceInitializer")
            .field("role_instance", &self.role_instance.get())
            .finish()
    }
}

impl ContextInitializer for DomainNameRoleInstanceInitializer {
    fn name(&self) -> &'static str {
        "DomainNameRoleInstance"
    }

    fn initialize(&self, context: &mut TelemetryContext) -> Result<(), TelemetryError> {
        self.apply(context)
    }
}

impl TelemetryInitializer for DomainNameRoleInstanceInitializer {
    fn name(&self) -> &'static str {
        "DomainNameRoleInstance"
    }

    fn initialize(&self, item: &mut TelemetryItem) -> Result<(), TelemetryError> {
        self.apply(item.context_mut())
    }
}
