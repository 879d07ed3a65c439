// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Stamps the application version on every item.

use crate::context::set_if_empty;
use crate::diagnostics::{EventSource, SdkEvent};
use crate::error::TelemetryError;
use crate::types::TelemetryItem;

use super::TelemetryInitializer;

/// Sets `component.version` from the configured application version.
#[derive(Debug, Clone, Default)]
pub struct ComponentVersionInitializer {
    version: Option<String>,
}

impl ComponentVersionInitializer {
    pub fn new(version: Option<String>, events: &EventSource) -> Self {
        let version = version.filter(|v| !v.trim().is_empty());
        if version.is_none() {
            events.emit(SdkEvent::ComponentVersionUnavailable);
        }
        Self { version }
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }
}

impl TelemetryInitializer for ComponentVersionInitializer {
    fn name(&self) -> &'static str {
        "ComponentVersion"
    }

    fn initialize(&self, item: &mut TelemetryItem) -> Result<(), TelemetryError> {
        if let Some(version) = &self.version {
            set_if_empty(&mut item.context_mut().component.version, version.as_str());
        }
        Ok(())
    }
}
