// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

use crate::context::set_if_empty;
use crate::error::TelemetryError;
use crate::types::TelemetryItem;

use super::TelemetryInitializer;

const SDK_VERSION_PREFIX: &str = "rustweb:";

/// SDK identifier stamped into `internal.sdk_version`.
pub fn sdk_version() -> String {
    format!("{}{}", SDK_VERSION_PREFIX, crate::VERSION)
}

/// Sets `internal.sdk_version`. The only initializer of a default
/// configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct SdkVersionInitializer;

impl TelemetryInitializer for SdkVersionInitializer {
    fn name(&self) -> &'static str {
        "SdkVersion"
    }

    fn initialize(&self, item: &mut TelemetryItem) -> Result<(), TelemetryError> {
        set_if_empty(&mut item.context_mut().internal.sdk_version, sdk_version());
        Ok(())
    }
}
