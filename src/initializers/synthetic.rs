// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Marks traffic generated by availability tests as synthetic.

use crate::context::{is_set, set_if_empty};
use crate::diagnostics::{EventSource, SdkEvent};
use crate::error::TelemetryError;
use crate::http::{header_names, HttpRequest};
use crate::types::{RequestTelemetry, TelemetryItem};

use super::WebTelemetryInitializer;

/// Value written to `operation.synthetic_source` for availability tests.
pub const SYNTHETIC_SOURCE_NAME: &str = "Application Insights Availability Monitoring";

/// Sets `operation.synthetic_source` when both the run-id and location
/// headers of an availability test are present. The run id also becomes the
/// session id and `<location>_<run id>` the user id, when those are unset.
#[derive(Debug, Clone, Default)]
pub struct SyntheticInitializer {
    events: EventSource,
}

impl SyntheticInitializer {
    pub fn new(events: EventSource) -> Self {
        Self { events }
    }
}

fn non_empty<'a>(request: &'a HttpRequest, name: &str) -> Option<&'a str> {
    request.header(name).map(str::trim).filter(|v| !v.is_empty())
}

impl WebTelemetryInitializer for SyntheticInitializer {
    fn name(&self) -> &'static str {
        "Synthetic"
    }

    fn on_initialize_telemetry(
        &self,
        request: &HttpRequest,
        _request_telemetry: &mut RequestTelemetry,
        item: &mut TelemetryItem,
    ) -> Result<(), TelemetryError> {
        if is_set(&item.context().operation.synthetic_source) {
            self.events.emit(SdkEvent::SyntheticSourceAlreadySet);
            return Ok(());
        }

        let run_id = non_empty(request, header_names::SYNTHETIC_TEST_RUN_ID);
        let location = non_empty(request, header_names::SYNTHETIC_TEST_LOCATION);
        let (Some(run_id), Some(location)) = (run_id, location) else {
            return Ok(());
        };

        let context = item.context_mut();
        context.operation.synthetic_source = Some(SYNTHETIC_SOURCE_NAME.to_string());
        set_if_empty(&mut context.user.id, format!("{location}_{run_id}"));
        set_if_empty(&mut context.session.id, run_id);
        Ok(())
    }
}
