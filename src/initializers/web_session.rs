// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Populates `session.id` from the `ai_session` tracking cookie.
//!
//! Cookie format: `<id>|<acquisition date>|<renewal date>`. Only the id is
//! used. The parsed id is cached on the request telemetry so the cookie is
//! read once per request.

use crate::context::{is_set, set_if_empty};
use crate::diagnostics::{EventSource, SdkEvent};
use crate::error::TelemetryError;
use crate::http::HttpRequest;
use crate::types::{RequestTelemetry, TelemetryItem};

use super::WebTelemetryInitializer;

/// Name of the session tracking cookie.
pub const WEB_SESSION_COOKIE: &str = "ai_session";

#[derive(Debug, Clone, Default)]
pub struct WebSessionInitializer {
    events: EventSource,
}

impl WebSessionInitializer {
    pub fn new(events: EventSource) -> Self {
        Self { events }
    }

    fn update_request_from_cookie(request_telemetry: &mut RequestTelemetry, request: &HttpRequest) {
        let Some(value) = request.cookie(WEB_SESSION_COOKIE) else {
            return;
        };
        if value.is_empty() {
            return;
        }
        if let Some(id) = value.split('|').next() {
            set_if_empty(&mut request_telemetry.context.session.id, id);
        }
    }
}

impl WebTelemetryInitializer for WebSessionInitializer {
    fn name(&self) -> &'static str {
        "WebSession"
    }

    fn on_initialize_telemetry(
        &self,
        request: &HttpRequest,
        request_telemetry: &mut RequestTelemetry,
        item: &mut TelemetryItem,
    ) -> Result<(), TelemetryError> {
        if is_set(&item.context().session.id) {
            self.events.emit(SdkEvent::SessionIdAlreadySet);
            return Ok(());
        }

        if !is_set(&request_telemetry.context.session.id) {
            Self::update_request_from_cookie(request_telemetry, request);
        }

        if let Some(id) = request_telemetry.context.session.id.as_deref() {
            set_if_empty(&mut item.context_mut().session.id, id);
        }
        Ok(())
    }
}
