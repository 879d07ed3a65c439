// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Populates `user.user_agent` from the `User-Agent` header.

use crate::context::{is_set, set_if_empty};
use crate::error::TelemetryError;
use crate::http::{header_names, HttpRequest};
use crate::types::{RequestTelemetry, TelemetryItem};

use super::WebTelemetryInitializer;

#[derive(Debug, Clone, Copy, Default)]
pub struct UserAgentInitializer;

impl WebTelemetryInitializer for UserAgentInitializer {
    fn name(&self) -> &'static str {
        "UserAgent"
    }

    fn on_initialize_telemetry(
        &self,
        request: &HttpRequest,
        _request_telemetry: &mut RequestTelemetry,
        item: &mut TelemetryItem,
    ) -> Result<(), TelemetryError> {
        let user = &mut item.context_mut().user;
        if is_set(&user.user_agent) {
            return Ok(());
        }

        if let Some(agent) = request.header(header_names::USER_AGENT) {
            set_if_empty(&mut user.user_agent, agent);
        }
        Ok(())
    }
}
