// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Populates `user.id` and `user.acquisition_date` from the `ai_user` cookie.
//!
//! Cookie format: `<id>|<acquisition date>`. Both segments are required and
//! the date must parse; otherwise the whole cookie is ignored and a
//! malformed-cookie diagnostic is emitted.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::context::{is_set, set_if_empty};
use crate::diagnostics::{EventSource, SdkEvent};
use crate::error::TelemetryError;
use crate::http::HttpRequest;
use crate::types::{RequestTelemetry, TelemetryItem};

use super::WebTelemetryInitializer;

/// Name of the user tracking cookie.
pub const WEB_USER_COOKIE: &str = "ai_user";

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

/// Parse an ISO-8601 date, assuming UTC when no offset is given.
pub fn parse_acquisition_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[derive(Debug, Clone, Default)]
pub struct WebUserInitializer {
    events: EventSource,
}

impl WebUserInitializer {
    pub fn new(events: EventSource) -> Self {
        Self { events }
    }

    fn update_request_from_cookie(
        &self,
        request_telemetry: &mut RequestTelemetry,
        request: &HttpRequest,
    ) {
        let Some(value) = request.cookie(WEB_USER_COOKIE) else {
            return;
        };

        let parts: Vec<&str> = value.split('|').collect();
        let parsed = match parts.as_slice() {
            [id, date, ..] if !value.is_empty() => {
                parse_acquisition_date(date).map(|date| (*id, date))
            }
            _ => None,
        };

        match parsed {
            Some((id, acquisition_date)) => {
                let user = &mut request_telemetry.context.user;
                set_if_empty(&mut user.id, id);
                user.acquisition_date = Some(acquisition_date);
            }
            None => self.events.emit(SdkEvent::MalformedCookie {
                name: WEB_USER_COOKIE.to_string(),
                value: value.to_string(),
            }),
        }
    }
}

impl WebTelemetryInitializer for WebUserInitializer {
    fn name(&self) -> &'static str {
        "WebUser"
    }

    fn on_initialize_telemetry(
        &self,
        request: &HttpRequest,
        request_telemetry: &mut RequestTelemetry,
        item: &mut TelemetryItem,
    ) -> Result<(), TelemetryError> {
        if is_set(&item.context().user.id) {
            self.events.emit(SdkEvent::UserIdAlreadySet);
            return Ok(());
        }

        if !is_set(&request_telemetry.context.user.id) {
            self.update_request_from_cookie(request_telemetry, request);
        }

        let source = &request_telemetry.context.user;
        let target = &mut item.context_mut().user;
        if let Some(id) = source.id.as_deref() {
            set_if_empty(&mut target.id, id);
        }
        if target.acquisition_date.is_none() {
            target.acquisition_date = source.acquisition_date;
        }
        Ok(())
    }
}
