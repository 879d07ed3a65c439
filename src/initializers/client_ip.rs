// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Populates `location.ip` from a forwarding header or the remote address.

use std::net::{IpAddr, SocketAddr};

use crate::context::{is_set, set_if_empty};
use crate::diagnostics::{EventSource, SdkEvent};
use crate::error::TelemetryError;
use crate::http::{header_names, HttpRequest};
use crate::types::{RequestTelemetry, TelemetryItem};

use super::WebTelemetryInitializer;

/// Resolves the client IP from the configured headers, in order.
///
/// For each header the first entry (split on any of the separator
/// characters) is taken, a port suffix is stripped, and the value must parse
/// as an IP address. When no header yields an address the connection's
/// remote address is used. The resolved IP is cached on the request
/// telemetry.
#[derive(Debug, Clone)]
pub struct ClientIpHeaderInitializer {
    header_names: Vec<String>,
    separators: String,
    events: EventSource,
}

impl Default for ClientIpHeaderInitializer {
    fn default() -> Self {
        Self::new(EventSource::new())
    }
}

impl ClientIpHeaderInitializer {
    pub fn new(events: EventSource) -> Self {
        Self {
            header_names: vec![header_names::X_FORWARDED_FOR.to_string()],
            separators: ",".to_string(),
            events,
        }
    }

    /// Replace the headers inspected for the client IP.
    pub fn with_header_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.header_names = names.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the characters separating entries within a header.
    pub fn with_separators(mut self, separators: impl Into<String>) -> Self {
        self.separators = separators.into();
        self
    }

    pub fn header_names(&self) -> &[String] {
        &self.header_names
    }

    fn first_ip(&self, header_value: &str) -> Option<String> {
        let first = header_value
            .split(|c: char| self.separators.contains(c))
            .map(str::trim)
            .find(|entry| !entry.is_empty())?;
        parse_ip(first).map(|ip| ip.to_string())
    }

    fn resolve(&self, request: &HttpRequest) -> Option<String> {
        self.header_names
            .iter()
            .filter_map(|name| request.header(name))
            .find_map(|value| self.first_ip(value))
            .or_else(|| request.remote_addr.map(|ip| ip.to_string()))
    }
}

/// Parse an address that may carry a port (`1.2.3.4:80`, `[::1]:443`).
fn parse_ip(value: &str) -> Option<IpAddr> {
    if let Ok(ip) = value.parse::<IpAddr>() {
        return Some(ip);
    }
    if let Ok(socket) = value.parse::<SocketAddr>() {
        return Some(socket.ip());
    }
    value
        .trim_start_matches('[')
        .trim_end_matches(']')
        .parse::<IpAddr>()
        .ok()
}

impl WebTelemetryInitializer for ClientIpHeaderInitializer {
    fn name(&self) -> &'static str {
        "ClientIpHeader"
    }

    fn on_initialize_telemetry(
        &self,
        request: &HttpRequest,
        request_telemetry: &mut RequestTelemetry,
        item: &mut TelemetryItem,
    ) -> Result<(), TelemetryError> {
        if is_set(&item.context().location.ip) {
            self.events.emit(SdkEvent::ClientIpAlreadySet);
            return Ok(());
        }

        if !is_set(&request_telemetry.context.location.ip) {
            if let Some(ip) = self.resolve(request) {
                set_if_empty(&mut request_telemetry.context.location.ip, ip);
            }
        }

        if let Some(ip) = request_telemetry.context.location.ip.as_deref() {
            set_if_empty(&mut item.context_mut().location.ip, ip);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::initializers::test_support::scoped_with_request;
    use crate::initializers::TelemetryInitializer;
    use crate::types::EventTelemetry;

    fn run(initializer: ClientIpHeaderInitializer, request: HttpRequest) -> TelemetryItem {
        let (scoped, _) = scoped_with_request(initializer, request, RequestTelemetry::new());
        let mut item: TelemetryItem = EventTelemetry::new("e").into();
        scoped.initialize(&mut item).unwrap();
        item
    }

    #[test]
    fn test_takes_first_forwarded_entry() {
        let item = run(
            ClientIpHeaderInitializer::default(),
            HttpRequest::new("GET", "/").with_header("X-Forwarded-For", "10.0.0.1, 10.0.0.2"),
        );
        assert_eq!(item.context().location.ip.as_deref(), Some("10.0.0.1"));
    }

    #[test]
    fn test_strips_port() {
        let item = run(
            ClientIpHeaderInitializer::default(),
            HttpRequest::new("GET", "/").with_header("X-Forwarded-For", "10.0.0.1:5000"),
        );
        assert_eq!(item.context().location.ip.as_deref(), Some("10.0.0.1"));

        let item = run(
            ClientIpHeaderInitializer::default(),
            HttpRequest::new("GET", "/").with_header("X-Forwarded-For", "[::1]:443"),
        );
        assert_eq!(item.context().location.ip.as_deref(), Some("::1"));
    }

    #[test]
    fn test_invalid_header_falls_back_to_remote_addr() {
        let item = run(
            ClientIpHeaderInitializer::default(),
            HttpRequest::new("GET", "/")
                .with_header("X-Forwarded-For", "not-an-ip")
                .with_remote_addr("192.168.1.7".parse().unwrap()),
        );
        assert_eq!(item.context().location.ip.as_deref(), Some("192.168.1.7"));
    }

    #[test]
    fn test_custom_headers_and_separators() {
        let initializer = ClientIpHeaderInitializer::default()
            .with_header_names(["X-Real-IP", "X-Forwarded-For"])
            .with_separators(";");
        assert_eq!(initializer.header_names().len(), 2);

        let item = run(
            initializer,
            HttpRequest::new("GET", "/")
                .with_header("X-Real-IP", "8.8.8.8;1.1.1.1")
                .with_header("X-Forwarded-For", "9.9.9.9"),
        );
        assert_eq!(item.context().location.ip.as_deref(), Some("8.8.8.8"));
    }

    #[test]
    fn test_does_not_override_existing_ip() {
        let events = EventSource::recording();
        let (scoped, _) = scoped_with_request(
            ClientIpHeaderInitializer::new(events.clone()),
            HttpRequest::new("GET", "/").with_header("X-Forwarded-For", "10.0.0.1"),
            RequestTelemetry::new(),
        );
        let mut event = EventTelemetry::new("e");
        event.context.location.ip = Some("127.0.0.1".to_string());
        let mut item: TelemetryItem = event.into();

        scoped.initialize(&mut item).unwrap();

        assert_eq!(item.context().location.ip.as_deref(), Some("127.0.0.1"));
        assert!(events.has_event(5));
    }

    #[test]
    fn test_no_source_leaves_ip_unset() {
        let item = run(ClientIpHeaderInitializer::default(), HttpRequest::new("GET", "/"));
        assert!(item.context().location.ip.is_none());
    }
}
