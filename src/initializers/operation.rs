// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Propagates the request's operation name and id to every item of the
//! same request.

use crate::context::{is_set, set_if_empty};
use crate::error::TelemetryError;
use crate::http::HttpRequest;
use crate::types::{RequestTelemetry, TelemetryItem};

use super::WebTelemetryInitializer;

/// Sets `operation.name` from the request name.
///
/// When the request has no name yet it is derived as `METHOD path` and
/// stored on the request telemetry. A request item without a name gets the
/// same value.
#[derive(Debug, Clone, Copy, Default)]
pub struct OperationNameInitializer;

fn request_name(request: &HttpRequest, request_telemetry: &mut RequestTelemetry) -> Option<String> {
    if !is_set(&request_telemetry.name) {
        let method = request.method.trim();
        let path = request.path.trim();
        if method.is_empty() && path.is_empty() {
            return None;
        }
        let derived = format!("{} {}", method.to_ascii_uppercase(), path);
        request_telemetry.name = Some(derived.trim().to_string());
    }
    request_telemetry.name.clone()
}

impl WebTelemetryInitializer for OperationNameInitializer {
    fn name(&self) -> &'static str {
        "OperationName"
    }

    fn on_initialize_telemetry(
        &self,
        request: &HttpRequest,
        request_telemetry: &mut RequestTelemetry,
        item: &mut TelemetryItem,
    ) -> Result<(), TelemetryError> {
        if is_set(&item.context().operation.name) {
            if let Some(req) = item.as_request_mut() {
                if !is_set(&req.name) {
                    req.name = req.context.operation.name.clone();
                }
            }
            return Ok(());
        }

        let Some(name) = request_name(request, request_telemetry) else {
            return Ok(());
        };

        set_if_empty(&mut item.context_mut().operation.name, name.as_str());
        if let Some(req) = item.as_request_mut() {
            set_if_empty(&mut req.name, name);
        }
        Ok(())
    }
}

/// Sets `operation.id` to the request id; child items also get the request
/// id as `operation.parent_id`.
#[derive(Debug, Clone, Copy, Default)]
pub struct OperationIdInitializer;

impl WebTelemetryInitializer for OperationIdInitializer {
    fn name(&self) -> &'static str {
        "OperationId"
    }

    fn on_initialize_telemetry(
        &self,
        _request: &HttpRequest,
        request_telemetry: &mut RequestTelemetry,
        item: &mut TelemetryItem,
    ) -> Result<(), TelemetryError> {
        let operation_id = match request_telemetry.context.operation.id.as_deref() {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => request_telemetry.id.clone(),
        };
        set_if_empty(
            &mut request_telemetry.context.operation.id,
            operation_id.as_str(),
        );

        let is_request = item.as_request().is_some();
        let operation = &mut item.context_mut().operation;
        set_if_empty(&mut operation.id, operation_id);
        if !is_request {
            set_if_empty(&mut operation.parent_id, request_telemetry.id.as_str());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::initializers::test_support::scoped_with_request;
    use crate::initializers::TelemetryInitializer;
    use crate::types::{DependencyTelemetry, RequestTelemetry};

    #[test]
    fn test_derives_operation_name_from_method_and_path() {
        let (initializer, context) = scoped_with_request(
            OperationNameInitializer,
            HttpRequest::new("get", "/orders/42"),
            RequestTelemetry::new(),
        );
        let mut item: TelemetryItem = DependencyTelemetry::new("db").into();

        initializer.initialize(&mut item).unwrap();

        assert_eq!(item.context().operation.name.as_deref(), Some("GET /orders/42"));
        let cached = context.request_telemetry().unwrap();
        assert_eq!(cached.name.as_deref(), Some("GET /orders/42"));
    }

    #[test]
    fn test_uses_existing_request_name() {
        let (initializer, _) = scoped_with_request(
            OperationNameInitializer,
            HttpRequest::new("GET", "/home/index"),
            RequestTelemetry::named("GET Home/Index"),
        );
        let mut item: TelemetryItem = DependencyTelemetry::new("db").into();

        initializer.initialize(&mut item).unwrap();

        assert_eq!(item.context().operation.name.as_deref(), Some("GET Home/Index"));
    }

    #[test]
    fn test_names_request_item() {
        let request_telemetry = RequestTelemetry::new();
        let (initializer, _) = scoped_with_request(
            OperationNameInitializer,
            HttpRequest::new("POST", "/login"),
            request_telemetry.clone(),
        );
        let mut item = TelemetryItem::Request(request_telemetry);

        initializer.initialize(&mut item).unwrap();

        assert_eq!(item.as_request().unwrap().name.as_deref(), Some("POST /login"));
        assert_eq!(item.context().operation.name.as_deref(), Some("POST /login"));
    }

    #[test]
    fn test_does_not_override_operation_name() {
        let (initializer, _) = scoped_with_request(
            OperationNameInitializer,
            HttpRequest::new("GET", "/"),
            RequestTelemetry::new(),
        );
        let mut dep = DependencyTelemetry::new("db");
        dep.context.operation.name = Some("Custom".to_string());
        let mut item: TelemetryItem = dep.into();

        initializer.initialize(&mut item).unwrap();

        assert_eq!(item.context().operation.name.as_deref(), Some("Custom"));
    }

    #[test]
    fn test_operation_id_propagates_to_children() {
        let request_telemetry = RequestTelemetry::new();
        let request_id = request_telemetry.id.clone();
        let (initializer, _) = scoped_with_request(
            OperationIdInitializer,
            HttpRequest::new("GET", "/"),
            request_telemetry,
        );
        let mut item: TelemetryItem = DependencyTelemetry::new("db").into();

        initializer.initialize(&mut item).unwrap();

        assert_eq!(item.context().operation.id.as_deref(), Some(request_id.as_str()));
        assert_eq!(
            item.context().operation.parent_id.as_deref(),
            Some(request_id.as_str())
        );
    }

    #[test]
    fn test_request_item_gets_own_id_without_parent() {
        let request_telemetry = RequestTelemetry::new();
        let request_id = request_telemetry.id.clone();
        let (initializer, _) = scoped_with_request(
            OperationIdInitializer,
            HttpRequest::new("GET", "/"),
            request_telemetry.clone(),
        );
        let mut item = TelemetryItem::Request(request_telemetry);

        initializer.initialize(&mut item).unwrap();

        assert_eq!(item.context().operation.id.as_deref(), Some(request_id.as_str()));
        assert!(item.context().operation.parent_id.is_none());
    }

    #[test]
    fn test_incoming_operation_id_is_reused() {
        let mut request_telemetry = RequestTelemetry::new();
        request_telemetry.context.operation.id = Some("upstream-op".to_string());
        let (initializer, _) = scoped_with_request(
            OperationIdInitializer,
            HttpRequest::new("GET", "/"),
            request_telemetry,
        );
        let mut item: TelemetryItem = DependencyTelemetry::new("db").into();

        initializer.initialize(&mut item).unwrap();

        assert_eq!(item.context().operation.id.as_deref(), Some("upstream-op"));
    }
}
