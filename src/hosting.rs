// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Request lifecycle hooks for the host.
//!
//! The host calls [`RequestTracker::begin`] when a request arrives and keeps
//! the returned [`RequestOperation`] for the duration of the request. While
//! it is alive the request is ambient on the current thread, so every item
//! tracked from request code is enriched from it. The request telemetry is
//! submitted exactly once: on [`complete`](RequestOperation::complete),
//! [`fail`](RequestOperation::fail), or drop.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, warn};

use crate::client::TelemetryClient;
use crate::context::set_if_empty;
use crate::http::{ContextScope, HttpContext, HttpRequest, ThreadLocalHttpContextAccessor};
use crate::types::{ExceptionTelemetry, HandledAt, RequestTelemetry, SeverityLevel};

/// Status reported when a request ends without an explicit status.
pub const UNFINISHED_STATUS: u16 = 500;

/// Starts request operations against a client.
#[derive(Debug, Clone)]
pub struct RequestTracker {
    client: Arc<TelemetryClient>,
    accessor: ThreadLocalHttpContextAccessor,
}

impl RequestTracker {
    pub fn new(client: Arc<TelemetryClient>) -> Self {
        Self {
            client,
            accessor: ThreadLocalHttpContextAccessor::new(),
        }
    }

    /// Create the request telemetry for `request` and make it ambient on
    /// the current thread.
    pub fn begin(&self, request: HttpRequest) -> RequestOperation {
        let mut telemetry = RequestTelemetry::new();
        telemetry.http_method = Some(request.method.clone());
        telemetry.url = Some(request.path.clone());

        let context = Arc::new(HttpContext::with_request_telemetry(request, telemetry));
        let scope = self.accessor.enter(context.clone());
        debug!(method = %context.request().method, path = %context.request().path, "Request started");

        RequestOperation {
            client: self.client.clone(),
            context,
            scope: Some(scope),
            started: Instant::now(),
            completed: false,
        }
    }
}

/// One in-flight request.
#[must_use = "the request is submitted when the operation completes or drops"]
pub struct RequestOperation {
    client: Arc<TelemetryClient>,
    context: Arc<HttpContext>,
    scope: Option<ContextScope>,
    started: Instant,
    completed: bool,
}

impl RequestOperation {
    pub fn context(&self) -> &Arc<HttpContext> {
        &self.context
    }

    /// Id of the request telemetry.
    pub fn request_id(&self) -> Option<String> {
        self.context.with_request_telemetry_mut(|t| t.id.clone())
    }

    /// Finish the request with `status` and submit it.
    pub fn complete(mut self, status: u16) {
        self.finish(status);
    }

    /// Report an error that escaped request code, then finish the request
    /// as failed.
    pub fn fail(mut self, err: &(dyn std::error::Error + 'static)) {
        let mut exception = ExceptionTelemetry::from_error(err, HandledAt::Platform);
        exception.severity_level = Some(SeverityLevel::Error);
        self.client.track_exception(exception);
        self.finish(UNFINISHED_STATUS);
    }

    fn finish(&mut self, status: u16) {
        if self.completed {
            return;
        }
        self.completed = true;

        let duration = self.started.elapsed();
        let request = self.context.request();
        let telemetry = self.context.with_request_telemetry_mut(|t| {
            t.duration = duration;
            t.response_code = Some(status.to_string());
            t.success = Some(status < 400);
            set_if_empty(&mut t.http_method, request.method.as_str());
            set_if_empty(&mut t.url, request.path.as_str());
            t.clone()
        });

        if let Some(telemetry) = telemetry {
            debug!(status, duration_ms = duration.as_millis() as u64, "Request completed");
            self.client.track_request(telemetry);
        }

        // Leave the ambient scope only after the request item was enriched.
        self.scope.take();
    }
}

impl Drop for RequestOperation {
    fn drop(&mut self) {
        if !self.completed {
            warn!(path = %self.context.request().path, "Request dropped without completion");
            self.finish(UNFINISHED_STATUS);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::InMemoryChannel;
    use crate::configuration::TelemetryConfiguration;
    use crate::diagnostics::EventSource;
    use crate::http::HttpContextAccessor;
    use crate::initializers::default_web_initializers;
    use crate::types::TelemetryItem;

    fn tracker() -> (RequestTracker, Arc<InMemoryChannel>) {
        let channel = Arc::new(InMemoryChannel::new());
        let mut config = TelemetryConfiguration::with_channel(channel.clone());
        config.telemetry_initializers.extend(default_web_initializers(
            Arc::new(ThreadLocalHttpContextAccessor::new()),
            &EventSource::new(),
        ));
        let client = Arc::new(TelemetryClient::new(Arc::new(config)));
        (RequestTracker::new(client), channel)
    }

    fn requests(items: &[TelemetryItem]) -> Vec<&RequestTelemetry> {
        items.iter().filter_map(|i| i.as_request()).collect()
    }

    #[test]
    fn test_complete_submits_once_with_status() {
        let (tracker, channel) = tracker();

        let operation = tracker.begin(HttpRequest::new("get", "/orders"));
        operation.complete(404);

        let items = channel.drain();
        let requests = requests(&items);
        assert_eq!(requests.len(), 1);
        let request = requests[0];
        assert_eq!(request.response_code.as_deref(), Some("404"));
        assert_eq!(request.success, Some(false));
        assert_eq!(request.name.as_deref(), Some("GET /orders"));
        assert_eq!(request.context.operation.id.as_deref(), Some(request.id.as_str()));
    }

    #[test]
    fn test_scope_ends_with_operation() {
        let (tracker, _channel) = tracker();
        let accessor = ThreadLocalHttpContextAccessor::new();

        let operation = tracker.begin(HttpRequest::new("GET", "/"));
        assert!(accessor.http_context().is_some());
        operation.complete(200);

        assert!(accessor.http_context().is_none());
    }

    #[test]
    fn test_child_items_are_correlated() {
        let (tracker, channel) = tracker();

        let operation = tracker.begin(
            HttpRequest::new("POST", "/checkout")
                .with_header("Cookie", "ai_session=s1|2015-04-10T17:11:38.378Z"),
        );
        operation.client.track_event("checkout-started");
        let request_id = operation.request_id().unwrap();
        operation.complete(201);

        let items = channel.drain();
        let event = items
            .iter()
            .find(|i| matches!(i, TelemetryItem::Event(_)))
            .unwrap();
        assert_eq!(event.context().operation.id.as_deref(), Some(request_id.as_str()));
        assert_eq!(event.context().operation.parent_id.as_deref(), Some(request_id.as_str()));
        assert_eq!(event.context().session.id.as_deref(), Some("s1"));
        assert_eq!(event.context().operation.name.as_deref(), Some("POST /checkout"));

        let request = requests(&items)[0];
        assert_eq!(request.context.session.id.as_deref(), Some("s1"));
        assert_eq!(request.success, Some(true));
    }

    #[test]
    fn test_fail_tracks_platform_exception() {
        let (tracker, channel) = tracker();
        let err = std::io::Error::new(std::io::ErrorKind::Other, "handler panicked");

        tracker.begin(HttpRequest::new("GET", "/boom")).fail(&err);

        let items = channel.drain();
        let exception = items.iter().find_map(|i| i.as_exception()).unwrap();
        assert_eq!(exception.handled_at, HandledAt::Platform);
        assert_eq!(exception.message, "handler panicked");
        assert_eq!(requests(&items)[0].response_code.as_deref(), Some("500"));
    }

    #[test]
    fn test_drop_submits_unfinished_request() {
        let (tracker, channel) = tracker();
        {
            let _operation = tracker.begin(HttpRequest::new("GET", "/slow"));
        }

        let items = channel.drain();
        let requests = requests(&items);
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].success, Some(false));
    }
}
