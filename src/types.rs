// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Telemetry item types.
//!
//! This module defines the records that flow through the pipeline: requests,
//! dependencies, exceptions, traces and custom events, plus the
//! [`TelemetryItem`] variant that wraps them.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

use crate::context::TelemetryContext;

// ============================================================================
// Severity
// ============================================================================

/// Severity of a trace or exception.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum SeverityLevel {
    Verbose,
    Information,
    Warning,
    Error,
    Critical,
}

impl SeverityLevel {
    /// Map a `tracing` level onto a telemetry severity.
    pub fn from_level(level: &tracing::Level) -> Self {
        match *level {
            tracing::Level::ERROR => Self::Error,
            tracing::Level::WARN => Self::Warning,
            tracing::Level::INFO => Self::Information,
            _ => Self::Verbose,
        }
    }
}

/// Where an exception was observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HandledAt {
    /// Reported explicitly by application code.
    User,
    /// Caught by the hosting pipeline.
    Platform,
    /// Not handled by anything.
    Unhandled,
}

// ============================================================================
// Item Types
// ============================================================================

/// The one item describing a whole inbound request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestTelemetry {
    pub context: TelemetryContext,
    pub timestamp: DateTime<Utc>,
    #[serde(serialize_with = "serialize_duration")]
    pub duration: Duration,
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
}

impl RequestTelemetry {
    /// Create a request starting now with a fresh id.
    pub fn new() -> Self {
        Self {
            context: TelemetryContext::default(),
            timestamp: Utc::now(),
            duration: Duration::ZERO,
            id: uuid::Uuid::new_v4().simple().to_string(),
            name: None,
            url: None,
            http_method: None,
            response_code: None,
            success: None,
        }
    }

    /// Create a named request.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::new()
        }
    }
}

impl Default for RequestTelemetry {
    fn default() -> Self {
        Self::new()
    }
}

/// A call from the application to an external component (database, HTTP).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyTelemetry {
    pub context: TelemetryContext,
    pub timestamp: DateTime<Utc>,
    #[serde(serialize_with = "serialize_duration")]
    pub duration: Duration,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub dependency_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_code: Option<String>,
    pub success: bool,
}

impl DependencyTelemetry {
    /// Create a successful dependency call with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            context: TelemetryContext::default(),
            timestamp: Utc::now(),
            duration: Duration::ZERO,
            name: name.into(),
            target: None,
            data: None,
            dependency_type: None,
            result_code: None,
            success: true,
        }
    }
}

/// An error observed by the application or the host.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExceptionTelemetry {
    pub context: TelemetryContext,
    pub timestamp: DateTime<Utc>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exception_type: Option<String>,
    pub handled_at: HandledAt,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity_level: Option<SeverityLevel>,
}

impl ExceptionTelemetry {
    /// Create an exception record from an error value.
    pub fn from_error(err: &(dyn std::error::Error + 'static), handled_at: HandledAt) -> Self {
        Self {
            context: TelemetryContext::default(),
            timestamp: Utc::now(),
            message: err.to_string(),
            exception_type: None,
            handled_at,
            severity_level: None,
        }
    }

    /// Create an exception record from a message.
    pub fn new(message: impl Into<String>, handled_at: HandledAt) -> Self {
        Self {
            context: TelemetryContext::default(),
            timestamp: Utc::now(),
            message: message.into(),
            exception_type: None,
            handled_at,
            severity_level: None,
        }
    }
}

/// A log line.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceTelemetry {
    pub context: TelemetryContext,
    pub timestamp: DateTime<Utc>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity_level: Option<SeverityLevel>,
}

impl TraceTelemetry {
    pub fn new(message: impl Into<String>, severity: SeverityLevel) -> Self {
        Self {
            context: TelemetryContext::default(),
            timestamp: Utc::now(),
            message: message.into(),
            severity_level: Some(severity),
        }
    }
}

/// A named custom event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTelemetry {
    pub context: TelemetryContext,
    pub timestamp: DateTime<Utc>,
    pub name: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub metrics: BTreeMap<String, f64>,
}

impl EventTelemetry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            context: TelemetryContext::default(),
            timestamp: Utc::now(),
            name: name.into(),
            metrics: BTreeMap::new(),
        }
    }
}

// ============================================================================
// TelemetryItem
// ============================================================================

/// Kind tag of a [`TelemetryItem`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TelemetryKind {
    Request,
    Dependency,
    Exception,
    Trace,
    Event,
}

/// Any telemetry record that can be tracked.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "data")]
pub enum TelemetryItem {
    Request(RequestTelemetry),
    Dependency(DependencyTelemetry),
    Exception(ExceptionTelemetry),
    Trace(TraceTelemetry),
    Event(EventTelemetry),
}

impl TelemetryItem {
    /// The context attached to this item.
    pub fn context(&self) -> &TelemetryContext {
        match self {
            Self::Request(t) => &t.context,
            Self::Dependency(t) => &t.context,
            Self::Exception(t) => &t.context,
            Self::Trace(t) => &t.context,
            Self::Event(t) => &t.context,
        }
    }

    /// Mutable access to the context attached to this item.
    pub fn context_mut(&mut self) -> &mut TelemetryContext {
        match self {
            Self::Request(t) => &mut t.context,
            Self::Dependency(t) => &mut t.context,
            Self::Exception(t) => &mut t.context,
            Self::Trace(t) => &mut t.context,
            Self::Event(t) => &mut t.context,
        }
    }

    /// When the item was created (start time for timed kinds).
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::Request(t) => t.timestamp,
            Self::Dependency(t) => t.timestamp,
            Self::Exception(t) => t.timestamp,
            Self::Trace(t) => t.timestamp,
            Self::Event(t) => t.timestamp,
        }
    }

    /// Duration of timed kinds (requests and dependencies).
    pub fn duration(&self) -> Option<Duration> {
        match self {
            Self::Request(t) => Some(t.duration),
            Self::Dependency(t) => Some(t.duration),
            _ => None,
        }
    }

    pub fn kind(&self) -> TelemetryKind {
        match self {
            Self::Request(_) => TelemetryKind::Request,
            Self::Dependency(_) => TelemetryKind::Dependency,
            Self::Exception(_) => TelemetryKind::Exception,
            Self::Trace(_) => TelemetryKind::Trace,
            Self::Event(_) => TelemetryKind::Event,
        }
    }

    pub fn as_request(&self) -> Option<&RequestTelemetry> {
        match self {
            Self::Request(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_request_mut(&mut self) -> Option<&mut RequestTelemetry> {
        match self {
            Self::Request(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_dependency(&self) -> Option<&DependencyTelemetry> {
        match self {
            Self::Dependency(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_exception(&self) -> Option<&ExceptionTelemetry> {
        match self {
            Self::Exception(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_trace(&self) -> Option<&TraceTelemetry> {
        match self {
            Self::Trace(t) => Some(t),
            _ => None,
        }
    }
}

impl From<RequestTelemetry> for TelemetryItem {
    fn from(t: RequestTelemetry) -> Self {
        Self::Request(t)
    }
}

impl From<DependencyTelemetry> for TelemetryItem {
    fn from(t: DependencyTelemetry) -> Self {
        Self::Dependency(t)
    }
}

impl From<ExceptionTelemetry> for TelemetryItem {
    fn from(t: ExceptionTelemetry) -> Self {
        Self::Exception(t)
    }
}

impl From<TraceTelemetry> for TelemetryItem {
    fn from(t: TraceTelemetry) -> Self {
        Self::Trace(t)
    }
}

impl From<EventTelemetry> for TelemetryItem {
    fn from(t: EventTelemetry) -> Self {
        Self::Event(t)
    }
}

/// Render a duration in the backend's `d.hh:mm:ss.fffffff` form.
pub fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    let days = total_secs / 86_400;
    let hours = (total_secs % 86_400) / 3_600;
    let minutes = (total_secs % 3_600) / 60;
    let seconds = total_secs % 60;
    let ticks = duration.subsec_nanos() / 100;
    format!(
        "{}.{:02}:{:02}:{:02}.{:07}",
        days, hours, minutes, seconds, ticks
    )
}

fn serialize_duration<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_duration(*duration))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_from_level() {
        assert_eq!(SeverityLevel::from_level(&tracing::Level::ERROR), SeverityLevel::Error);
        assert_eq!(SeverityLevel::from_level(&tracing::Level::WARN), SeverityLevel::Warning);
        assert_eq!(
            SeverityLevel::from_level(&tracing::Level::INFO),
            SeverityLevel::Information
        );
        assert_eq!(SeverityLevel::from_level(&tracing::Level::DEBUG), SeverityLevel::Verbose);
        assert_eq!(SeverityLevel::from_level(&tracing::Level::TRACE), SeverityLevel::Verbose);
    }

    #[test]
    fn test_request_ids_are_unique() {
        let a = RequestTelemetry::new();
        let b = RequestTelemetry::new();
        assert_ne!(a.id, b.id);
        assert!(!a.id.is_empty());
    }

    #[test]
    fn test_item_context_mut_reaches_inner_context() {
        let mut item = TelemetryItem::from(TraceTelemetry::new("hi", SeverityLevel::Information));
        item.context_mut().session.id = Some("s1".to_string());
        assert_eq!(item.context().session.id.as_deref(), Some("s1"));
        assert_eq!(item.kind(), TelemetryKind::Trace);
        assert!(item.duration().is_none());
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(25)), "0.00:00:00.0250000");
        assert_eq!(
            format_duration(Duration::from_secs(90_061) + Duration::from_nanos(1_234_500)),
            "1.01:01:01.0012345"
        );
    }

    #[test]
    fn test_item_serializes_with_kind_tag() {
        let mut dep = DependencyTelemetry::new("orders");
        dep.dependency_type = Some("SQL".to_string());
        dep.duration = Duration::from_millis(5);
        let json = serde_json::to_value(TelemetryItem::from(dep)).unwrap();
        assert_eq!(json["kind"], "Dependency");
        assert_eq!(json["data"]["type"], "SQL");
        assert_eq!(json["data"]["duration"], "0.00:00:00.0050000");
    }
}
