// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Self-diagnostics for the SDK.
//!
//! Conditions the SDK handles softly (no ambient request, malformed cookies,
//! a failing initializer) are reported as [`SdkEvent`]s. Every event is
//! written to `tracing` under the [`DIAGNOSTICS_TARGET`] target with a stable
//! numeric `event_id`; an [`EventSource`] created with
//! [`EventSource::recording`] additionally keeps the events in memory.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, error, warn};

/// `tracing` target used for all SDK diagnostics.
pub const DIAGNOSTICS_TARGET: &str = "insights_web::diagnostics";

/// A diagnostic condition raised by the SDK itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SdkEvent {
    /// An initializer returned an error; the item was still submitted.
    InitializerFailed { initializer: String, message: String },
    /// No ambient request context was available.
    HttpContextMissing { initializer: String },
    /// The ambient request carries no request telemetry.
    RequestTelemetryMissing { initializer: String },
    /// `location.ip` was already set on the item.
    ClientIpAlreadySet,
    /// `session.id` was already set on the item.
    SessionIdAlreadySet,
    /// `user.id` was already set on the item.
    UserIdAlreadySet,
    /// No application version is configured.
    ComponentVersionUnavailable,
    /// `operation.synthetic_source` was already set on the item.
    SyntheticSourceAlreadySet,
    /// A tracking cookie could not be parsed and was ignored.
    MalformedCookie { name: String, value: String },
    /// A command completed without a matching start event.
    UnmatchedCommandEnd { listener: String, instance_id: String },
    /// A telemetry module failed to initialize.
    ModuleFailed { module: String, message: String },
    /// A started command never completed and was forgotten.
    StaleCommandEvicted { listener: String, instance_id: String },
}

impl SdkEvent {
    /// Stable numeric id of the event.
    pub fn id(&self) -> u32 {
        match self {
            Self::InitializerFailed { .. } => 1,
            Self::HttpContextMissing { .. } => 2,
            Self::RequestTelemetryMissing { .. } => 3,
            Self::ClientIpAlreadySet => 5,
            Self::SessionIdAlreadySet => 6,
            Self::UserIdAlreadySet => 7,
            Self::ComponentVersionUnavailable => 8,
            Self::SyntheticSourceAlreadySet => 9,
            Self::MalformedCookie { .. } => 10,
            Self::UnmatchedCommandEnd { .. } => 11,
            Self::ModuleFailed { .. } => 12,
            Self::StaleCommandEvicted { .. } => 13,
        }
    }

    /// Severity the event is logged at.
    pub fn level(&self) -> tracing::Level {
        match self {
            Self::InitializerFailed { .. } | Self::ModuleFailed { .. } => tracing::Level::ERROR,
            Self::HttpContextMissing { .. }
            | Self::RequestTelemetryMissing { .. }
            | Self::MalformedCookie { .. }
            | Self::UnmatchedCommandEnd { .. }
            | Self::StaleCommandEvicted { .. } => tracing::Level::WARN,
            _ => tracing::Level::DEBUG,
        }
    }
}

impl fmt::Display for SdkEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InitializerFailed {
                initializer,
                message,
            } => write!(f, "{initializer}.initialize failed: {message}"),
            Self::HttpContextMissing { initializer } => write!(
                f,
                "{initializer}.initialize - no ambient http context, returning"
            ),
            Self::RequestTelemetryMissing { initializer } => write!(
                f,
                "{initializer}.initialize - http context has no request telemetry, returning"
            ),
            Self::ClientIpAlreadySet => {
                write!(f, "ClientIpHeader - location.ip is already set, returning")
            }
            Self::SessionIdAlreadySet => {
                write!(f, "WebSession - session.id is already set, returning")
            }
            Self::UserIdAlreadySet => write!(f, "WebUser - user.id is already set, returning"),
            Self::ComponentVersionUnavailable => {
                write!(f, "ComponentVersion - no application version configured")
            }
            Self::SyntheticSourceAlreadySet => write!(
                f,
                "Synthetic - operation.synthetic_source is already set, returning"
            ),
            Self::MalformedCookie { name, value } => {
                write!(f, "Malformed cookie {name}={value:?}, ignoring")
            }
            Self::UnmatchedCommandEnd {
                listener,
                instance_id,
            } => write!(
                f,
                "{listener} - command {instance_id} completed without a start event"
            ),
            Self::ModuleFailed { module, message } => {
                write!(f, "Telemetry module {module} failed to initialize: {message}")
            }
            Self::StaleCommandEvicted {
                listener,
                instance_id,
            } => write!(
                f,
                "{listener} - command {instance_id} never completed, evicting"
            ),
        }
    }
}

/// Sink for [`SdkEvent`]s.
///
/// Cheap to clone; clones share the same in-memory recorder.
#[derive(Debug, Clone, Default)]
pub struct EventSource {
    recorder: Option<Arc<Mutex<Vec<SdkEvent>>>>,
}

impl EventSource {
    /// An event source that only logs.
    pub fn new() -> Self {
        Self::default()
    }

    /// An event source that logs and keeps every event in memory.
    pub fn recording() -> Self {
        Self {
            recorder: Some(Arc::new(Mutex::new(Vec::new()))),
        }
    }

    /// Report an event.
    pub fn emit(&self, event: SdkEvent) {
        let event_id = event.id();
        match event.level() {
            tracing::Level::ERROR => {
                error!(target: DIAGNOSTICS_TARGET, event_id, "{}", event)
            }
            tracing::Level::WARN => warn!(target: DIAGNOSTICS_TARGET, event_id, "{}", event),
            _ => debug!(target: DIAGNOSTICS_TARGET, event_id, "{}", event),
        }

        if let Some(recorder) = &self.recorder {
            recorder
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(event);
        }
    }

    /// Events recorded so far (empty unless created with [`Self::recording`]).
    pub fn events(&self) -> Vec<SdkEvent> {
        match &self.recorder {
            Some(recorder) => recorder
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone(),
            None => Vec::new(),
        }
    }

    /// Whether an event with the given id was recorded.
    pub fn has_event(&self, id: u32) -> bool {
        self.events().iter().any(|e| e.id() == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_source_does_not_record() {
        let source = EventSource::new();
        source.emit(SdkEvent::UserIdAlreadySet);
        assert!(source.events().is_empty());
    }

    #[test]
    fn test_recording_source_shares_events_between_clones() {
        let source = EventSource::recording();
        let clone = source.clone();
        clone.emit(SdkEvent::MalformedCookie {
            name: "ai_user".to_string(),
            value: "abc".to_string(),
        });

        assert!(source.has_event(10));
        assert_eq!(source.events().len(), 1);
    }

    #[test]
    fn test_event_ids_are_stable() {
        assert_eq!(
            SdkEvent::HttpContextMissing {
                initializer: "x".to_string()
            }
            .id(),
            2
        );
        assert_eq!(SdkEvent::SyntheticSourceAlreadySet.id(), 9);
        let evicted = SdkEvent::StaleCommandEvicted {
            listener: "orm".to_string(),
            instance_id: "1".to_string(),
        };
        assert_eq!(evicted.id(), 13);
        assert_eq!(evicted.level(), tracing::Level::WARN);
    }

    #[test]
    fn test_event_display_mentions_cookie() {
        let event = SdkEvent::MalformedCookie {
            name: "ai_user".to_string(),
            value: "abc".to_string(),
        };
        let display = event.to_string();
        assert!(display.contains("ai_user"));
        assert!(display.contains("abc"));
        assert_eq!(event.level(), tracing::Level::WARN);
    }
}
