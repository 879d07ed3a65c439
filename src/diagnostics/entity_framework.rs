// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Turns ORM command events into SQL dependency telemetry.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use crate::client::TelemetryClient;
use crate::types::DependencyTelemetry;

use super::event_source::SdkEvent;
use super::listener::{DbCommandInfo, DiagnosticEvent, DiagnosticListener};

/// Source name of the ORM's diagnostic events.
pub const ENTITY_FRAMEWORK_LISTENER_NAME: &str = "Microsoft.EntityFrameworkCore";

/// Dependency type recorded for database commands.
pub const SQL_DEPENDENCY_TYPE: &str = "SQL";

/// How long a started command is remembered without an end event.
pub const DEFAULT_COMMAND_MAX_AGE: Duration = Duration::from_secs(10 * 60);

/// Tracks each executed command as a dependency.
///
/// Start times are kept per command instance so overlapping commands on the
/// same or different threads each get their own duration. A start older
/// than the max age is evicted the next time a command begins.
pub struct EntityFrameworkDiagnosticListener {
    client: Arc<TelemetryClient>,
    started: Mutex<HashMap<Uuid, Instant>>,
    max_age: Duration,
}

impl EntityFrameworkDiagnosticListener {
    pub fn new(client: Arc<TelemetryClient>) -> Self {
        Self {
            client,
            started: Mutex::new(HashMap::new()),
            max_age: DEFAULT_COMMAND_MAX_AGE,
        }
    }

    /// Override how long an unfinished command is remembered.
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    /// Commands started but not yet completed.
    pub fn in_flight(&self) -> usize {
        self.started
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn on_begin_command(&self, instance_id: Uuid, timestamp: Instant) {
        let mut evicted = Vec::new();
        {
            let mut started = self.started.lock().unwrap_or_else(PoisonError::into_inner);
            started.retain(|id, start| {
                let stale = timestamp.saturating_duration_since(*start) > self.max_age;
                if stale {
                    evicted.push(*id);
                }
                !stale
            });
            started.insert(instance_id, timestamp);
        }

        for id in evicted {
            self.client.events().emit(SdkEvent::StaleCommandEvicted {
                listener: ENTITY_FRAMEWORK_LISTENER_NAME.to_string(),
                instance_id: id.to_string(),
            });
        }
    }

    fn on_end_command(
        &self,
        command: &DbCommandInfo,
        instance_id: Uuid,
        timestamp: Instant,
        success: bool,
    ) {
        let start = self
            .started
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&instance_id);

        let duration = match start {
            Some(start) => timestamp.saturating_duration_since(start),
            None => {
                self.client
                    .events()
                    .emit(SdkEvent::UnmatchedCommandEnd {
                        listener: ENTITY_FRAMEWORK_LISTENER_NAME.to_string(),
                        instance_id: instance_id.to_string(),
                    });
                Duration::ZERO
            }
        };

        let mut telemetry = DependencyTelemetry::new(command.database.clone());
        telemetry.target = Some(command.database.clone());
        telemetry.data = Some(command.command_text.clone());
        telemetry.dependency_type = Some(SQL_DEPENDENCY_TYPE.to_string());
        telemetry.duration = duration;
        telemetry.timestamp = Utc::now()
            - chrono::Duration::from_std(duration).unwrap_or_else(|_| chrono::Duration::zero());
        telemetry.success = success;

        debug!(
            database = %command.database,
            duration_ms = duration.as_millis() as u64,
            success,
            "Tracking SQL dependency"
        );
        self.client.track_dependency(telemetry);
    }
}

impl DiagnosticListener for EntityFrameworkDiagnosticListener {
    fn listener_name(&self) -> &str {
        ENTITY_FRAMEWORK_LISTENER_NAME
    }

    fn on_event(&self, event: &DiagnosticEvent) {
        match event {
            DiagnosticEvent::BeforeExecuteCommand {
                instance_id,
                timestamp,
            } => self.on_begin_command(*instance_id, *timestamp),
            DiagnosticEvent::AfterExecuteCommand {
                command,
                instance_id,
                timestamp,
                ..
            } => self.on_end_command(command, *instance_id, *timestamp, true),
            DiagnosticEvent::CommandError {
                command,
                instance_id,
                timestamp,
                ..
            } => self.on_end_command(command, *instance_id, *timestamp, false),
        }
    }
}
