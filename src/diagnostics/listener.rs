// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Named diagnostic sources and the listeners subscribed to them.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Instant;

use tracing::trace;
use uuid::Uuid;

/// The command a data-access event refers to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DbCommandInfo {
    pub command_text: String,
    pub database: String,
}

impl DbCommandInfo {
    pub fn new(command_text: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            command_text: command_text.into(),
            database: database.into(),
        }
    }
}

/// An event published by an instrumented framework.
#[derive(Debug, Clone, PartialEq)]
pub enum DiagnosticEvent {
    BeforeExecuteCommand {
        instance_id: Uuid,
        timestamp: Instant,
    },
    AfterExecuteCommand {
        command: DbCommandInfo,
        execute_method: String,
        instance_id: Uuid,
        timestamp: Instant,
        is_async: bool,
    },
    CommandError {
        command: DbCommandInfo,
        execute_method: String,
        instance_id: Uuid,
        timestamp: Instant,
        error: String,
    },
}

impl DiagnosticEvent {
    /// Event name as published by the framework.
    pub fn name(&self) -> &'static str {
        match self {
            Self::BeforeExecuteCommand { .. } => "BeforeExecuteCommand",
            Self::AfterExecuteCommand { .. } => "AfterExecuteCommand",
            Self::CommandError { .. } => "CommandError",
        }
    }
}

/// Receives the events of one named diagnostic source.
pub trait DiagnosticListener: Send + Sync {
    /// Name of the source this listener subscribes to.
    fn listener_name(&self) -> &str;

    fn on_event(&self, event: &DiagnosticEvent);
}

/// Routes published events to the listeners subscribed to their source.
#[derive(Default)]
pub struct DiagnosticSourceHub {
    listeners: RwLock<Vec<Arc<dyn DiagnosticListener>>>,
}

impl DiagnosticSourceHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe `listener` to the source named by its `listener_name`.
    pub fn subscribe(&self, listener: Arc<dyn DiagnosticListener>) {
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(listener);
    }

    /// Number of subscribed listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Deliver `event` to every listener of `source`.
    pub fn publish(&self, source: &str, event: &DiagnosticEvent) {
        let listeners: Vec<_> = self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|l| l.listener_name() == source)
            .cloned()
            .collect();

        trace!(source, event = event.name(), listeners = listeners.len(), "Publishing diagnostic event");

        for listener in listeners {
            listener.on_event(event);
        }
    }
}

impl std::fmt::Debug for DiagnosticSourceHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiagnosticSourceHub")
            .field("listeners", &self.listener_count())
            .finish()
    }
}
