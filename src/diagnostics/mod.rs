// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! SDK self-diagnostics and framework diagnostic listeners.
//!
//! - [`EventSource`] reports conditions the SDK handles softly
//! - [`DiagnosticSourceHub`] routes framework events to [`DiagnosticListener`]s
//! - [`EntityFrameworkDiagnosticListener`] converts ORM command events into
//!   dependency telemetry

mod entity_framework;
mod event_source;
mod listener;

pub use entity_framework::{
    EntityFrameworkDiagnosticListener, DEFAULT_COMMAND_MAX_AGE, ENTITY_FRAMEWORK_LISTENER_NAME,
    SQL_DEPENDENCY_TYPE,
};
pub use event_source::{EventSource, SdkEvent, DIAGNOSTICS_TARGET};
pub use listener::{DbCommandInfo, DiagnosticEvent, DiagnosticListener, DiagnosticSourceHub};
