// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Logging.
//!
//! All diagnostics are `tracing` events. [`init_logging`] installs a console
//! subscriber; [`init_logging_with_client`] additionally forwards
//! application log events to a client as trace and exception telemetry.
//!
//! ```rust,ignore
//! use insights_web::logging::{init_logging_with_client, LogConfig};
//!
//! let provider = TelemetryServices::new().build()?;
//! let _guard = init_logging_with_client(&LogConfig::default(), provider.client().clone())?;
//! tracing::warn!(target: "shop", order_id = 7, "Payment retried");
//! ```

mod init;
mod layer;

pub use init::{init_logging, init_logging_with_client, LogConfig, LogGuard};
pub use layer::{TelemetryLayer, CATEGORY_NAME_PROPERTY, EXCEPTION_PROPERTY};
