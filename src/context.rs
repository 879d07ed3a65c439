// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Per-item telemetry context.
//!
//! Every telemetry item carries a [`TelemetryContext`]: a set of named
//! sub-contexts (device, user, session, operation, location, ...) whose
//! fields are populated by context and telemetry initializers before the
//! item is sent.
//!
//! Initializers follow a set-once rule: a field is only written when it is
//! currently unset or empty. [`set_if_empty`] is the single place that rule
//! lives.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Write `value` into `slot` unless `slot` already holds a non-empty string.
///
/// Returns `true` when the slot was written. Empty values are never written.
pub fn set_if_empty(slot: &mut Option<String>, value: impl Into<String>) -> bool {
    if is_set(slot) {
        return false;
    }
    let value = value.into();
    if value.is_empty() {
        return false;
    }
    *slot = Some(value);
    true
}

/// Whether an optional string field holds a non-empty value.
pub fn is_set(slot: &Option<String>) -> bool {
    slot.as_deref().is_some_and(|v| !v.is_empty())
}

/// Information about the machine that produced the telemetry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role_instance: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operating_system: Option<String>,
}

/// The end user on whose behalf the request was made.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authenticated_user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acquisition_date: Option<DateTime<Utc>>,
}

/// The browser session the request belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_first: Option<bool>,
}

/// The logical operation (usually the inbound request) an item belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub synthetic_source: Option<String>,
}

/// Where the request came from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
}

/// Cloud role information for the hosting application.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role_instance: Option<String>,
}

/// Version of the instrumented application.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// SDK bookkeeping fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InternalContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sdk_version: Option<String>,
}

/// The full set of semantic fields attached to a telemetry item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instrumentation_key: Option<String>,
    pub device: DeviceContext,
    pub user: UserContext,
    pub session: SessionContext,
    pub operation: OperationContext,
    pub location: LocationContext,
    pub cloud: CloudContext,
    pub component: ComponentContext,
    pub internal: InternalContext,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,
}

impl TelemetryContext {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy every field of `other` into `self` where `self` is still unset.
    ///
    /// Used to stamp the client-level context onto each tracked item without
    /// clobbering values the item already carries.
    pub fn merge_from(&mut self, other: &TelemetryContext) {
        merge_str(&mut self.instrumentation_key, &other.instrumentation_key);

        merge_str(&mut self.device.id, &other.device.id);
        merge_str(&mut self.device.role_instance, &other.device.role_instance);
        merge_str(&mut self.device.device_type, &other.device.device_type);
        merge_str(
            &mut self.device.operating_system,
            &other.device.operating_system,
        );

        merge_str(&mut self.user.id, &other.user.id);
        merge_str(
            &mut self.user.authenticated_user_id,
            &other.user.authenticated_user_id,
        );
        merge_str(&mut self.user.user_agent, &other.user.user_agent);
        if self.user.acquisition_date.is_none() {
            self.user.acquisition_date = other.user.acquisition_date;
        }

        merge_str(&mut self.session.id, &other.session.id);
        if self.session.is_first.is_none() {
            self.session.is_first = other.session.is_first;
        }

        merge_str(&mut self.operation.id, &other.operation.id);
        merge_str(&mut self.operation.parent_id, &other.operation.parent_id);
        merge_str(&mut self.operation.name, &other.operation.name);
        merge_str(
            &mut self.operation.synthetic_source,
            &other.operation.synthetic_source,
        );

        merge_str(&mut self.location.ip, &other.location.ip);

        merge_str(&mut self.cloud.role_name, &other.cloud.role_name);
        merge_str(&mut self.cloud.role_instance, &other.cloud.role_instance);

        merge_str(&mut self.component.version, &other.component.version);
        merge_str(&mut self.internal.sdk_version, &other.internal.sdk_version);

        for (key, value) in &other.properties {
            self.properties
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }
    }
}

fn merge_str(target: &mut Option<String>, source: &Option<String>) {
    if let Some(value) = source {
        set_if_empty(target, value.as_str());
    }
}
