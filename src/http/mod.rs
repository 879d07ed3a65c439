// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Host request state consumed by the initializers.
//!
//! The SDK does not own an HTTP server. Hosts describe each inbound request
//! as an [`HttpRequest`], wrap it in an [`HttpContext`] together with the
//! request's [`RequestTelemetry`], and make it ambient through an
//! [`HttpContextAccessor`] while the request is being processed.

mod accessor;
mod cookies;

pub use accessor::{
    ContextScope, FixedHttpContextAccessor, HttpContextAccessor, ThreadLocalHttpContextAccessor,
};
pub use cookies::parse_cookie_headers;

use std::collections::BTreeMap;
use std::net::IpAddr;
use std::sync::{Mutex, PoisonError};

use once_cell::sync::OnceCell;

use crate::types::RequestTelemetry;

/// Well-known header names.
pub mod header_names {
    pub const USER_AGENT: &str = "User-Agent";
    pub const COOKIE: &str = "Cookie";
    pub const X_FORWARDED_FOR: &str = "X-Forwarded-For";
    pub const SYNTHETIC_TEST_RUN_ID: &str = "SyntheticTest-RunId";
    pub const SYNTHETIC_TEST_LOCATION: &str = "SyntheticTest-Location";
}

/// Ordered, case-insensitive multi-map of request headers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMap {
    entries: Vec<(String, String)>,
}

impl HeaderMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a header value (existing values for the name are kept).
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    /// First value for `name`, compared case-insensitively.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Every value for `name`, in insertion order.
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.entries
            .iter()
            .filter(move |(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// An inbound HTTP request as seen by the initializers.
#[derive(Debug, Clone, Default)]
pub struct HttpRequest {
    pub method: String,
    pub path: String,
    pub headers: HeaderMap,
    pub remote_addr: Option<IpAddr>,
    cookies: OnceCell<BTreeMap<String, String>>,
}

impl HttpRequest {
    /// Create a request with a method and path.
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            ..Default::default()
        }
    }

    /// Add a header (builder style).
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.append(name, value);
        self.cookies = OnceCell::new();
        self
    }

    /// Set the connection's remote address (builder style).
    pub fn with_remote_addr(mut self, addr: IpAddr) -> Self {
        self.remote_addr = Some(addr);
        self
    }

    /// First value of a header.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    /// Cookies parsed from every `Cookie` header, computed once.
    pub fn cookies(&self) -> &BTreeMap<String, String> {
        self.cookies
            .get_or_init(|| parse_cookie_headers(self.headers.get_all(header_names::COOKIE)))
    }

    /// Value of a single cookie.
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies().get(name).map(String::as_str)
    }
}

/// Per-request state: the request plus its ambient request telemetry.
#[derive(Debug)]
pub struct HttpContext {
    request: HttpRequest,
    request_telemetry: Option<Mutex<RequestTelemetry>>,
}

impl HttpContext {
    /// A context without request telemetry (initializers will no-op).
    pub fn new(request: HttpRequest) -> Self {
        Self {
            request,
            request_telemetry: None,
        }
    }

    /// A context carrying the request's telemetry.
    pub fn with_request_telemetry(request: HttpRequest, telemetry: RequestTelemetry) -> Self {
        Self {
            request,
            request_telemetry: Some(Mutex::new(telemetry)),
        }
    }

    pub fn request(&self) -> &HttpRequest {
        &self.request
    }

    pub fn has_request_telemetry(&self) -> bool {
        self.request_telemetry.is_some()
    }

    /// Run `f` with exclusive access to the request telemetry.
    ///
    /// Returns `None` when the context carries no request telemetry.
    pub fn with_request_telemetry_mut<R>(
        &self,
        f: impl FnOnce(&mut RequestTelemetry) -> R,
    ) -> Option<R> {
        let slot = self.request_telemetry.as_ref()?;
        let mut guard = slot.lock().unwrap_or_else(PoisonError::into_inner);
        Some(f(&mut guard))
    }

    /// A copy of the current request telemetry.
    pub fn request_telemetry(&self) -> Option<RequestTelemetry> {
        self.with_request_telemetry_mut(|t| t.clone())
    }
}
