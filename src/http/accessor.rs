// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Access to the ambient request.

use std::cell::RefCell;
use std::marker::PhantomData;
use std::sync::Arc;

use super::HttpContext;

/// Resolves the request currently being processed, if any.
///
/// Absence of a request is a normal condition (background work, startup) and
/// must be handled as a no-op by callers.
pub trait HttpContextAccessor: Send + Sync {
    fn http_context(&self) -> Option<Arc<HttpContext>>;
}

thread_local! {
    static CURRENT: RefCell<Option<Arc<HttpContext>>> = const { RefCell::new(None) };
}

/// Accessor backed by a thread-local slot.
///
/// The host calls [`enter`](Self::enter) when it starts processing a request
/// on a thread and keeps the returned [`ContextScope`] alive until the
/// request completes. Scopes nest: dropping one restores the previous
/// context.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadLocalHttpContextAccessor;

impl ThreadLocalHttpContextAccessor {
    pub fn new() -> Self {
        Self
    }

    /// Make `context` ambient on the current thread.
    pub fn enter(&self, context: Arc<HttpContext>) -> ContextScope {
        let previous = CURRENT.with(|slot| slot.borrow_mut().replace(context));
        ContextScope {
            previous,
            _not_send: PhantomData,
        }
    }
}

impl HttpContextAccessor for ThreadLocalHttpContextAccessor {
    fn http_context(&self) -> Option<Arc<HttpContext>> {
        CURRENT.with(|slot| slot.borrow().clone())
    }
}

/// Guard returned by [`ThreadLocalHttpContextAccessor::enter`].
#[must_use = "the context is only ambient while the scope is alive"]
pub struct ContextScope {
    previous: Option<Arc<HttpContext>>,
    _not_send: PhantomData<*const ()>,
}

impl Drop for ContextScope {
    fn drop(&mut self) {
        let previous = self.previous.take();
        CURRENT.with(|slot| *slot.borrow_mut() = previous);
    }
}

/// Accessor that always returns the same context (or none).
#[derive(Debug, Clone, Default)]
pub struct FixedHttpContextAccessor {
    context: Option<Arc<HttpContext>>,
}

impl FixedHttpContextAccessor {
    pub fn new(context: Arc<HttpContext>) -> Self {
        Self {
            context: Some(context),
        }
    }

    /// An accessor with no ambient request.
    pub fn empty() -> Self {
        Self { context: None }
    }
}

impl HttpContextAccessor for FixedHttpContextAccessor {
    fn http_context(&self) -> Option<Arc<HttpContext>> {
        self.context.clone()
    }
}
