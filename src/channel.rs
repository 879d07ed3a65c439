// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Telemetry channels.
//!
//! A channel is the hand-off point between the pipeline and the transport
//! that ships items to the backend. Transmission itself (batching, retry,
//! the network) is outside this crate; [`InMemoryChannel`] buffers items
//! for whatever transmitter drains it.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError, RwLock};

use tracing::{debug, trace, warn};

use crate::types::TelemetryItem;

/// Default ingestion endpoint.
pub const DEFAULT_ENDPOINT_ADDRESS: &str = "https://dc.services.visualstudio.com/v2/track";

/// Default number of items [`InMemoryChannel`] holds before dropping.
pub const DEFAULT_CAPACITY: usize = 500;

/// Receives finished telemetry items.
#[cfg_attr(test, mockall::automock)]
pub trait TelemetryChannel: Send + Sync {
    /// Implementation name, used for registration and diagnostics.
    fn name(&self) -> &'static str;

    /// Enqueue an item. Never blocks on I/O.
    fn send(&self, item: TelemetryItem);

    /// Push buffered items to the transmitter.
    fn flush(&self);

    fn developer_mode(&self) -> bool;

    fn set_developer_mode(&self, enabled: bool);

    fn endpoint_address(&self) -> String;

    fn set_endpoint_address(&self, address: String);
}

/// Bounded in-memory buffer of items awaiting transmission.
///
/// Both the send buffer and the flushed items awaiting pickup hold at most
/// `capacity` items; past that the oldest item is dropped and counted. In
/// developer mode every send is followed by a flush.
#[derive(Debug)]
pub struct InMemoryChannel {
    buffer: Mutex<VecDeque<TelemetryItem>>,
    flushed: Mutex<VecDeque<TelemetryItem>>,
    capacity: usize,
    developer_mode: AtomicBool,
    endpoint_address: RwLock<String>,
    dropped: AtomicU64,
}

impl Default for InMemoryChannel {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl InMemoryChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Mutex::new(VecDeque::new()),
            flushed: Mutex::new(VecDeque::new()),
            capacity: capacity.max(1),
            developer_mode: AtomicBool::new(false),
            endpoint_address: RwLock::new(DEFAULT_ENDPOINT_ADDRESS.to_string()),
            dropped: AtomicU64::new(0),
        }
    }

    /// Items waiting in the buffer.
    pub fn pending(&self) -> usize {
        self.buffer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Flushed items not yet taken by [`Self::drain`].
    pub fn flushed(&self) -> usize {
        self.flushed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Items dropped because the buffer or the flushed queue was full.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Take every item sent so far, flushed ones first, in send order.
    pub fn drain(&self) -> Vec<TelemetryItem> {
        let mut items: Vec<_> = self
            .flushed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();
        items.extend(
            self.buffer
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .drain(..),
        );
        items
    }
}

impl TelemetryChannel for InMemoryChannel {
    fn name(&self) -> &'static str {
        "InMemoryChannel"
    }

    fn send(&self, item: TelemetryItem) {
        {
            let mut buffer = self.buffer.lock().unwrap_or_else(PoisonError::into_inner);
            if buffer.len() >= self.capacity {
                buffer.pop_front();
                let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                warn!(capacity = self.capacity, dropped, "Telemetry buffer full, dropping oldest item");
            }
            trace!(kind = ?item.kind(), "Buffered telemetry item");
            buffer.push_back(item);
        }

        if self.developer_mode() {
            self.flush();
        }
    }

    fn flush(&self) {
        let items: Vec<_> = self
            .buffer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();
        if items.is_empty() {
            return;
        }
        debug!(count = items.len(), endpoint = %self.endpoint_address(), "Flushing telemetry");
        let mut flushed = self.flushed.lock().unwrap_or_else(PoisonError::into_inner);
        flushed.extend(items);
        let overflow = flushed.len().saturating_sub(self.capacity);
        if overflow > 0 {
            flushed.drain(..overflow);
            let overflow = overflow as u64;
            let dropped = self.dropped.fetch_add(overflow, Ordering::Relaxed) + overflow;
            warn!(
                capacity = self.capacity,
                dropped,
                "Flushed telemetry not drained, dropping oldest items"
            );
        }
    }

    fn developer_mode(&self) -> bool {
        self.developer_mode.load(Ordering::Relaxed)
    }

    fn set_developer_mode(&self, enabled: bool) {
        self.developer_mode.store(enabled, Ordering::Relaxed);
    }

    fn endpoint_address(&self) -> String {
        self.endpoint_address
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_endpoint_address(&self, address: String) {
        *self
            .endpoint_address
            .write()
            .unwrap_or_else(PoisonError::into_inner) = address;
    }
}
