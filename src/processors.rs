// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Telemetry processors.
//!
//! Processors run after the initializer chain, in registration order. Each
//! receives an owned item and either passes it on or drops it by returning
//! `None`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::debug;

use crate::configuration::TelemetryConfiguration;
use crate::error::TelemetryError;
use crate::types::TelemetryItem;

/// A stage of the processing chain.
pub trait TelemetryProcessor: Send + Sync {
    /// Implementation name, used for registration and diagnostics.
    fn name(&self) -> &'static str;

    /// Called once when the configuration holding the processor is built.
    fn initialize(&self, _configuration: &TelemetryConfiguration) {}

    /// Pass `item` on, possibly modified, or drop it.
    fn process(&self, item: TelemetryItem) -> Option<TelemetryItem>;
}

/// Creates a processor when the configuration is built.
pub trait TelemetryProcessorFactory: Send + Sync {
    /// Name of the processor this factory creates.
    fn name(&self) -> &str;

    fn create(&self) -> Result<Arc<dyn TelemetryProcessor>, TelemetryError>;
}

/// Factory backed by a closure.
pub struct FnProcessorFactory<F> {
    name: String,
    create: F,
}

impl<F> FnProcessorFactory<F>
where
    F: Fn() -> Result<Arc<dyn TelemetryProcessor>, TelemetryError> + Send + Sync,
{
    /// Wrap `create`; the name must not be blank.
    pub fn new(name: impl Into<String>, create: F) -> Result<Self, TelemetryError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(TelemetryError::InvalidProcessor(
                "processor factory name must not be empty".to_string(),
            ));
        }
        Ok(Self { name, create })
    }
}

impl<F> TelemetryProcessorFactory for FnProcessorFactory<F>
where
    F: Fn() -> Result<Arc<dyn TelemetryProcessor>, TelemetryError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn create(&self) -> Result<Arc<dyn TelemetryProcessor>, TelemetryError> {
        (self.create)()
    }
}

/// Instantiate a processor from its factory, checking it is what the
/// factory claims to build.
pub fn instantiate(
    factory: &dyn TelemetryProcessorFactory,
) -> Result<Arc<dyn TelemetryProcessor>, TelemetryError> {
    let processor = factory.create().map_err(|err| match err {
        TelemetryError::InvalidProcessor(_) => err,
        other => TelemetryError::InvalidProcessor(format!("{}: {}", factory.name(), other)),
    })?;
    if processor.name() != factory.name() {
        return Err(TelemetryError::InvalidProcessor(format!(
            "factory {} produced processor {}",
            factory.name(),
            processor.name()
        )));
    }
    Ok(processor)
}

/// Run `item` through `processors` in order.
pub fn run_chain(
    processors: &[Arc<dyn TelemetryProcessor>],
    item: TelemetryItem,
) -> Option<TelemetryItem> {
    processors
        .iter()
        .try_fold(item, |item, processor| processor.process(item))
}

// ============================================================================
// Adaptive Sampling
// ============================================================================

/// Default target rate of the adaptive sampler.
pub const DEFAULT_MAX_ITEMS_PER_SECOND: f64 = 5.0;

const MIN_SAMPLING_PERCENTAGE: f64 = 0.1;

#[derive(Debug)]
struct SamplingWindow {
    started: Instant,
    seen: u64,
    percentage: f64,
}

/// Keeps the item rate near a target by adjusting a sampling percentage
/// once per evaluation window.
///
/// The keep/drop decision hashes the operation id, so all items of one
/// operation share the same fate. Items without an operation id are always
/// kept.
#[derive(Debug)]
pub struct AdaptiveSamplingProcessor {
    max_items_per_second: f64,
    window: Duration,
    state: Mutex<SamplingWindow>,
}

impl Default for AdaptiveSamplingProcessor {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ITEMS_PER_SECOND)
    }
}

impl AdaptiveSamplingProcessor {
    pub fn new(max_items_per_second: f64) -> Self {
        Self::with_window(max_items_per_second, Duration::from_secs(15))
    }

    pub fn with_window(max_items_per_second: f64, window: Duration) -> Self {
        Self {
            max_items_per_second: max_items_per_second.max(f64::EPSILON),
            window,
            state: Mutex::new(SamplingWindow {
                started: Instant::now(),
                seen: 0,
                percentage: 100.0,
            }),
        }
    }

    /// The current sampling percentage, in `(0, 100]`.
    pub fn sampling_percentage(&self) -> f64 {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .percentage
    }

    fn observe(&self) -> f64 {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.seen += 1;
        let elapsed = state.started.elapsed();
        if elapsed >= self.window {
            let rate = state.seen as f64 / elapsed.as_secs_f64();
            let target = (self.max_items_per_second / rate * 100.0)
                .clamp(MIN_SAMPLING_PERCENTAGE, 100.0);
            debug!(rate, percentage = target, "Adjusted sampling percentage");
            state.percentage = target;
            state.started = Instant::now();
            state.seen = 0;
        }
        state.percentage
    }
}

/// Stable score in `[0, 100)` for a sampling key.
fn sampling_score(key: &str) -> f64 {
    let hash = key
        .bytes()
        .fold(5381u32, |h, b| h.wrapping_mul(33) ^ u32::from(b));
    f64::from(hash % 10_000) / 100.0
}

impl TelemetryProcessor for AdaptiveSamplingProcessor {
    fn name(&self) -> &'static str {
        "AdaptiveSampling"
    }

    fn process(&self, item: TelemetryItem) -> Option<TelemetryItem> {
        let percentage = self.observe();
        if percentage >= 100.0 {
            return Some(item);
        }
        match item.context().operation.id.as_deref() {
            Some(id) if sampling_score(id) >= percentage => None,
            _ => Some(item),
        }
    }
}

// ============================================================================
// Live Metrics
// ============================================================================

/// Counters collected by [`QuickPulseProcessor`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuickPulseSnapshot {
    pub requests: u64,
    pub failed_requests: u64,
    pub dependencies: u64,
    pub failed_dependencies: u64,
    pub exceptions: u64,
}

/// Counts items for the live metrics stream. Never drops anything.
#[derive(Debug, Default)]
pub struct QuickPulseProcessor {
    requests: AtomicU64,
    failed_requests: AtomicU64,
    dependencies: AtomicU64,
    failed_dependencies: AtomicU64,
    exceptions: AtomicU64,
}

impl QuickPulseProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> QuickPulseSnapshot {
        QuickPulseSnapshot {
            requests: self.requests.load(Ordering::Relaxed),
            failed_requests: self.failed_requests.load(Ordering::Relaxed),
            dependencies: self.dependencies.load(Ordering::Relaxed),
            failed_dependencies: self.failed_dependencies.load(Ordering::Relaxed),
            exceptions: self.exceptions.load(Ordering::Relaxed),
        }
    }
}

impl TelemetryProcessor for QuickPulseProcessor {
    fn name(&self) -> &'static str {
        "QuickPulse"
    }

    fn process(&self, item: TelemetryItem) -> Option<TelemetryItem> {
        match &item {
            TelemetryItem::Request(r) => {
                self.requests.fetch_add(1, Ordering::Relaxed);
                if r.success == Some(false) {
                    self.failed_requests.fetch_add(1, Ordering::Relaxed);
                }
            }
            TelemetryItem::Dependency(d) => {
                self.dependencies.fetch_add(1, Ordering::Relaxed);
                if !d.success {
                    self.failed_dependencies.fetch_add(1, Ordering::Relaxed);
                }
            }
            TelemetryItem::Exception(_) => {
                self.exceptions.fetch_add(1, Ordering::Relaxed);
            }
            _ => {}
        }
        Some(item)
    }
}
