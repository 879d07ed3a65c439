// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Benchmarks for the initializer chain and the tracking pipeline.
//!
//! Run with: `cargo bench --bench pipeline`

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use std::hint::black_box;
use std::sync::Arc;

use insights_web::config::{merge_settings, InsightsOptions, InsightsSettings};
use insights_web::diagnostics::EventSource;
use insights_web::http::{FixedHttpContextAccessor, HttpContext};
use insights_web::initializers::default_web_initializers;
use insights_web::{
    EventTelemetry, HttpRequest, InMemoryChannel, RequestTelemetry, TelemetryItem,
    TelemetryServices,
};

fn browser_request() -> HttpRequest {
    HttpRequest::new("POST", "/api/orders")
        .with_header("User-Agent", "Mozilla/5.0")
        .with_header("X-Forwarded-For", "203.0.113.7, 10.0.0.1")
        .with_header(
            "Cookie",
            "ai_session=sess|2015-04-10T17:11:38.378Z; ai_user=user|2015-04-09T21:51:59.993Z",
        )
}

/// Benchmark the default web initializers on one item.
fn bench_initializer_chain(c: &mut Criterion) {
    let context = Arc::new(HttpContext::with_request_telemetry(
        browser_request(),
        RequestTelemetry::new(),
    ));
    let chain = default_web_initializers(
        Arc::new(FixedHttpContextAccessor::new(context)),
        &EventSource::new(),
    );

    let mut group = c.benchmark_group("initializer_chain");
    group.throughput(Throughput::Elements(1));

    group.bench_function("default_web_chain", |b| {
        b.iter(|| {
            let mut item: TelemetryItem = EventTelemetry::new("bench").into();
            for initializer in &chain {
                let _ = initializer.initialize(black_box(&mut item));
            }
            item
        });
    });

    // Without an ambient request every initializer takes the no-op path.
    let empty = default_web_initializers(
        Arc::new(FixedHttpContextAccessor::empty()),
        &EventSource::new(),
    );
    group.bench_function("no_ambient_request", |b| {
        b.iter(|| {
            let mut item: TelemetryItem = EventTelemetry::new("bench").into();
            for initializer in &empty {
                let _ = initializer.initialize(black_box(&mut item));
            }
            item
        });
    });

    group.finish();
}

/// Benchmark a full `track` call through a built provider.
fn bench_track(c: &mut Criterion) {
    let channel = Arc::new(InMemoryChannel::with_capacity(1024));
    let mut services = TelemetryServices::new().with_env_lookup(|_| None);
    services
        .add_application_insights_telemetry(InsightsOptions::default())
        .add_telemetry_channel(channel.clone());
    let provider = services.build().unwrap();
    let client = provider.client().clone();

    let mut group = c.benchmark_group("track");
    group.throughput(Throughput::Elements(1));

    group.bench_function("track_event_outside_request", |b| {
        b.iter(|| client.track_event(black_box("bench")));
        channel.drain();
    });

    group.finish();
}

/// Benchmark settings merging.
fn bench_settings_merging(c: &mut Criterion) {
    let file = InsightsSettings {
        instrumentation_key: Some("11111111-2222-3333-4444-555555555555".to_string()),
        endpoint_address: Some("http://file/".to_string()),
        ..Default::default()
    };
    let env = InsightsSettings {
        developer_mode: Some(true),
        ..Default::default()
    };
    let options = InsightsOptions {
        enable_heartbeat: Some(false),
        ..Default::default()
    };

    c.bench_function("merge_all_layers", |b| {
        b.iter(|| {
            merge_settings(
                black_box(std::slice::from_ref(&file)),
                black_box(&env),
                black_box(&options),
            )
        });
    });
}

criterion_group!(
    benches,
    bench_initializer_chain,
    bench_track,
    bench_settings_merging
);
criterion_main!(benches);
