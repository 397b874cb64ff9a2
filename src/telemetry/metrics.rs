//! Metric instrument factories for hashbench.
//!
//! Uses the OTel Meter API with the globally-registered `MeterProvider`.
//! All instruments are created lazily from the `"hashbench"` meter.

use opentelemetry::metrics::{Counter, Histogram, Meter};

/// Returns the shared meter for hashbench instruments.
fn meter() -> Meter {
    opentelemetry::global::meter("hashbench")
}

/// Counter: deliveries acknowledged by the accumulator.
/// Labels: `strategy`.
pub fn deliveries_acknowledged() -> Counter<u64> {
    meter()
        .u64_counter("hashbench.delivery.acknowledged")
        .with_description("Number of deliveries acknowledged")
        .build()
}

/// Counter: deliveries that failed (transport, status, or parse).
/// Labels: `strategy`.
pub fn deliveries_failed() -> Counter<u64> {
    meter()
        .u64_counter("hashbench.delivery.failed")
        .with_description("Number of deliveries that failed")
        .build()
}

/// Counter: batch flushes.
/// Labels: `trigger` ("automatic" | "explicit").
pub fn batch_flushes() -> Counter<u64> {
    meter()
        .u64_counter("hashbench.batch.flushes")
        .with_description("Number of batch cohorts flushed")
        .build()
}

/// Histogram: wall-clock run duration in seconds.
/// Labels: `strategy`, `difficulty`.
pub fn run_duration_s() -> Histogram<f64> {
    meter()
        .f64_histogram("hashbench.run.duration_s")
        .with_description("Wall-clock duration of a dispatch run")
        .with_unit("s")
        .build()
}
