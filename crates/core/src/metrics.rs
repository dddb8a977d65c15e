//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Conversions (outcomes, durations, output files)
//! - Converter pool occupancy
//! - Engine asset retrieval

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts};

// =============================================================================
// Conversion Metrics
// =============================================================================

/// Conversions total by result.
pub static CONVERSIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("local_converter_conversions_total", "Total conversions"),
        &["result"], // "success", "unsupported_format", "execution_error"
    )
    .unwrap()
});

/// Conversion duration in seconds.
pub static CONVERSION_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "local_converter_conversion_duration_seconds",
            "Duration of a single conversion",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 300.0]),
        &["result"],
    )
    .unwrap()
});

/// Output files produced.
pub static OUTPUT_FILES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "local_converter_output_files_total",
        "Total output files produced by conversions",
    )
    .unwrap()
});

/// Scratch cleanups that left state behind.
pub static CLEANUP_FAILURES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "local_converter_cleanup_failures_total",
        "Scratch directory cleanups that did not complete",
    )
    .unwrap()
});

// =============================================================================
// Pool Metrics
// =============================================================================

/// Converters currently leased out of the pool.
pub static POOL_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "local_converter_pool_active",
        "Converters currently running a conversion",
    )
    .unwrap()
});

/// Conversions waiting for a free converter.
pub static POOL_QUEUED: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "local_converter_pool_queued",
        "Conversions waiting for a free converter",
    )
    .unwrap()
});

// =============================================================================
// Asset Metrics
// =============================================================================

/// Asset fetches by source and status.
pub static ASSET_FETCHES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "local_converter_asset_fetches_total",
            "Total engine asset fetches",
        ),
        &["source", "status"], // status: "success", "error"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Records the outcome of one conversion.
pub fn record_conversion(result: &str, duration_secs: f64, output_files: usize) {
    CONVERSIONS_TOTAL.with_label_values(&[result]).inc();
    CONVERSION_DURATION
        .with_label_values(&[result])
        .observe(duration_secs);
    OUTPUT_FILES_TOTAL.inc_by(output_files as u64);
}

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Conversions
        Box::new(CONVERSIONS_TOTAL.clone()),
        Box::new(CONVERSION_DURATION.clone()),
        Box::new(OUTPUT_FILES_TOTAL.clone()),
        Box::new(CLEANUP_FAILURES.clone()),
        // Pool
        Box::new(POOL_ACTIVE.clone()),
        Box::new(POOL_QUEUED.clone()),
        // Assets
        Box::new(ASSET_FETCHES.clone()),
    ]
}
