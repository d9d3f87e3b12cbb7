//! Prometheus metrics for magazine allocation
//!
//! Features:
//! - Allocation outcomes (allocated / not found)
//! - Requested run lengths
//! - Slot layout gauges (visible, occupied)
//!
//! The layout gauges are process-wide. With several conveyors alive they
//! show whichever conveyor changed its layout last.

use crate::magazine::MagazineStats;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use std::sync::Once;
use tracing::{error, info};

lazy_static::lazy_static! {
    /// Global metrics registry
    pub static ref METRICS_REGISTRY: Registry = Registry::new();

    pub static ref ALLOCATIONS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("magazine_allocations_total", "Total allocation requests"),
        &["outcome"]
    ).unwrap();

    pub static ref RECONFIGURATIONS_TOTAL: IntCounter = IntCounter::new(
        "magazine_reconfigurations_total",
        "Total magazine reconfigurations"
    ).unwrap();

    pub static ref RUN_LENGTH: Histogram = Histogram::with_opts(
        HistogramOpts::new("magazine_run_length", "Requested run length")
            .buckets(vec![1.0, 2.0, 3.0, 5.0, 8.0, 13.0, 21.0, 50.0])
    ).unwrap();

    /// Occupied slots of the most recently changed magazine
    pub static ref OCCUPIED_SLOTS: IntGauge = IntGauge::new(
        "magazine_occupied_slots",
        "Occupied slots in the most recently changed magazine"
    ).unwrap();

    /// Visible slots of the most recently changed magazine
    pub static ref VISIBLE_SLOTS: IntGauge = IntGauge::new(
        "magazine_visible_slots",
        "Visible slots in the most recently changed magazine"
    ).unwrap();
}

static INIT: Once = Once::new();

/// Initialize metrics registry
pub fn init_metrics() {
    INIT.call_once(|| {
        info!("Initializing Prometheus metrics");

        METRICS_REGISTRY.register(Box::new(ALLOCATIONS_TOTAL.clone())).ok();
        METRICS_REGISTRY.register(Box::new(RECONFIGURATIONS_TOTAL.clone())).ok();
        METRICS_REGISTRY.register(Box::new(RUN_LENGTH.clone())).ok();
        METRICS_REGISTRY.register(Box::new(OCCUPIED_SLOTS.clone())).ok();
        METRICS_REGISTRY.register(Box::new(VISIBLE_SLOTS.clone())).ok();
    });
}

/// Record one allocation request
pub fn record_allocation(allocated: bool, run_length: usize) {
    let outcome = if allocated { "allocated" } else { "not_found" };
    ALLOCATIONS_TOTAL.with_label_values(&[outcome]).inc();
    RUN_LENGTH.observe(run_length as f64);
}

/// Record a magazine replacement
pub fn record_reconfigure(stats: &MagazineStats) {
    RECONFIGURATIONS_TOTAL.inc();
    record_layout(stats);
}

/// Update the slot layout gauges
///
/// Last writer wins: the gauges hold `stats` until any conveyor records again.
pub fn record_layout(stats: &MagazineStats) {
    OCCUPIED_SLOTS.set(stats.occupied_slots as i64);
    VISIBLE_SLOTS.set(stats.visible_slots as i64);
}

/// Export all metrics in Prometheus text format
pub fn export_metrics() -> String {
    init_metrics();

    let encoder = TextEncoder::new();
    let metric_families = METRICS_REGISTRY.gather();

    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!(error = %e, "Failed to encode metrics");
        return String::from("# Error encoding metrics\n");
    }

    String::from_utf8(buffer).unwrap_or_else(|_| String::from("# Error converting metrics\n"))
}
