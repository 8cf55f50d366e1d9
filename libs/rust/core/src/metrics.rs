//! Prometheus metrics for artifact loading, sanitization and inference.
//!
//! Everything registers into the default registry so `/metrics` exposes it
//! without extra wiring.

use once_cell::sync::Lazy;
use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, TextEncoder};

#[derive(Clone, Debug)]
pub struct IdsMetrics {
    pub non_finite_total: IntCounter,
    pub imputed_total: IntCounter,
    pub predictions_total: IntCounter,
    pub artifact_loads_total: IntCounter,
    pub cache_hits_total: IntCounter,
    pub inference_latency_ms: Histogram,
}

fn counter(name: &str, help: &str) -> IntCounter {
    let c = IntCounter::new(name, help).expect("static metric definition");
    // AlreadyReg only happens if another crate registered the same name; the local handle still counts.
    let _ = prometheus::default_registry().register(Box::new(c.clone()));
    c
}

fn histogram(name: &str, help: &str, buckets: Vec<f64>) -> Histogram {
    let h = Histogram::with_opts(HistogramOpts::new(name, help).buckets(buckets)).expect("static metric definition");
    let _ = prometheus::default_registry().register(Box::new(h.clone()));
    h
}

pub static IDS_METRICS: Lazy<IdsMetrics> = Lazy::new(|| IdsMetrics {
    non_finite_total: counter("ids_sanitizer_non_finite_total", "Non-finite input values converted to missing"),
    imputed_total: counter("ids_sanitizer_imputed_total", "Missing input values imputed with training medians"),
    predictions_total: counter("ids_predictions_total", "Rows scored by the classifier"),
    artifact_loads_total: counter("ids_artifact_loads_total", "Artifact bundle loads that touched disk"),
    cache_hits_total: counter("ids_artifact_cache_hits_total", "Artifact requests served from the in-process cache"),
    inference_latency_ms: histogram(
        "ids_inference_latency_ms",
        "Sanitize + score latency per batch (ms)",
        vec![0.5, 1.0, 2.5, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 1000.0],
    ),
});

/// Render the default registry in the text exposition format.
pub fn encode_metrics() -> anyhow::Result<String> {
    Lazy::force(&IDS_METRICS);
    let families = prometheus::default_registry().gather();
    let mut buf = Vec::new();
    TextEncoder::new().encode(&families, &mut buf)?;
    Ok(String::from_utf8(buf)?)
}
