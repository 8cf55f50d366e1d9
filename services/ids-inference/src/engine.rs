//! Sanitize, score, threshold.

use crate::bundle::{ArtifactBundle, ModelInfo};
use crate::error::{IdsError, Result};
use crate::layout::DEFAULT_DECISION_THRESHOLD;
use crate::model::ATTACK_CLASS;
use crate::sanitizer::{sanitize, SanitizeReport};
use crate::store::ArtifactStore;
use crate::table::FeatureTable;
use ids_core::IDS_METRICS;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct Prediction {
    /// Attack-class probability per input row.
    pub probabilities: Vec<f64>,
    /// 1 = Attack, 0 = Benign.
    pub labels: Vec<u8>,
    pub report: SanitizeReport,
    /// Bundle that produced these scores.
    pub bundle: Arc<ArtifactBundle>,
}

impl Prediction {
    pub fn version(&self) -> &str { self.bundle.version() }
}

/// Inclusive: a probability equal to the threshold is an attack.
pub fn label_for(probability: f64, threshold: f64) -> u8 { u8::from(probability >= threshold) }

pub fn predict(table: &FeatureTable, threshold: f64, bundle: Arc<ArtifactBundle>, context: &str) -> Result<Prediction> {
    if threshold.is_nan() {
        return Err(IdsError::InvalidThreshold(threshold));
    }
    let start = Instant::now();

    // an empty feature list drops every input column, so the sanitizer imputes all cells
    let reindexed = table.reindex(bundle.feature_names());
    let sanitized = sanitize(&reindexed, bundle.sanitizer(), context)?;
    let aligned = if sanitized.table.columns() == bundle.model_columns() {
        sanitized.table
    } else {
        sanitized.table.select(bundle.model_columns())?
    };

    let scores = bundle.model().predict_proba(&aligned)?;
    if scores.len() != table.n_rows() {
        return Err(IdsError::Model(format!("model returned {} rows for {} inputs", scores.len(), table.n_rows())));
    }
    let probabilities: Vec<f64> = scores.iter().map(|s| s[ATTACK_CLASS]).collect();
    let labels = probabilities.iter().map(|p| label_for(*p, threshold)).collect();

    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
    IDS_METRICS.predictions_total.inc_by(probabilities.len() as u64);
    IDS_METRICS.inference_latency_ms.observe(elapsed_ms);
    debug!(context, rows = probabilities.len(), version = %bundle.version(), elapsed_ms, "batch scored");

    Ok(Prediction { probabilities, labels, report: sanitized.report, bundle })
}

/// The two operations the HTTP boundary needs, over a shared store.
#[derive(Debug)]
pub struct InferenceEngine {
    store: Arc<ArtifactStore>,
    default_threshold: f64,
}

impl InferenceEngine {
    pub fn new(store: Arc<ArtifactStore>) -> Self { Self::with_threshold(store, DEFAULT_DECISION_THRESHOLD) }

    pub fn with_threshold(store: Arc<ArtifactStore>, default_threshold: f64) -> Self { Self { store, default_threshold } }

    pub fn store(&self) -> &Arc<ArtifactStore> { &self.store }
    pub fn default_threshold(&self) -> f64 { self.default_threshold }

    pub fn predict_table(&self, table: &FeatureTable, threshold: Option<f64>, context: &str) -> Result<Prediction> {
        let bundle = self.store.latest()?;
        predict(table, threshold.unwrap_or(self.default_threshold), bundle, context)
    }

    pub fn predict_records(&self, records: &[Map<String, Value>], threshold: Option<f64>) -> Result<Prediction> {
        self.predict_table(&FeatureTable::from_records(records), threshold, "api_request")
    }

    pub fn model_info(&self) -> Result<ModelInfo> { Ok(self.store.latest()?.info()) }
}
