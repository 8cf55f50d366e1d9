use crate::layout::{ArtifactLayout, DEFAULT_DECISION_THRESHOLD};
use serde::Deserialize;

/// Settings for the `ids-inference` binary, loaded through `ids_core::load_config`
/// (`IDS__LISTEN_ADDR`, `IDS__ARTIFACTS__ROOT`, `IDS__DECISION_THRESHOLD`, ...).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub service_name: String,
    /// Filter directive used when `RUST_LOG` is unset.
    pub log_level: String,
    pub listen_addr: String,
    pub decision_threshold: f64,
    /// Load the latest bundle before accepting traffic.
    pub preload: bool,
    pub artifacts: ArtifactLayout,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            service_name: "ids-inference".into(),
            log_level: "info".into(),
            listen_addr: "0.0.0.0:8000".into(),
            decision_threshold: DEFAULT_DECISION_THRESHOLD,
            preload: true,
            artifacts: ArtifactLayout::default(),
        }
    }
}
