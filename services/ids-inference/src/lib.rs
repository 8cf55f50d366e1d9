//! Cyber IDS inference: versioned artifact loading, training-time input repair
//! and thresholded attack probabilities for network flow records.

pub mod api;
pub mod bundle;
pub mod config;
pub mod engine;
pub mod error;
pub mod layout;
pub mod locator;
pub mod model;
#[cfg(feature = "onnx")]
pub mod onnx;
pub mod sanitizer;
pub mod store;
pub mod table;

pub use bundle::{ArtifactBundle, Metadata, ModelInfo};
pub use config::ServiceConfig;
pub use engine::{label_for, predict, InferenceEngine, Prediction};
pub use error::{IdsError, Result};
pub use layout::{ArtifactLayout, ArtifactPaths, DEFAULT_DECISION_THRESHOLD};
pub use locator::discover_latest_version;
pub use model::{Classifier, ModelBlob};
pub use sanitizer::{sanitize, SanitizeReport, SanitizedTable, SanitizerSpec};
pub use store::ArtifactStore;
pub use table::{Cell, FeatureTable};
