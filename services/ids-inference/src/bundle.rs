//! One immutable, fully loaded artifact version.

use crate::error::{IdsError, Result};
use crate::layout::ArtifactLayout;
use crate::model::{load_model, Classifier};
use crate::sanitizer::SanitizerSpec;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::path::Path;
use tracing::{info, warn};

pub const DEFAULT_TARGET_COLUMN: &str = "Label";
pub const DEFAULT_BENIGN_LABEL: &str = "Benign";

/// Descriptive training metadata. Unknown keys are kept verbatim.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata(Map<String, Value>);

impl Metadata {
    pub fn new(map: Map<String, Value>) -> Self { Self(map) }
    pub fn get(&self, key: &str) -> Option<&Value> { self.0.get(key) }
    pub fn as_map(&self) -> &Map<String, Value> { &self.0 }

    pub fn target_column(&self) -> String {
        match self.0.get("target_column") {
            Some(Value::String(s)) => s.clone(),
            other => {
                if other.is_some() { warn!(key = "target_column", "metadata value is not a string; using default"); }
                DEFAULT_TARGET_COLUMN.to_string()
            }
        }
    }

    pub fn benign_labels(&self) -> Vec<String> {
        self.string_list("benign_labels").unwrap_or_else(|| vec![DEFAULT_BENIGN_LABEL.to_string()])
    }

    pub fn train_days(&self) -> Vec<String> { self.string_list("train_days").unwrap_or_default() }
    pub fn test_days(&self) -> Vec<String> { self.string_list("test_days").unwrap_or_default() }

    fn string_list(&self, key: &str) -> Option<Vec<String>> {
        let items = match self.0.get(key)? {
            Value::Array(items) => items,
            _ => {
                warn!(key, "metadata value is not a list; using default");
                return None;
            }
        };
        let list = items
            .iter()
            .map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect();
        Some(list)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelInfo {
    pub version: String,
    pub target_column: String,
    pub benign_labels: Vec<String>,
    pub feature_count: usize,
    pub train_days: Vec<String>,
    pub test_days: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct FeatureList {
    #[serde(default)]
    features: Option<Vec<String>>,
}

#[derive(Debug)]
pub struct ArtifactBundle {
    version: String,
    model: Box<dyn Classifier>,
    feature_names: Vec<String>,
    metadata: Metadata,
    sanitizer: SanitizerSpec,
}

impl ArtifactBundle {
    /// Assembles a bundle after checking that the pieces agree: sanitizer
    /// columns/medians line up, the feature list (when present) names the same
    /// set as the sanitizer, and the model width matches.
    pub fn new(
        version: impl Into<String>,
        model: Box<dyn Classifier>,
        feature_names: Vec<String>,
        metadata: Metadata,
        sanitizer: SanitizerSpec,
    ) -> Result<Self> {
        sanitizer.validate()?;
        if !feature_names.is_empty() {
            let features: HashSet<&str> = feature_names.iter().map(String::as_str).collect();
            let columns: HashSet<&str> = sanitizer.columns.iter().map(String::as_str).collect();
            if features != columns || features.len() != feature_names.len() {
                let mut only_features: Vec<&str> = features.difference(&columns).copied().collect();
                let mut only_sanitizer: Vec<&str> = columns.difference(&features).copied().collect();
                only_features.sort_unstable();
                only_sanitizer.sort_unstable();
                return Err(IdsError::SchemaMismatch(format!(
                    "feature list and sanitizer columns differ (only in features: {only_features:?}, only in sanitizer: {only_sanitizer:?})"
                )));
            }
        }
        if model.n_features() != sanitizer.columns.len() {
            return Err(IdsError::SchemaMismatch(format!(
                "model expects {} features, sanitizer provides {}",
                model.n_features(),
                sanitizer.columns.len()
            )));
        }
        Ok(Self { version: version.into(), model, feature_names, metadata, sanitizer })
    }

    /// All-or-nothing load of `version`: every file must exist before any is read.
    pub fn load(layout: &ArtifactLayout, version: &str) -> Result<Self> {
        let paths = layout.resolve_paths(version);
        if let Some(missing) = paths.all().into_iter().find(|p| !p.exists()) {
            return Err(IdsError::MissingArtifact { path: missing.to_path_buf() });
        }

        let features: FeatureList = read_json(&paths.feature_list)?;
        let feature_names = features.features.unwrap_or_else(|| {
            warn!(path = %paths.feature_list.display(), "feature list has no `features` key; using an empty list");
            Vec::new()
        });

        let metadata = match read_json::<Value>(&paths.metadata)? {
            Value::Object(map) => Metadata::new(map),
            other => {
                return Err(IdsError::SchemaMismatch(format!(
                    "{}: metadata must be a JSON object, found {}",
                    paths.metadata.display(),
                    json_kind(&other)
                )))
            }
        };

        let sanitizer_bytes = std::fs::read(&paths.sanitizer).map_err(|e| IdsError::io(&paths.sanitizer, e))?;
        let sanitizer: SanitizerSpec = bincode::deserialize(&sanitizer_bytes)
            .map_err(|source| IdsError::Blob { path: paths.sanitizer.clone(), source })?;

        let width = if feature_names.is_empty() { sanitizer.columns.len() } else { feature_names.len() };
        let model = load_model(&paths.model, width)?;

        let bundle = Self::new(version, model, feature_names, metadata, sanitizer)?;
        info!(
            version = %bundle.version,
            family = bundle.model.family(),
            features = bundle.sanitizer.columns.len(),
            "artifacts loaded"
        );
        Ok(bundle)
    }

    pub fn version(&self) -> &str { &self.version }
    pub fn model(&self) -> &dyn Classifier { self.model.as_ref() }
    pub fn feature_names(&self) -> &[String] { &self.feature_names }
    pub fn metadata(&self) -> &Metadata { &self.metadata }
    pub fn sanitizer(&self) -> &SanitizerSpec { &self.sanitizer }

    /// Column order the model is fed: the feature list, or the sanitizer's
    /// order when the feature list fell back to empty. Input is reindexed to
    /// [`Self::feature_names`], so that fallback scores training medians only.
    pub fn model_columns(&self) -> &[String] {
        if self.feature_names.is_empty() { &self.sanitizer.columns } else { &self.feature_names }
    }

    pub fn info(&self) -> ModelInfo {
        ModelInfo {
            version: self.version.clone(),
            target_column: self.metadata.target_column(),
            benign_labels: self.metadata.benign_labels(),
            feature_count: self.feature_names.len(),
            train_days: self.metadata.train_days(),
            test_days: self.metadata.test_days(),
        }
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = std::fs::read(path).map_err(|e| IdsError::io(path, e))?;
    serde_json::from_slice(&bytes).map_err(|source| IdsError::Json { path: path.to_path_buf(), source })
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
