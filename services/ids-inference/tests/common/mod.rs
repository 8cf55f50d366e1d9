//! Writes artifact sets the way the training notebook lays them out.
#![allow(dead_code)]

use ids_inference::model::{LogisticModel, ModelBlob};
use ids_inference::{ArtifactLayout, SanitizerSpec};
use serde_json::json;
use std::fs;
use tempfile::TempDir;

pub struct ArtifactDir {
    pub dir: TempDir,
    pub layout: ArtifactLayout,
}

impl ArtifactDir {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let layout = ArtifactLayout::with_root(dir.path());
        fs::create_dir_all(layout.models_dir()).unwrap();
        fs::create_dir_all(layout.meta_dir()).unwrap();
        Self { dir, layout }
    }

    /// Full bundle: logistic model over `features`, zero medians.
    pub fn write_version(&self, version: &str, features: &[&str], coefficients: &[f64]) {
        let model = ModelBlob::Logistic(LogisticModel { coefficients: coefficients.to_vec(), intercept: 0.0 });
        let sanitizer = SanitizerSpec::new(features.iter().map(|f| f.to_string()).collect(), vec![0.0; features.len()]).unwrap();
        self.write_parts(version, &model, &json!({ "features": features }), &sanitizer);
    }

    pub fn write_parts(&self, version: &str, model: &ModelBlob, feature_list: &serde_json::Value, sanitizer: &SanitizerSpec) {
        let p = self.layout.resolve_paths(version);
        fs::write(&p.model, model.encode().unwrap()).unwrap();
        fs::write(&p.feature_list, serde_json::to_vec(feature_list).unwrap()).unwrap();
        let metadata = json!({
            "target_column": "Label",
            "benign_labels": ["Benign"],
            "train_days": ["Wednesday-14-02-2018"],
            "test_days": ["Friday-16-02-2018"],
            "version": version,
        });
        fs::write(&p.metadata, serde_json::to_vec(&metadata).unwrap()).unwrap();
        fs::write(&p.sanitizer, bincode::serialize(sanitizer).unwrap()).unwrap();
    }
}
