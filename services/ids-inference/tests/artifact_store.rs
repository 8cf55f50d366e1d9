mod common;

use common::ArtifactDir;
use ids_inference::model::{LogisticModel, ModelBlob};
use ids_inference::{ArtifactStore, IdsError, InferenceEngine, SanitizerSpec};
use serde_json::json;
use std::sync::Arc;

#[test]
fn second_latest_load_is_served_from_cache() {
    let art = ArtifactDir::new();
    art.write_version("20240101-0000", &["src_port", "dst_port"], &[0.1, 0.2]);
    let store = ArtifactStore::new(art.layout.clone());

    let first = store.load(None, true).unwrap();
    assert_eq!(store.disk_loads(), 1);
    let second = store.load(None, true).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(store.disk_loads(), 1);
}

#[test]
fn discovery_picks_greatest_version() {
    let art = ArtifactDir::new();
    for v in ["20240101-0000", "20240601-1200", "20230101-0000"] {
        art.write_version(v, &["a"], &[1.0]);
    }
    let store = ArtifactStore::new(art.layout.clone());
    assert_eq!(store.latest().unwrap().version(), "20240601-1200");
}

#[test]
fn missing_explicit_version_fails_without_touching_cache() {
    let art = ArtifactDir::new();
    art.write_version("20240101-0000", &["a"], &[1.0]);
    let store = ArtifactStore::new(art.layout.clone());
    let cached = store.latest().unwrap();

    let err = store.load(Some("20991231-0000"), true).unwrap_err();
    match err {
        IdsError::MissingArtifact { path } => assert!(path.ends_with("models/cyber_ids_champion_20991231-0000.bin")),
        other => panic!("unexpected error {other}"),
    }
    assert!(Arc::ptr_eq(&store.cached().unwrap(), &cached));

    let cold = ArtifactStore::new(art.layout.clone());
    assert!(cold.load(Some("nope"), true).is_err());
    assert!(cold.cached().is_none());
}

#[test]
fn partial_bundle_is_never_returned() {
    let art = ArtifactDir::new();
    art.write_version("v1", &["a"], &[1.0]);
    std::fs::remove_file(art.layout.resolve_paths("v1").sanitizer).unwrap();
    let store = ArtifactStore::new(art.layout.clone());
    let err = store.load(Some("v1"), true).unwrap_err();
    match err {
        IdsError::MissingArtifact { path } => assert!(path.ends_with("meta/cyber_ids_sanitizer_v1.bin")),
        other => panic!("unexpected error {other}"),
    }
    assert!(store.cached().is_none());
}

#[test]
fn explicit_version_replaces_cached_latest() {
    let art = ArtifactDir::new();
    art.write_version("v1", &["a"], &[1.0]);
    art.write_version("v2", &["a"], &[2.0]);
    let store = ArtifactStore::new(art.layout.clone());
    assert_eq!(store.latest().unwrap().version(), "v2");

    store.load(Some("v1"), true).unwrap();
    assert_eq!(store.latest().unwrap().version(), "v1");

    store.load(Some("v2"), false).unwrap();
    assert_eq!(store.cached().unwrap().version(), "v1");
}

#[test]
fn cache_stays_stale_until_cleared() {
    let art = ArtifactDir::new();
    art.write_version("v1", &["a"], &[1.0]);
    let store = ArtifactStore::new(art.layout.clone());
    assert_eq!(store.latest().unwrap().version(), "v1");

    art.write_version("v2", &["a"], &[1.0]);
    assert_eq!(store.latest().unwrap().version(), "v1");
    assert_eq!(store.load(None, false).unwrap().version(), "v2");
    assert_eq!(store.latest().unwrap().version(), "v1");

    store.clear();
    assert_eq!(store.latest().unwrap().version(), "v2");
}

#[test]
fn empty_artifact_dir_is_not_found() {
    let art = ArtifactDir::new();
    let store = ArtifactStore::new(art.layout.clone());
    assert!(matches!(store.latest(), Err(IdsError::NotFound { .. })));
}

#[test]
fn feature_list_without_key_falls_back_to_empty() {
    let art = ArtifactDir::new();
    let model = ModelBlob::Logistic(LogisticModel { coefficients: vec![1.0, 1.0], intercept: 0.0 });
    let sanitizer = SanitizerSpec::new(vec!["a".into(), "b".into()], vec![0.0, 0.0]).unwrap();
    art.write_parts("v1", &model, &json!({"columns": ["a", "b"]}), &sanitizer);

    let store = Arc::new(ArtifactStore::new(art.layout.clone()));
    let bundle = store.latest().unwrap();
    assert!(bundle.feature_names().is_empty());
    assert_eq!(bundle.info().feature_count, 0);
    assert_eq!(bundle.model_columns(), sanitizer.columns.as_slice());

    // caller values are dropped; the model only sees the zero medians
    let engine = InferenceEngine::new(store);
    let record = json!({"a": 3, "b": 4}).as_object().cloned().unwrap();
    let out = engine.predict_records(&[record], None).unwrap();
    assert_eq!(out.probabilities, vec![0.5]);
    assert_eq!(out.report.imputed, 2);
}

#[test]
fn inconsistent_bundle_is_schema_mismatch() {
    let art = ArtifactDir::new();
    let model = ModelBlob::Logistic(LogisticModel { coefficients: vec![1.0, 1.0], intercept: 0.0 });
    let sanitizer = SanitizerSpec { columns: vec!["a".into(), "b".into()], medians: vec![0.0] };
    art.write_parts("v1", &model, &json!({"features": ["a", "b"]}), &sanitizer);
    let store = ArtifactStore::new(art.layout.clone());
    assert!(matches!(store.latest(), Err(IdsError::SchemaMismatch(_))));
    assert!(store.cached().is_none());
}

#[test]
fn concurrent_cold_loads_share_one_bundle() {
    let art = ArtifactDir::new();
    art.write_version("v1", &["a", "b"], &[1.0, 1.0]);
    let store = Arc::new(ArtifactStore::new(art.layout.clone()));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let s = store.clone();
            std::thread::spawn(move || s.latest().unwrap())
        })
        .collect();
    let bundles: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(bundles.iter().all(|b| Arc::ptr_eq(b, &bundles[0])));
    assert_eq!(store.disk_loads(), 1);
}

#[test]
fn model_info_reflects_metadata() {
    let art = ArtifactDir::new();
    art.write_version("20251130-123456", &["src_port", "dst_port", "flow_duration"], &[0.0, 0.0, 0.0]);
    let info = ArtifactStore::new(art.layout.clone()).latest().unwrap().info();
    assert_eq!(info.version, "20251130-123456");
    assert_eq!(info.target_column, "Label");
    assert_eq!(info.benign_labels, vec!["Benign".to_string()]);
    assert_eq!(info.feature_count, 3);
    assert_eq!(info.train_days, vec!["Wednesday-14-02-2018".to_string()]);
    assert_eq!(info.test_days, vec!["Friday-16-02-2018".to_string()]);
}
