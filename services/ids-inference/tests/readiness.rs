mod common;

use common::ArtifactDir;
use ids_core::{clear_ready, is_ready};
use ids_inference::ArtifactStore;

// Own test binary: readiness is a process-wide flag.
#[test]
fn first_successful_load_after_failed_preload_marks_ready() {
    clear_ready();
    let art = ArtifactDir::new();
    let store = ArtifactStore::new(art.layout.clone());
    assert!(store.latest().is_err());
    assert!(!is_ready());

    // bypass loads do not fill the slot, so they do not flip readiness
    art.write_version("v1", &["a"], &[1.0]);
    store.load(None, false).unwrap();
    assert!(!is_ready());

    assert_eq!(store.latest().unwrap().version(), "v1");
    assert!(is_ready());
}
