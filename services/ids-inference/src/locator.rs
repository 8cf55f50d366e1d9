//! Version discovery. Versions are timestamp strings, so the lexicographic
//! maximum of the metadata file names is the most recent one.

use crate::error::{IdsError, Result};
use crate::layout::ArtifactLayout;
use std::path::Path;
use tracing::debug;

/// Returns the version carried by the lexicographically greatest
/// `<basename>_*<suffix>` entry in `dir`.
pub fn discover_latest_version(dir: &Path, basename: &str, suffix: &str) -> Result<String> {
    let prefix = format!("{basename}_");
    let pattern = format!("{basename}_*{suffix}");
    let entries = match std::fs::read_dir(dir) {
        Ok(e) => e,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(IdsError::NotFound { dir: dir.to_path_buf(), pattern });
        }
        Err(e) => return Err(IdsError::io(dir, e)),
    };

    let mut candidates: Vec<String> = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| IdsError::io(dir, e))?;
        let Ok(name) = entry.file_name().into_string() else { continue };
        if glob_match(&name, &prefix, suffix) { candidates.push(name); }
    }
    candidates.sort();
    let Some(latest) = candidates.pop() else {
        return Err(IdsError::NotFound { dir: dir.to_path_buf(), pattern });
    };
    debug!(file = %latest, remaining = candidates.len(), "latest metadata file");

    let stem = latest.strip_suffix(suffix).unwrap_or(&latest);
    match stem.strip_prefix(&prefix) {
        Some(version) if !version.is_empty() => Ok(version.to_string()),
        _ => Err(IdsError::MalformedName { file: latest.clone(), prefix }),
    }
}

// `<prefix>*<suffix>`: the wildcard may be empty, prefix and suffix may not overlap.
fn glob_match(name: &str, prefix: &str, suffix: &str) -> bool {
    name.len() >= prefix.len() + suffix.len() && name.starts_with(prefix) && name.ends_with(suffix)
}

impl ArtifactLayout {
    pub fn discover_latest_version(&self) -> Result<String> {
        discover_latest_version(&self.meta_dir(), &self.metadata_basename, &self.meta_suffix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(dir: &Path, name: &str) { fs::write(dir.join(name), b"{}").unwrap(); }

    #[test]
    fn picks_lexicographic_maximum() {
        let dir = tempfile::tempdir().unwrap();
        for v in ["20240101-0000", "20240601-1200", "20230101-0000"] {
            touch(dir.path(), &format!("cyber_ids_metadata_{v}.json"));
        }
        touch(dir.path(), "cyber_ids_features_20991231-0000.json");
        touch(dir.path(), "cyber_ids_metadata_20991231-0000.bin");
        let v = discover_latest_version(dir.path(), "cyber_ids_metadata", ".json").unwrap();
        assert_eq!(v, "20240601-1200");
    }

    #[test]
    fn empty_or_missing_dir_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = discover_latest_version(dir.path(), "cyber_ids_metadata", ".json").unwrap_err();
        assert!(matches!(err, IdsError::NotFound { .. }));
        let err = discover_latest_version(&dir.path().join("nope"), "cyber_ids_metadata", ".json").unwrap_err();
        assert!(matches!(err, IdsError::NotFound { .. }));
    }

    #[test]
    fn empty_version_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "cyber_ids_metadata_.json");
        let err = discover_latest_version(dir.path(), "cyber_ids_metadata", ".json").unwrap_err();
        assert!(matches!(err, IdsError::MalformedName { .. }), "{err}");
    }

    #[test]
    fn layout_discovers_from_meta_dir() {
        let dir = tempfile::tempdir().unwrap();
        let layout = ArtifactLayout::with_root(dir.path());
        fs::create_dir_all(layout.meta_dir()).unwrap();
        touch(&layout.meta_dir(), "cyber_ids_metadata_v1.json");
        assert_eq!(layout.discover_latest_version().unwrap(), "v1");
    }
}
