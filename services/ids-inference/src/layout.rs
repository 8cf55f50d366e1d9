//! On-disk artifact naming: `<root>/models/<basename>_<version><suffix>` for the
//! model, `<root>/meta/...` for everything else.

use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const MODELS_SUBDIR: &str = "models";
pub const META_SUBDIR: &str = "meta";

pub const MODEL_BASENAME: &str = "cyber_ids_champion";
pub const FEATURES_BASENAME: &str = "cyber_ids_features";
pub const METADATA_BASENAME: &str = "cyber_ids_metadata";
pub const SANITIZER_BASENAME: &str = "cyber_ids_sanitizer";

pub const MODEL_SUFFIX: &str = ".bin";
pub const META_SUFFIX: &str = ".json";
pub const SANITIZER_SUFFIX: &str = ".bin";

pub const DEFAULT_DECISION_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ArtifactLayout {
    pub root: PathBuf,
    pub model_basename: String,
    pub features_basename: String,
    pub metadata_basename: String,
    pub sanitizer_basename: String,
    pub model_suffix: String,
    pub meta_suffix: String,
    pub sanitizer_suffix: String,
}

impl Default for ArtifactLayout {
    fn default() -> Self {
        Self {
            root: PathBuf::from("artifacts"),
            model_basename: MODEL_BASENAME.into(),
            features_basename: FEATURES_BASENAME.into(),
            metadata_basename: METADATA_BASENAME.into(),
            sanitizer_basename: SANITIZER_BASENAME.into(),
            model_suffix: MODEL_SUFFIX.into(),
            meta_suffix: META_SUFFIX.into(),
            sanitizer_suffix: SANITIZER_SUFFIX.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub model: PathBuf,
    pub feature_list: PathBuf,
    pub metadata: PathBuf,
    pub sanitizer: PathBuf,
}

impl ArtifactPaths {
    /// Existence-check order used by the loader.
    pub fn all(&self) -> [&Path; 4] { [&self.model, &self.feature_list, &self.metadata, &self.sanitizer] }
}

impl ArtifactLayout {
    pub fn with_root(root: impl Into<PathBuf>) -> Self { Self { root: root.into(), ..Self::default() } }

    pub fn models_dir(&self) -> PathBuf { self.root.join(MODELS_SUBDIR) }
    pub fn meta_dir(&self) -> PathBuf { self.root.join(META_SUBDIR) }

    /// Prefix every metadata file name must carry, e.g. `cyber_ids_metadata_`.
    pub fn metadata_prefix(&self) -> String { format!("{}_", self.metadata_basename) }

    /// Glob-style pattern used for discovery, for error messages.
    pub fn metadata_pattern(&self) -> String { format!("{}_*{}", self.metadata_basename, self.meta_suffix) }

    pub fn resolve_paths(&self, version: &str) -> ArtifactPaths {
        let meta = self.meta_dir();
        ArtifactPaths {
            model: self.models_dir().join(format!("{}_{}{}", self.model_basename, version, self.model_suffix)),
            feature_list: meta.join(format!("{}_{}{}", self.features_basename, version, self.meta_suffix)),
            metadata: meta.join(format!("{}_{}{}", self.metadata_basename, version, self.meta_suffix)),
            sanitizer: meta.join(format!("{}_{}{}", self.sanitizer_basename, version, self.sanitizer_suffix)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_follow_naming_convention() {
        let layout = ArtifactLayout::with_root("/srv/ids");
        let p = layout.resolve_paths("20251130-123456");
        assert_eq!(p.model, PathBuf::from("/srv/ids/models/cyber_ids_champion_20251130-123456.bin"));
        assert_eq!(p.feature_list, PathBuf::from("/srv/ids/meta/cyber_ids_features_20251130-123456.json"));
        assert_eq!(p.metadata, PathBuf::from("/srv/ids/meta/cyber_ids_metadata_20251130-123456.json"));
        assert_eq!(p.sanitizer, PathBuf::from("/srv/ids/meta/cyber_ids_sanitizer_20251130-123456.bin"));
        assert_eq!(layout.metadata_pattern(), "cyber_ids_metadata_*.json");
    }
}
