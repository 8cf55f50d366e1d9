use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IdsError {
    #[error("no metadata files found in {} with pattern {pattern:?}", dir.display())]
    NotFound { dir: PathBuf, pattern: String },
    #[error("unexpected metadata filename {file:?}; expected it to start with {prefix:?}")]
    MalformedName { file: String, prefix: String },
    #[error("expected artifact not found: {}", path.display())]
    MissingArtifact { path: PathBuf },
    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),
    #[error("io error on {}: {source}", path.display())]
    Io { path: PathBuf, #[source] source: std::io::Error },
    #[error("invalid json in {}: {source}", path.display())]
    Json { path: PathBuf, #[source] source: serde_json::Error },
    #[error("cannot decode blob {}: {source}", path.display())]
    Blob { path: PathBuf, #[source] source: bincode::Error },
    #[error("model error: {0}")]
    Model(String),
    #[error("unsupported model format {0:?}")]
    UnsupportedModelFormat(String),
    #[error("invalid decision threshold {0}")]
    InvalidThreshold(f64),
}

impl IdsError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self { Self::Io { path: path.into(), source } }
}

pub type Result<T, E = IdsError> = std::result::Result<T, E>;
