//! Errors raised while reading diagram exports

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed diagram JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported diagram type `{found}` (expected {expected})")]
    UnsupportedDiagramType { expected: &'static str, found: String },
}

pub type Result<T> = std::result::Result<T, IngestError>;

pub(crate) fn read_file(path: &std::path::Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    })
}
