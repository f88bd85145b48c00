use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to serialize report to json: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write report to {path}: {source}")]
    Write { path: PathBuf, source: std::io::Error },

    #[error("failed to read report from {path}: {source}")]
    Read { path: PathBuf, source: std::io::Error },
}
