//! Error types for studyview-core.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StudyviewError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Study not found: {0}")]
    StudyNotFound(String),

    #[error("Invalid target: {0}")]
    InvalidTarget(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Dashboard registration failed: {0}")]
    Registration(String),

    #[error("{0}")]
    Other(String),
}

impl StudyviewError {
    /// True for errors caused by the caller's input rather than the server.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            StudyviewError::InvalidTarget(_)
                | StudyviewError::InvalidQuery(_)
                | StudyviewError::Registration(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, StudyviewError>;
