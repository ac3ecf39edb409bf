//! Error taxonomy shared by the pipeline stages.
//!
//! Ingestion and loading errors are fatal to their run. [`PipelineError::Query`]
//! is the only recoverable variant: the dashboard turns it into an empty view
//! plus a warning.

use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Missing or invalid settings, including a missing label directory.
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("file not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// A field in the result file could not be parsed.
    #[error("format error at row {row}: {message}")]
    Format { row: usize, message: String },

    #[error("storage error: {0}")]
    Storage(String),

    #[error("query error: {0}")]
    Query(String),
}

impl PipelineError {
    pub fn storage(err: impl std::fmt::Display) -> Self {
        PipelineError::Storage(err.to_string())
    }

    pub fn query(err: impl std::fmt::Display) -> Self {
        PipelineError::Query(err.to_string())
    }

    /// Process exit status used by the binaries.
    pub fn exit_code(&self) -> u8 {
        match self {
            PipelineError::Configuration(_) => 2,
            PipelineError::NotFound { .. } => 3,
            PipelineError::Format { .. } => 4,
            PipelineError::Storage(_) => 5,
            PipelineError::Query(_) => 6,
        }
    }

    pub fn is_recoverable(&self) -> bool {
        matches!(self, PipelineError::Query(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_are_nonzero_and_distinct() {
        let errors = [
            PipelineError::Configuration("x".into()),
            PipelineError::NotFound { path: PathBuf::from("a.csv") },
            PipelineError::Format { row: 1, message: "x".into() },
            PipelineError::Storage("x".into()),
            PipelineError::Query("x".into()),
        ];
        let mut codes: Vec<u8> = errors.iter().map(|e| e.exit_code()).collect();
        assert!(codes.iter().all(|&c| c != 0));
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn test_only_query_is_recoverable() {
        assert!(PipelineError::Query("down".into()).is_recoverable());
        assert!(!PipelineError::Storage("down".into()).is_recoverable());
    }
}
