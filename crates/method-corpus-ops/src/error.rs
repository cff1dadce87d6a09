//! Error types for the mining pipeline.

use thiserror::Error;

use crate::discovery::SearchFailureKind;

/// Result type for pipeline operations.
pub type CorpusResult<T> = Result<T, CorpusError>;

/// Errors that abort a mining run.
///
/// Failures scoped to one repository or one file never surface here; they are
/// logged and recorded in the run report instead.
#[derive(Debug, Error)]
pub enum CorpusError {
    /// The repository search capability failed.
    #[error("Repository search failed ({kind}): {message}")]
    Discovery {
        kind: SearchFailureKind,
        message: String,
    },

    /// The grammar could not be loaded into the parser.
    #[error("Parser setup failed: {0}")]
    Parser(String),

    /// Writing the output table failed.
    #[error("Export error: {0}")]
    Export(#[from] csv::Error),

    /// IO error during file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}
