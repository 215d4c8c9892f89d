use thiserror::Error;

/// Error type shared across the validator workspace.
#[derive(Debug, Error)]
pub enum ValidatorError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid data file: {0}")]
    InvalidDataFile(String),

    #[error("file split error: {0}")]
    Split(String),

    #[error("source preparation error: {0}")]
    SourcePreparation(String),

    #[error("record reading error: {0}")]
    RecordSource(String),

    #[error("job storage error: {0}")]
    Storage(String),

    #[error("invalid job status: expected {expected}, got {actual}")]
    InvalidJobStatus { expected: String, actual: String },

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Unified result type.
pub type Result<T> = std::result::Result<T, ValidatorError>;
