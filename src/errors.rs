use crate::session::SessionError;
use thiserror::Error;

/// Errors raised by the scanning pipeline.
///
/// Capture-boundary failures (`PayloadNotFound`, `IdentityNotFound`,
/// `InvalidFrame`) are transient: the caller reports them and lets the
/// operator present the sheet again.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Payload not found: no identity marker decoded after {attempts} attempts")]
    PayloadNotFound { attempts: usize },

    #[error("Identity not found: no student matches external id '{external_id}'")]
    IdentityNotFound { external_id: String },

    #[error("Missing answer key for quiz '{quiz_id}'")]
    MissingAnswerKey { quiz_id: String },

    #[error("Malformed extraction: expected {expected} answers, got {actual}")]
    MalformedExtraction { expected: usize, actual: usize },

    #[error("Invalid frame: {0}")]
    InvalidFrame(String),

    #[error("Invalid sheet layout: {0}")]
    InvalidLayout(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Result store error: {0}")]
    StoreError(String),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ScanError {
    /// Whether the operator may simply retry the capture.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ScanError::PayloadNotFound { .. }
                | ScanError::IdentityNotFound { .. }
                | ScanError::InvalidFrame(_)
        )
    }
}
