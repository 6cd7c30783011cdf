use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Network,
    Shape,
    StorageUnavailable,
    ConstraintViolation,
    Storage,
}

impl ErrorKind {
    pub fn label(self) -> &'static str {
        match self {
            ErrorKind::Network => "Network",
            ErrorKind::Shape => "Unexpected response",
            ErrorKind::StorageUnavailable => "Storage unavailable",
            ErrorKind::ConstraintViolation => "Duplicate entry",
            ErrorKind::Storage => "Storage",
        }
    }
}

/// Cloneable summary of a failed operation, kept in view state after the
/// original error has been logged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    pub kind: ErrorKind,
    pub message: String,
}

impl Failure {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Raised when a remote payload does not carry the fields a profile needs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeError {
    #[error("response body is not valid JSON: {0}")]
    InvalidJson(String),
    #[error("response is missing the `results` array")]
    MissingResults,
    #[error("result #{index} is missing `{field}`")]
    MissingField { index: usize, field: &'static str },
}
