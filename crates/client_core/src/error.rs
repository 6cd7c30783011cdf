use shared::error::{ErrorKind, Failure, ShapeError};
use storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("profile request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("profile endpoint returned HTTP {status}")]
    Status { status: u16 },
    #[error("malformed profile response: {0}")]
    Shape(#[from] ShapeError),
}

impl RemoteError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RemoteError::Transport(_) | RemoteError::Status { .. } => ErrorKind::Network,
            RemoteError::Shape(_) => ErrorKind::Shape,
        }
    }
}

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error(transparent)]
    Remote(#[from] RemoteError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl DirectoryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DirectoryError::Remote(err) => err.kind(),
            DirectoryError::Storage(StorageError::Unavailable(_)) => ErrorKind::StorageUnavailable,
            DirectoryError::Storage(StorageError::ConstraintViolation { .. }) => {
                ErrorKind::ConstraintViolation
            }
            DirectoryError::Storage(StorageError::Query(_)) => ErrorKind::Storage,
        }
    }

    pub fn to_failure(&self) -> Failure {
        Failure::new(self.kind(), self.to_string())
    }
}
