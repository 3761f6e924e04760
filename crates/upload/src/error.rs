//! Upload error types.

use std::path::PathBuf;

use pikup_oss::{CredentialParseError, ObjectStorageError};
use pikup_transfer::TransferError;

/// Errors produced by an upload. The underlying cause is kept as the
/// error source.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("transfer error: {0}")]
    Transfer(#[source] TransferError),

    #[error("credential error: {0}")]
    CredentialParse(#[from] CredentialParseError),

    #[error("drive API error: {0}")]
    Drive(#[from] pikup_drive::Error),

    #[error("object storage error: {0}")]
    ObjectStorage(#[from] ObjectStorageError),

    #[error("task join error: {0}")]
    TaskJoin(String),

    #[error("cancelled")]
    Cancelled,
}

impl From<TransferError> for UploadError {
    fn from(e: TransferError) -> Self {
        match e {
            TransferError::NotFound(path) | TransferError::NotAFile(path) => Self::NotFound(path),
            TransferError::Io(e) => Self::Io(e),
            TransferError::Cancelled => Self::Cancelled,
            TransferError::SizeMismatch { expected, actual } => {
                Self::Io(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    format!("file changed while reading: expected {expected} bytes, read {actual}"),
                ))
            }
            other => Self::Transfer(other),
        }
    }
}

impl From<tokio::task::JoinError> for UploadError {
    fn from(e: tokio::task::JoinError) -> Self {
        Self::TaskJoin(e.to_string())
    }
}
