//! Object-storage and credential error types.

use std::fmt;

/// The multipart step that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    InitMultipartUpload,
    UploadPart(u32),
    CompleteMultipartUpload,
    AbortMultipartUpload,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InitMultipartUpload => f.write_str("init multipart upload"),
            Self::UploadPart(n) => write!(f, "upload part {n}"),
            Self::CompleteMultipartUpload => f.write_str("complete multipart upload"),
            Self::AbortMultipartUpload => f.write_str("abort multipart upload"),
        }
    }
}

/// Errors produced while talking to object storage.
#[derive(Debug, thiserror::Error)]
pub enum ObjectStorageError {
    #[error("HTTP error during {operation}: {source}")]
    Http {
        operation: Operation,
        #[source]
        source: reqwest::Error,
    },

    #[error("{operation} failed with status {status}: {code} {message}")]
    Api {
        operation: Operation,
        status: u16,
        code: String,
        message: String,
    },

    #[error("invalid response to {operation}: {reason}")]
    InvalidResponse { operation: Operation, reason: String },

    #[error("{operation} failed: {message}")]
    Backend { operation: Operation, message: String },

    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
}

impl ObjectStorageError {
    /// The multipart step this error belongs to, if any.
    pub fn operation(&self) -> Option<Operation> {
        match self {
            Self::Http { operation, .. }
            | Self::Api { operation, .. }
            | Self::InvalidResponse { operation, .. }
            | Self::Backend { operation, .. } => Some(*operation),
            Self::ClientBuild(_) => None,
        }
    }
}

/// Errors produced while turning resumable parameters into a credential.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CredentialParseError {
    #[error("create-file response carries no resumable parameters")]
    MissingParams,

    #[error("missing resumable parameter: {0}")]
    MissingField(&'static str),

    #[error("malformed resumable parameter {field}: {reason}")]
    Malformed { field: &'static str, reason: String },
}
