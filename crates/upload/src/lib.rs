//! Upload flow: hash, register, multipart transfer, complete.
//!
//! This crate holds the upload state machine. It has no HTTP code of its
//! own; the drive metadata API and object storage are reached through the
//! [`DriveApi`](pikup_drive::DriveApi) and
//! [`StorageConnector`](pikup_oss::StorageConnector) traits.
//!
//! # Pipeline
//!
//! 1. **Inspect**: validate the path and sample the file size once
//! 2. **Hash**: compute the GCID of the content
//! 3. **Register**: call create-file; a complete task ends the upload here
//! 4. **Transfer**: upload fixed-size parts in order with the issued credentials
//! 5. **Complete**: finalize the multipart upload with every part's ETag

pub mod error;
pub mod parts;
pub mod session;
pub mod types;

#[cfg(test)]
mod testutil;

// Re-export primary types for convenience.
pub use error::UploadError;
pub use parts::PartUploader;
pub use session::UploadSession;
pub use types::{UploadEvent, UploadOptions, UploadOutcome};
