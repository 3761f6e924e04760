//! Local-file side of an upload: GCID hashing and part segmentation.
//!
//! Both operate on independent sequential reads of the same path; nothing
//! is shared between the hash pass and the transfer pass.

mod chunked;
mod gcid;
mod types;
mod validation;

use std::path::PathBuf;

pub use chunked::{PartReader, read_full};
pub use gcid::{
    GcidDigest, MAX_CHUNK_SIZE, MIN_CHUNK_SIZE, gcid_hash_file, gcid_hash_reader,
    gcid_hash_reader_until, select_chunk_size,
};
pub use types::{FileDescriptor, Part};
pub use validation::{validate_display_name, validate_upload_file};

/// Default part size: 5 MiB.
///
/// The smallest part size object storage accepts for every part but the last.
pub const DEFAULT_PART_SIZE: usize = 5 * 1024 * 1024;

/// Errors produced by the transfer crate.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("not a regular file: {}", .0.display())]
    NotAFile(PathBuf),

    #[error("invalid file name: {0}")]
    InvalidName(String),

    #[error("file size changed during read: expected {expected} bytes, read {actual}")]
    SizeMismatch { expected: u64, actual: u64 },

    #[error("cancelled")]
    Cancelled,
}
