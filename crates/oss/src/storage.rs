//! The object-storage primitive the uploader drives.
//!
//! `ObjectStorage` is implemented by [`OssClient`](crate::OssClient) for
//! real uploads. Keeping it a trait keeps the multipart state machine
//! decoupled from HTTP and testable with mocks.

use std::future::Future;
use std::pin::Pin;

use crate::credential::ResumableCredential;
use crate::error::ObjectStorageError;

/// Boxed future returned by every storage call.
pub type StorageFuture<'a, T> =
    Pin<Box<dyn Future<Output = Result<T, ObjectStorageError>> + Send + 'a>>;

/// A confirmed part: required verbatim, in ascending order, to complete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartRecord {
    pub part_number: u32,
    pub etag: String,
}

/// Multipart-upload operations against a single bucket.
pub trait ObjectStorage: Send + Sync {
    /// Starts a multipart upload for `key` and returns its upload id.
    fn init_multipart_upload<'a>(&'a self, key: &'a str) -> StorageFuture<'a, String>;

    /// Uploads one part and returns its entity tag.
    fn upload_part<'a>(
        &'a self,
        key: &'a str,
        upload_id: &'a str,
        part_number: u32,
        data: Vec<u8>,
    ) -> StorageFuture<'a, String>;

    /// Finalizes the upload from the ordered part list.
    fn complete_multipart_upload<'a>(
        &'a self,
        key: &'a str,
        upload_id: &'a str,
        parts: &'a [PartRecord],
    ) -> StorageFuture<'a, ()>;

    /// Discards an unfinished upload and any parts already stored.
    fn abort_multipart_upload<'a>(
        &'a self,
        key: &'a str,
        upload_id: &'a str,
    ) -> StorageFuture<'a, ()>;
}

/// Opens an [`ObjectStorage`] session from freshly issued credentials.
pub trait StorageConnector: Send + Sync {
    fn connect(
        &self,
        credential: ResumableCredential,
    ) -> Result<Box<dyn ObjectStorage>, ObjectStorageError>;
}
