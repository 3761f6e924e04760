//! Multipart upload to Aliyun OSS using delegated (STS) credentials.
//!
//! The uploader talks to storage only through [`ObjectStorage`] and
//! [`StorageConnector`]; [`OssConnector`] is the production implementation.

mod client;
pub mod credential;
pub mod error;
pub mod sign;
pub mod storage;
mod xml;

pub use client::{OssClient, OssConnector};
pub use credential::{ResumableCredential, Secret, normalize_endpoint};
pub use error::{CredentialParseError, ObjectStorageError, Operation};
pub use storage::{ObjectStorage, PartRecord, StorageConnector, StorageFuture};
